//! Sector/wall arenas built from level records, with portal links,
//! boundary loops and per-sector mesh caches.

use std::sync::OnceLock;

use glam::{Vec2, Vec3};
use rayon::prelude::*;
use sectorscope_core::math::{is_counter_clockwise, point_in_polygon};
use sectorscope_core::{SectorId, WallId};
use sectorscope_formats::{LevelData, Spawn, Tileset};

use crate::error::{malformed, WorldResult};
use crate::geometry::build_sector_mesh;
use crate::mesh::SectorMesh;
use crate::sector::{FlatFrame, FlatInfo, Sector};
use crate::visibility::Portal;
use crate::wall::Wall;

#[derive(Debug)]
pub struct SpatialGraph {
    sectors: Vec<Sector>,
    walls: Vec<Wall>,
    spawn: Spawn,
}

impl SpatialGraph {
    /// Link walls and sectors, validating every cross reference.
    pub fn build(level: &LevelData) -> WorldResult<Self> {
        let owners = assign_owners(level)?;
        validate_links(level, &owners)?;

        let walls: Vec<Wall> = level
            .walls
            .iter()
            .enumerate()
            .map(|(i, def)| {
                let next = &level.walls[def.next_wall as usize];
                Wall::new(WallId(i as u32), owners[i], def, next)
            })
            .collect();

        let mut sectors = Vec::with_capacity(level.sectors.len());
        for (i, def) in level.sectors.iter().enumerate() {
            let first = def.first_wall as usize;
            let count = def.wall_count as usize;
            let id = SectorId(i as u32);
            let anchor = &walls[first];
            sectors.push(Sector {
                id,
                first_wall: WallId(first as u32),
                wall_count: count as u32,
                floor: FlatInfo::from_def(&def.floor),
                ceiling: FlatInfo::from_def(&def.ceiling),
                shade_factor: def.shade_factor,
                frame: FlatFrame {
                    origin: anchor.start,
                    normal: anchor.normal,
                },
                loops: find_loops(level, id, first, count, &walls)?,
                portals: Vec::new(),
                mesh: OnceLock::new(),
            });
        }

        let mut graph = Self {
            sectors,
            walls,
            spawn: level.spawn,
        };
        for i in 0..graph.sectors.len() {
            let portals = graph.collect_portals(&graph.sectors[i]);
            graph.sectors[i].portals = portals;
        }

        log::info!(
            "Spatial graph: {} sectors, {} walls, {} portals",
            graph.sectors.len(),
            graph.walls.len(),
            graph.walls.iter().filter(|w| w.is_portal()).count()
        );
        Ok(graph)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id.index())
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id.index())
    }

    pub fn spawn(&self) -> &Spawn {
        &self.spawn
    }

    /// First sector, in id order, containing the camera's ground position.
    pub fn locate(&self, position: Vec3) -> Option<SectorId> {
        let point = Vec2::new(position.x, position.z);
        self.sectors
            .iter()
            .find(|s| {
                let edges: Vec<(Vec2, Vec2)> = s.walls().map(|w| self.wall_edge(w)).collect();
                point_in_polygon(point, &edges)
            })
            .map(|s| s.id)
    }

    fn wall_edge(&self, id: WallId) -> (Vec2, Vec2) {
        let wall = &self.walls[id.index()];
        (wall.start, wall.end)
    }

    /// Portals of a sector in wall order.
    pub fn portals(&self, id: SectorId) -> &[Portal] {
        self.sector(id)
            .map(|s| s.portals.as_slice())
            .unwrap_or_default()
    }

    fn collect_portals(&self, sector: &Sector) -> Vec<Portal> {
        sector
            .walls()
            .filter_map(|id| {
                let wall = &self.walls[id.index()];
                let other = self.sector(wall.other_sector?)?;
                let (l, r) = (wall.start, wall.end);
                let top = |p: Vec2| sector.ceiling_at(p).min(other.ceiling_at(p));
                let bottom = |p: Vec2| sector.floor_at(p).max(other.floor_at(p));
                Some(Portal {
                    wall: id,
                    sector: other.id,
                    points: [
                        Vec3::new(l.x, top(l), l.y),
                        Vec3::new(r.x, top(r), r.y),
                        Vec3::new(r.x, bottom(r), r.y),
                        Vec3::new(l.x, bottom(l), l.y),
                    ],
                })
            })
            .collect()
    }

    pub fn floor_at(&self, id: SectorId, point: Vec2) -> Option<f32> {
        self.sector(id).map(|s| s.floor_at(point))
    }

    pub fn ceiling_at(&self, id: SectorId, point: Vec2) -> Option<f32> {
        self.sector(id).map(|s| s.ceiling_at(point))
    }

    /// Mesh of a sector, generated on first request after being dirtied.
    pub fn sector_mesh(&self, id: SectorId, tiles: &Tileset) -> WorldResult<&SectorMesh> {
        let sector = self
            .sector(id)
            .ok_or_else(|| malformed(format!("sector {id} does not exist")))?;
        if let Some(mesh) = sector.mesh.get() {
            return Ok(mesh);
        }
        let mesh = build_sector_mesh(self, sector, tiles)?;
        Ok(sector.mesh.get_or_init(|| mesh))
    }

    pub fn is_built(&self, id: SectorId) -> bool {
        self.sector(id).is_some_and(|s| s.mesh.get().is_some())
    }

    /// Drop a sector's cached mesh so the next request rebuilds it.
    pub fn mark_dirty(&mut self, id: SectorId) {
        if let Some(sector) = self.sectors.get_mut(id.index()) {
            sector.mesh.take();
        }
    }

    /// Build every dirty sector's mesh in parallel. Results are published
    /// only after all sectors succeeded.
    pub fn prebuild_geometry(&self, tiles: &Tileset) -> WorldResult<usize> {
        let built = self
            .sectors
            .par_iter()
            .filter(|s| s.mesh.get().is_none())
            .map(|s| build_sector_mesh(self, s, tiles).map(|mesh| (s.id, mesh)))
            .collect::<WorldResult<Vec<_>>>()?;

        let count = built.len();
        for (id, mesh) in built {
            // may already be filled by a concurrent `sector_mesh`
            let _ = self.sectors[id.index()].mesh.set(mesh);
        }
        log::info!("Prebuilt geometry for {count} sectors");
        Ok(count)
    }
}

/// Map every wall to the sector whose range contains it. Ranges must be
/// in bounds, non-empty, disjoint and cover all walls.
fn assign_owners(level: &LevelData) -> WorldResult<Vec<SectorId>> {
    let mut owners: Vec<Option<SectorId>> = vec![None; level.walls.len()];
    for (i, def) in level.sectors.iter().enumerate() {
        if def.first_wall < 0 || def.wall_count <= 0 {
            return Err(malformed(format!(
                "sector {i} has wall range {}+{}",
                def.first_wall, def.wall_count
            )));
        }
        let first = def.first_wall as usize;
        let end = first + def.wall_count as usize;
        if end > level.walls.len() {
            return Err(malformed(format!(
                "sector {i} walls {first}..{end} exceed wall count {}",
                level.walls.len()
            )));
        }
        for (w, owner) in owners[first..end].iter_mut().enumerate() {
            if let Some(other) = owner {
                return Err(malformed(format!(
                    "wall {} claimed by sectors {other} and {i}",
                    first + w
                )));
            }
            *owner = Some(SectorId(i as u32));
        }
    }

    owners
        .into_iter()
        .enumerate()
        .map(|(w, owner)| owner.ok_or_else(|| malformed(format!("wall {w} belongs to no sector"))))
        .collect()
}

fn validate_links(level: &LevelData, owners: &[SectorId]) -> WorldResult<()> {
    let wall_count = level.walls.len();
    let in_range = |index: i16, len: usize| index >= 0 && (index as usize) < len;

    for (i, def) in level.walls.iter().enumerate() {
        let owner = owners[i];
        if !in_range(def.next_wall, wall_count) || owners[def.next_wall as usize] != owner {
            return Err(malformed(format!(
                "wall {i} continues to wall {} outside sector {owner}",
                def.next_wall
            )));
        }

        match (def.opposite_wall, def.opposite_sector) {
            (-1, -1) => {}
            (-1, _) | (_, -1) => {
                return Err(malformed(format!(
                    "wall {i} has half-set portal (wall {}, sector {})",
                    def.opposite_wall, def.opposite_sector
                )));
            }
            (other_wall, other_sector) => {
                if !in_range(other_wall, wall_count) || !in_range(other_sector, level.sectors.len()) {
                    return Err(malformed(format!(
                        "wall {i} portal out of range (wall {other_wall}, sector {other_sector})"
                    )));
                }
                let other = &level.walls[other_wall as usize];
                if other.opposite_wall as usize != i {
                    return Err(malformed(format!(
                        "wall {i} links to wall {other_wall}, which links to {}",
                        other.opposite_wall
                    )));
                }
                if owners[other_wall as usize] != SectorId(other_sector as u32) {
                    return Err(malformed(format!(
                        "wall {i} links to wall {other_wall} outside sector {other_sector}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Split a sector's walls into closed loops. A loop ends at the wall whose
/// successor index is lower than its own. When there are several loops and
/// the first does not wind counter-clockwise, the first loop that does is
/// moved to the front.
fn find_loops(
    level: &LevelData,
    sector: SectorId,
    first: usize,
    count: usize,
    walls: &[Wall],
) -> WorldResult<Vec<Vec<WallId>>> {
    let mut loops = Vec::new();
    let mut current = Vec::new();
    for i in first..first + count {
        current.push(WallId(i as u32));
        if (level.walls[i].next_wall as usize) < i {
            loops.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        return Err(malformed(format!(
            "sector {sector} has an unterminated wall loop starting at wall {}",
            current[0]
        )));
    }

    let winds_ccw = |ids: &Vec<WallId>| {
        let points: Vec<Vec2> = ids.iter().map(|id| walls[id.index()].start).collect();
        is_counter_clockwise(&points)
    };
    if loops.len() > 1 && !winds_ccw(&loops[0]) {
        if let Some(outer) = loops.iter().skip(1).position(winds_ccw) {
            let outer = loops.remove(outer + 1);
            loops.insert(0, outer);
        }
    }
    Ok(loops)
}
