//! Triangulation of sector flats and wall section quads.

use glam::{Vec2, Vec3};
use sectorscope_core::{FlatFlags, TileId, WallFlags};
use sectorscope_formats::{Tile, Tileset};

use crate::error::{WorldError, WorldResult};
use crate::graph::SpatialGraph;
use crate::mesh::{BlendMode, MaterialKey, SectorMesh, SurfaceKind, WallSection};
use crate::sector::{FlatInfo, Sector};
use crate::wall::Wall;

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Ear-clip a polygon. The first loop is the outer boundary, the rest are
/// holes; indices refer to the loops' points concatenated in order.
pub fn triangulate(loops: &[Vec<Vec2>]) -> Result<Vec<u32>, String> {
    let mut coords = Vec::new();
    let mut holes = Vec::new();
    for (i, points) in loops.iter().enumerate() {
        if i > 0 {
            holes.push(coords.len() / 2);
        }
        coords.extend(points.iter().flat_map(|p| [p.x as f64, p.y as f64]));
    }

    let indices = earcutr::earcut(&coords, &holes, 2).map_err(|e| format!("{e:?}"))?;
    Ok(indices.into_iter().map(|i| i as u32).collect())
}

/// Reverse the winding of every triangle by swapping its last two corners.
pub fn flip_winding(indices: &[u32]) -> Vec<u32> {
    indices
        .chunks_exact(3)
        .flat_map(|t| [t[0], t[2], t[1]])
        .collect()
}

/// Generate the full mesh of one sector.
pub fn build_sector_mesh(graph: &SpatialGraph, sector: &Sector, tiles: &Tileset) -> WorldResult<SectorMesh> {
    let mut builder = MeshBuilder {
        graph,
        sector,
        tiles,
        mesh: SectorMesh::default(),
    };
    builder.flats()?;
    for id in sector.walls() {
        if let Some(wall) = graph.wall(id) {
            builder.wall(wall);
        }
    }
    log::debug!(
        "Sector {}: {} triangles in {} surfaces",
        sector.id,
        builder.mesh.triangle_count(),
        builder.mesh.surfaces.len()
    );
    Ok(builder.mesh)
}

struct MeshBuilder<'a> {
    graph: &'a SpatialGraph,
    sector: &'a Sector,
    tiles: &'a Tileset,
    mesh: SectorMesh,
}

impl<'a> MeshBuilder<'a> {
    fn tile(&self, id: Option<TileId>) -> Option<&'a Tile> {
        let id = id?;
        let tile = self.tiles.find(id);
        if tile.is_none() {
            log::warn!("Sector {} references missing tile {id}", self.sector.id);
        }
        tile
    }

    fn flats(&mut self) -> WorldResult<()> {
        let loops: Vec<Vec<Vec2>> = self
            .sector
            .loops
            .iter()
            .map(|walls| {
                walls
                    .iter()
                    .filter_map(|&id| self.graph.wall(id))
                    .map(|w| w.start)
                    .collect()
            })
            .collect();
        let indices = triangulate(&loops).map_err(|detail| WorldError::Triangulation {
            sector: self.sector.id,
            detail,
        })?;
        let points = loops.concat();

        let sector = self.sector;
        let floor_tile = self.tile(sector.floor.tile);
        let positions: Vec<[f32; 3]> = points
            .iter()
            .map(|&p| [p.x, sector.floor_at(p), p.y])
            .collect();
        let uvs: Vec<[f32; 2]> = points
            .iter()
            .map(|&p| sector.floor_uv(p, floor_tile).to_array())
            .collect();
        self.mesh.push(
            SurfaceKind::Floor,
            flat_material(&sector.floor),
            &positions,
            &uvs,
            indices.iter().copied(),
        );

        let ceiling_tile = self.tile(sector.ceiling.tile);
        let positions: Vec<[f32; 3]> = points
            .iter()
            .map(|&p| [p.x, sector.ceiling_at(p), p.y])
            .collect();
        let uvs: Vec<[f32; 2]> = points
            .iter()
            .map(|&p| sector.ceiling_uv(p, ceiling_tile).to_array())
            .collect();
        self.mesh.push(
            SurfaceKind::Ceiling,
            flat_material(&sector.ceiling),
            &positions,
            &uvs,
            flip_winding(&indices),
        );
        Ok(())
    }

    fn wall(&mut self, wall: &Wall) {
        let (graph, sector) = (self.graph, self.sector);
        let floor = (sector.floor_at(wall.start), sector.floor_at(wall.end));
        let ceiling = (sector.ceiling_at(wall.start), sector.ceiling_at(wall.end));

        let Some(other) = wall.other_sector.and_then(|id| graph.sector(id)) else {
            self.section(wall, WallSection::Full, wall.texture, floor, ceiling);
            return;
        };

        let other_floor = (other.floor_at(wall.start), other.floor_at(wall.end));
        let other_ceiling = (other.ceiling_at(wall.start), other.ceiling_at(wall.end));
        self.section(wall, WallSection::UpperGap, wall.texture, other_ceiling, ceiling);
        self.section(wall, WallSection::LowerGap, wall.texture, floor, other_floor);

        if wall.flags.contains(WallFlags::MASKING) {
            self.section(wall, WallSection::Mask, wall.mask_texture, other_floor, other_ceiling);
        } else if wall.flags.contains(WallFlags::ONE_WAY) {
            self.section(wall, WallSection::OneWay, wall.texture, floor, ceiling);
        }
    }

    /// Emit one quad between `bottom` and `top` (heights at start, end).
    fn section(
        &mut self,
        wall: &Wall,
        section: WallSection,
        texture: Option<TileId>,
        bottom: (f32, f32),
        top: (f32, f32),
    ) {
        if bottom.0 >= top.0 && bottom.1 >= top.1 {
            self.mesh.skipped_sections += 1;
            return;
        }

        let (l, r) = (wall.start, wall.end);
        let corners = [
            Vec3::new(l.x, top.0, l.y),
            Vec3::new(r.x, top.1, r.y),
            Vec3::new(l.x, bottom.0, l.y),
            Vec3::new(r.x, bottom.1, r.y),
        ];
        let tile = self.tile(texture);
        let origin = self.origin_height(wall, section);
        let uvs = corners.map(|c| wall.uv(c, tile, origin).to_array());

        let blend = if section.is_gap() {
            BlendMode::Opaque
        } else {
            wall_blend(wall.flags)
        };
        let material = MaterialKey {
            tile: texture,
            palette: wall.palette,
            shade: wall.shade,
            blend,
            parallax: false,
        };
        self.mesh.push(
            SurfaceKind::Wall {
                wall: wall.id,
                section,
            },
            material,
            &corners.map(|c| c.to_array()),
            &uvs,
            QUAD_INDICES,
        );
    }

    /// Height the wall texture hangs from.
    fn origin_height(&self, wall: &Wall, section: WallSection) -> f32 {
        let bottom_align = wall.flags.contains(WallFlags::BOTTOM_ALIGN);
        match wall.other_sector.and_then(|id| self.graph.sector(id)) {
            Some(other) if bottom_align || section == WallSection::LowerGap => other.floor.height,
            Some(other) => other.ceiling.height,
            None if bottom_align => self.sector.floor.height,
            None => self.sector.ceiling.height,
        }
    }
}

fn flat_material(flat: &FlatInfo) -> MaterialKey {
    MaterialKey {
        tile: flat.tile,
        palette: flat.palette,
        shade: flat.shade,
        blend: BlendMode::Opaque,
        parallax: flat.flags.contains(FlatFlags::PARALLAX),
    }
}

fn wall_blend(flags: WallFlags) -> BlendMode {
    if flags.contains(WallFlags::TRANSPARENT) {
        BlendMode::Translucent
    } else if flags.contains(WallFlags::INVERSE_TRANSPARENT) {
        BlendMode::TranslucentInverse
    } else if flags.contains(WallFlags::MASKING) {
        BlendMode::Masked
    } else {
        BlendMode::Opaque
    }
}
