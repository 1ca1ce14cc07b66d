pub mod error;
pub mod geometry;
pub mod graph;
pub mod mesh;
pub mod sector;
pub mod visibility;
pub mod wall;

#[cfg(test)]
mod fixtures;

use std::collections::HashSet;
use std::sync::Arc;

use glam::Vec3;
use sectorscope_core::{SectorId, TileId};
use sectorscope_formats::{Archive, ArchiveSource, LevelData, Palette, SoundClip, TextureSink, Tileset};

pub use error::{WorldError, WorldResult};
pub use graph::SpatialGraph;
pub use mesh::{BlendMode, MaterialKey, MeshSink, SectorMesh, Surface, SurfaceKind, WallSection};
pub use sector::{FlatInfo, Sector};
pub use visibility::{AlwaysVisible, Portal, PortalVisibility};
pub use wall::Wall;

/// A loaded archive with its shared assets and the current level.
///
/// The archive, palette and tiles never change after construction. Each
/// level load builds a fresh [`SpatialGraph`] and replaces the previous one
/// only once it is complete; readers holding the old `Arc` keep a
/// consistent view.
pub struct World {
    archive: Archive,
    palette: Palette,
    tiles: Tileset,
    level: Option<(String, Arc<SpatialGraph>)>,
}

impl World {
    /// Decode the palette and every tileset file of `archive`.
    pub fn new(archive: Archive) -> WorldResult<Self> {
        let palette = Palette::load(&archive)?;
        let tiles = Tileset::load(&archive)?;
        Ok(Self {
            archive,
            palette,
            tiles,
            level: None,
        })
    }

    /// Fetch the archive named `name` from `source`, then decode its assets.
    pub async fn open<S: ArchiveSource>(source: &S, name: &str) -> WorldResult<Self> {
        let archive = Archive::fetch(source, name).await?;
        Self::new(archive)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn tiles(&self) -> &Tileset {
        &self.tiles
    }

    /// Decode and link a level, then make it current. On failure the
    /// previous level stays in place.
    pub fn load_level(&mut self, name: &str) -> WorldResult<Arc<SpatialGraph>> {
        let data = LevelData::load(&self.archive, name)?;
        let graph = Arc::new(SpatialGraph::build(&data)?);
        self.level = Some((name.to_string(), graph.clone()));
        Ok(graph)
    }

    pub fn level_name(&self) -> Option<&str> {
        self.level.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn graph(&self) -> WorldResult<Arc<SpatialGraph>> {
        self.level
            .as_ref()
            .map(|(_, graph)| graph.clone())
            .ok_or(WorldError::NoLevel)
    }

    fn current(&self) -> WorldResult<&SpatialGraph> {
        self.level
            .as_ref()
            .map(|(_, graph)| graph.as_ref())
            .ok_or(WorldError::NoLevel)
    }

    pub fn sector_mesh(&self, id: SectorId) -> WorldResult<&SectorMesh> {
        self.current()?.sector_mesh(id, &self.tiles)
    }

    pub fn prebuild_geometry(&self) -> WorldResult<usize> {
        self.current()?.prebuild_geometry(&self.tiles)
    }

    /// Sectors potentially visible from `camera`; empty when the camera is
    /// outside every sector.
    pub fn visible_sectors(
        &self,
        camera: Vec3,
        predicate: &dyn PortalVisibility,
    ) -> WorldResult<Vec<SectorId>> {
        let graph = self.current()?;
        Ok(graph
            .locate(camera)
            .map(|seed| visibility::visible_sectors(graph, seed, predicate))
            .unwrap_or_default())
    }

    /// Create texture handles for every tile the current level uses.
    /// Returns the number of distinct tiles touched.
    pub fn precache_textures(&self, sink: &dyn TextureSink) -> WorldResult<usize> {
        let graph = self.current()?;
        let flats = graph
            .sectors()
            .iter()
            .flat_map(|s| [s.floor.tile, s.ceiling.tile]);
        let walls = graph
            .walls()
            .iter()
            .flat_map(|w| [w.texture, w.mask_texture]);

        let mut seen: HashSet<TileId> = HashSet::new();
        for id in flats.chain(walls).flatten() {
            if !seen.insert(id) {
                continue;
            }
            match self.tiles.find(id) {
                Some(tile) => {
                    tile.texture(sink);
                }
                None => log::warn!("Level references missing tile {id}"),
            }
        }
        log::info!("Precached {} textures", seen.len());
        Ok(seen.len())
    }

    pub fn load_sound(&self, name: &str) -> WorldResult<SoundClip> {
        Ok(SoundClip::load(&self.archive, name)?)
    }
}
