use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use glam::Vec3;
use sectorscope_formats::{DirectorySource, TextureHandle, TextureSink, Tile};
use sectorscope_world::{AlwaysVisible, SurfaceKind, World};

use crate::config::InspectConfig;
use crate::report::{LevelReport, SoundSummary, TriangleCounts};
use crate::InspectError;

/// Hands out sequential handles without touching any GPU.
#[derive(Debug, Default)]
pub struct HandleCounter {
    next: AtomicU64,
}

impl HandleCounter {
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl TextureSink for HandleCounter {
    fn upload(&self, tile: &Tile) -> TextureHandle {
        log::debug!("Texture for tile {} ({}x{})", tile.id, tile.width, tile.height);
        TextureHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Loads a level and collects statistics about it.
pub struct Inspector {
    world: World,
}

impl Inspector {
    /// Read the archive named by `config` from disk. Blocks on the fetch.
    pub fn open(config: &InspectConfig) -> Result<Self, InspectError> {
        let root = config
            .archive
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let name = config
            .archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source = DirectorySource::new(root);
        let world = pollster::block_on(World::open(&source, &name))?;
        Ok(Self { world })
    }

    pub fn from_world(world: World) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Load the configured level, build its geometry, walk visibility from
    /// the camera and decode the requested sounds.
    pub fn run(&mut self, config: &InspectConfig) -> Result<LevelReport, InspectError> {
        log::info!("Inspecting level {}", config.level);
        let graph = self.world.load_level(&config.level)?;

        let start = Instant::now();
        if config.parallel {
            self.world.prebuild_geometry()?;
        }
        let mut triangles = TriangleCounts::default();
        let mut skipped_sections = 0;
        for sector in graph.sectors() {
            let mesh = self.world.sector_mesh(sector.id)?;
            skipped_sections += mesh.skipped_sections;
            for surface in &mesh.surfaces {
                let count = surface.triangle_count() as usize;
                match surface.kind {
                    SurfaceKind::Floor => triangles.floor += count,
                    SurfaceKind::Ceiling => triangles.ceiling += count,
                    SurfaceKind::Wall { .. } => triangles.wall += count,
                }
            }
        }
        let build_ms = start.elapsed().as_secs_f64() * 1000.0;

        let spawn = graph.spawn();
        let camera = config
            .camera
            .map(Vec3::from_array)
            .unwrap_or_else(|| spawn.world_position());
        let visible = self.world.visible_sectors(camera, &AlwaysVisible)?;

        let textures = HandleCounter::default();
        let textures_cached = self.world.precache_textures(&textures)?;

        let mut sounds = Vec::new();
        for name in &config.sounds {
            match self.world.load_sound(name) {
                Ok(clip) => sounds.push(SoundSummary {
                    name: name.clone(),
                    rate: clip.rate,
                    channels: clip.channels,
                    bits: clip.bits,
                    frames: clip.frames(),
                    seconds: clip.duration().as_secs_f64(),
                }),
                Err(e) => log::warn!("Skipping sound {name}: {e}"),
            }
        }

        Ok(LevelReport {
            archive_entries: self.world.archive().entries().len(),
            tiles: self.world.tiles().len(),
            shade_tables: self.world.palette().shade_count(),
            level: config.level.clone(),
            sectors: graph.sectors().len(),
            walls: graph.walls().len(),
            portals: graph.walls().iter().filter(|w| w.is_portal()).count(),
            triangles,
            skipped_sections,
            spawn_angle: spawn.angle_radians(),
            camera: camera.to_array(),
            camera_sector: graph.locate(camera).map(|id| id.0),
            visible_sectors: visible.into_iter().map(|id| id.0).collect(),
            textures_cached,
            sounds,
            build_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use sectorscope_core::constants::{LOOKUP_FILE, PALETTE_FILE};
    use sectorscope_formats::write::{encode_level, encode_lookup, grayscale_palette, ArchiveBuilder};
    use sectorscope_formats::{Archive, LevelData, SectorDef, WallDef};

    /// Two 1024-unit rooms side by side, sharing walls 1 and 7.
    fn two_rooms() -> LevelData {
        let mut level = LevelData::default();
        for room in 0..2i16 {
            let x = room as i32 * 1024;
            let first = room * 4;
            let corners = [(x, 0), (x + 1024, 0), (x + 1024, 1024), (x, 1024)];
            for (k, (cx, cy)) in corners.into_iter().enumerate() {
                let next = if k == 3 { first } else { first + k as i16 + 1 };
                level.walls.push(WallDef {
                    start: IVec2::new(cx, cy),
                    next_wall: next,
                    opposite_wall: -1,
                    opposite_sector: -1,
                    texture: 0,
                    mask_texture: -1,
                    repeat: [8, 8],
                    ..Default::default()
                });
            }
            let mut sector = SectorDef {
                first_wall: first,
                wall_count: 4,
                ..Default::default()
            };
            sector.ceiling.height = -16384;
            level.sectors.push(sector);
        }
        level.walls[1].opposite_wall = 7;
        level.walls[1].opposite_sector = 1;
        level.walls[7].opposite_wall = 1;
        level.walls[7].opposite_sector = 0;
        level.spawn.position = glam::IVec3::new(512, 512, 0);
        level
    }

    fn sound() -> Vec<u8> {
        let mut out = b"Creative Voice File".to_vec();
        out.push(0x1A);
        out.extend_from_slice(&26u16.to_le_bytes());
        out.extend_from_slice(&[0x0A, 0x01, 0x29, 0x11]);
        // 8-bit data block at 10 kHz with four samples
        out.extend_from_slice(&[1, 6, 0, 0, 156, 0, 128, 128, 128, 128, 0]);
        out
    }

    fn inspector() -> Inspector {
        let bytes = ArchiveBuilder::new()
            .entry(PALETTE_FILE, grayscale_palette())
            .entry(LOOKUP_FILE, encode_lookup(&[]))
            .entry("ROOMS.MAP", encode_level(&two_rooms()))
            .entry("BEEP.VOC", sound())
            .build();
        let world = World::new(Archive::load(bytes).unwrap()).unwrap();
        Inspector::from_world(world)
    }

    fn config() -> InspectConfig {
        InspectConfig {
            level: "ROOMS.MAP".to_string(),
            sounds: vec!["BEEP.VOC".to_string(), "NOPE.VOC".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_run_collects_level_stats() {
        let report = inspector().run(&config()).unwrap();
        assert_eq!(report.archive_entries, 4);
        assert_eq!(report.sectors, 2);
        assert_eq!(report.walls, 8);
        assert_eq!(report.portals, 2);
        assert_eq!(report.triangles.floor, 4);
        assert_eq!(report.triangles.ceiling, 4);
        // six solid walls; both sides of the shared wall are level
        assert_eq!(report.triangles.wall, 12);
        assert_eq!(report.skipped_sections, 4);
        assert_eq!(report.camera_sector, Some(0));
        assert_eq!(report.visible_sectors, vec![0, 1]);
        // flats and walls all use tile 0
        assert_eq!(report.textures_cached, 1);
    }

    #[test]
    fn test_run_decodes_sounds() {
        let report = inspector().run(&config()).unwrap();
        assert_eq!(report.sounds.len(), 1);
        let beep = &report.sounds[0];
        assert_eq!(beep.rate, 10_000);
        assert_eq!(beep.frames, 4);
        assert!((beep.seconds - 0.0004).abs() < 1e-9);
    }

    #[test]
    fn test_camera_override_and_sequential_build() {
        let mut cfg = config();
        cfg.parallel = false;
        cfg.camera = Some([1.5, 0.2, 0.5]);
        let report = inspector().run(&cfg).unwrap();
        assert_eq!(report.camera_sector, Some(1));
        assert_eq!(report.visible_sectors, vec![1, 0]);
        assert_eq!(report.triangles.floor, 4);
    }

    #[test]
    fn test_missing_level() {
        let mut cfg = config();
        cfg.level = "MISSING.MAP".to_string();
        assert!(matches!(inspector().run(&cfg), Err(InspectError::World(_))));
    }

    #[test]
    fn test_open_missing_archive() {
        let cfg = InspectConfig {
            archive: std::env::temp_dir().join("sectorscope-no-such-dir").join("GAME.GRP"),
            ..Default::default()
        };
        assert!(Inspector::open(&cfg).is_err());
    }
}
