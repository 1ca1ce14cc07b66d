//! Level records for tests.

use glam::IVec2;
use sectorscope_formats::{FlatDef, LevelData, SectorDef, WallDef};

/// Corners of an axis-aligned room, counter-clockwise in level coordinates.
/// Walls built from it run north, east, south, west.
pub fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<IVec2> {
    vec![
        IVec2::new(x0, y0),
        IVec2::new(x1, y0),
        IVec2::new(x1, y1),
        IVec2::new(x0, y1),
    ]
}

#[derive(Default)]
pub struct LevelFixture {
    level: LevelData,
}

impl LevelFixture {
    /// Append a sector made of `loops`; returns the index of its first wall.
    pub fn sector(&mut self, loops: &[Vec<IVec2>], floor: i32, ceiling: i32) -> usize {
        let first = self.level.walls.len();
        for points in loops {
            let base = self.level.walls.len();
            for (k, &start) in points.iter().enumerate() {
                let next = if k + 1 == points.len() { base } else { base + k + 1 };
                self.level.walls.push(WallDef {
                    start,
                    next_wall: next as i16,
                    opposite_wall: -1,
                    opposite_sector: -1,
                    texture: 0,
                    mask_texture: -1,
                    repeat: [8, 8],
                    ..Default::default()
                });
            }
        }
        self.level.sectors.push(SectorDef {
            first_wall: first as i16,
            wall_count: (self.level.walls.len() - first) as i16,
            ceiling: FlatDef {
                height: ceiling,
                ..Default::default()
            },
            floor: FlatDef {
                height: floor,
                ..Default::default()
            },
            ..Default::default()
        });
        first
    }

    pub fn finish(self) -> LevelData {
        self.level
    }
}

fn owner(level: &LevelData, wall: usize) -> i16 {
    level
        .sectors
        .iter()
        .position(|s| {
            let first = s.first_wall as usize;
            wall >= first && wall < first + s.wall_count as usize
        })
        .map_or(-1, |i| i as i16)
}

/// Pair two walls as the two sides of a portal.
pub fn link(level: &mut LevelData, a: usize, b: usize) {
    let (sector_a, sector_b) = (owner(level, a), owner(level, b));
    level.walls[a].opposite_wall = b as i16;
    level.walls[a].opposite_sector = sector_b;
    level.walls[b].opposite_wall = a as i16;
    level.walls[b].opposite_sector = sector_a;
}

/// `count` rooms in a row along x, each joined to the next.
pub fn corridor(count: i32) -> LevelData {
    let mut fixture = LevelFixture::default();
    for i in 0..count {
        fixture.sector(&[rect(i * 1024, 0, (i + 1) * 1024, 1024)], 0, -16384);
    }
    let mut level = fixture.finish();
    for i in 0..(count - 1) as usize {
        link(&mut level, i * 4 + 1, (i + 1) * 4 + 3);
    }
    level
}
