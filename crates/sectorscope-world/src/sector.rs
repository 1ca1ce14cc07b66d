use std::sync::OnceLock;

use glam::Vec2;
use sectorscope_core::constants::{
    FLAT_TEXELS, FLAT_TEXEL_DIVISOR, HEIGHT_UNITS, LEVEL_SCALE, PANNING_UNITS, SLOPE_UNITS,
};
use sectorscope_core::{FlatFlags, SectorId, TileId, WallId};
use sectorscope_formats::{FlatDef, Tile};

use crate::mesh::SectorMesh;
use crate::visibility::Portal;

/// Floor or ceiling surface in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatInfo {
    /// World height at the first wall's start.
    pub height: f32,
    /// Height change per world unit along the first wall's normal, negated.
    /// Zero unless the flat is flagged as sloped.
    pub slope: f32,
    pub tile: Option<TileId>,
    pub flags: FlatFlags,
    pub panning: Vec2,
    pub shade: i8,
    pub palette: u8,
}

impl FlatInfo {
    pub(crate) fn from_def(def: &FlatDef) -> Self {
        let flags = FlatFlags(def.flags);
        let slope = if flags.contains(FlatFlags::SLOPED) {
            def.slope as f32 / SLOPE_UNITS
        } else {
            0.0
        };
        Self {
            height: -(def.height as f32 / HEIGHT_UNITS) * LEVEL_SCALE,
            slope,
            tile: Some(TileId(def.texture as u32)),
            flags,
            panning: Vec2::new(def.panning[0] as f32, def.panning[1] as f32),
            shade: def.shade,
            palette: def.palette,
        }
    }
}

/// Origin and normal of a sector's first wall. Slopes and wall-aligned
/// flat textures are measured in this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlatFrame {
    pub origin: Vec2,
    pub normal: Vec2,
}

impl FlatFrame {
    fn slope_factor(&self, point: Vec2) -> f32 {
        self.normal.dot(point - self.origin)
    }
}

/// Runtime sector. Owns a contiguous range of walls and a lazily built mesh.
#[derive(Debug)]
pub struct Sector {
    pub id: SectorId,
    pub first_wall: WallId,
    pub wall_count: u32,
    pub floor: FlatInfo,
    pub ceiling: FlatInfo,
    pub shade_factor: i8,
    pub frame: FlatFrame,
    /// Boundary loops; the first is the outer boundary, the rest are holes.
    pub loops: Vec<Vec<WallId>>,
    pub(crate) portals: Vec<Portal>,
    pub(crate) mesh: OnceLock<SectorMesh>,
}

impl Sector {
    pub fn walls(&self) -> impl Iterator<Item = WallId> + '_ {
        let first = self.first_wall.0;
        (first..first + self.wall_count).map(WallId)
    }

    pub fn owns(&self, wall: WallId) -> bool {
        wall.0 >= self.first_wall.0 && wall.0 < self.first_wall.0 + self.wall_count
    }

    pub fn floor_at(&self, point: Vec2) -> f32 {
        self.flat_height(&self.floor, point)
    }

    pub fn ceiling_at(&self, point: Vec2) -> f32 {
        self.flat_height(&self.ceiling, point)
    }

    fn flat_height(&self, flat: &FlatInfo, point: Vec2) -> f32 {
        if flat.slope == 0.0 {
            return flat.height;
        }
        flat.height + self.frame.slope_factor(point) * -flat.slope
    }

    pub fn floor_uv(&self, point: Vec2, tile: Option<&Tile>) -> Vec2 {
        self.flat_uv(&self.floor, point, tile)
    }

    pub fn ceiling_uv(&self, point: Vec2, tile: Option<&Tile>) -> Vec2 {
        self.flat_uv(&self.ceiling, point, tile)
    }

    fn flat_uv(&self, flat: &FlatInfo, point: Vec2, tile: Option<&Tile>) -> Vec2 {
        let Some(tile) = tile.filter(|t| !t.is_empty()) else {
            return Vec2::ZERO;
        };

        let mut uv = point;
        if flat.flags.contains(FlatFlags::SWAP_COORDS) {
            uv = Vec2::new(-uv.y, uv.x);
        }
        if flat.flags.contains(FlatFlags::ALIGN_TO_FIRST_WALL) {
            let angle = self.frame.normal.y.atan2(self.frame.normal.x);
            uv = Vec2::from_angle(std::f32::consts::FRAC_PI_2 - angle).rotate(uv - self.frame.origin);
            if flat.slope != 0.0 {
                uv.y = uv.y.hypot(uv.y * flat.slope.abs());
            }
        } else {
            uv.y = -uv.y;
        }
        if flat.flags.contains(FlatFlags::FLIP_X) {
            uv.x = -uv.x;
        }
        if flat.flags.contains(FlatFlags::FLIP_Y) {
            uv.y = -uv.y;
        }

        let size = Vec2::new(tile.width as f32, tile.height as f32);
        uv = (uv / FLAT_TEXEL_DIVISOR * FLAT_TEXELS) / size + flat.panning / PANNING_UNITS;
        if flat.flags.contains(FlatFlags::LARGE_TEXTURE) {
            uv *= 2.0;
        }
        uv
    }
}
