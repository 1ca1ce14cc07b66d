use glam::{Vec2, Vec3};
use sectorscope_core::constants::{LEVEL_SCALE, PANNING_UNITS, PIXELS_IN_HEIGHT_UNIT, PIXELS_IN_REPEAT};
use sectorscope_core::{SectorId, TileId, WallFlags, WallId};
use sectorscope_formats::{Tile, WallDef};

/// Runtime wall: a directed segment of its sector's boundary.
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: WallId,
    pub sector: SectorId,
    /// World-space start on the ground plane.
    pub start: Vec2,
    /// Start of the wall referenced as next in the same loop.
    pub end: Vec2,
    /// Unit left-perpendicular of `end - start`.
    pub normal: Vec2,
    pub flags: WallFlags,
    pub texture: Option<TileId>,
    pub mask_texture: Option<TileId>,
    pub shade: i8,
    pub palette: u8,
    pub repeat: Vec2,
    pub panning: Vec2,
    pub other_wall: Option<WallId>,
    pub other_sector: Option<SectorId>,
}

impl Wall {
    pub(crate) fn new(id: WallId, sector: SectorId, def: &WallDef, next: &WallDef) -> Self {
        let start = def.start.as_vec2() * LEVEL_SCALE;
        let end = next.start.as_vec2() * LEVEL_SCALE;
        let d = end - start;
        Self {
            id,
            sector,
            start,
            end,
            normal: Vec2::new(-d.y, d.x).normalize_or_zero(),
            flags: WallFlags(def.flags),
            texture: TileId::from_raw(def.texture as i32),
            mask_texture: TileId::from_raw(def.mask_texture as i32),
            shade: def.shade,
            palette: def.palette,
            repeat: Vec2::new(def.repeat[0] as f32, def.repeat[1] as f32),
            panning: Vec2::new(def.panning[0] as f32, def.panning[1] as f32),
            other_wall: u32::try_from(def.opposite_wall).ok().map(WallId),
            other_sector: u32::try_from(def.opposite_sector).ok().map(SectorId),
        }
    }

    pub fn is_portal(&self) -> bool {
        self.other_sector.is_some()
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Texture coordinate of a world-space point on this wall.
    ///
    /// `origin_height` is the world height the texture is anchored to.
    /// Without a tile (or with an empty one) the result is zero.
    pub fn uv(&self, point: Vec3, tile: Option<&Tile>, origin_height: f32) -> Vec2 {
        let Some(tile) = tile.filter(|t| !t.is_empty()) else {
            return Vec2::ZERO;
        };
        let (tile_w, tile_h) = (tile.width as f32, tile.height as f32);

        let length = self.length();
        let mut along = Vec2::new(point.x, point.z).distance(self.start);
        if self.flags.contains(WallFlags::FLIP_X) {
            along = length - along;
        }
        let x = if length > 0.0 {
            (along / length) * (PIXELS_IN_REPEAT * self.repeat.x / tile_w)
        } else {
            0.0
        };

        let span = (origin_height - point.y) / LEVEL_SCALE;
        let mut y = span * self.repeat.y * PIXELS_IN_HEIGHT_UNIT / tile_h;
        if self.flags.contains(WallFlags::FLIP_Y) {
            y = 1.0 - y;
        }

        Vec2::new(
            x + self.panning.x / tile_w,
            y + self.panning.y / PANNING_UNITS,
        )
    }
}
