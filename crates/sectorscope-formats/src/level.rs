//! Level (map) records: spawn point, sector table, wall table.

use glam::{IVec2, IVec3, Vec3};
use sectorscope_core::constants::{HEIGHT_UNITS, LEVEL_SCALE, LEVEL_VERSION};
use sectorscope_core::math::build_angle_to_radians;

use crate::archive::Archive;
use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// Size in bytes of one encoded sector record.
pub const SECTOR_RECORD_SIZE: usize = 40;

/// Size in bytes of one encoded wall record.
pub const WALL_RECORD_SIZE: usize = 32;

/// Free-form trigger tags attached to sectors and walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagDef {
    pub low: i16,
    pub high: i16,
    pub extra: i16,
}

/// Floor or ceiling record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlatDef {
    /// Raw height (level z units, growing downwards).
    pub height: i32,
    pub flags: u16,
    pub texture: u16,
    pub slope: i16,
    pub shade: i8,
    pub palette: u8,
    pub panning: [u8; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectorDef {
    pub first_wall: i16,
    pub wall_count: i16,
    pub ceiling: FlatDef,
    pub floor: FlatDef,
    pub shade_factor: i8,
    pub tags: TagDef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallDef {
    pub start: IVec2,
    /// Next wall of the same loop (absolute wall index).
    pub next_wall: i16,
    /// Wall on the other side of a portal, -1 if none.
    pub opposite_wall: i16,
    /// Sector on the other side of a portal, -1 if none.
    pub opposite_sector: i16,
    pub flags: u16,
    /// Main texture, -1 if none.
    pub texture: i16,
    /// Masking texture, -1 if none.
    pub mask_texture: i16,
    pub shade: i8,
    pub palette: u8,
    pub repeat: [u8; 2],
    pub panning: [u8; 2],
    pub tags: TagDef,
}

/// Player start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spawn {
    /// Raw position: x, y on the plane, z as height.
    pub position: IVec3,
    pub angle: i16,
    pub sector: i16,
}

impl Spawn {
    /// Spawn point in world space (x right, y up, z forward).
    pub fn world_position(&self) -> Vec3 {
        let p = self.position;
        Vec3::new(
            p.x as f32 * LEVEL_SCALE,
            -(p.z as f32 / HEIGHT_UNITS) * LEVEL_SCALE,
            p.y as f32 * LEVEL_SCALE,
        )
    }

    pub fn angle_radians(&self) -> f32 {
        build_angle_to_radians(self.angle)
    }
}

/// Flat records decoded from a level file. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelData {
    pub spawn: Spawn,
    pub sectors: Vec<SectorDef>,
    pub walls: Vec<WallDef>,
}

impl LevelData {
    /// Decode a level stored in `archive` under `name`.
    pub fn load(archive: &Archive, name: &str) -> DecodeResult<Self> {
        let mut r = archive.reader(name)?;
        let level = decode_level(&mut r)?;
        log::info!(
            "Level {name}: {} sectors, {} walls",
            level.sectors.len(),
            level.walls.len()
        );
        Ok(level)
    }
}

/// Decode a level from a reader positioned at the start of the file.
pub fn decode_level(r: &mut ByteReader<'_>) -> DecodeResult<LevelData> {
    let version = r.read_i32()?;
    if version != LEVEL_VERSION {
        return Err(DecodeError::invalid(
            "level header",
            format!("unsupported version {version}"),
        ));
    }

    let spawn = Spawn {
        position: IVec3::new(r.read_i32()?, r.read_i32()?, r.read_i32()?),
        angle: r.read_i16()?,
        sector: r.read_i16()?,
    };

    let sector_count = r.read_u16()? as usize;
    let mut sectors = Vec::with_capacity(sector_count);
    for _ in 0..sector_count {
        sectors.push(read_sector(r)?);
    }

    let wall_count = r.read_u16()? as usize;
    let mut walls = Vec::with_capacity(wall_count);
    for _ in 0..wall_count {
        walls.push(read_wall(r)?);
    }

    Ok(LevelData {
        spawn,
        sectors,
        walls,
    })
}

fn read_tags(r: &mut ByteReader<'_>) -> DecodeResult<TagDef> {
    Ok(TagDef {
        low: r.read_i16()?,
        high: r.read_i16()?,
        extra: r.read_i16()?,
    })
}

fn read_flat(r: &mut ByteReader<'_>, height: i32, flags: u16) -> DecodeResult<FlatDef> {
    Ok(FlatDef {
        height,
        flags,
        texture: r.read_u16()?,
        slope: r.read_i16()?,
        shade: r.read_i8()?,
        palette: r.read_u8()?,
        panning: [r.read_u8()?, r.read_u8()?],
    })
}

fn read_sector(r: &mut ByteReader<'_>) -> DecodeResult<SectorDef> {
    let first_wall = r.read_i16()?;
    let wall_count = r.read_i16()?;
    let ceiling_height = r.read_i32()?;
    let floor_height = r.read_i32()?;
    let ceiling_flags = r.read_u16()?;
    let floor_flags = r.read_u16()?;
    let ceiling = read_flat(r, ceiling_height, ceiling_flags)?;
    let floor = read_flat(r, floor_height, floor_flags)?;
    let shade_factor = r.read_i8()?;
    r.skip(1)?;
    let tags = read_tags(r)?;
    Ok(SectorDef {
        first_wall,
        wall_count,
        ceiling,
        floor,
        shade_factor,
        tags,
    })
}

fn read_wall(r: &mut ByteReader<'_>) -> DecodeResult<WallDef> {
    Ok(WallDef {
        start: IVec2::new(r.read_i32()?, r.read_i32()?),
        next_wall: r.read_i16()?,
        opposite_wall: r.read_i16()?,
        opposite_sector: r.read_i16()?,
        flags: r.read_u16()?,
        texture: r.read_i16()?,
        mask_texture: r.read_i16()?,
        shade: r.read_i8()?,
        palette: r.read_u8()?,
        repeat: [r.read_u8()?, r.read_u8()?],
        panning: [r.read_u8()?, r.read_u8()?],
        tags: read_tags(r)?,
    })
}
