//! Encoders for the archive, level and palette layouts. Used to assemble
//! test fixtures and by tooling that repacks archives.

use sectorscope_core::constants::{ARCHIVE_MAGIC, ARCHIVE_NAME_LEN, LEVEL_VERSION, PALETTE_SIZE};

use crate::level::{FlatDef, LevelData, SectorDef, TagDef, WallDef};

/// Assembles a group archive from named payloads, in insertion order.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Names longer than 12 bytes are truncated.
    pub fn entry(mut self, name: &str, data: Vec<u8>) -> Self {
        self.entries.push((name.to_string(), data));
        self
    }

    /// Layout: signature (12B) + count (4B) + table (16B × N) + payloads.
    pub fn build(&self) -> Vec<u8> {
        let payload_size: usize = self.entries.iter().map(|(_, d)| d.len()).sum();
        let mut output = Vec::with_capacity(16 + self.entries.len() * 16 + payload_size);

        output.extend_from_slice(ARCHIVE_MAGIC);
        output.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        for (name, data) in &self.entries {
            let mut field = [0u8; ARCHIVE_NAME_LEN];
            let len = name.len().min(ARCHIVE_NAME_LEN);
            field[..len].copy_from_slice(&name.as_bytes()[..len]);
            output.extend_from_slice(&field);
            output.extend_from_slice(&(data.len() as u32).to_le_bytes());
        }

        for (_, data) in &self.entries {
            output.extend_from_slice(data);
        }

        output
    }
}

/// Serialize level records into the version 7 level layout.
pub fn encode_level(level: &LevelData) -> Vec<u8> {
    let mut output = Vec::new();
    output.extend_from_slice(&LEVEL_VERSION.to_le_bytes());

    let spawn = &level.spawn;
    output.extend_from_slice(&spawn.position.x.to_le_bytes());
    output.extend_from_slice(&spawn.position.y.to_le_bytes());
    output.extend_from_slice(&spawn.position.z.to_le_bytes());
    output.extend_from_slice(&spawn.angle.to_le_bytes());
    output.extend_from_slice(&spawn.sector.to_le_bytes());

    output.extend_from_slice(&(level.sectors.len() as u16).to_le_bytes());
    for sector in &level.sectors {
        write_sector(&mut output, sector);
    }

    output.extend_from_slice(&(level.walls.len() as u16).to_le_bytes());
    for wall in &level.walls {
        write_wall(&mut output, wall);
    }

    output
}

fn write_tags(output: &mut Vec<u8>, tags: &TagDef) {
    output.extend_from_slice(&tags.low.to_le_bytes());
    output.extend_from_slice(&tags.high.to_le_bytes());
    output.extend_from_slice(&tags.extra.to_le_bytes());
}

fn write_flat(output: &mut Vec<u8>, flat: &FlatDef) {
    output.extend_from_slice(&flat.texture.to_le_bytes());
    output.extend_from_slice(&flat.slope.to_le_bytes());
    output.push(flat.shade as u8);
    output.push(flat.palette);
    output.extend_from_slice(&flat.panning);
}

fn write_sector(output: &mut Vec<u8>, sector: &SectorDef) {
    output.extend_from_slice(&sector.first_wall.to_le_bytes());
    output.extend_from_slice(&sector.wall_count.to_le_bytes());
    output.extend_from_slice(&sector.ceiling.height.to_le_bytes());
    output.extend_from_slice(&sector.floor.height.to_le_bytes());
    output.extend_from_slice(&sector.ceiling.flags.to_le_bytes());
    output.extend_from_slice(&sector.floor.flags.to_le_bytes());
    write_flat(output, &sector.ceiling);
    write_flat(output, &sector.floor);
    output.push(sector.shade_factor as u8);
    output.push(0);
    write_tags(output, &sector.tags);
}

fn write_wall(output: &mut Vec<u8>, wall: &WallDef) {
    output.extend_from_slice(&wall.start.x.to_le_bytes());
    output.extend_from_slice(&wall.start.y.to_le_bytes());
    output.extend_from_slice(&wall.next_wall.to_le_bytes());
    output.extend_from_slice(&wall.opposite_wall.to_le_bytes());
    output.extend_from_slice(&wall.opposite_sector.to_le_bytes());
    output.extend_from_slice(&wall.flags.to_le_bytes());
    output.extend_from_slice(&wall.texture.to_le_bytes());
    output.extend_from_slice(&wall.mask_texture.to_le_bytes());
    output.push(wall.shade as u8);
    output.push(wall.palette);
    output.extend_from_slice(&wall.repeat);
    output.extend_from_slice(&wall.panning);
    write_tags(output, &wall.tags);
}

/// Serialize a base palette file: 256 RGB triples (6-bit components), then
/// the shade table count and tables.
pub fn encode_palette(colors: &[[u8; 3]; PALETTE_SIZE], shades: &[[u8; PALETTE_SIZE]]) -> Vec<u8> {
    let mut output = Vec::with_capacity(PALETTE_SIZE * 3 + 2 + shades.len() * PALETTE_SIZE);
    for color in colors {
        output.extend_from_slice(color);
    }
    output.extend_from_slice(&(shades.len() as u16).to_le_bytes());
    for table in shades {
        output.extend_from_slice(table);
    }
    output
}

/// Serialize a palette swap file: count, then (slot, 256-byte permutation) pairs.
pub fn encode_lookup(swaps: &[(u8, [u8; PALETTE_SIZE])]) -> Vec<u8> {
    let mut output = Vec::with_capacity(1 + swaps.len() * (PALETTE_SIZE + 1));
    output.push(swaps.len() as u8);
    for (slot, table) in swaps {
        output.push(*slot);
        output.extend_from_slice(table);
    }
    output
}

/// Grayscale palette with a single identity shade table.
pub fn grayscale_palette() -> Vec<u8> {
    let mut colors = [[0u8; 3]; PALETTE_SIZE];
    for (i, color) in colors.iter_mut().enumerate() {
        let level = (i * 63 / (PALETTE_SIZE - 1)) as u8;
        *color = [level; 3];
    }
    let mut identity = [0u8; PALETTE_SIZE];
    for (i, entry) in identity.iter_mut().enumerate() {
        *entry = i as u8;
    }
    encode_palette(&colors, &[identity])
}
