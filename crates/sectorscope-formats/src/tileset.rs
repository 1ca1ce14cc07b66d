//! Tileset (`.art`) decoding: tile dimensions, packed placement/animation
//! words, and column-major pixel blocks.

use std::collections::HashMap;
use std::sync::OnceLock;

use glam::Vec2;
use sectorscope_core::constants::{MAX_TILESET_FILES, TILESET_VERSION, TILE_CONFIG_FIELDS};
use sectorscope_core::math::{split_bits, transpose_pixels};
use sectorscope_core::TileId;

use crate::archive::Archive;
use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// Animation kind stored in bits [6:7] of the tile config word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileAnimation {
    #[default]
    None,
    PingPong,
    Forward,
    Backward,
}

impl TileAnimation {
    fn from_bits(bits: i32) -> Self {
        match bits & 0b11 {
            1 => Self::PingPong,
            2 => Self::Forward,
            3 => Self::Backward,
            _ => Self::None,
        }
    }
}

/// Opaque handle produced by a [`TextureSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Receives decoded tiles and returns a handle to the uploaded texture.
/// Called at most once per tile.
pub trait TextureSink {
    fn upload(&self, tile: &Tile) -> TextureHandle;
}

/// A single decoded raster graphic.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    /// Width in pixels. Zero together with `height` for empty tiles.
    pub width: u16,
    pub height: u16,
    /// Placement origin: half size plus the signed offsets from the config word.
    pub center: Vec2,
    pub animation: TileAnimation,
    pub animation_speed: u8,
    /// Palette indices, row-major.
    pub pixels: Vec<u8>,
    texture: OnceLock<TextureHandle>,
}

impl Tile {
    pub fn new(id: TileId, width: u16, height: u16, pixels: Vec<u8>) -> Self {
        Self {
            id,
            width,
            height,
            center: Vec2::new(width as f32 / 2.0, height as f32 / 2.0),
            animation: TileAnimation::None,
            animation_speed: 0,
            pixels,
            texture: OnceLock::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Palette index at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        self.pixels.get(y * self.width as usize + x).copied()
    }

    /// Texture handle, created through `sink` on first use.
    pub fn texture(&self, sink: &dyn TextureSink) -> TextureHandle {
        *self.texture.get_or_init(|| sink.upload(self))
    }

    /// Handle if the texture was already created.
    pub fn cached_texture(&self) -> Option<TextureHandle> {
        self.texture.get().copied()
    }
}

/// Bytes of per-tile header data: width, height, config word.
const TILE_RECORD_SIZE: usize = 8;

/// Decode one tileset file.
pub fn decode_tileset(r: &mut ByteReader<'_>) -> DecodeResult<Vec<Tile>> {
    let version = r.read_i32()?;
    if version != TILESET_VERSION {
        return Err(DecodeError::invalid(
            "tileset header",
            format!("unsupported version {version}"),
        ));
    }
    r.skip(4)?;

    let first = r.read_i32()?;
    let last = r.read_i32()?;
    if first < 0 || i64::from(last) < i64::from(first) - 1 {
        return Err(DecodeError::invalid(
            "tileset header",
            format!("bad tile range {first}..={last}"),
        ));
    }
    let count = (i64::from(last) - i64::from(first) + 1) as usize;

    // Width, height and config word for every tile must fit in the file.
    let table_len = count.saturating_mul(TILE_RECORD_SIZE);
    if table_len > r.remaining() {
        return Err(DecodeError::OutOfRange {
            position: r.position(),
            needed: table_len,
            len: r.len(),
        });
    }

    let mut widths = Vec::with_capacity(count);
    for _ in 0..count {
        widths.push(r.read_i16()?);
    }
    let mut heights = Vec::with_capacity(count);
    for _ in 0..count {
        heights.push(r.read_i16()?);
    }
    let mut configs = Vec::with_capacity(count);
    for _ in 0..count {
        configs.push(r.read_i32()?);
    }

    let mut tiles = Vec::with_capacity(count);
    for i in 0..count {
        let id = TileId(first as u32 + i as u32);
        let fields = split_bits(configs[i], &TILE_CONFIG_FIELDS);
        let (animation, offset_x, offset_y, speed) = (fields[1], fields[2], fields[3], fields[4]);

        let (width, height, pixels) = if widths[i] > 0 && heights[i] > 0 {
            let (w, h) = (widths[i] as usize, heights[i] as usize);
            let columns = r.read_bytes(w * h)?;
            (widths[i] as u16, heights[i] as u16, transpose_pixels(columns, w, h))
        } else {
            if widths[i] != 0 || heights[i] != 0 {
                log::warn!(
                    "Tile {id} has degenerate size {}x{}, treating as empty",
                    widths[i],
                    heights[i]
                );
            }
            (0, 0, Vec::new())
        };

        tiles.push(Tile {
            id,
            width,
            height,
            center: Vec2::new(
                width as f32 / 2.0 + offset_x as f32,
                height as f32 / 2.0 + offset_y as f32,
            ),
            animation: TileAnimation::from_bits(animation),
            animation_speed: speed as u8,
            pixels,
            texture: OnceLock::new(),
        });
    }

    Ok(tiles)
}

/// All tiles of an archive, indexed by tile id.
#[derive(Debug, Clone, Default)]
pub struct Tileset {
    tiles: HashMap<TileId, Tile>,
}

impl Tileset {
    /// Decode every numbered tileset file in the archive, stopping at the
    /// first missing number.
    pub fn load(archive: &Archive) -> DecodeResult<Self> {
        let Some(prefix) = archive.tileset_prefix() else {
            log::warn!("Archive contains no tileset files");
            return Ok(Self::default());
        };

        let mut tileset = Self::default();
        let mut files = 0;
        for index in 0..MAX_TILESET_FILES {
            let name = Archive::tileset_file_name(&prefix, index);
            if !archive.has(&name) {
                break;
            }
            let mut r = archive.reader(&name)?;
            let tiles = decode_tileset(&mut r)?;
            log::debug!("Tileset {name}: {} tiles", tiles.len());
            tileset.extend(tiles);
            files += 1;
        }

        log::info!("Tileset: {} tiles from {files} files", tileset.len());
        Ok(tileset)
    }

    /// Build a tileset from already decoded tiles. Later tiles replace
    /// earlier ones with the same id.
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut tileset = Self::default();
        tileset.extend(tiles);
        tileset
    }

    fn extend(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        for tile in tiles {
            self.tiles.insert(tile.id, tile);
        }
    }

    /// Number of tiles present.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile by id, or `NotFound`.
    pub fn get(&self, id: TileId) -> DecodeResult<&Tile> {
        self.find(id)
            .ok_or_else(|| DecodeError::NotFound(format!("tile {id}")))
    }

    /// Tile by id, if present.
    pub fn find(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Texture handle of a tile, created lazily through `sink`.
    pub fn texture(&self, id: TileId, sink: &dyn TextureSink) -> DecodeResult<TextureHandle> {
        Ok(self.get(id)?.texture(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::ArchiveBuilder;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// (width, height, config, column-major pixels)
    type RawTile = (i16, i16, i32, Vec<u8>);

    fn encode_tileset(first: i32, tiles: &[RawTile]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&first.to_le_bytes());
        out.extend_from_slice(&(first + tiles.len() as i32 - 1).to_le_bytes());
        for t in tiles {
            out.extend_from_slice(&t.0.to_le_bytes());
        }
        for t in tiles {
            out.extend_from_slice(&t.1.to_le_bytes());
        }
        for t in tiles {
            out.extend_from_slice(&t.2.to_le_bytes());
        }
        for t in tiles {
            out.extend_from_slice(&t.3);
        }
        out
    }

    fn config(animation: i32, offset_x: i8, offset_y: i8, speed: i32) -> i32 {
        (animation << 6)
            | ((offset_x as u8 as i32) << 8)
            | ((offset_y as u8 as i32) << 16)
            | (speed << 24)
    }

    #[test]
    fn test_decode_single_tile() {
        // 2 wide, 3 tall, stored column by column
        let bytes = encode_tileset(10, &[(2, 3, config(2, -3, 4, 5), vec![1, 2, 3, 4, 5, 6])]);
        let tiles = decode_tileset(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(tiles.len(), 1);

        let tile = &tiles[0];
        assert_eq!(tile.id, TileId(10));
        assert_eq!((tile.width, tile.height), (2, 3));
        assert_eq!(tile.pixels, vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(tile.pixel(1, 0), Some(4));
        assert_eq!(tile.pixel(0, 2), Some(3));
        assert_eq!(tile.pixel(2, 0), None);
        assert_eq!(tile.animation, TileAnimation::Forward);
        assert_eq!(tile.animation_speed, 5);
        assert_eq!(tile.center, Vec2::new(1.0 - 3.0, 1.5 + 4.0));
    }

    #[test]
    fn test_animation_speed_is_unsigned_nibble() {
        let bytes = encode_tileset(0, &[(1, 1, config(0, -1, -1, 0xF), vec![0])]);
        let tile = &decode_tileset(&mut ByteReader::new(&bytes)).unwrap()[0];
        assert_eq!(tile.animation_speed, 15);
        assert_eq!(tile.center, Vec2::new(0.5 - 1.0, 0.5 - 1.0));
    }

    #[test]
    fn test_empty_tiles_have_no_payload() {
        let bytes = encode_tileset(
            0,
            &[
                (0, 0, 0, vec![]),
                (1, 1, config(1, 0, 0, 0), vec![9]),
                (4, 0, 0, vec![]),
            ],
        );
        let tiles = decode_tileset(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(tiles.len(), 3);
        assert!(tiles[0].is_empty());
        assert_eq!(tiles[1].pixels, vec![9]);
        assert_eq!(tiles[1].animation, TileAnimation::PingPong);
        assert!(tiles[2].is_empty());
        assert_eq!((tiles[2].width, tiles[2].height), (0, 0));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut bytes = encode_tileset(0, &[(1, 1, 0, vec![0])]);
        bytes[0] = 2;
        assert!(matches!(
            decode_tileset(&mut ByteReader::new(&bytes)),
            Err(DecodeError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_missing_pixels_out_of_range() {
        let mut bytes = encode_tileset(0, &[(4, 4, 0, vec![0; 16])]);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            decode_tileset(&mut ByteReader::new(&bytes)),
            Err(DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_huge_tile_range_rejected() {
        let mut bytes = Vec::new();
        for word in [1, 0, 0, i32::MAX] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(
            decode_tileset(&mut ByteReader::new(&bytes)),
            Err(DecodeError::OutOfRange { needed, .. }) if needed > bytes.len()
        ));
    }

    #[test]
    fn test_high_tile_id() {
        let bytes = encode_tileset(2_000_000_000, &[(1, 1, 0, vec![7])]);
        let tiles = decode_tileset(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(tiles[0].id, TileId(2_000_000_000));

        let tileset = Tileset::from_tiles(tiles);
        assert_eq!(tileset.len(), 1);
        assert_eq!(tileset.get(TileId(2_000_000_000)).unwrap().pixels, vec![7]);
        assert!(tileset.find(TileId(0)).is_none());
    }

    #[test]
    fn test_load_numbered_files_until_gap() {
        let archive = Archive::load(
            ArchiveBuilder::new()
                .entry("TILES000.ART", encode_tileset(0, &[(1, 1, 0, vec![1])]))
                .entry("TILES001.ART", encode_tileset(1, &[(1, 1, 0, vec![2])]))
                .entry("TILES003.ART", encode_tileset(2, &[(1, 1, 0, vec![3])]))
                .build(),
        )
        .unwrap();

        let tileset = Tileset::load(&archive).unwrap();
        assert_eq!(tileset.len(), 2);
        assert_eq!(tileset.get(TileId(1)).unwrap().pixels, vec![2]);
        assert!(matches!(tileset.get(TileId(2)), Err(DecodeError::NotFound(_))));
        assert!(tileset.find(TileId(99)).is_none());
    }

    #[test]
    fn test_archive_without_tiles() {
        let archive = Archive::load(ArchiveBuilder::new().entry("E1L1.MAP", vec![]).build()).unwrap();
        assert!(Tileset::load(&archive).unwrap().is_empty());
    }

    struct CountingSink(AtomicU64);

    impl TextureSink for CountingSink {
        fn upload(&self, _tile: &Tile) -> TextureHandle {
            TextureHandle(self.0.fetch_add(1, Ordering::SeqCst) + 100)
        }
    }

    #[test]
    fn test_texture_created_once() {
        let tileset = Tileset::from_tiles([
            Tile::new(TileId(0), 1, 1, vec![0]),
            Tile::new(TileId(3), 1, 1, vec![0]),
        ]);
        let sink = CountingSink(AtomicU64::new(0));

        assert_eq!(tileset.find(TileId(3)).unwrap().cached_texture(), None);
        let first = tileset.texture(TileId(3), &sink).unwrap();
        let again = tileset.texture(TileId(3), &sink).unwrap();
        assert_eq!(first, again);
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);

        let other = tileset.texture(TileId(0), &sink).unwrap();
        assert_ne!(first, other);
        assert!(tileset.texture(TileId(1), &sink).is_err());
    }
}
