//! Decoders for the group archive and the resources it carries: tilesets,
//! palettes, voice sounds and levels.

pub mod archive;
pub mod error;
pub mod level;
pub mod palette;
pub mod reader;
pub mod sound;
pub mod tileset;
pub mod write;

pub use archive::{Archive, ArchiveEntry, ArchiveSource, DirectorySource};
pub use error::{DecodeError, DecodeResult};
pub use level::{FlatDef, LevelData, SectorDef, Spawn, TagDef, WallDef};
pub use palette::{Palette, PaletteColor};
pub use reader::ByteReader;
pub use sound::SoundClip;
pub use tileset::{TextureHandle, TextureSink, Tile, TileAnimation, Tileset};
