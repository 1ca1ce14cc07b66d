//! Single source of truth for shared constants.
//! Format signatures and versions are used by the decoders; the unit
//! conversions are used by the spatial graph and the geometry builder.

/// Signature at the start of every group archive.
pub const ARCHIVE_MAGIC: &[u8; 12] = b"KenSilverman";

/// Size of the archive header (signature + entry count).
pub const ARCHIVE_HEADER_SIZE: usize = 16;

/// Size of one archive entry record (12-byte name + u32 length).
pub const ARCHIVE_ENTRY_SIZE: usize = 16;

/// Fixed width of archive entry names.
pub const ARCHIVE_NAME_LEN: usize = 12;

/// Extension of tileset files inside an archive.
pub const TILESET_EXTENSION: &str = "art";

/// Tileset files are looked up as `<prefix>000.art` .. `<prefix>999.art`.
pub const MAX_TILESET_FILES: usize = 1000;

/// Only tileset version understood by the decoder.
pub const TILESET_VERSION: i32 = 1;

/// Bit widths of the packed per-tile config word, low bit first.
/// Negative widths are sign-extended; the animation speed nibble is unsigned (0..=15).
pub const TILE_CONFIG_FIELDS: [i32; 5] = [6, 2, -8, -8, 4];

/// Only level (map) version understood by the decoder.
pub const LEVEL_VERSION: i32 = 7;

/// Base palette file name.
pub const PALETTE_FILE: &str = "PALETTE.DAT";

/// Palette swap (lookup) file name.
pub const LOOKUP_FILE: &str = "LOOKUP.DAT";

/// Number of colors in the base palette and entries in every lookup table.
pub const PALETTE_SIZE: usize = 256;

/// Palette components are stored as 6-bit values.
pub const PALETTE_COMPONENT_MAX: f32 = 63.0;

/// Color index treated as transparent by the palette lookup texture.
pub const TRANSPARENT_INDEX: usize = 255;

/// Signature at the start of a voice (sound) file.
pub const SOUND_SIGNATURE: &[u8; 19] = b"Creative Voice File";

/// Byte that terminates the voice file signature.
pub const SOUND_SIGNATURE_END: u8 = 0x1A;

/// Filler byte used for silence blocks (unsigned 8-bit mid-scale).
pub const SOUND_SILENCE_BYTE: u8 = 128;

/// Upper bound for null-terminated string scans.
pub const NULL_STRING_LIMIT: usize = 1024;

/// World units per raw level unit on the horizontal plane.
pub const LEVEL_SCALE: f32 = 0.001;

/// Raw level heights are 16 times finer than horizontal units.
pub const HEIGHT_UNITS: f32 = 16.0;

/// Raw slope values are fixed point with this denominator.
pub const SLOPE_UNITS: f32 = 4096.0;

/// Texels covered horizontally by one wall repeat step.
pub const PIXELS_IN_REPEAT: f32 = 8.0;

/// Texels covered vertically per raw height unit and repeat step.
pub const PIXELS_IN_HEIGHT_UNIT: f32 = PIXELS_IN_REPEAT / 1024.0;

/// Flat texture mapping: world units are divided by this before scaling.
pub const FLAT_TEXEL_DIVISOR: f32 = 1.024;

/// Flat texture mapping: texels per normalized flat unit.
pub const FLAT_TEXELS: f32 = 64.0;

/// Panning bytes are normalized by this value.
pub const PANNING_UNITS: f32 = 255.0;

/// Build angles use 2048 units per full turn.
pub const BUILD_ANGLE_UNITS: f32 = 2048.0;
