//! Base palette, shade tables and palette swaps.

use sectorscope_core::constants::{
    LOOKUP_FILE, PALETTE_COMPONENT_MAX, PALETTE_FILE, PALETTE_SIZE, TRANSPARENT_INDEX,
};

use crate::archive::Archive;
use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// One base palette color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaletteColor {
    /// Normalized components in [0, 1].
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// Byte components, rounded up.
    pub r8: u8,
    pub g8: u8,
    pub b8: u8,
}

impl PaletteColor {
    fn from_components(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (
            r as f32 / PALETTE_COMPONENT_MAX,
            g as f32 / PALETTE_COMPONENT_MAX,
            b as f32 / PALETTE_COMPONENT_MAX,
        );
        let to_byte = |v: f32| (v * 255.0).ceil().clamp(0.0, 255.0) as u8;
        Self {
            r,
            g,
            b,
            r8: to_byte(r),
            g8: to_byte(g),
            b8: to_byte(b),
        }
    }

    pub fn rgb8(&self) -> [u8; 3] {
        [self.r8, self.g8, self.b8]
    }
}

/// Maps a raw pixel index to a base color index for one light level.
pub type ShadeTable = [u8; PALETTE_SIZE];

/// Permutation of pixel indices applied before shading.
pub type SwapTable = [u8; PALETTE_SIZE];

#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<PaletteColor>,
    shades: Vec<ShadeTable>,
    /// Indexed by destination slot; unassigned slots are identity.
    swaps: Vec<Option<SwapTable>>,
}

impl Palette {
    /// Decode the base palette and the swap file from an archive.
    pub fn load(archive: &Archive) -> DecodeResult<Self> {
        let mut palette = decode_base_palette(&mut archive.reader(PALETTE_FILE)?)?;
        palette.swaps = decode_swaps(&mut archive.reader(LOOKUP_FILE)?)?;
        log::info!(
            "Palette: {} shade tables, {} swaps",
            palette.shades.len(),
            palette.swaps.iter().flatten().count()
        );
        Ok(palette)
    }

    pub fn colors(&self) -> &[PaletteColor] {
        &self.colors
    }

    pub fn shade_count(&self) -> usize {
        self.shades.len()
    }

    pub fn shade_table(&self, shade: usize) -> DecodeResult<&ShadeTable> {
        self.shades.get(shade).ok_or(DecodeError::IndexOutOfRange {
            what: "shade table",
            index: shade,
            len: self.shades.len(),
        })
    }

    /// Swap table for a slot, `None` for identity.
    pub fn swap(&self, slot: u8) -> Option<&SwapTable> {
        self.swaps.get(slot as usize).and_then(Option::as_ref)
    }

    /// Final color of a pixel index under a light level.
    pub fn get(&self, index: u8, shade: usize) -> DecodeResult<&PaletteColor> {
        let table = self.shade_table(shade)?;
        Ok(&self.colors[table[index as usize] as usize])
    }

    /// Like [`Palette::get`], with a palette swap applied first.
    pub fn resolve(&self, index: u8, shade: usize, swap: u8) -> DecodeResult<&PaletteColor> {
        let index = self.swap(swap).map_or(index, |t| t[index as usize]);
        self.get(index, shade)
    }

    /// RGBA lookup grid for one swap slot: 256 columns (pixel index) by one
    /// row per shade table. Index 255 is fully transparent.
    pub fn lookup_rgba(&self, swap: u8) -> Vec<u8> {
        let remap = self.swap(swap);
        let mut pixels = Vec::with_capacity(PALETTE_SIZE * self.shades.len() * 4);
        for table in &self.shades {
            for idx in 0..PALETTE_SIZE {
                let color_id = remap.map_or(idx, |t| t[idx] as usize);
                let color = &self.colors[table[color_id] as usize];
                let alpha = if idx == TRANSPARENT_INDEX { 0 } else { 255 };
                pixels.extend_from_slice(&[color.r8, color.g8, color.b8, alpha]);
            }
        }
        pixels
    }
}

/// Decode the base colors and shade tables.
pub fn decode_base_palette(r: &mut ByteReader<'_>) -> DecodeResult<Palette> {
    let mut colors = Vec::with_capacity(PALETTE_SIZE);
    for _ in 0..PALETTE_SIZE {
        let [red, green, blue] = [r.read_u8()?, r.read_u8()?, r.read_u8()?];
        colors.push(PaletteColor::from_components(red, green, blue));
    }

    let count = r.read_u16()? as usize;
    let mut shades = Vec::with_capacity(count);
    for _ in 0..count {
        let mut table = [0u8; PALETTE_SIZE];
        table.copy_from_slice(r.read_bytes(PALETTE_SIZE)?);
        shades.push(table);
    }

    Ok(Palette {
        colors,
        shades,
        swaps: Vec::new(),
    })
}

/// Decode palette swaps; the result is indexed by destination slot.
pub fn decode_swaps(r: &mut ByteReader<'_>) -> DecodeResult<Vec<Option<SwapTable>>> {
    let count = r.read_u8()?;
    let mut swaps = vec![None; PALETTE_SIZE];
    for _ in 0..count {
        let slot = r.read_u8()? as usize;
        let mut table = [0u8; PALETTE_SIZE];
        table.copy_from_slice(r.read_bytes(PALETTE_SIZE)?);
        swaps[slot] = Some(table);
    }
    Ok(swaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{encode_lookup, encode_palette, grayscale_palette, ArchiveBuilder};

    fn identity() -> [u8; PALETTE_SIZE] {
        let mut t = [0u8; PALETTE_SIZE];
        for (i, v) in t.iter_mut().enumerate() {
            *v = i as u8;
        }
        t
    }

    fn sample_archive() -> Archive {
        let mut colors = [[0u8; 3]; PALETTE_SIZE];
        colors[1] = [63, 0, 0];
        colors[2] = [0, 63, 0];
        colors[3] = [0, 0, 32];

        let mut darker = [0u8; PALETTE_SIZE];
        darker[1] = 3;
        darker[2] = 3;

        let mut swap = identity();
        swap[1] = 2;

        Archive::load(
            ArchiveBuilder::new()
                .entry(PALETTE_FILE, encode_palette(&colors, &[identity(), darker]))
                .entry(LOOKUP_FILE, encode_lookup(&[(5, swap)]))
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn test_color_conversion() {
        let color = PaletteColor::from_components(63, 32, 1);
        assert_eq!(color.r, 1.0);
        assert_eq!(color.rgb8(), [255, 130, 5]);
    }

    #[test]
    fn test_get_through_shade_table() {
        let palette = Palette::load(&sample_archive()).unwrap();
        assert_eq!(palette.shade_count(), 2);
        assert_eq!(palette.get(1, 0).unwrap().rgb8(), [255, 0, 0]);
        assert_eq!(palette.get(1, 1).unwrap().rgb8(), [0, 0, 130]);
        assert!(matches!(
            palette.get(1, 2),
            Err(DecodeError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
    }

    #[test]
    fn test_swaps_default_to_identity() {
        let palette = Palette::load(&sample_archive()).unwrap();
        assert!(palette.swap(5).is_some());
        assert!(palette.swap(0).is_none());
        assert_eq!(palette.resolve(1, 0, 5).unwrap().rgb8(), [0, 255, 0]);
        assert_eq!(palette.resolve(1, 0, 0).unwrap().rgb8(), [255, 0, 0]);
    }

    #[test]
    fn test_lookup_rgba_layout() {
        let palette = Palette::load(&sample_archive()).unwrap();
        let rgba = palette.lookup_rgba(5);
        assert_eq!(rgba.len(), PALETTE_SIZE * 2 * 4);
        // row 0, index 1 swapped to green
        assert_eq!(&rgba[4..8], &[0, 255, 0, 255]);
        // index 255 is transparent
        assert_eq!(rgba[255 * 4 + 3], 0);
    }

    #[test]
    fn test_missing_lookup_file() {
        let archive = Archive::load(
            ArchiveBuilder::new()
                .entry(PALETTE_FILE, grayscale_palette())
                .build(),
        )
        .unwrap();
        assert!(matches!(Palette::load(&archive), Err(DecodeError::NotFound(_))));
    }

    #[test]
    fn test_truncated_shades_out_of_range() {
        let mut bytes = grayscale_palette();
        bytes.pop();
        assert!(matches!(
            decode_base_palette(&mut ByteReader::new(&bytes)),
            Err(DecodeError::OutOfRange { .. })
        ));
    }
}
