//! Creative voice (`.voc`) sound decoding into normalized PCM samples.

use std::time::Duration;

use sectorscope_core::constants::{SOUND_SIGNATURE, SOUND_SIGNATURE_END, SOUND_SILENCE_BYTE};

use crate::archive::Archive;
use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// Block kinds in the voice stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Terminator,
    SoundData,
    MoreSoundData,
    Silence,
    NewFormat,
    Unknown(u8),
}

impl From<u8> for BlockKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Terminator,
            1 => Self::SoundData,
            2 => Self::MoreSoundData,
            3 => Self::Silence,
            9 => Self::NewFormat,
            other => Self::Unknown(other),
        }
    }
}

/// Decoded sound: interleaved samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct SoundClip {
    pub samples: Vec<f32>,
    /// Frames per second.
    pub rate: u32,
    pub channels: u8,
    /// Bit depth of the stored samples (8 or 16).
    pub bits: u8,
}

impl SoundClip {
    /// Decode a named sound entry.
    pub fn load(archive: &Archive, name: &str) -> DecodeResult<Self> {
        let clip = decode_sound(&mut archive.reader(name)?)?;
        log::debug!(
            "Sound {name}: {} frames at {} Hz, {} channel(s)",
            clip.frames(),
            clip.rate,
            clip.channels
        );
        Ok(clip)
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.rate as f64)
    }

    /// De-interleaved samples of one channel.
    pub fn channel(&self, index: usize) -> DecodeResult<Vec<f32>> {
        let channels = self.channels.max(1) as usize;
        if index >= channels {
            return Err(DecodeError::IndexOutOfRange {
                what: "sound channel",
                index,
                len: channels,
            });
        }
        Ok(self
            .samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect())
    }
}

fn read_header(r: &mut ByteReader<'_>) -> DecodeResult<()> {
    let signature = r
        .read_bytes(SOUND_SIGNATURE.len())
        .map_err(|_| DecodeError::invalid("sound header", "file too small"))?;
    if signature != SOUND_SIGNATURE {
        return Err(DecodeError::invalid("sound header", "bad signature"));
    }
    if r.read_u8()? != SOUND_SIGNATURE_END {
        return Err(DecodeError::invalid("sound header", "bad signature terminator"));
    }
    let data_offset = r.read_u16()? as usize;
    r.set_position(data_offset)
}

/// Decode a voice stream.
pub fn decode_sound(r: &mut ByteReader<'_>) -> DecodeResult<SoundClip> {
    read_header(r)?;

    let mut data: Vec<u8> = Vec::new();
    let mut rate = 0u32;
    let mut channels = 1u8;
    let mut bits = 8u8;

    while !r.is_eof() {
        let kind = BlockKind::from(r.read_u8()?);
        let size = if kind == BlockKind::Terminator {
            0
        } else {
            r.read_u24()? as usize
        };

        match kind {
            BlockKind::Terminator => break,
            BlockKind::SoundData => {
                let divisor = r.read_u8()?;
                rate = (1_000_000.0 / (256.0 - divisor as f64)).round() as u32;
                r.skip(1)?;
                data.extend_from_slice(r.read_bytes(size.saturating_sub(2))?);
            }
            BlockKind::MoreSoundData => {
                r.skip(2)?;
                data.extend_from_slice(r.read_bytes(size.saturating_sub(2))?);
            }
            BlockKind::Silence => {
                let length = (r.read_u16()? as usize).saturating_sub(1);
                r.skip(1)?;
                data.resize(data.len() + length, SOUND_SILENCE_BYTE);
            }
            BlockKind::NewFormat => {
                rate = r.read_u32()?;
                bits = r.read_u8()?;
                channels = r.read_u8()?;
                r.skip(6)?;
                data = r.read_bytes(size.saturating_sub(12))?.to_vec();
                break;
            }
            BlockKind::Unknown(kind) => {
                log::warn!("Skipping unknown sound block type {kind} ({size} bytes)");
                r.skip(size)?;
            }
        }
    }

    Ok(SoundClip {
        samples: convert_samples(&data, bits),
        rate,
        channels,
        bits,
    })
}

fn convert_samples(data: &[u8], bits: u8) -> Vec<f32> {
    if bits == 16 {
        data.chunks_exact(2)
            .map(|pair| {
                let mut value = u16::from_le_bytes([pair[0], pair[1]]) as i32;
                if value > 32767 {
                    value -= 65535;
                }
                value as f32 / 32767.0
            })
            .collect()
    } else {
        data.iter().map(|&b| (b as f32 - 128.0) / 128.0).collect()
    }
}
