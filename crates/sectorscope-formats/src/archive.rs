//! Group archive container: a signature, an entry table, then the entry
//! payloads back to back in table order.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use sectorscope_core::constants::{
    ARCHIVE_ENTRY_SIZE, ARCHIVE_HEADER_SIZE, ARCHIVE_MAGIC, ARCHIVE_NAME_LEN, TILESET_EXTENSION,
};

use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// One named payload inside the archive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name as stored in the entry table.
    pub name: String,
    /// Byte offset of the payload in the archive buffer.
    pub offset: usize,
    /// Payload length in bytes.
    pub length: usize,
}

/// Parsed archive. The buffer is immutable and shared, so readers handed
/// out by [`Archive::reader`] stay valid for as long as the archive lives.
#[derive(Debug, Clone)]
pub struct Archive {
    buffer: Arc<[u8]>,
    entries: Vec<ArchiveEntry>,
    /// Lowercased name -> index into `entries`.
    lookup: HashMap<String, usize>,
}

impl Archive {
    /// Parse the archive header and entry table.
    pub fn load(bytes: impl Into<Arc<[u8]>>) -> DecodeResult<Self> {
        let buffer: Arc<[u8]> = bytes.into();
        if buffer.len() < ARCHIVE_HEADER_SIZE {
            return Err(DecodeError::invalid("archive header", "file too small"));
        }
        let mut r = ByteReader::new(&buffer);

        let magic = r.read_bytes(ARCHIVE_MAGIC.len())?;
        if magic != ARCHIVE_MAGIC {
            return Err(DecodeError::invalid("archive header", "bad signature"));
        }

        let count = r.read_u32()? as usize;
        let mut records = Vec::with_capacity(count.min(r.remaining() / ARCHIVE_ENTRY_SIZE));
        for _ in 0..count {
            let name = r.read_fixed_string(ARCHIVE_NAME_LEN)?;
            let length = r.read_u32()? as usize;
            records.push((name, length));
        }

        // Payloads start right after the table, in record order.
        let mut offset = r.position();
        let mut entries = Vec::with_capacity(records.len());
        let mut lookup = HashMap::with_capacity(records.len());
        for (name, length) in records {
            let key = name.to_lowercase();
            if lookup.insert(key, entries.len()).is_some() {
                return Err(DecodeError::invalid(
                    "archive entry table",
                    format!("duplicate entry {name}"),
                ));
            }
            log::debug!("Archive entry {name} => {length} bytes at {offset}");
            entries.push(ArchiveEntry {
                name,
                offset,
                length,
            });
            offset += length;
        }

        if offset > buffer.len() {
            return Err(DecodeError::invalid(
                "archive entry table",
                format!(
                    "entries need {offset} bytes but archive holds {}",
                    buffer.len()
                ),
            ));
        }

        log::info!("Archive loaded: {} entries, {} bytes", entries.len(), buffer.len());

        Ok(Self {
            buffer,
            entries,
            lookup,
        })
    }

    /// Fetch the archive bytes once from `source` and parse them.
    pub async fn fetch<S: ArchiveSource>(source: &S, name: &str) -> DecodeResult<Self> {
        let bytes = source.fetch(name).await?;
        Self::load(bytes)
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Case-insensitive existence check.
    pub fn has(&self, name: &str) -> bool {
        self.lookup.contains_key(&name.to_lowercase())
    }

    /// Case-insensitive entry lookup.
    pub fn entry(&self, name: &str) -> DecodeResult<&ArchiveEntry> {
        self.lookup
            .get(&name.to_lowercase())
            .map(|&i| &self.entries[i])
            .ok_or_else(|| DecodeError::NotFound(format!("archive entry {name}")))
    }

    /// Bounded reader over exactly the entry's bytes.
    pub fn reader(&self, name: &str) -> DecodeResult<ByteReader<'_>> {
        let entry = self.entry(name)?;
        Ok(ByteReader::window(&self.buffer, entry.offset, entry.length))
    }

    /// Raw payload of an entry.
    pub fn bytes(&self, name: &str) -> DecodeResult<&[u8]> {
        let entry = self.entry(name)?;
        Ok(&self.buffer[entry.offset..entry.offset + entry.length])
    }

    /// Prefix shared by the numbered tileset files, e.g. `tiles` for
    /// `TILES000.ART`. Scans entries in table order and returns the first
    /// match, lowercased.
    pub fn tileset_prefix(&self) -> Option<String> {
        self.entries.iter().find_map(|entry| {
            let name = entry.name.to_lowercase();
            let stem = name.strip_suffix(TILESET_EXTENSION)?.strip_suffix('.')?;
            let split = stem
                .len()
                .checked_sub(3)
                .filter(|&i| stem.is_char_boundary(i))?;
            let (prefix, digits) = stem.split_at(split);
            digits
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| prefix.to_string())
        })
    }

    /// Name of the `index`-th numbered tileset file for `prefix`.
    pub fn tileset_file_name(prefix: &str, index: usize) -> String {
        format!("{prefix}{index:03}.{TILESET_EXTENSION}")
    }
}

/// Source of raw archive bytes. Fetching is the only suspension point of the
/// whole pipeline and happens once, before any decoding.
pub trait ArchiveSource {
    fn fetch(&self, name: &str) -> impl Future<Output = std::io::Result<Vec<u8>>> + Send;
}

/// Reads archives from a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveSource for DirectorySource {
    fn fetch(&self, name: &str) -> impl Future<Output = std::io::Result<Vec<u8>>> + Send {
        let path = self.root.join(name);
        async move {
            log::info!("Reading archive {}", path.display());
            std::fs::read(path)
        }
    }
}
