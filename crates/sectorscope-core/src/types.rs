use serde::{Deserialize, Serialize};

/// Index of a sector in the level's sector arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorId(pub u32);

/// Index of a wall in the level's wall arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallId(pub u32);

/// Numeric tile (texture) identifier as stored in tilesets and level records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

macro_rules! arena_index {
    ($name:ident) => {
        impl $name {
            /// Position in the owning arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_index!(SectorId);
arena_index!(WallId);
arena_index!(TileId);

impl TileId {
    /// Convert a raw signed texture reference; -1 (or any negative) means "no texture".
    pub fn from_raw(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }
}
