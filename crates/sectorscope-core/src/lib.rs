pub mod constants;
pub mod flags;
pub mod math;
pub mod types;

pub use flags::{FlatFlags, WallFlags};
pub use types::{SectorId, TileId, WallId};
