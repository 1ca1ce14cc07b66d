use sectorscope_core::SectorId;
use sectorscope_formats::DecodeError;

/// Errors raised while building or querying a level.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Internally inconsistent level references.
    #[error("malformed level: {0}")]
    Malformed(String),

    #[error("triangulation of sector {sector} failed: {detail}")]
    Triangulation { sector: SectorId, detail: String },

    #[error("no level loaded")]
    NoLevel,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type WorldResult<T> = Result<T, WorldError>;

pub(crate) fn malformed(detail: impl Into<String>) -> WorldError {
    WorldError::Malformed(detail.into())
}
