pub mod config;
pub mod report;
pub mod runner;

use sectorscope_world::WorldError;

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("Failed to parse config RON: {0}")]
    Config(String),
    #[error("Bad report file: {0}")]
    Report(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    World(#[from] WorldError),
}
