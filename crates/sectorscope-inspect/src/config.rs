use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::InspectError;

/// Inspector settings, loaded from RON and overridable from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Archive file on disk.
    pub archive: PathBuf,
    /// Level entry inside the archive.
    pub level: String,
    /// Camera position in world space; the level spawn when unset.
    pub camera: Option<[f32; 3]>,
    /// Sound entries to decode.
    pub sounds: Vec<String>,
    /// Build all sector meshes on the thread pool instead of one by one.
    pub parallel: bool,
    /// Where to write the JSON report.
    pub output: Option<PathBuf>,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            archive: PathBuf::from("DUKE3D.GRP"),
            level: "E1L1.MAP".to_string(),
            camera: None,
            sounds: Vec::new(),
            parallel: true,
            output: None,
        }
    }
}

pub fn load_config_from_str(ron_str: &str) -> Result<InspectConfig, InspectError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| InspectError::Config(e.to_string()))
}

pub fn load_config(path: &Path) -> Result<InspectConfig, InspectError> {
    let contents = std::fs::read_to_string(path)?;
    load_config_from_str(&contents)
}
