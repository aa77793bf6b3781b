//! Generator configuration, loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::MAX_SONGS;
use crate::dsp::ProcessorConfig;
use crate::suggest::EnergyHeuristic;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything a [`crate::pipeline::Generator`] can be tuned with.
/// Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Mood transform parameters.
    pub processor: ProcessorConfig,
    /// Catalog size, at most 10.
    pub catalog_capacity: usize,
    /// Live playback handles allowed at once.
    pub max_playback_handles: usize,
    /// Title template; `{mood}` is replaced by the mood's display name.
    pub title_template: String,
    /// Heuristic used when a caller asks for a suggestion.
    pub suggester: EnergyHeuristic,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            catalog_capacity: MAX_SONGS,
            max_playback_handles: MAX_SONGS + 1,
            title_template: "{mood} Music Creation".to_string(),
            suggester: EnergyHeuristic::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
