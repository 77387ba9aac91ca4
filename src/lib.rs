use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub mod pipeline;
pub mod startup_checks;
pub mod timestamp;
pub mod watermark;

pub use error::DatemarkError;
pub use pipeline::{BatchReport, FileOutcome, OutcomeStatus, run};
pub use watermark::WatermarkStyle;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub watermark: WatermarkStyle,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Subfolder of the input folder receiving the stamped copies
    pub directory_name: String,
    pub file_prefix: String,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads; 1 is sequential, 0 uses every core
    pub jobs: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory_name: "mask".to_string(),
            file_prefix: "watermarked_".to_string(),
            jpeg_quality: 95,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, DatemarkError> {
        let config_content = std::fs::read_to_string(path)?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self, DatemarkError> {
        Ok(toml_edit::de::from_str::<Config>(content)?)
    }
}
