use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatemarkError {
    #[error("Input folder does not exist: {0}")]
    InputMissing(PathBuf),

    #[error("Input path is not a folder: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Config error: {0}")]
    ConfigError(#[from] toml_edit::de::Error),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}
