use crate::OutputConfig;
use crate::error::DatemarkError;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Fail fast unless `input_dir` exists and is a directory.
pub fn check_input_directory(input_dir: &Path) -> Result<(), DatemarkError> {
    if !input_dir.exists() {
        error!("Input folder does not exist: {:?}", input_dir);
        return Err(DatemarkError::InputMissing(input_dir.to_path_buf()));
    }

    if !input_dir.is_dir() {
        error!("Input path is not a folder: {:?}", input_dir);
        return Err(DatemarkError::NotADirectory(input_dir.to_path_buf()));
    }

    // Readability is checked up front so a permission problem is fatal
    // rather than an empty batch
    std::fs::read_dir(input_dir)?;
    info!("Input folder is accessible: {:?}", input_dir);
    Ok(())
}

/// Create the output directory inside `input_dir` if it is not there yet.
pub fn prepare_output_directory(
    input_dir: &Path,
    output: &OutputConfig,
) -> Result<PathBuf, DatemarkError> {
    let output_dir = input_dir.join(&output.directory_name);

    if output_dir.is_dir() {
        info!("Output folder exists: {:?}", output_dir);
    } else {
        info!("Output folder does not exist, creating: {:?}", output_dir);
        if let Err(e) = std::fs::create_dir_all(&output_dir) {
            error!("Failed to create output folder {:?}: {}", output_dir, e);
            return Err(e.into());
        }
    }

    Ok(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_input_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            check_input_directory(&missing),
            Err(DatemarkError::InputMissing(path)) if path == missing
        ));
    }

    #[test]
    fn test_input_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            check_input_directory(&file),
            Err(DatemarkError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_prepare_output_directory_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let output = OutputConfig::default();

        let first = prepare_output_directory(temp_dir.path(), &output).unwrap();
        let second = prepare_output_directory(temp_dir.path(), &output).unwrap();

        assert_eq!(first, temp_dir.path().join("mask"));
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn test_prepare_output_directory_blocked_by_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("mask"), b"in the way").unwrap();
        assert!(matches!(
            prepare_output_directory(temp_dir.path(), &OutputConfig::default()),
            Err(DatemarkError::IoError(_))
        ));
    }
}
