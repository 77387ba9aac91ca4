use crate::timestamp::TimestampSource;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Processed {
        text: String,
        source: TimestampSource,
    },
    Failed {
        reason: String,
    },
    Skipped {
        reason: String,
    },
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub status: OutcomeStatus,
}

impl FileOutcome {
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn is_processed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Processed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped { .. })
    }
}

/// Per-file outcomes of a batch, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(outcomes: Vec<FileOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed_files(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(|o| o.source.as_path())
            .collect()
    }

    pub fn outcome_for(&self, file_name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file_name() == file_name)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Processed {} files: {} succeeded, {} failed, {} skipped",
            self.total(),
            self.succeeded(),
            self.failed(),
            self.skipped()
        )
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary_line())?;
        for outcome in &self.outcomes {
            match &outcome.status {
                OutcomeStatus::Failed { reason } => {
                    writeln!(f, "  failed:  {} ({})", outcome.file_name(), reason)?
                }
                OutcomeStatus::Skipped { reason } => {
                    writeln!(f, "  skipped: {} ({})", outcome.file_name(), reason)?
                }
                OutcomeStatus::Processed { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: OutcomeStatus) -> FileOutcome {
        FileOutcome {
            source: PathBuf::from("photos").join(name),
            output: PathBuf::from("photos/mask").join(format!("watermarked_{}", name)),
            status,
        }
    }

    fn sample_report() -> BatchReport {
        BatchReport::new(vec![
            outcome(
                "a.jpg",
                OutcomeStatus::Processed {
                    text: "2023-05-10 14:30:00".to_string(),
                    source: TimestampSource::FileModified,
                },
            ),
            outcome(
                "b.png",
                OutcomeStatus::Failed {
                    reason: "Image error: bad header".to_string(),
                },
            ),
            outcome(
                "c.heic",
                OutcomeStatus::Skipped {
                    reason: "no HEIF decoder".to_string(),
                },
            ),
        ])
    }

    #[test]
    fn test_counts() {
        let report = sample_report();
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed_files(), vec![Path::new("photos/b.png")]);
    }

    #[test]
    fn test_display_names_failed_files() {
        let rendered = sample_report().to_string();
        assert!(rendered.starts_with("Processed 3 files: 1 succeeded, 1 failed, 1 skipped"));
        assert!(rendered.contains("failed:  b.png (Image error: bad header)"));
        assert!(rendered.contains("skipped: c.heic"));
        assert!(!rendered.contains("a.jpg"));
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::default();
        assert_eq!(
            report.summary_line(),
            "Processed 0 files: 0 succeeded, 0 failed, 0 skipped"
        );
        assert!(report.outcome_for("a.jpg").is_none());
    }
}
