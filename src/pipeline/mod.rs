// Batch pipeline - discovers photos, stamps each one and writes the results
mod formats;
mod metadata;
mod report;

pub use formats::ImageKind;
pub use metadata::PhotoMetadata;
pub use report::{BatchReport, FileOutcome, OutcomeStatus};

use crate::error::DatemarkError;
use crate::timestamp::{self, ResolvedTimestamp};
use crate::watermark::{self, LoadedFont};
use crate::{Config, OutputConfig, startup_checks};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use rayon::prelude::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One supported file found in the input folder
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: ImageKind,
}

/// Stamp every supported photo directly inside `input_dir`.
///
/// Only a missing or unreadable input folder (or an output folder that cannot
/// be created) is an error; per-file problems end up in the report.
pub fn run(input_dir: &Path, config: &Config) -> Result<BatchReport, DatemarkError> {
    startup_checks::check_input_directory(input_dir)?;
    let output_dir = startup_checks::prepare_output_directory(input_dir, &config.output)?;

    let jobs = discover_photos(input_dir, &output_dir, &config.output);
    info!(
        "Found {} candidate files in {}",
        jobs.len(),
        input_dir.display()
    );

    let font = LoadedFont::load(&config.watermark);
    let start_time = Instant::now();

    let outcomes: Vec<FileOutcome> = if config.processing.jobs == 1 {
        jobs.iter()
            .map(|job| process_photo(job, &font, config))
            .collect()
    } else {
        // 0 lets rayon pick the thread count
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.processing.jobs)
            .build()?;
        debug!("Processing with {} worker threads", pool.current_num_threads());
        pool.install(|| {
            jobs.par_iter()
                .map(|job| process_photo(job, &font, config))
                .collect()
        })
    };

    let report = BatchReport::new(outcomes);
    info!(
        "{} in {:.2}s",
        report.summary_line(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// List supported files directly inside `input_dir`, sorted by file name.
pub fn discover_photos(
    input_dir: &Path,
    output_dir: &Path,
    output: &OutputConfig,
) -> Vec<PhotoJob> {
    let mut jobs = Vec::new();

    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1) // Only immediate children
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };

        // Follows symlinks, so linked photos are stamped too
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(kind) = ImageKind::from_path(path) else {
            debug!("Ignoring unsupported file {}", path.display());
            continue;
        };

        let mut output_name = OsString::from(&output.file_prefix);
        output_name.push(entry.file_name());

        jobs.push(PhotoJob {
            source: path.to_path_buf(),
            output: output_dir.join(output_name),
            kind,
        });
    }

    jobs
}

/// Process one photo, containing any failure in the returned outcome.
pub fn process_photo(job: &PhotoJob, font: &LoadedFont, config: &Config) -> FileOutcome {
    let status = if !job.kind.is_decodable() {
        warn!(
            "Skipping {}: no {} decoder available",
            job.source.display(),
            job.kind.name()
        );
        OutcomeStatus::Skipped {
            reason: format!("no {} decoder available", job.kind.name()),
        }
    } else {
        match stamp_photo(job, font, config) {
            Ok(timestamp) => {
                info!(
                    "Stamped {} with {} (from {})",
                    job.source.display(),
                    timestamp.display_text(),
                    timestamp.source
                );
                OutcomeStatus::Processed {
                    text: timestamp.display_text(),
                    source: timestamp.source,
                }
            }
            Err(e) => {
                warn!("Failed to process {}: {}", job.source.display(), e);
                OutcomeStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    };

    FileOutcome {
        source: job.source.clone(),
        output: job.output.clone(),
        status,
    }
}

fn stamp_photo(
    job: &PhotoJob,
    font: &LoadedFont,
    config: &Config,
) -> Result<ResolvedTimestamp, DatemarkError> {
    let timestamp = timestamp::resolve(&job.source);
    let text = timestamp.display_text();

    let (image, metadata) = decode_upright(&job.source)?;
    let stamped = watermark::render(&image, &text, font, &config.watermark);
    drop(image);

    job.kind.save(
        &stamped,
        &metadata,
        &job.output,
        config.output.jpeg_quality,
    )?;
    debug!("Wrote {}", job.output.display());
    Ok(timestamp)
}

/// Decode an image and rotate it into its display orientation, so the stamp
/// ends up at the bottom-right of the photo as the viewer sees it.
///
/// The EXIF block and ICC profile come back alongside the pixels, with the
/// orientation tag reset to upright.
fn decode_upright(path: &Path) -> Result<(DynamicImage, PhotoMetadata), DatemarkError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut metadata = PhotoMetadata::from_decoder(&mut decoder);

    let mut image = DynamicImage::from_decoder(decoder)?;
    if orientation != Orientation::NoTransforms {
        debug!("Applying {:?} to {}", orientation, path.display());
        image.apply_orientation(orientation);
        metadata.reset_orientation();
    }
    Ok((image, metadata))
}
