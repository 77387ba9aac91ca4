use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use image::{ImageDecoder, ImageReader};
use std::fmt;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, trace, warn};

/// Format used for the rendered watermark text
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// EXIF fields consulted for the capture time, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifDateField {
    DateTimeOriginal,
    DateTimeDigitized,
}

impl ExifDateField {
    const ALL: [ExifDateField; 2] = [
        ExifDateField::DateTimeOriginal,
        ExifDateField::DateTimeDigitized,
    ];

    fn tag(self) -> rexif::ExifTag {
        match self {
            ExifDateField::DateTimeOriginal => rexif::ExifTag::DateTimeOriginal,
            ExifDateField::DateTimeDigitized => rexif::ExifTag::DateTimeDigitized,
        }
    }
}

/// Where a resolved timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Exif(ExifDateField),
    FileModified,
    Now,
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampSource::Exif(ExifDateField::DateTimeOriginal) => {
                write!(f, "EXIF DateTimeOriginal")
            }
            TimestampSource::Exif(ExifDateField::DateTimeDigitized) => {
                write!(f, "EXIF DateTimeDigitized")
            }
            TimestampSource::FileModified => write!(f, "file modified time"),
            TimestampSource::Now => write!(f, "current time"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub datetime: NaiveDateTime,
    pub source: TimestampSource,
}

impl ResolvedTimestamp {
    pub fn display_text(&self) -> String {
        format_display(&self.datetime)
    }
}

pub fn format_display(datetime: &NaiveDateTime) -> String {
    datetime.format(DISPLAY_FORMAT).to_string()
}

/// Resolve the capture time of a photo.
///
/// Embedded EXIF capture time wins; otherwise the file's last-modified time
/// is used, and as a last resort the current time. This never fails: any
/// problem reading metadata is treated as "metadata unavailable".
pub fn resolve(path: &Path) -> ResolvedTimestamp {
    if let Some((datetime, field)) = read_exif_capture_time(path) {
        return ResolvedTimestamp {
            datetime,
            source: TimestampSource::Exif(field),
        };
    }

    match file_modified_time(path) {
        Ok(modified) => ResolvedTimestamp {
            datetime: to_local_seconds(modified),
            source: TimestampSource::FileModified,
        },
        Err(e) => {
            warn!(
                "Failed to read modified time of {}: {}, using current time",
                path.display(),
                e
            );
            ResolvedTimestamp {
                datetime: to_local_seconds(SystemTime::now()),
                source: TimestampSource::Now,
            }
        }
    }
}

fn read_exif_capture_time(path: &Path) -> Option<(NaiveDateTime, ExifDateField)> {
    let exif = match rexif::parse_file(path) {
        Ok(exif) => exif,
        Err(e) => {
            trace!("No EXIF data for {} via rexif: {}", path.display(), e);
            // rexif only understands JPEG and TIFF containers; PNG keeps its
            // EXIF block in an eXIf chunk that the image decoder exposes
            read_decoder_exif(path)?
        }
    };

    capture_time_from_exif(&exif, path)
}

/// Parse the raw EXIF block the image decoder found, if any.
fn read_decoder_exif(path: &Path) -> Option<rexif::ExifData> {
    let mut decoder = ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .into_decoder()
        .ok()?;
    let block = match decoder.exif_metadata() {
        Ok(Some(block)) => block,
        Ok(None) => return None,
        Err(e) => {
            trace!("Decoder could not read EXIF of {}: {}", path.display(), e);
            return None;
        }
    };

    let tiff = block.strip_prefix(EXIF_HEADER).unwrap_or(&block[..]);
    match rexif::parse_buffer(tiff) {
        Ok(exif) => Some(exif),
        Err(e) => {
            debug!("Malformed EXIF block in {}: {}", path.display(), e);
            None
        }
    }
}

fn capture_time_from_exif(
    exif: &rexif::ExifData,
    path: &Path,
) -> Option<(NaiveDateTime, ExifDateField)> {
    for field in ExifDateField::ALL {
        let tag = field.tag();
        if let Some(entry) = exif.entries.iter().find(|e| e.tag == tag) {
            match parse_exif_datetime(&entry.value_more_readable) {
                Some(datetime) => {
                    debug!("Found capture date in {:?}: {}", field, datetime);
                    return Some((datetime, field));
                }
                None => debug!(
                    "Unparseable {:?} value {:?} in {}",
                    field,
                    entry.value_more_readable,
                    path.display()
                ),
            }
        }
    }

    None
}

/// Parse an EXIF datetime such as "2005:07:30 07:22:46".
pub fn parse_exif_datetime(datetime_str: &str) -> Option<NaiveDateTime> {
    let trimmed = datetime_str.trim_matches(|c: char| c == '\0' || c.is_whitespace());

    let formats = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

fn file_modified_time(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

fn to_local_seconds(time: SystemTime) -> NaiveDateTime {
    let local = DateTime::<Local>::from(time).naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}
