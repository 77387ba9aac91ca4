use image::{ImageDecoder, ImageEncoder};
use tracing::debug;

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const ORIENTATION_TAG: u16 = 0x0112;

/// Metadata carried over from a source photo to its stamped copy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub icc_profile: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
}

impl PhotoMetadata {
    pub fn from_decoder<D: ImageDecoder>(decoder: &mut D) -> Self {
        let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
            debug!("Failed to read ICC profile: {}", e);
            None
        });
        let exif = decoder.exif_metadata().unwrap_or_else(|e| {
            debug!("Failed to read EXIF block: {}", e);
            None
        });
        Self { icc_profile, exif }
    }

    /// Mark the EXIF block as upright, for pixels that were already rotated.
    pub fn reset_orientation(&mut self) {
        if let Some(exif) = &mut self.exif
            && !reset_orientation(exif)
        {
            debug!("EXIF block has no orientation tag to reset");
        }
    }

    /// Hand the metadata to an encoder. Formats that cannot carry a chunk
    /// simply drop it.
    pub fn apply_to<E: ImageEncoder>(&self, encoder: &mut E, format: &str) {
        if let Some(profile) = &self.icc_profile
            && let Err(e) = encoder.set_icc_profile(profile.clone())
        {
            debug!("{} encoder does not take an ICC profile: {}", format, e);
        }
        if let Some(exif) = &self.exif
            && let Err(e) = encoder.set_exif_metadata(exif.clone())
        {
            debug!("{} encoder does not take EXIF metadata: {}", format, e);
        }
    }
}

fn read_u16(bytes: &[u8], at: usize, little_endian: bool) -> Option<u16> {
    let raw: [u8; 2] = bytes.get(at..at + 2)?.try_into().ok()?;
    Some(if little_endian {
        u16::from_le_bytes(raw)
    } else {
        u16::from_be_bytes(raw)
    })
}

fn read_u32(bytes: &[u8], at: usize, little_endian: bool) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(if little_endian {
        u32::from_le_bytes(raw)
    } else {
        u32::from_be_bytes(raw)
    })
}

/// Set the IFD0 orientation tag of a TIFF-structured EXIF block to 1.
/// Returns false when the block has no such tag or is malformed.
pub fn reset_orientation(exif: &mut [u8]) -> bool {
    let start = if exif.starts_with(EXIF_HEADER) {
        EXIF_HEADER.len()
    } else {
        0
    };
    let tiff = &mut exif[start..];

    let little_endian = match tiff.get(0..2) {
        Some(b"II") => true,
        Some(b"MM") => false,
        _ => return false,
    };

    let Some(ifd0) = read_u32(tiff, 4, little_endian) else {
        return false;
    };
    let ifd0 = ifd0 as usize;
    let Some(count) = read_u16(tiff, ifd0, little_endian) else {
        return false;
    };

    for index in 0..count as usize {
        let entry = ifd0 + 2 + 12 * index;
        if read_u16(tiff, entry, little_endian) != Some(ORIENTATION_TAG) {
            continue;
        }
        let upright = if little_endian {
            1u16.to_le_bytes()
        } else {
            1u16.to_be_bytes()
        };
        return match tiff.get_mut(entry + 8..entry + 10) {
            Some(value) => {
                value.copy_from_slice(&upright);
                true
            }
            None => false,
        };
    }

    false
}
