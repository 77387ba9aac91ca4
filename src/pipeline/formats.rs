use super::metadata::PhotoMetadata;
use crate::error::DatemarkError;
use image::codecs::{
    bmp::BmpEncoder, jpeg::JpegEncoder, png::PngEncoder, tiff::TiffEncoder,
};
use image::{DynamicImage, ImageEncoder};
use std::io::Cursor;
use std::path::Path;

/// Image containers the batch recognizes, keyed by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    /// Recognized, but there is no HEIF decoder so these are skipped
    Heif,
}

impl ImageKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "bmp" => Some(ImageKind::Bmp),
            "tif" | "tiff" => Some(ImageKind::Tiff),
            "heic" | "heif" => Some(ImageKind::Heif),
            _ => None,
        }
    }

    pub fn is_decodable(&self) -> bool {
        !matches!(self, ImageKind::Heif)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Bmp => "BMP",
            ImageKind::Tiff => "TIFF",
            ImageKind::Heif => "HEIF",
        }
    }

    /// Encode `image` in this format, attach `metadata` where the format can
    /// carry it, and write the result to `path`.
    pub fn save(
        &self,
        image: &DynamicImage,
        metadata: &PhotoMetadata,
        path: &Path,
        jpeg_quality: u8,
    ) -> Result<(), DatemarkError> {
        let mut buffer = Cursor::new(Vec::new());
        let name = self.name();

        match self {
            ImageKind::Jpeg => {
                // JPEG has no alpha channel
                let rgb_image = image.to_rgb8();
                let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
                metadata.apply_to(&mut encoder, name);
                encoder.write_image(
                    &rgb_image,
                    rgb_image.width(),
                    rgb_image.height(),
                    image::ExtendedColorType::Rgb8,
                )?;
            }
            ImageKind::Png => {
                let mut encoder = PngEncoder::new(&mut buffer);
                metadata.apply_to(&mut encoder, name);
                image.write_with_encoder(encoder)?;
            }
            ImageKind::Bmp => {
                let mut encoder = BmpEncoder::new(&mut buffer);
                metadata.apply_to(&mut encoder, name);
                image.write_with_encoder(encoder)?;
            }
            ImageKind::Tiff => {
                let mut encoder = TiffEncoder::new(&mut buffer);
                metadata.apply_to(&mut encoder, name);
                image.write_with_encoder(encoder)?;
            }
            ImageKind::Heif => {
                return Err(DatemarkError::UnsupportedFormat(name.to_string()));
            }
        }

        std::fs::write(path, buffer.into_inner())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_from_path_is_case_insensitive() {
        assert_eq!(ImageKind::from_path(Path::new("a.JPG")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("a.jpeg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("a.Png")), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_path(Path::new("a.bmp")), Some(ImageKind::Bmp));
        assert_eq!(ImageKind::from_path(Path::new("a.tif")), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_path(Path::new("a.TIFF")), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_path(Path::new("a.HEIC")), Some(ImageKind::Heif));
    }

    #[test]
    fn test_from_path_rejects_others() {
        assert_eq!(ImageKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(ImageKind::from_path(Path::new("anim.gif")), None);
        assert_eq!(ImageKind::from_path(Path::new("jpg")), None);
    }

    #[test]
    fn test_heif_is_not_decodable() {
        assert!(!ImageKind::Heif.is_decodable());
        assert!(ImageKind::Jpeg.is_decodable());
    }

    #[test]
    fn test_save_preserves_format() {
        let temp_dir = TempDir::new().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([200, 100, 50])));

        for (kind, name, format) in [
            (ImageKind::Jpeg, "out.jpg", image::ImageFormat::Jpeg),
            (ImageKind::Png, "out.png", image::ImageFormat::Png),
            (ImageKind::Bmp, "out.bmp", image::ImageFormat::Bmp),
            (ImageKind::Tiff, "out.tiff", image::ImageFormat::Tiff),
        ] {
            let path = temp_dir.path().join(name);
            kind.save(&img, &PhotoMetadata::default(), &path, 90).unwrap();
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), format);
        }
    }

    #[test]
    fn test_save_png_keeps_alpha() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alpha.png");
        let img =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 40])));

        ImageKind::Png.save(&img, &PhotoMetadata::default(), &path, 90).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert!(reloaded.color().has_alpha());
        assert_eq!(*reloaded.to_rgba8().get_pixel(3, 3), Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_save_attaches_icc_profile() {
        let temp_dir = TempDir::new().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])));
        let profile = vec![7u8; 200];
        let metadata = PhotoMetadata {
            icc_profile: Some(profile.clone()),
            exif: None,
        };

        for (kind, name) in [(ImageKind::Jpeg, "icc.jpg"), (ImageKind::Png, "icc.png")] {
            let path = temp_dir.path().join(name);
            kind.save(&img, &metadata, &path, 90).unwrap();

            let mut decoder = image::ImageReader::open(&path)
                .unwrap()
                .with_guessed_format()
                .unwrap()
                .into_decoder()
                .unwrap();
            assert_eq!(
                image::ImageDecoder::icc_profile(&mut decoder).unwrap(),
                Some(profile.clone()),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_save_heif_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.heic");
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(
            ImageKind::Heif.save(&img, &PhotoMetadata::default(), &path, 90),
            Err(DatemarkError::UnsupportedFormat(_))
        ));
        assert!(!path.exists());
    }
}
