//! Writers for the composed raster

mod pdf;

use std::borrow::Cow;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use log::info;
use thiserror::Error;

pub use pdf::{write_pdf, Caption};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF generation failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("PDF resolution must be a positive number of dots per inch, got {0}")]
    InvalidDpi(f32),
}

/// Save the composed raster as an RGBA PNG
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    image.save_with_format(path, ImageFormat::Png)?;
    info!("wrote {} ({}x{})", path.display(), image.width(), image.height());
    Ok(())
}

/// Save a raster as a single-page PDF. Alpha is dropped, not flattened
/// against a background.
pub fn save_pdf(image: &DynamicImage, path: &Path, dpi: f32) -> Result<(), OutputError> {
    let rgb: Cow<'_, RgbImage> = match image {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        other => Cow::Owned(other.to_rgb8()),
    };
    write_pdf(&rgb, path, dpi, None)?;
    info!("wrote {} at {} dpi", path.display(), dpi);
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{ColorType, Rgba};

    use super::*;

    #[test]
    fn test_png_keeps_rgba_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbaImage::from_pixel(7, 5, Rgba([10, 20, 30, 40]));
        save_png(&img, &path).unwrap();

        let back = image::open(&path).unwrap();
        assert_eq!(back.color(), ColorType::Rgba8);
        assert_eq!((back.width(), back.height()), (7, 5));
        assert_eq!(back.to_rgba8().get_pixel(3, 3), &Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_png_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");
        let img = RgbaImage::new(1, 1);
        assert!(save_png(&img, &path).is_err());
    }

    #[test]
    fn test_pdf_from_rgba_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 0])));
        save_pdf(&img, &path, 100.0).unwrap();

        let doc = lopdf::Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let image = doc
            .objects
            .values()
            .find_map(|o| match o {
                lopdf::Object::Stream(s)
                    if s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()) =>
                {
                    Some(s.clone())
                }
                _ => None,
            })
            .expect("image stream");
        assert_eq!(
            image.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceRGB"
        );
        assert_eq!(image.dict.get(b"BitsPerComponent").unwrap().as_i64().unwrap(), 8);
        let raw = image.decompressed_content().unwrap_or_else(|_| image.content.clone());
        assert_eq!(raw.len(), 3 * 2 * 3);
        assert_eq!(&raw[..3], &[9, 8, 7]);
    }
}
