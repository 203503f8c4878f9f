//! User-supplied replacement values

use std::path::Path;
use std::sync::Arc;

use image::{ImageReader, RgbaImage};
use log::info;

use crate::config::InputPaths;
use crate::FillError;

/// The two text snippets and the replacement image
#[derive(Debug, Clone)]
pub struct Inputs {
    pub first_text: String,
    pub second_text: String,
    /// Shared by every placed layer it replaces
    pub image: Arc<RgbaImage>,
}

impl Inputs {
    /// Read every input. Text is trimmed of surrounding whitespace. The first
    /// failure aborts.
    pub fn load(paths: &InputPaths) -> Result<Self, FillError> {
        let first_text = read_text(&paths.first_text)?;
        let second_text = read_text(&paths.second_text)?;
        let image = read_image(&paths.image).map_err(|source| FillError::Image {
            path: paths.image.clone(),
            source,
        })?;
        info!(
            "loaded inputs: {} chars, {} chars, {}x{} image",
            first_text.chars().count(),
            second_text.chars().count(),
            image.width(),
            image.height()
        );
        Ok(Self {
            first_text,
            second_text,
            image: Arc::new(image),
        })
    }
}

fn read_text(path: &Path) -> Result<String, FillError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| FillError::MissingText {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode by content rather than by extension
fn read_image(path: &Path) -> Result<RgbaImage, image::ImageError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?.to_rgba8())
}
