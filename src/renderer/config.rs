//! Configuration for composition

use std::path::PathBuf;

use image::imageops::FilterType;
use serde::Deserialize;

/// Filter used when an embedded bitmap is resampled into its placement box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resample {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl Resample {
    pub fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Configuration options for the compositor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Font used by text layers that do not name their own
    pub default_font: Option<PathBuf>,

    /// Resampling filter for placed layers
    pub resample: Resample,
}

impl ComposeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback font file
    pub fn with_default_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_font = Some(path.into());
        self
    }

    /// Set the resampling filter
    pub fn with_resample(mut self, resample: Resample) -> Self {
        self.resample = resample;
        self
    }
}
