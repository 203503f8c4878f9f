//! Run configuration
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! pdf_dpi = 150
//!
//! [paths]
//! template = "templates/card.layers"
//! image = "photo.png"
//!
//! [slots]
//! image_group = "photos"
//!
//! [compose]
//! default_font = "fonts/NotoSansSC-Regular.otf"
//! resample = "catmull_rom"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::renderer::ComposeConfig;

pub const DEFAULT_SENTINEL: &str = "This is a placeholder";
pub const DEFAULT_PDF_DPI: f32 = 100.0;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("pdf_dpi must be a positive number, got {0}")]
    InvalidDpi(f32),
}

/// Where inputs are read from and outputs written to
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub template: PathBuf,
    pub first_text: PathBuf,
    pub second_text: PathBuf,
    pub image: PathBuf,
    pub output_png: PathBuf,
    pub output_pdf: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            template: PathBuf::from("./template/test.layers"),
            first_text: PathBuf::from("./text/1.txt"),
            second_text: PathBuf::from("./text/2.txt"),
            image: PathBuf::from("sample_image.jpg"),
            output_png: PathBuf::from("test.png"),
            output_pdf: PathBuf::from("test.pdf"),
        }
    }
}

impl InputPaths {
    /// Resolve every relative path against `dir`
    pub fn rooted_at(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let root = |p: PathBuf| if p.is_absolute() { p } else { dir.join(p) };
        Self {
            template: root(self.template),
            first_text: root(self.first_text),
            second_text: root(self.second_text),
            image: root(self.image),
            output_png: root(self.output_png),
            output_pdf: root(self.output_pdf),
        }
    }
}

/// Names of the template layers that receive the inputs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlotNames {
    /// Group holding both the text group and the image group
    pub outer_group: String,
    pub text_group: String,
    pub first_text_layer: String,
    pub second_text_layer: String,
    /// Group whose direct placed children receive the image
    pub image_group: String,
}

impl Default for SlotNames {
    fn default() -> Self {
        Self {
            outer_group: "模板".to_string(),
            text_group: "改文本".to_string(),
            first_text_layer: "文字1".to_string(),
            second_text_layer: "文字2".to_string(),
            image_group: "改图".to_string(),
        }
    }
}

/// Everything a run needs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    pub paths: InputPaths,
    pub slots: SlotNames,
    /// Marker text identifying a placeholder template
    pub sentinel: String,
    pub pdf_dpi: f32,
    pub compose: ComposeConfig,
    /// Print the layer outline before and after substitution
    pub debug: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            paths: InputPaths::default(),
            slots: SlotNames::default(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            pdf_dpi: DEFAULT_PDF_DPI,
            compose: ComposeConfig::default(),
            debug: false,
        }
    }
}

impl FillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FillConfig = toml::from_str(content)?;
        if !(config.pdf_dpi.is_finite() && config.pdf_dpi > 0.0) {
            return Err(ConfigError::InvalidDpi(config.pdf_dpi));
        }
        Ok(config)
    }

    pub fn with_paths(mut self, paths: InputPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_slots(mut self, slots: SlotNames) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_pdf_dpi(mut self, dpi: f32) -> Self {
        self.pdf_dpi = dpi;
        self
    }

    pub fn with_compose(mut self, compose: ComposeConfig) -> Self {
        self.compose = compose;
        self
    }

    /// Enable debug outline output
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
