//! Compositor turning a layer tree into a flat raster
//!
//! Layers are painted bottom to top with straight-alpha blending. Groups are
//! composed in isolation and then blended into their parent.

pub mod blend;
pub mod config;
mod raster;
pub mod text;

pub use config::{ComposeConfig, Resample};
pub use raster::Compositor;
