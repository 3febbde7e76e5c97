//! # Podmix Common Library
//!
//! Shared code for the podcast mixing engine and its tools:
//! - Mixing settings (serializable, every field defaulted)
//! - Settings file loading and path resolution
//! - Fade curve definitions and calculations
//! - Common error type

pub mod config;
pub mod error;
pub mod fade_curves;
pub mod settings;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use settings::MixingSettings;
