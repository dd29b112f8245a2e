use crate::core_modules::detection::DetectorOptions;
use crate::core_modules::overlay_renderer::OverlayStyle;
use crate::error::OverlayError;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration for the overlay pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Pixel size of the output canvas. Frames are stretched to fit it.
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub detector: DetectorOptions,
    pub style: OverlayStyle,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            canvas_height: 720,
            detector: DetectorOptions::default(),
            style: OverlayStyle::default(),
        }
    }
}

impl OverlayConfig {
    /// Loads a JSON config. Missing fields fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let content = fs::read_to_string(path)?;
        let config: OverlayConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(OverlayError::InvalidOption(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        self.style.validate()?;
        self.detector.validate()
    }
}
