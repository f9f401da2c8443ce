// Application configuration: optional TOML file plus environment overrides
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::tables::TableSettings;
use crate::types::{PickerError, Result};

pub const CONFIG_FILE_NAME: &str = "tablepicker.toml";
pub const PDFIUM_PATH_ENV: &str = "TABLEPICKER_PDFIUM_PATH";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub window: WindowConfig,
    pub tables: TableSettings,
    pub pdfium_library_path: Option<PathBuf>,
}

/// Preview rendering and overlay geometry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub dpi: f32,
    pub border: f32,
    pub handle_radius: f32,
    pub max_canvas_width: f32,
    pub max_canvas_height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 200.0,
            border: 60.0,
            handle_radius: 12.0,
            max_canvas_width: 1200.0,
            max_canvas_height: 1400.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "PDF Table Selector and Exporter".to_string(),
            width: 1500.0,
            height: 1100.0,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// An explicit path must exist; otherwise the working directory and the
    /// user config directory are tried before falling back to defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                info!("Using config {}", candidate.display());
                return Self::load(&candidate);
            }
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.render.dpi > 0.0) {
            return Err(PickerError::Config(format!("render.dpi must be positive, got {}", self.render.dpi)));
        }
        // The preview is padded by whole pixels, so the overlay offset must be too
        if !(self.render.border >= 0.0) || self.render.border.fract() != 0.0 {
            return Err(PickerError::Config(format!(
                "render.border must be a whole number of pixels, got {}",
                self.render.border
            )));
        }
        if !(self.render.handle_radius > 0.0) {
            return Err(PickerError::Config(format!(
                "render.handle_radius must be positive, got {}",
                self.render.handle_radius
            )));
        }
        self.tables.validate()
    }

    /// Directory holding the pdfium shared library.
    pub fn pdfium_library_path(&self) -> PathBuf {
        env::var(PDFIUM_PATH_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| self.pdfium_library_path.clone())
            .unwrap_or_else(|| PathBuf::from("./lib"))
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("tablepicker").join("config.toml"));
    }
    locations
}
