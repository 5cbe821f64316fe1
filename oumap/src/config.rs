//! Tool configuration stored in `oumap.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::FilterError;
use crate::geo::Viewport;

pub const DEFAULT_CONFIG_FILE: &str = "oumap.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OumapConfig {
    #[serde(default)]
    pub hours: HoursSettings,
    #[serde(default)]
    pub viewport: ViewportSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursSettings {
    /// Offset of the site's local time from UTC, used to evaluate `open_now`.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    /// Extra room around the markers as a fraction of the bounds.
    #[serde(default)]
    pub padding: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_zoom: default_max_zoom(),
            padding: 0.0,
        }
    }
}

impl ViewportSettings {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_max_zoom() -> u8 {
    18
}

impl OumapConfig {
    pub fn from_toml(content: &str) -> Result<Self, FilterError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `oumap.toml` in `dir` is used when present,
    /// otherwise defaults apply.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, FilterError> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    debug!("no {} in {}, using defaults", DEFAULT_CONFIG_FILE, dir.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        debug!("loading config from {}", path.display());
        Self::from_toml(&fs::read_to_string(&path)?)
    }

    fn validate(&self) -> Result<(), FilterError> {
        if self.hours.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(FilterError::invalid_request(format!(
                "hours.utc_offset_minutes must be within ±1439, got {}",
                self.hours.utc_offset_minutes
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(FilterError::invalid_request("viewport width and height must be positive"));
        }
        if !(0.0..=10.0).contains(&self.viewport.padding) {
            return Err(FilterError::invalid_request(format!(
                "viewport.padding must be between 0 and 10, got {}",
                self.viewport.padding
            )));
        }
        Ok(())
    }
}
