//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReframeError, ReframeResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReframeConfig {
    /// Motion detection parameters.
    #[serde(default)]
    pub detection: DetectionDefaults,

    /// Viewport tracking parameters.
    #[serde(default)]
    pub tracking: TrackingDefaults,

    /// Frame source sampling parameters.
    #[serde(default)]
    pub sampling: SamplingDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default motion detection parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionDefaults {
    /// Brightness difference a pixel must exceed to count as motion.
    pub threshold: u8,

    /// Contours enclosing this many pixels or fewer are dropped as noise.
    pub min_area: u32,
}

/// Default viewport tracking parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackingDefaults {
    /// Weight of the current frame's region of interest, in (0, 1].
    pub smoothing_factor: f64,

    /// Viewport width in pixels.
    pub viewport_width: u32,

    /// Viewport height in pixels.
    pub viewport_height: u32,
}

/// Default frame sampling parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplingDefaults {
    /// Frame rate of the source image sequence.
    pub source_fps: f64,

    /// Frame rate to analyze at.
    pub target_fps: f64,

    /// Width every frame is resized to.
    pub width: u32,

    /// Height every frame is resized to.
    pub height: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reframe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for DetectionDefaults {
    fn default() -> Self {
        Self {
            threshold: 25,
            min_area: 100,
        }
    }
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.3,
            viewport_width: 640,
            viewport_height: 360,
        }
    }
}

impl Default for SamplingDefaults {
    fn default() -> Self {
        Self {
            source_fps: 30.0,
            target_fps: 5.0,
            width: 1280,
            height: 720,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl ReframeConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ReframeResult<()> {
        if self.detection.min_area == 0 {
            return Err(ReframeError::config("detection.min_area must be positive"));
        }

        let factor = self.tracking.smoothing_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ReframeError::config(format!(
                "tracking.smoothing_factor must be in (0, 1], got {factor}"
            )));
        }

        if self.tracking.viewport_width == 0 || self.tracking.viewport_height == 0 {
            return Err(ReframeError::config("tracking viewport must be non-empty"));
        }

        if self.tracking.viewport_width > self.sampling.width
            || self.tracking.viewport_height > self.sampling.height
        {
            return Err(ReframeError::config(format!(
                "viewport {}x{} does not fit in frames of {}x{}",
                self.tracking.viewport_width,
                self.tracking.viewport_height,
                self.sampling.width,
                self.sampling.height
            )));
        }

        if self.sampling.source_fps <= 0.0 || self.sampling.target_fps <= 0.0 {
            return Err(ReframeError::config("sampling rates must be positive"));
        }

        if self.sampling.width == 0 || self.sampling.height == 0 {
            return Err(ReframeError::config("sampling resolution must be non-empty"));
        }

        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reframe").join("config.json")
}
