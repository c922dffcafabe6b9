//! Engine configuration
//!
//! Session defaults and interaction thresholds. Configuration can be loaded
//! from a JSON file, from environment variables, or built programmatically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::{AnnotationStyle, AnnotationType};

/// Tunable settings for a [`Session`](crate::session::Session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attribution written into every new annotation
    pub user_id: String,
    /// Tool active when a session starts
    pub default_tool: AnnotationType,
    /// Style active when a session starts
    pub default_style: AnnotationStyle,
    /// Maximum snapshots kept per document; `None` keeps everything
    pub history_limit: Option<usize>,
    /// Offset applied to both axes on paste, document units
    pub paste_offset: f64,
    /// Smallest hit radius, screen pixels
    pub min_tap_target_px: f64,
    /// Two-point drafts shorter than this are discarded, document units
    pub min_shape_distance: f64,
    /// Resize handle edge length, screen pixels
    pub handle_size_px: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_id: "current-user".to_string(),
            default_tool: AnnotationType::Freehand,
            default_style: AnnotationStyle::new(),
            history_limit: None,
            paste_offset: 20.0,
            min_tap_target_px: 8.0,
            min_shape_distance: 2.0,
            handle_size_px: 6.0,
        }
    }
}

impl EngineConfig {
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_default_tool(mut self, tool: AnnotationType) -> Self {
        self.default_tool = tool;
        self
    }

    pub fn with_default_style(mut self, style: AnnotationStyle) -> Self {
        self.default_style = style;
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_paste_offset(mut self, offset: f64) -> Self {
        self.paste_offset = offset;
        self
    }

    pub fn with_min_tap_target_px(mut self, px: f64) -> Self {
        self.min_tap_target_px = px;
        self
    }

    pub fn with_min_shape_distance(mut self, distance: f64) -> Self {
        self.min_shape_distance = distance;
        self
    }

    pub fn with_handle_size_px(mut self, px: f64) -> Self {
        self.handle_size_px = px;
        self
    }

    /// Returns the default config file location for the current platform.
    ///
    /// - macOS: ~/Library/Application Support/inkpage/config.json
    /// - Linux: ~/.config/inkpage/config.json
    /// - Windows: %APPDATA%\inkpage\config.json
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("inkpage").join("config.json"),
            None => PathBuf::from("inkpage.json"),
        }
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - `INKPAGE_USER_ID`: attribution string
    /// - `INKPAGE_HISTORY_LIMIT`: maximum snapshots per document (`0` = unlimited)
    /// - `INKPAGE_PASTE_OFFSET`: paste offset in document units
    /// - `INKPAGE_MIN_TAP_PX`: minimum hit radius in screen pixels
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Applies environment overrides to an existing configuration
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("INKPAGE_USER_ID") {
            let val = val.trim();
            if val.is_empty() {
                return Err(ConfigError::InvalidValue("INKPAGE_USER_ID".to_string()));
            }
            self.user_id = val.to_string();
        }

        if let Ok(val) = std::env::var("INKPAGE_HISTORY_LIMIT") {
            let limit = val
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue("INKPAGE_HISTORY_LIMIT".to_string()))?;
            self.history_limit = (limit > 0).then_some(limit);
        }

        if let Ok(val) = std::env::var("INKPAGE_PASTE_OFFSET") {
            self.paste_offset = parse_positive(&val, "INKPAGE_PASTE_OFFSET")?;
        }

        if let Ok(val) = std::env::var("INKPAGE_MIN_TAP_PX") {
            self.min_tap_target_px = parse_positive(&val, "INKPAGE_MIN_TAP_PX")?;
        }

        Ok(self)
    }

    /// Loads configuration from a JSON file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or holds invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration as pretty-printed JSON, creating parent directories.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Rejects values that would make the engine misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("user_id".to_string()));
        }
        if self.default_style.validate().is_err() {
            return Err(ConfigError::InvalidValue("default_style".to_string()));
        }
        let positive = [
            ("paste_offset", self.paste_offset),
            ("min_tap_target_px", self.min_tap_target_px),
            ("handle_size_px", self.handle_size_px),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue(key.to_string()));
            }
        }
        if !(self.min_shape_distance.is_finite() && self.min_shape_distance >= 0.0) {
            return Err(ConfigError::InvalidValue("min_shape_distance".to_string()));
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::InvalidValue("history_limit".to_string()));
        }
        Ok(())
    }
}

fn parse_positive(val: &str, key: &str) -> Result<f64, ConfigError> {
    match val.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}
