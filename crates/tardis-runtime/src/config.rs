#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! Every tunable of the engine lives in one [`TardisConfig`] that can be
//! loaded from TOML or JSON at startup (feature `config-file`).
//!
//! # Loading
//!
//! ```toml
//! # tardis.toml
//! debounce_ms = 250
//! tooltip_radius = 6.0
//! viewport_width = 1280.0
//! sibling_seed = "snap_to_pick"
//! ```
//!
//! ```rust,ignore
//! let config = TardisConfig::load_validated("tardis.toml")?;
//! let config = TardisConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Missing keys fall back to [`TardisConfig::default`], so a partial file
//! only overrides what it names.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use tardis_core::Pixel;

use crate::range::SiblingSeed;

/// Upper bound accepted for `debounce_ms`.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Tunables of the Tardis engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct TardisConfig {
    /// Quiet period before the pointer focus reaches the tooltip.
    pub debounce_ms: u64,

    /// Pixel radius (inclusive) for revisions near the tooltip focus.
    pub tooltip_radius: Pixel,

    /// Chart width the time scale is fitted to.
    pub viewport_width: Pixel,

    /// Whether a pick seeds an absent sibling handle.
    pub sibling_seed: SiblingSeed,
}

impl Default for TardisConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            tooltip_radius: 5.0,
            viewport_width: 800.0,
            sibling_seed: SiblingSeed::LeaveAbsent,
        }
    }
}

impl TardisConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load a file (JSON when the extension is `.json`, TOML otherwise) and
    /// reject it unless it validates.
    #[cfg(feature = "config-file")]
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        config.validated()
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.tooltip_radius.is_finite() || self.tooltip_radius < 0.0 {
            errors.push(format!(
                "tooltip_radius must be finite and >= 0, got {}",
                self.tooltip_radius
            ));
        }

        if !self.viewport_width.is_finite() || self.viewport_width <= 0.0 {
            errors.push(format!(
                "viewport_width must be finite and > 0, got {}",
                self.viewport_width
            ));
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            errors.push(format!(
                "debounce_ms must be <= {MAX_DEBOUNCE_MS}, got {}",
                self.debounce_ms
            ));
        }

        errors
    }

    /// `self` if it validates, otherwise every violation at once.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Format as a JSONL line for structured logging.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let seed = match self.sibling_seed {
            SiblingSeed::LeaveAbsent => "leave_absent",
            SiblingSeed::SnapToPick => "snap_to_pick",
        };
        format!(
            r#"{{"schema":"tardis-config-v1","debounce_ms":{},"tooltip_radius":{},"viewport_width":{},"sibling_seed":"{}"}}"#,
            self.debounce_ms, self.tooltip_radius, self.viewport_width, seed,
        )
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
