//! Editor tuning: rim-zone width and the half-zone split point.
//!
//! Values are deterministic given defaults, an optional JSON document, and
//! environment overrides. Every constructor validates before returning.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the container rim band (`0 < x < 0.5`).
pub const ENV_RIM_FRACTION: &str = "PAGECRAFT_RIM_FRACTION";
/// Environment variable overriding the leaf before/after split (`0 < x < 1`).
pub const ENV_HALF_SPLIT: &str = "PAGECRAFT_HALF_SPLIT";

/// Default rim band: the outer 10% of a container at each edge.
pub const DEFAULT_RIM_FRACTION: f32 = 0.10;
/// Default half-zone split: the midpoint of a leaf.
pub const DEFAULT_HALF_SPLIT: f32 = 0.5;

/// Placement tuning shared by the resolver and the drag session.
///
/// Fields are private so every instance in circulation has passed
/// [`EditorConfig::validate`]; deserialization validates too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEditorConfig")]
pub struct EditorConfig {
    rim_fraction: f32,
    half_split: f32,
}

/// Unvalidated wire form of [`EditorConfig`].
#[derive(Deserialize)]
#[serde(default)]
struct RawEditorConfig {
    rim_fraction: f32,
    half_split: f32,
}

impl Default for RawEditorConfig {
    fn default() -> Self {
        Self {
            rim_fraction: DEFAULT_RIM_FRACTION,
            half_split: DEFAULT_HALF_SPLIT,
        }
    }
}

impl TryFrom<RawEditorConfig> for EditorConfig {
    type Error = ConfigError;

    fn try_from(raw: RawEditorConfig) -> Result<Self, Self::Error> {
        Self::new(raw.rim_fraction, raw.half_split)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            rim_fraction: DEFAULT_RIM_FRACTION,
            half_split: DEFAULT_HALF_SPLIT,
        }
    }
}

impl EditorConfig {
    /// Build a validated config.
    pub fn new(rim_fraction: f32, half_split: f32) -> Result<Self, ConfigError> {
        let config = Self {
            rim_fraction,
            half_split,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fraction of a container's extent, at each edge, that counts as rim.
    #[must_use]
    pub const fn rim_fraction(self) -> f32 {
        self.rim_fraction
    }

    /// Pointer fraction at or past which a leaf drop lands after the leaf.
    #[must_use]
    pub const fn half_split(self) -> f32 {
        self.half_split
    }

    /// Validate ranges.
    pub fn validate(self) -> Result<(), ConfigError> {
        if !(self.rim_fraction > 0.0 && self.rim_fraction < 0.5) {
            return Err(ConfigError::RimFractionOutOfRange {
                value: self.rim_fraction,
            });
        }
        if !(self.half_split > 0.0 && self.half_split < 1.0) {
            return Err(ConfigError::HalfSplitOutOfRange {
                value: self.half_split,
            });
        }
        Ok(())
    }

    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from a custom environment lookup (for tests).
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_env_overrides(get_env)
    }

    /// Parse a JSON config document; missing fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawEditorConfig =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::try_from(raw)
    }

    /// Apply environment overrides on top of `self`.
    pub fn with_env_overrides<F>(mut self, get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_env_f32(&get_env, ENV_RIM_FRACTION)? {
            tracing::trace!(message = "config.env_override", key = ENV_RIM_FRACTION, value);
            self.rim_fraction = value;
        }
        if let Some(value) = parse_env_f32(&get_env, ENV_HALF_SPLIT)? {
            tracing::trace!(message = "config.env_override", key = ENV_HALF_SPLIT, value);
            self.half_split = value;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_env_f32<F>(get_env: &F, key: &'static str) -> Result<Option<f32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get_env(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f32>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnvValue { key, value: raw })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    RimFractionOutOfRange { value: f32 },
    HalfSplitOutOfRange { value: f32 },
    InvalidEnvValue { key: &'static str, value: String },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RimFractionOutOfRange { value } => {
                write!(f, "rim_fraction {value} must be within (0, 0.5)")
            }
            Self::HalfSplitOutOfRange { value } => {
                write!(f, "half_split {value} must be within (0, 1)")
            }
            Self::InvalidEnvValue { key, value } => {
                write!(f, "{key}={value:?} is not a number")
            }
            Self::Parse(msg) => write!(f, "invalid editor config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
