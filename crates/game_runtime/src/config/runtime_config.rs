//! # Runtime Configuration
//!
//! Settings consumed by [`crate::Runtime`] at construction: log level,
//! reference pool strict checking and game clock behavior.

use serde::{Serialize, Deserialize};

use super::{Config, ConfigError};

/// When the reference pool validates releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StrictCheckMode {
    /// Always validate
    AlwaysEnable,
    /// Validate in debug builds only
    #[default]
    OnlyEnableWhenDevelopment,
    /// Never validate
    AlwaysDisable,
}

impl StrictCheckMode {
    /// Resolve the mode for the current build
    pub fn is_enabled(self) -> bool {
        match self {
            Self::AlwaysEnable => true,
            Self::OnlyEnableWhenDevelopment => cfg!(debug_assertions),
            Self::AlwaysDisable => false,
        }
    }
}

/// # Runtime Configuration
///
/// Top-level configuration for the runtime context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Reference pool strict checking
    pub strict_check: StrictCheckMode,
    /// Initial game speed multiplier
    pub game_speed: f32,
    /// Longest real frame delta fed into a tick, in seconds
    pub max_frame_delta: Option<f32>,
}

impl RuntimeConfig {
    /// Create a new runtime configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            strict_check: StrictCheckMode::default(),
            game_speed: 1.0,
            max_frame_delta: Some(0.25),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set strict check mode
    pub fn with_strict_check(mut self, mode: StrictCheckMode) -> Self {
        self.strict_check = mode;
        self
    }

    /// Set initial game speed
    pub fn with_game_speed(mut self, speed: f32) -> Self {
        self.game_speed = speed;
        self
    }

    /// Set frame delta clamp
    pub fn with_max_frame_delta(mut self, max: Option<f32>) -> Self {
        self.max_frame_delta = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.is_empty() {
            return Err(ConfigError::Invalid("Log level cannot be empty".to_string()));
        }

        if !self.game_speed.is_finite() || self.game_speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Game speed must be finite and non-negative, got {}",
                self.game_speed
            )));
        }

        if let Some(max) = self.max_frame_delta {
            if !max.is_finite() || max <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "Max frame delta must be positive, got {}",
                    max
                )));
            }
        }

        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for RuntimeConfig {}
