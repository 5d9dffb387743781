/// Widget configuration: timing, fallback copy and normalization mode.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::resolver::Normalization;
use crate::core::reveal::CURSOR_CLASS;

/// Shortest inter-word delay the reveal accepts.
pub const MIN_TICK_MS: u64 = 50;
/// Longest inter-word delay the reveal accepts.
pub const MAX_TICK_MS: u64 = 74;

pub const DEFAULT_FALLBACK_TEXT: &str = "I dunno mate. Did you try turning it on and off again?";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Delay between revealed words, in milliseconds.
    pub tick_interval_ms: u64,
    /// Text of the answer given when no keyword matches.
    pub fallback_text: String,
    pub normalization: Normalization,
    /// Class of the trailing in-progress marker.
    pub cursor_class: String,
    /// Class marking the tutorial placeholder in the answer area.
    pub placeholder_class: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: MIN_TICK_MS,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            normalization: Normalization::default(),
            cursor_class: CURSOR_CLASS.to_string(),
            placeholder_class: "chat-placeholder".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Load a config from a RON file. Missing fields take their defaults.
    pub fn load_from_ron(path: &Path) -> Result<WidgetConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<WidgetConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// The inter-word delay, clamped into the supported range.
    pub fn tick_interval(&self) -> Duration {
        let ms = self.tick_interval_ms.clamp(MIN_TICK_MS, MAX_TICK_MS);
        if ms != self.tick_interval_ms {
            tracing::warn!(
                requested = self.tick_interval_ms,
                used = ms,
                "tick interval out of range, clamping"
            );
        }
        Duration::from_millis(ms)
    }
}
