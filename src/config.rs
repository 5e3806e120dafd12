//! Reader configuration loaded from `~/.config/readaloud/config.toml`.
//!
//! ```toml
//! [extraction]
//! method = "auto"
//!
//! [speech]
//! rate = 1.1
//! voice = "en-us"
//! program = "/usr/bin/espeak-ng"
//!
//! [playback]
//! advance_delay_ms = 300
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::content::ExtractionMethod;
use crate::playback::SpeechParams;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub extraction: ExtractionConfig,
    pub speech: SpeechConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub method: ExtractionMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    #[serde(flatten)]
    pub params: SpeechParams,
    /// Synthesizer binary; searched on `PATH` when unset.
    pub program: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Pause between chunks, in milliseconds.
    pub advance_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            advance_delay_ms: 300,
        }
    }
}

impl PlaybackConfig {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

impl ReaderConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(config_path, Path::to_path_buf);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

/// Return the path to the default config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readaloud")
        .join("config.toml")
}
