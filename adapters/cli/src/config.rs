//! TOML configuration for the command-line session.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use ferry_crossing_core::StageCeilings;
use ferry_crossing_world::Config as WorldConfig;
use serde::Deserialize;

use crate::gemini::DEFAULT_API_BASE;

const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_SAMPLE_RATE: u32 = 48_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings read from the configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    /// Countdown ceilings in seconds.
    pub(crate) stages: StageCeilings,
    pub(crate) narration: NarrationConfig,
    pub(crate) audio: AudioConfig,
}

/// Speech backend settings and the outcome lines the world narrates.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct NarrationConfig {
    /// Environment variable holding the speech API key.
    pub(crate) api_key_env: String,
    /// Speech model identifier.
    pub(crate) model: String,
    /// Endpoint root the model path is appended to.
    pub(crate) api_base: String,
    /// Seconds before a speech request is abandoned.
    pub(crate) request_timeout_secs: u64,
    pub(crate) success_line: Option<String>,
    pub(crate) failure_line: Option<String>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_owned(),
            model: DEFAULT_SPEECH_MODEL.to_owned(),
            api_base: DEFAULT_API_BASE.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            success_line: None,
            failure_line: None,
        }
    }
}

/// Output settings for the offline device.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AudioConfig {
    pub(crate) sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl AppConfig {
    /// Loads the configuration at `path`; a missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                log::info!("no configuration at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read configuration {}", path.display()))
            }
        };
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse configuration toml contents")?;
        for (name, seconds) in [
            ("stage1", config.stages.stage1),
            ("stage2", config.stages.stage2),
            ("stage3", config.stages.stage3),
        ] {
            if !seconds.is_finite() || seconds <= 0.0 {
                bail!("stage ceiling `{name}` must be a positive number of seconds, got {seconds}");
            }
        }
        if config.narration.request_timeout_secs == 0 {
            bail!("narration request timeout must be at least one second");
        }
        if config.audio.sample_rate == 0 {
            bail!("audio sample rate must be non-zero");
        }
        Ok(config)
    }

    /// World configuration with any overridden narration lines applied.
    pub(crate) fn world_config(&self) -> WorldConfig {
        let defaults = WorldConfig::default().with_ceilings(self.stages);
        let success = self
            .narration
            .success_line
            .clone()
            .unwrap_or_else(|| defaults.success_line().to_owned());
        let failure = self
            .narration
            .failure_line
            .clone()
            .unwrap_or_else(|| defaults.failure_line().to_owned());
        WorldConfig::new(self.stages, success, failure)
    }
}

/// Default configuration path next to the working directory.
pub(crate) fn default_path() -> PathBuf {
    PathBuf::from("ferry-crossing.toml")
}
