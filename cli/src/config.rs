//! CLI configuration.
//!
//! Read from `~/.prospect/config.toml`, with the `PROSPECT_API_BASE`
//! environment variable overriding the configured service address. Missing
//! or unreadable config falls back to defaults; a present-but-invalid file
//! is reported and otherwise ignored.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use prospect_engine::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    poll_interval_secs: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    pub api_base: String,
    pub poll_interval: Duration,
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".prospect").join("config.toml"))
    }

    pub fn load() -> Self {
        let file = Self::path()
            .and_then(|path| std::fs::read_to_string(&path).ok().map(|text| (path, text)))
            .and_then(|(path, text)| match toml::from_str::<ConfigFile>(&text) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "ignoring invalid config file");
                    None
                }
            })
            .unwrap_or_default();
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Self {
        let api_base = std::env::var("PROSPECT_API_BASE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        let poll_interval = file
            .poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        Self {
            api_base,
            poll_interval,
        }
    }
}
