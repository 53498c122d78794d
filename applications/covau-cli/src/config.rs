/// CLI configuration
use anyhow::Context;
use covau_queue::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "covau.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Where the ids of the persisted queue are kept between runs
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub player: PlayerSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerSettings {
    /// How long the simulated player takes to finish a track
    #[serde(default = "default_track_millis")]
    pub track_millis: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            track_millis: default_track_millis(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `covau.toml` is read if present.
    /// `COVAU_*` variables override both, with `__` separating sections
    /// (`COVAU_QUEUE__AUTOPLAY=false`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("COVAU")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

fn default_database_url() -> String {
    "sqlite://covau.db".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("covau-state.json")
}

fn default_log_filter() -> String {
    "covau_cli=info,covau_queue=info,covau_storage=warn".to_string()
}

fn default_track_millis() -> u64 {
    2000
}
