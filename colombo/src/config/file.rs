//! INI configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::keys::ConfigKey;
use crate::discovery::{
    DEFAULT_ARTICLE_RADIUS_METERS, DEFAULT_ENRICHMENT_CONCURRENCY, DEFAULT_SEARCH_RADIUS_METERS,
};
use crate::geosearch::DEFAULT_GEOSEARCH_TIMEOUT;
use crate::landmark::{PoiCategory, DEFAULT_OVERPASS_ENDPOINT, DEFAULT_OVERPASS_TIMEOUT};
use crate::location::{DEFAULT_MIN_FETCH_INTERVAL, DEFAULT_MOVEMENT_THRESHOLD_METERS};
use crate::narration::{DEFAULT_NARRATION_BASE_URL, DEFAULT_NARRATION_TIMEOUT};
use crate::playback::{AudioOutput, DEFAULT_PLAYBACK_RATE, DEFAULT_SAMPLE_INTERVAL};

/// Application directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "colombo";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default Wikipedia language edition.
pub const DEFAULT_GEOSEARCH_LANGUAGE: &str = "en";

/// Default log level when neither the file nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Returns `~/.config/colombo/config.ini` (platform equivalent).
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub movement_threshold_m: f64,
    pub min_fetch_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub search_radius_m: f64,
    pub article_radius_m: f64,
    pub enrichment_concurrency: usize,
    pub category: PoiCategory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeosearchSettings {
    pub language: String,
    /// Overrides the `https://{language}.wikipedia.org/w/api.php` endpoint.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverpassSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub language: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacesSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub sample_interval_ms: u64,
    pub default_rate: f64,
    pub output: AudioOutput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Directory for daily log files. Console only when unset.
    pub directory: Option<PathBuf>,
}

/// Contents of `config.ini`. Every key is optional; missing keys keep
/// their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub location: LocationSettings,
    pub discovery: DiscoverySettings,
    pub geosearch: GeosearchSettings,
    pub overpass: OverpassSettings,
    pub narration: NarrationSettings,
    pub places: PlacesSettings,
    pub playback: PlaybackSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            location: LocationSettings {
                movement_threshold_m: DEFAULT_MOVEMENT_THRESHOLD_METERS,
                min_fetch_interval_ms: DEFAULT_MIN_FETCH_INTERVAL.as_millis() as u64,
            },
            discovery: DiscoverySettings {
                search_radius_m: DEFAULT_SEARCH_RADIUS_METERS,
                article_radius_m: DEFAULT_ARTICLE_RADIUS_METERS,
                enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
                category: PoiCategory::Landmark,
            },
            geosearch: GeosearchSettings {
                language: DEFAULT_GEOSEARCH_LANGUAGE.to_string(),
                endpoint: None,
                timeout_secs: DEFAULT_GEOSEARCH_TIMEOUT.as_secs(),
            },
            overpass: OverpassSettings {
                endpoint: DEFAULT_OVERPASS_ENDPOINT.to_string(),
                timeout_secs: DEFAULT_OVERPASS_TIMEOUT.as_secs(),
            },
            narration: NarrationSettings {
                base_url: DEFAULT_NARRATION_BASE_URL.to_string(),
                timeout_secs: DEFAULT_NARRATION_TIMEOUT.as_secs(),
                language: None,
                access_token: None,
            },
            places: PlacesSettings::default(),
            playback: PlaybackSettings {
                sample_interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
                default_rate: DEFAULT_PLAYBACK_RATE,
                output: AudioOutput::default(),
            },
            logging: LoggingSettings {
                level: DEFAULT_LOG_LEVEL.to_string(),
                directory: None,
            },
        }
    }
}

impl ConfigFile {
    /// Loads the file at [`config_file_path`]. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse(parse.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Renders every setting, including defaults, as INI.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }

    /// Writes the file to [`config_file_path`], creating its directory.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        tracing::info!(path = %path.display(), "Config file written");
        Ok(())
    }
}
