//! Application configuration for [`TourGuide`](super::TourGuide).

use std::time::Duration;

use crate::config::ConfigFile;
use crate::discovery::DiscoveryConfig;
use crate::geosearch::DEFAULT_GEOSEARCH_TIMEOUT;
use crate::landmark::{DEFAULT_OVERPASS_ENDPOINT, DEFAULT_OVERPASS_TIMEOUT};
use crate::location::TrackerConfig;
use crate::narration::{DEFAULT_NARRATION_BASE_URL, DEFAULT_NARRATION_TIMEOUT};
use crate::playback::{AudioOutput, PlaybackConfig};

/// Capacity of the location event channel.
pub const DEFAULT_LOCATION_CHANNEL_CAPACITY: usize = 64;

/// Geosearch endpoint settings.
#[derive(Clone, Debug, PartialEq)]
pub struct GeosearchAppConfig {
    pub language: String,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

/// Overpass endpoint settings.
#[derive(Clone, Debug, PartialEq)]
pub struct OverpassAppConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

/// Narration backend settings.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationAppConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Language hint used when a selection does not name one.
    pub language: Option<String>,
    /// Token from the config file. Falls back to `COLOMBO_ACCESS_TOKEN`.
    pub access_token: Option<String>,
}

/// Place directory settings. Lookups are disabled when absent.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacesAppConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Top-level configuration combining every component config.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    pub discovery: DiscoveryConfig,
    pub playback: PlaybackConfig,
    /// Where narration audio is played.
    pub audio_output: AudioOutput,
    pub geosearch: GeosearchAppConfig,
    pub overpass: OverpassAppConfig,
    pub narration: NarrationAppConfig,
    pub places: Option<PlacesAppConfig>,
    pub location_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            discovery: DiscoveryConfig::default(),
            playback: PlaybackConfig::default(),
            audio_output: AudioOutput::default(),
            geosearch: GeosearchAppConfig {
                language: crate::config::DEFAULT_GEOSEARCH_LANGUAGE.to_string(),
                endpoint: None,
                timeout: DEFAULT_GEOSEARCH_TIMEOUT,
            },
            overpass: OverpassAppConfig {
                endpoint: DEFAULT_OVERPASS_ENDPOINT.to_string(),
                timeout: DEFAULT_OVERPASS_TIMEOUT,
            },
            narration: NarrationAppConfig {
                base_url: DEFAULT_NARRATION_BASE_URL.to_string(),
                timeout: DEFAULT_NARRATION_TIMEOUT,
                language: None,
                access_token: None,
            },
            places: None,
            location_channel_capacity: DEFAULT_LOCATION_CHANNEL_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Translates the loaded configuration file into component configs.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let places = match (&config.places.base_url, &config.places.api_key) {
            (Some(base_url), Some(api_key)) => Some(PlacesAppConfig {
                base_url: base_url.clone(),
                api_key: api_key.clone(),
            }),
            _ => None,
        };

        Self {
            tracker: TrackerConfig::default()
                .with_movement_threshold(config.location.movement_threshold_m)
                .with_min_fetch_interval(Duration::from_millis(
                    config.location.min_fetch_interval_ms,
                )),
            discovery: DiscoveryConfig::default()
                .with_search_radius(config.discovery.search_radius_m)
                .with_article_radius(config.discovery.article_radius_m)
                .with_enrichment_concurrency(config.discovery.enrichment_concurrency)
                .with_category(config.discovery.category),
            playback: PlaybackConfig::default()
                .with_sample_interval(Duration::from_millis(config.playback.sample_interval_ms))
                .with_default_rate(config.playback.default_rate),
            audio_output: config.playback.output,
            geosearch: GeosearchAppConfig {
                language: config.geosearch.language.clone(),
                endpoint: config.geosearch.endpoint.clone(),
                timeout: Duration::from_secs(config.geosearch.timeout_secs),
            },
            overpass: OverpassAppConfig {
                endpoint: config.overpass.endpoint.clone(),
                timeout: Duration::from_secs(config.overpass.timeout_secs),
            },
            narration: NarrationAppConfig {
                base_url: config.narration.base_url.clone(),
                timeout: Duration::from_secs(config.narration.timeout_secs),
                language: config.narration.language.clone(),
                access_token: config.narration.access_token.clone(),
            },
            places,
            location_channel_capacity: DEFAULT_LOCATION_CHANNEL_CAPACITY,
        }
    }

    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_audio_output(mut self, output: AudioOutput) -> Self {
        self.audio_output = output;
        self
    }

    /// Sets the default narration language.
    pub fn with_narration_language(mut self, language: impl Into<String>) -> Self {
        self.narration.language = Some(language.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::PoiCategory;

    #[test]
    fn test_default_matches_config_file_default() {
        let from_file = AppConfig::from_config_file(&ConfigFile::default());
        assert_eq!(from_file, AppConfig::default());
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.location.movement_threshold_m = 12.0;
        file.location.min_fetch_interval_ms = 2500;
        file.discovery.category = PoiCategory::Any;
        file.playback.default_rate = 1.5;
        file.playback.output = AudioOutput::Silent;
        file.narration.language = Some("fr".to_string());

        let config = AppConfig::from_config_file(&file);
        assert_eq!(config.tracker.movement_threshold_meters, 12.0);
        assert_eq!(config.tracker.min_fetch_interval, Duration::from_millis(2500));
        assert_eq!(config.discovery.category, PoiCategory::Any);
        assert_eq!(config.playback.default_rate, 1.5);
        assert_eq!(config.audio_output, AudioOutput::Silent);
        assert_eq!(config.narration.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_places_needs_url_and_key() {
        let mut file = ConfigFile::default();
        file.places.base_url = Some("https://db.example.com".to_string());
        assert!(AppConfig::from_config_file(&file).places.is_none());

        file.places.api_key = Some("anon".to_string());
        let places = AppConfig::from_config_file(&file).places.unwrap();
        assert_eq!(places.base_url, "https://db.example.com");
    }
}
