//! Addressable configuration keys.
//!
//! Every setting in [`ConfigFile`] has a [`ConfigKey`] in `section.key` form
//! (e.g. `location.movement_threshold_m`). Keys drive both INI parsing and
//! the CLI's `config get`/`config set` commands, so validation lives here
//! once.

use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigError, ConfigFile};
use crate::landmark::PoiCategory;
use crate::playback::{is_valid_rate, AudioOutput, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    LocationMovementThreshold,
    LocationMinFetchInterval,
    DiscoverySearchRadius,
    DiscoveryArticleRadius,
    DiscoveryEnrichmentConcurrency,
    DiscoveryCategory,
    GeosearchLanguage,
    GeosearchEndpoint,
    GeosearchTimeout,
    OverpassEndpoint,
    OverpassTimeout,
    NarrationBaseUrl,
    NarrationTimeout,
    NarrationLanguage,
    NarrationAccessToken,
    PlacesBaseUrl,
    PlacesApiKey,
    PlaybackSampleInterval,
    PlaybackDefaultRate,
    PlaybackOutput,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        use ConfigKey::*;
        &[
            LocationMovementThreshold,
            LocationMinFetchInterval,
            DiscoverySearchRadius,
            DiscoveryArticleRadius,
            DiscoveryEnrichmentConcurrency,
            DiscoveryCategory,
            GeosearchLanguage,
            GeosearchEndpoint,
            GeosearchTimeout,
            OverpassEndpoint,
            OverpassTimeout,
            NarrationBaseUrl,
            NarrationTimeout,
            NarrationLanguage,
            NarrationAccessToken,
            PlacesBaseUrl,
            PlacesApiKey,
            PlaybackSampleInterval,
            PlaybackDefaultRate,
            PlaybackOutput,
            LoggingLevel,
            LoggingDirectory,
        ]
    }

    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            LocationMovementThreshold | LocationMinFetchInterval => "location",
            DiscoverySearchRadius
            | DiscoveryArticleRadius
            | DiscoveryEnrichmentConcurrency
            | DiscoveryCategory => "discovery",
            GeosearchLanguage | GeosearchEndpoint | GeosearchTimeout => "geosearch",
            OverpassEndpoint | OverpassTimeout => "overpass",
            NarrationBaseUrl | NarrationTimeout | NarrationLanguage | NarrationAccessToken => {
                "narration"
            }
            PlacesBaseUrl | PlacesApiKey => "places",
            PlaybackSampleInterval | PlaybackDefaultRate | PlaybackOutput => "playback",
            LoggingLevel | LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            LocationMovementThreshold => "movement_threshold_m",
            LocationMinFetchInterval => "min_fetch_interval_ms",
            DiscoverySearchRadius => "search_radius_m",
            DiscoveryArticleRadius => "article_radius_m",
            DiscoveryEnrichmentConcurrency => "enrichment_concurrency",
            DiscoveryCategory => "category",
            GeosearchLanguage => "language",
            GeosearchEndpoint => "endpoint",
            GeosearchTimeout => "timeout_secs",
            OverpassEndpoint => "endpoint",
            OverpassTimeout => "timeout_secs",
            NarrationBaseUrl => "base_url",
            NarrationTimeout => "timeout_secs",
            NarrationLanguage => "language",
            NarrationAccessToken => "access_token",
            PlacesBaseUrl => "base_url",
            PlacesApiKey => "api_key",
            PlaybackSampleInterval => "sample_interval_ms",
            PlaybackDefaultRate => "default_rate",
            PlaybackOutput => "output",
            LoggingLevel => "level",
            LoggingDirectory => "directory",
        }
    }

    /// Full name in `section.key` form.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Whether the value is a credential and should not be echoed.
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            ConfigKey::NarrationAccessToken | ConfigKey::PlacesApiKey
        )
    }

    /// Current value as a string. Unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        match self {
            LocationMovementThreshold => config.location.movement_threshold_m.to_string(),
            LocationMinFetchInterval => config.location.min_fetch_interval_ms.to_string(),
            DiscoverySearchRadius => config.discovery.search_radius_m.to_string(),
            DiscoveryArticleRadius => config.discovery.article_radius_m.to_string(),
            DiscoveryEnrichmentConcurrency => config.discovery.enrichment_concurrency.to_string(),
            DiscoveryCategory => config.discovery.category.to_string(),
            GeosearchLanguage => config.geosearch.language.clone(),
            GeosearchEndpoint => config.geosearch.endpoint.clone().unwrap_or_default(),
            GeosearchTimeout => config.geosearch.timeout_secs.to_string(),
            OverpassEndpoint => config.overpass.endpoint.clone(),
            OverpassTimeout => config.overpass.timeout_secs.to_string(),
            NarrationBaseUrl => config.narration.base_url.clone(),
            NarrationTimeout => config.narration.timeout_secs.to_string(),
            NarrationLanguage => config.narration.language.clone().unwrap_or_default(),
            NarrationAccessToken => config.narration.access_token.clone().unwrap_or_default(),
            PlacesBaseUrl => config.places.base_url.clone().unwrap_or_default(),
            PlacesApiKey => config.places.api_key.clone().unwrap_or_default(),
            PlaybackSampleInterval => config.playback.sample_interval_ms.to_string(),
            PlaybackDefaultRate => config.playback.default_rate.to_string(),
            PlaybackOutput => config.playback.output.to_string(),
            LoggingLevel => config.logging.level.clone(),
            LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validates and stores `value`. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            section: self.section(),
            key: self.key_name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            LocationMovementThreshold => {
                config.location.movement_threshold_m =
                    parse_f64(value, 0.0, f64::MAX).ok_or_else(|| {
                        invalid("expected a non-negative distance in meters")
                    })?;
            }
            LocationMinFetchInterval => {
                config.location.min_fetch_interval_ms = value
                    .parse()
                    .map_err(|_| invalid("expected milliseconds"))?;
            }
            DiscoverySearchRadius => {
                let radius = parse_f64(value, 0.0, f64::MAX)
                    .filter(|r| *r > 0.0)
                    .ok_or_else(|| invalid("expected a positive distance in meters"))?;
                config.discovery.search_radius_m = radius;
            }
            DiscoveryArticleRadius => {
                config.discovery.article_radius_m = parse_f64(value, 10.0, 10_000.0)
                    .ok_or_else(|| invalid("must be between 10 and 10000 meters"))?;
            }
            DiscoveryEnrichmentConcurrency => {
                config.discovery.enrichment_concurrency = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=32).contains(n))
                    .ok_or_else(|| invalid("must be between 1 and 32"))?;
            }
            DiscoveryCategory => {
                config.discovery.category = PoiCategory::from_config_str(value)
                    .ok_or_else(|| invalid("expected landmark, museum or any"))?;
            }
            GeosearchLanguage => {
                if !is_language_code(value) {
                    return Err(invalid("expected a language code such as 'en'"));
                }
                config.geosearch.language = value.to_lowercase();
            }
            GeosearchEndpoint => {
                config.geosearch.endpoint = parse_optional_url(value).map_err(invalid)?;
            }
            GeosearchTimeout => {
                config.geosearch.timeout_secs = parse_timeout(value).ok_or_else(|| {
                    invalid("must be between 1 and 600 seconds")
                })?;
            }
            OverpassEndpoint => {
                config.overpass.endpoint = parse_optional_url(value)
                    .map_err(invalid)?
                    .ok_or_else(|| invalid("endpoint is required"))?;
            }
            OverpassTimeout => {
                config.overpass.timeout_secs = parse_timeout(value).ok_or_else(|| {
                    invalid("must be between 1 and 600 seconds")
                })?;
            }
            NarrationBaseUrl => {
                config.narration.base_url = parse_optional_url(value)
                    .map_err(invalid)?
                    .ok_or_else(|| invalid("base URL is required"))?;
            }
            NarrationTimeout => {
                config.narration.timeout_secs = parse_timeout(value).ok_or_else(|| {
                    invalid("must be between 1 and 600 seconds")
                })?;
            }
            NarrationLanguage => {
                if !value.is_empty() && !is_language_code(value) {
                    return Err(invalid("expected a language code such as 'en'"));
                }
                config.narration.language = non_empty(value);
            }
            NarrationAccessToken => config.narration.access_token = non_empty(value),
            PlacesBaseUrl => {
                config.places.base_url = parse_optional_url(value).map_err(invalid)?;
            }
            PlacesApiKey => config.places.api_key = non_empty(value),
            PlaybackSampleInterval => {
                config.playback.sample_interval_ms = value
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| (10..=5_000).contains(ms))
                    .ok_or_else(|| invalid("must be between 10 and 5000 milliseconds"))?;
            }
            PlaybackDefaultRate => {
                let rate = value
                    .parse::<f64>()
                    .ok()
                    .filter(|r| is_valid_rate(*r))
                    .ok_or_else(|| {
                        invalid(&format!(
                            "must be between {} and {}",
                            MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE
                        ))
                    })?;
                config.playback.default_rate = rate;
            }
            PlaybackOutput => {
                config.playback.output = AudioOutput::from_config_str(value)
                    .ok_or_else(|| invalid("expected device or silent"))?;
            }
            LoggingLevel => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid("expected trace, debug, info, warn or error"));
                }
                config.logging.level = level;
            }
            LoggingDirectory => config.logging.directory = non_empty(value).map(PathBuf::from),
        }

        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn parse_f64(value: &str, min: f64, max: f64) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= min && *v <= max)
}

fn parse_timeout(value: &str) -> Option<u64> {
    value
        .parse::<u64>()
        .ok()
        .filter(|secs| (1..=600).contains(secs))
}

fn parse_optional_url(value: &str) -> Result<Option<String>, &'static str> {
    if value.is_empty() {
        return Ok(None);
    }
    let url = reqwest::Url::parse(value).map_err(|_| "expected an absolute URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("expected an http or https URL");
    }
    Ok(Some(value.trim_end_matches('/').to_string()))
}

fn is_language_code(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 12
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
