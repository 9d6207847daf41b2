//! Configuration file support
//!
//! Settings live in `~/.config/colombo/config.ini`:
//!
//! ```ini
//! [location]
//! movement_threshold_m = 5
//! min_fetch_interval_ms = 1000
//!
//! [discovery]
//! search_radius_m = 50
//! article_radius_m = 10
//! enrichment_concurrency = 4
//! category = landmark
//!
//! [geosearch]
//! language = en
//!
//! [narration]
//! base_url = https://colombo.guide
//! access_token =
//!
//! [logging]
//! level = info
//! directory =
//! ```
//!
//! Missing keys fall back to defaults. CLI arguments override file values.

mod file;
mod keys;

pub use file::{
    config_file_path, ConfigError, ConfigFile, DiscoverySettings, GeosearchSettings,
    LocationSettings, LoggingSettings, NarrationSettings, OverpassSettings, PlacesSettings,
    PlaybackSettings, APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_GEOSEARCH_LANGUAGE,
    DEFAULT_LOG_LEVEL,
};
pub use keys::ConfigKey;
