//! Application wiring and lifecycle.
//!
//! [`TourGuide`] connects the pipeline stages and owns their tasks:
//!
//! ```text
//! LocationEvent ──► ProximityTracker ──► DiscoveryHandle ──► LandmarkSnapshot
//!   (mpsc)            (run_tracker)        (worker task)        (watch)
//!                                                                  │
//!                                          select_landmark(id) ◄───┘
//!                                                  │
//!                                                  ▼
//!                                          PlaybackController ──► PlaybackSession
//!                                            (actor task)           (watch)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use colombo::app::{AppConfig, TourGuide};
//! use colombo::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load().unwrap_or_default());
//! let guide = TourGuide::start(config)?;
//! // ...
//! guide.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{TourGuide, TourServices};
pub use config::{
    AppConfig, GeosearchAppConfig, NarrationAppConfig, OverpassAppConfig, PlacesAppConfig,
    DEFAULT_LOCATION_CHANNEL_CAPACITY,
};
pub use error::AppError;
