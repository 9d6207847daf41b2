//! Colombo - Proximity-driven landmark narration
//!
//! This library follows a user's position, discovers notable landmarks
//! nearby and plays generated audio stories about them.
//!
//! The pipeline has three stages:
//!
//! 1. [`location`] throttles raw fixes into a stable location signal.
//! 2. [`discovery`] searches [`landmark`] sources near that signal, keeps
//!    candidates that have a [`geosearch`] article within a few meters and
//!    publishes them nearest first.
//! 3. [`playback`] requests a [`narration`] for a selected landmark and
//!    plays its audio.
//!
//! [`app::TourGuide`] wires the stages together.

pub mod app;
pub mod config;
pub mod coord;
pub mod discovery;
pub mod geosearch;
pub mod landmark;
pub mod location;
pub mod logging;
pub mod narration;
pub mod places;
pub mod playback;
pub mod provider;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
