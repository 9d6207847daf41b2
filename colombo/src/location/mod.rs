//! Location tracking
//!
//! Turns a push-based stream of location provider events into discovery
//! triggers. [`ProximityTracker`] is a synchronous state machine applying a
//! distance gate and a rate gate; [`run_tracker`] drives it from a channel
//! and forwards its output to a [`LocationSink`].
//!
//! # Example
//!
//! ```ignore
//! use colombo::location::{run_tracker, LocationFix, ProximityTracker, TrackerStatus};
//!
//! let (events_tx, events_rx) = tokio::sync::mpsc::channel(64);
//! let (status_tx, status_rx) = tokio::sync::watch::channel(TrackerStatus::Waiting);
//!
//! tokio::spawn(run_tracker(
//!     ProximityTracker::with_defaults(),
//!     events_rx,
//!     discovery.handle(),
//!     status_tx,
//!     shutdown.child_token(),
//! ));
//!
//! events_tx.send(LocationFix::now(position).into()).await?;
//! ```

mod config;
mod driver;
mod fix;
mod tracker;

pub use config::{TrackerConfig, DEFAULT_MIN_FETCH_INTERVAL, DEFAULT_MOVEMENT_THRESHOLD_METERS};
pub use driver::{run_tracker, LocationSink};
pub use fix::{AuthorizationStatus, LocationError, LocationEvent, LocationFix};
pub use tracker::{FixDecision, ProximityTracker, SuppressReason, TrackerStats, TrackerStatus};
