//! Location provider events.

use std::fmt;
use std::time::Instant;

use thiserror::Error;

use crate::coord::Coordinate;

/// A single position report from a location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub timestamp: Instant,
    /// Horizontal accuracy radius in meters, if the provider reports one.
    pub accuracy: Option<f64>,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, timestamp: Instant) -> Self {
        Self {
            coordinate,
            timestamp,
            accuracy: None,
        }
    }

    /// Creates a fix stamped with the current time.
    pub fn now(coordinate: Coordinate) -> Self {
        Self::new(coordinate, Instant::now())
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }
}

/// Errors reported by a location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Access was denied or revoked. Terminal until re-granted.
    #[error("Location access denied. Please enable it in Settings.")]
    PermissionDenied,

    /// The provider could not determine a position right now.
    #[error("Unable to determine location. Please try again.")]
    LocationUnknown,

    /// A transient network problem on the provider side.
    #[error("Network error. Please check your connection.")]
    Network,

    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    /// Returns true if the tracker must stop emitting until re-authorized.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LocationError::PermissionDenied)
    }
}

/// Authorization state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    Authorized,
    Denied,
    /// Access is blocked by policy (parental controls, device management).
    Restricted,
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthorizationStatus::NotDetermined => "not determined",
            AuthorizationStatus::Authorized => "authorized",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Restricted => "restricted",
        };
        f.write_str(s)
    }
}

/// Everything a location provider can push to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Fix(LocationFix),
    Error(LocationError),
    Authorization(AuthorizationStatus),
}

impl From<LocationFix> for LocationEvent {
    fn from(fix: LocationFix) -> Self {
        LocationEvent::Fix(fix)
    }
}

impl From<LocationError> for LocationEvent {
    fn from(err: LocationError) -> Self {
        LocationEvent::Error(err)
    }
}

impl From<AuthorizationStatus> for LocationEvent {
    fn from(status: AuthorizationStatus) -> Self {
        LocationEvent::Authorization(status)
    }
}
