//! Common types and utilities shared across CLI commands.

use std::time::Duration;

use clap::ValueEnum;
use colombo::config::ConfigFile;
use colombo::coord::Coordinate;
use colombo::discovery::{Landmark, LandmarkSnapshot};
use colombo::landmark::PoiCategory;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;

/// Point-of-interest category selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CategoryArg {
    /// Monuments, historic sites and attractions
    Landmark,
    /// Museums and galleries
    Museum,
    /// Any named place
    Any,
}

impl From<CategoryArg> for PoiCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::Landmark => PoiCategory::Landmark,
            CategoryArg::Museum => PoiCategory::Museum,
            CategoryArg::Any => PoiCategory::Any,
        }
    }
}

/// Validates a latitude/longitude pair from arguments.
pub fn parse_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, CliError> {
    Coordinate::new(latitude, longitude).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

/// Parses a `lat,lon` line. Whitespace around either number is ignored.
pub fn parse_coordinate_line(line: &str) -> Result<Coordinate, CliError> {
    let (lat, lon) = line.trim().split_once(',').ok_or_else(|| {
        CliError::InvalidArgument(format!("expected 'lat,lon', got '{}'", line.trim()))
    })?;

    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| CliError::InvalidArgument(format!("'{}' is not a number", s.trim())))
    };

    parse_coordinate(parse(lat)?, parse(lon)?)
}

/// Narration language: CLI takes precedence, then config.
pub fn resolve_language(cli_language: Option<String>, config: &ConfigFile) -> Option<String> {
    cli_language.or_else(|| config.narration.language.clone())
}

/// Picks a landmark by id, or the nearest one when no id is given.
pub fn choose_landmark(landmarks: &[Landmark], id: Option<&str>) -> Result<Landmark, CliError> {
    match id {
        Some(id) => landmarks
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| CliError::InvalidArgument(format!("no landmark with id '{}' nearby", id))),
        None => landmarks
            .first()
            .cloned()
            .ok_or_else(|| CliError::Discovery("no landmarks nearby".to_string())),
    }
}

/// Spinner shown while waiting on the network.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(template);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Prints one landmark row.
pub fn print_landmark(index: usize, landmark: &Landmark) {
    let address = landmark
        .candidate
        .address
        .as_ref()
        .map(|a| a.formatted())
        .filter(|a| !a.is_empty())
        .map(|a| format!("  {}", style(a).dim()))
        .unwrap_or_default();

    println!(
        "  {:>2}. {} {} {}{}",
        index + 1,
        style(landmark.name()).bold(),
        style(format!("({:.0} m)", landmark.distance_from_user)).cyan(),
        style(&landmark.id).dim(),
        address
    );
}

/// Prints a landmark list with its status line.
pub fn print_snapshot(snapshot: &LandmarkSnapshot) {
    if snapshot.landmarks.is_empty() {
        let message = snapshot.message();
        if snapshot.status.is_degraded() {
            println!("{}", style(message).red());
        } else {
            println!("{}", style(message).yellow());
        }
        return;
    }

    println!(
        "{} landmark(s) nearby:",
        style(snapshot.landmarks.len()).green().bold()
    );
    for (index, landmark) in snapshot.landmarks.iter().enumerate() {
        print_landmark(index, landmark);
    }
}
