//! Discover command - run one discovery cycle at a coordinate.

use colombo::app::{AppConfig, TourServices};
use colombo::coord::Coordinate;
use colombo::discovery::{
    DiscoveryReport, DiscoveryStatus, LandmarkDiscoveryEngine, LandmarkSnapshot,
};
use console::style;

use super::common::{parse_coordinate, print_snapshot, spinner, CategoryArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the discover command.
pub struct DiscoverArgs {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: Option<f64>,
    pub category: Option<CategoryArg>,
    pub verbose: bool,
}

/// Applies CLI overrides to the discovery settings.
pub fn apply_overrides(
    config: &mut AppConfig,
    radius: Option<f64>,
    category: Option<CategoryArg>,
) -> Result<(), CliError> {
    if let Some(radius) = radius {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CliError::InvalidArgument(format!(
                "radius must be a positive number of meters, got {}",
                radius
            )));
        }
        config.discovery = config.discovery.clone().with_search_radius(radius);
    }
    if let Some(category) = category {
        config.discovery = config.discovery.clone().with_category(category.into());
    }
    Ok(())
}

/// Builds the services and runs a single cycle at `origin`.
pub async fn discover_at(
    config: &AppConfig,
    origin: Coordinate,
) -> Result<(DiscoveryReport, TourServices), CliError> {
    let services = TourServices::from_config(config)?;
    let engine = LandmarkDiscoveryEngine::new(
        services.source.clone(),
        services.geosearch.clone(),
        config.discovery.clone(),
    );

    let bar = spinner(format!(
        "Searching {} within {} m of {}",
        config.discovery.category, config.discovery.search_radius_meters, origin
    ));
    let report = engine.run_cycle(origin).await;
    bar.finish_and_clear();

    if let DiscoveryStatus::SourceUnavailable(reason) = &report.status {
        return Err(CliError::Discovery(reason.clone()));
    }

    Ok((report, services))
}

/// Wraps a one-off report for display.
pub fn report_snapshot(report: &DiscoveryReport, search_radius_meters: f64) -> LandmarkSnapshot {
    LandmarkSnapshot {
        landmarks: report.landmarks.clone(),
        status: report.status.clone(),
        origin: Some(report.origin),
        is_searching: false,
        cycle: 1,
        search_radius_meters,
    }
}

/// Run the discover command.
pub fn run(args: DiscoverArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("discover");

    let origin = parse_coordinate(args.latitude, args.longitude)?;
    let mut config = runner.app_config();
    apply_overrides(&mut config, args.radius, args.category)?;

    let (report, _services) = runner.block_on(discover_at(&config, origin))?;

    print_snapshot(&report_snapshot(&report, config.discovery.search_radius_meters));
    println!();
    println!(
        "{}",
        style(format!(
            "{} candidate(s) checked, {} article lookup(s) failed",
            report.candidates, report.enrichment_failures
        ))
        .dim()
    );

    if report.status.is_degraded() {
        return Err(CliError::Discovery(
            "article lookups failed for every candidate".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colombo::landmark::PoiCategory;

    #[test]
    fn test_apply_overrides() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, Some(120.0), Some(CategoryArg::Museum)).unwrap();
        assert_eq!(config.discovery.search_radius_meters, 120.0);
        assert_eq!(config.discovery.category, PoiCategory::Museum);
    }

    #[test]
    fn test_apply_overrides_rejects_bad_radius() {
        let mut config = AppConfig::default();
        assert!(apply_overrides(&mut config, Some(0.0), None).is_err());
        assert!(apply_overrides(&mut config, Some(f64::NAN), None).is_err());
    }

    #[test]
    fn test_report_snapshot() {
        let origin = Coordinate::new(48.8584, 2.2945).unwrap();
        let report = DiscoveryReport {
            origin,
            landmarks: Vec::new(),
            status: DiscoveryStatus::NoArticles,
            candidates: 3,
            enrichment_failures: 0,
        };
        let snapshot = report_snapshot(&report, 50.0);
        assert_eq!(
            snapshot.message(),
            "No landmarks with Wikipedia articles found within 50 meters"
        );
    }
}
