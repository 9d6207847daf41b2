//! Narrate command - fetch the story for a nearby landmark without playing it.

use colombo::narration::NarrationRequest;
use console::style;

use super::common::{choose_landmark, parse_coordinate, print_landmark, resolve_language, spinner};
use super::discover::discover_at;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the narrate command.
pub struct NarrateArgs {
    pub latitude: f64,
    pub longitude: f64,
    /// Landmark id; nearest when absent.
    pub id: Option<String>,
    pub language: Option<String>,
    pub verbose: bool,
}

/// Run the narrate command.
pub fn run(args: NarrateArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("narrate");

    let origin = parse_coordinate(args.latitude, args.longitude)?;
    let config = runner.app_config();
    let language = resolve_language(args.language, runner.config());

    runner.block_on(async {
        let (report, services) = discover_at(&config, origin).await?;
        let landmark = choose_landmark(&report.landmarks, args.id.as_deref())?;

        println!("Selected:");
        print_landmark(0, &landmark);
        println!();

        if let Some(places) = &services.places {
            match places.find_by_external_id(&landmark.id).await {
                Ok(Some(record)) => println!("{}", style(format!("Stored place #{}", record.id)).dim()),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Place lookup failed"),
            }
        }

        let mut request = NarrationRequest::new(landmark);
        if let Some(language) = language {
            request = request.with_language(language);
        }

        let bar = spinner("Generating story...");
        let result = services.narration.request_narration(&request).await;
        bar.finish_and_clear();
        let narration = result.map_err(|e| CliError::Narration(e.to_string()))?;

        println!("{}", style(&narration.place_name).bold().underlined());
        if let Some(subtitle) = &narration.subtitle {
            println!("{}", style(subtitle).italic());
        }
        println!();
        println!("{}", narration.story_text);
        println!();
        println!("Audio: {}", style(&narration.audio_uri).cyan());
        Ok(())
    })
}
