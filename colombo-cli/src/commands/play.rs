//! Play command - narrate a nearby landmark and follow its playback.

use std::sync::Arc;

use colombo::narration::NarrationRequest;
use colombo::playback::{
    rate_label, AudioOutput, PlaybackController, PlaybackEvent, PlaybackSession, PlaybackState,
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::common::{choose_landmark, parse_coordinate, print_landmark, resolve_language, spinner};
use super::discover::discover_at;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the play command.
pub struct PlayArgs {
    pub latitude: f64,
    pub longitude: f64,
    /// Landmark id; nearest when absent.
    pub id: Option<String>,
    pub language: Option<String>,
    pub rate: Option<f64>,
    /// Skip the audio device.
    pub silent: bool,
    pub verbose: bool,
}

/// Run the play command.
pub fn run(args: PlayArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("play");

    let origin = parse_coordinate(args.latitude, args.longitude)?;
    let mut config = runner.app_config();
    if args.silent {
        config.audio_output = AudioOutput::Silent;
    }
    let language = resolve_language(args.language, runner.config());
    let interrupt = runner.interrupt_token()?;

    runner.block_on(async {
        let (report, services) = discover_at(&config, origin).await?;
        let landmark = choose_landmark(&report.landmarks, args.id.as_deref())?;

        println!("Selected:");
        print_landmark(0, &landmark);
        println!();

        let shutdown = CancellationToken::new();
        let (controller, task) = PlaybackController::spawn(
            Arc::clone(&services.narration),
            Arc::clone(&services.audio),
            config.playback.clone(),
            shutdown.child_token(),
        );

        if let Some(rate) = args.rate {
            controller
                .set_rate(rate)
                .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        }

        let mut request = NarrationRequest::new(landmark);
        if let Some(language) = language {
            request = request.with_language(language);
        }

        let mut events = controller.events();
        controller
            .play(request)
            .map_err(|e| CliError::Playback(e.to_string()))?;

        let outcome = follow(&controller, &mut events, &interrupt).await;

        shutdown.cancel();
        let _ = task.await;
        outcome
    })
}

/// Renders session updates until the narration finishes, fails or is
/// interrupted.
async fn follow(
    controller: &PlaybackController,
    events: &mut tokio::sync::broadcast::Receiver<PlaybackEvent>,
    interrupt: &CancellationToken,
) -> Result<(), CliError> {
    let mut session = controller.subscribe();
    let mut loading = Some(spinner("Generating story..."));
    let mut progress: Option<ProgressBar> = None;

    loop {
        tokio::select! {
            biased;

            _ = interrupt.cancelled() => {
                let _ = controller.stop();
                if let Some(bar) = progress.take() {
                    bar.abandon();
                }
                return Err(CliError::Interrupted);
            }

            event = events.recv() => match event {
                Ok(PlaybackEvent::NarrationReady(narration)) => {
                    let print = || {
                        println!("{}", style(&narration.place_name).bold().underlined());
                        println!();
                        println!("{}", narration.story_text);
                        println!();
                    };
                    match &loading {
                        Some(bar) => bar.suspend(print),
                        None => print(),
                    }
                }
                Ok(PlaybackEvent::Finished { .. }) => {
                    if let Some(bar) = progress.take() {
                        bar.finish_with_message("Finished");
                    }
                    return Ok(());
                }
                Ok(PlaybackEvent::StateChanged { to: PlaybackState::Failed(reason), .. }) => {
                    if let Some(bar) = loading.take() {
                        bar.finish_and_clear();
                    }
                    if let Some(bar) = progress.take() {
                        bar.abandon();
                    }
                    let _ = controller.acknowledge();
                    return Err(CliError::Playback(reason.to_string()));
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => {
                    return Err(CliError::Playback("controller stopped".to_string()));
                }
            },

            changed = session.changed() => {
                if changed.is_err() {
                    return Err(CliError::Playback("controller stopped".to_string()));
                }
                let current = session.borrow_and_update().clone();
                render(&current, &mut loading, &mut progress);
            }
        }
    }
}

fn render(
    session: &PlaybackSession,
    loading: &mut Option<ProgressBar>,
    progress: &mut Option<ProgressBar>,
) {
    if session.state.is_loading() {
        if let Some(bar) = loading {
            bar.set_message(session.status_message());
        }
        return;
    }

    if !session.state.has_audio() {
        return;
    }

    if let Some(bar) = loading.take() {
        bar.finish_and_clear();
    }

    let bar = progress.get_or_insert_with(|| {
        let bar = ProgressBar::new((session.duration_seconds * 1000.0) as u64);
        if let Ok(template) = ProgressStyle::with_template("{prefix} [{bar:40.cyan/blue}] {msg}") {
            bar.set_style(template.progress_chars("=> "));
        }
        bar
    });

    bar.set_position((session.current_time_seconds * 1000.0) as u64);
    bar.set_prefix(if session.state == PlaybackState::Paused {
        "paused "
    } else {
        "playing"
    });
    bar.set_message(format!(
        "{} {}",
        session.status_message(),
        rate_label(session.playback_rate)
    ));
}
