//! Tour command - feed location fixes from stdin and follow nearby landmarks.
//!
//! Each stdin line is either a `lat,lon` fix or a command:
//!
//! ```text
//! 48.8584,2.2945     location fix
//! refresh            clear the list and search again
//! play <id>          narrate a landmark from the current list
//! pause | resume | stop
//! rate <x>           set the playback rate (0.25 - 4)
//! quit
//! ```
//!
//! When stdin closes the command waits for the pending search and any
//! narration to finish, then exits.

use std::time::Duration;

use colombo::app::{AppError, TourGuide};
use colombo::coord::Coordinate;
use colombo::location::{AuthorizationStatus, LocationEvent, LocationFix, TrackerStatus};
use colombo::playback::{AudioOutput, PlaybackEvent, PlaybackState};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::common::{parse_coordinate_line, print_snapshot, resolve_language, CategoryArg};
use super::discover::apply_overrides;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Poll interval while draining after stdin closes.
const DRAIN_POLL: Duration = Duration::from_millis(500);

/// Arguments for the tour command.
pub struct TourArgs {
    pub radius: Option<f64>,
    pub category: Option<CategoryArg>,
    pub language: Option<String>,
    /// Narrate the nearest landmark whenever it changes and nothing plays.
    pub auto_play: bool,
    /// Skip the audio device.
    pub silent: bool,
    pub verbose: bool,
}

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
pub enum TourCommand {
    Fix(Coordinate),
    Refresh,
    Play(String),
    Pause,
    Resume,
    Stop,
    Rate(f64),
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<TourCommand, CliError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(w, r)| (w, r.trim()))
        .unwrap_or((line, ""));

    let command = match word.to_lowercase().as_str() {
        "" => TourCommand::Empty,
        "refresh" => TourCommand::Refresh,
        "pause" => TourCommand::Pause,
        "resume" => TourCommand::Resume,
        "stop" => TourCommand::Stop,
        "quit" | "exit" => TourCommand::Quit,
        "play" if !rest.is_empty() => TourCommand::Play(rest.to_string()),
        "play" => return Err(CliError::InvalidArgument("usage: play <id>".to_string())),
        "rate" => {
            let rate = rest
                .parse()
                .map_err(|_| CliError::InvalidArgument("usage: rate <x>".to_string()))?;
            TourCommand::Rate(rate)
        }
        _ => TourCommand::Fix(parse_coordinate_line(line)?),
    };
    Ok(command)
}

/// Run the tour command.
pub fn run(args: TourArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("tour");

    let mut config = runner.app_config();
    apply_overrides(&mut config, args.radius, args.category)?;
    if args.silent {
        config.audio_output = AudioOutput::Silent;
    }
    let language = resolve_language(args.language, runner.config());
    let interrupt = runner.interrupt_token()?;

    runner.block_on(async {
        let guide = TourGuide::start(config)?;

        let result = drive(&guide, language.as_deref(), args.auto_play, &interrupt).await;

        if let Some(stats) = guide.shutdown().await {
            println!(
                "{}",
                style(format!(
                    "{} fix(es) received, {} search(es) triggered",
                    stats.fixes_received, stats.emitted
                ))
                .dim()
            );
        }
        result
    })
}

fn is_idle(guide: &TourGuide) -> bool {
    let state = guide.playback().session().state;
    !guide.snapshot().is_searching && !state.is_loading() && !state.has_audio()
}

async fn drive(
    guide: &TourGuide,
    language: Option<&str>,
    auto_play: bool,
    interrupt: &CancellationToken,
) -> Result<(), CliError> {
    let location = guide.location_sender();
    send(&location, AuthorizationStatus::Authorized.into()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut landmarks = guide.landmarks();
    let mut tracker = guide.tracker_status();
    let mut events = guide.playback().events();
    let mut drain = tokio::time::interval(DRAIN_POLL);
    let mut input_open = true;
    let mut nearest: Option<String> = None;

    eprintln!(
        "{}",
        style("Reading 'lat,lon' fixes from stdin (commands: refresh, play <id>, pause, resume, stop, rate <x>, quit)").dim()
    );

    loop {
        tokio::select! {
            biased;

            _ = interrupt.cancelled() => return Err(CliError::Interrupted),

            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, draining");
                    input_open = false;
                    drain.reset();
                    continue;
                };
                match parse_command(&line) {
                    Ok(TourCommand::Quit) => return Ok(()),
                    Ok(command) => {
                        if let Err(e) = execute(guide, &location, command, language).await {
                            eprintln!("{}", style(e).yellow());
                        }
                    }
                    Err(e) => eprintln!("{}", style(e).yellow()),
                }
            }

            changed = landmarks.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let snapshot = landmarks.borrow_and_update().clone();
                if snapshot.is_searching {
                    continue;
                }
                println!();
                print_snapshot(&snapshot);

                let first = snapshot.landmarks.first().map(|l| l.id.clone());
                if auto_play && first.is_some() && first != nearest && is_idle(guide) {
                    if let Some(id) = &first {
                        guide.select_landmark(id, language)?;
                    }
                }
                nearest = first;
            }

            changed = tracker.changed() => {
                if changed.is_err() {
                    continue;
                }
                let status = *tracker.borrow_and_update();
                match status {
                    TrackerStatus::Blocked => eprintln!("{}", style(status.message()).red()),
                    TrackerStatus::Tracking | TrackerStatus::Waiting | TrackerStatus::Stopped => {
                        tracing::debug!(%status, "Tracker status changed")
                    }
                }
            }

            event = events.recv() => match event {
                Ok(PlaybackEvent::NarrationReady(narration)) => {
                    println!();
                    println!("{}", style(&narration.place_name).bold().underlined());
                    println!("{}", narration.story_text);
                }
                Ok(PlaybackEvent::StateChanged { to: PlaybackState::Failed(reason), .. }) => {
                    eprintln!("{}", style(format!("Playback failed: {}", reason)).red());
                    let _ = guide.playback().acknowledge();
                }
                Ok(PlaybackEvent::StateChanged { to, .. }) if to != PlaybackState::Idle => {
                    println!("{}", style(format!("[{}]", to)).cyan());
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return Ok(()),
            },

            _ = drain.tick(), if !input_open => {
                if is_idle(guide) {
                    return Ok(());
                }
            }
        }
    }
}

async fn send(location: &mpsc::Sender<LocationEvent>, event: LocationEvent) -> Result<(), CliError> {
    location
        .send(event)
        .await
        .map_err(|_| CliError::App(AppError::ShutDown))
}

async fn execute(
    guide: &TourGuide,
    location: &mpsc::Sender<LocationEvent>,
    command: TourCommand,
    language: Option<&str>,
) -> Result<(), CliError> {
    let playback = guide.playback();
    let result = match command {
        TourCommand::Fix(coordinate) => {
            return send(location, LocationFix::now(coordinate).into()).await
        }
        TourCommand::Refresh => {
            if !guide.refresh() {
                eprintln!("No position yet");
            }
            Ok(())
        }
        TourCommand::Play(id) => {
            guide.select_landmark(&id, language)?;
            Ok(())
        }
        TourCommand::Pause => playback.pause(),
        TourCommand::Resume => playback.resume(),
        TourCommand::Stop => playback.stop(),
        TourCommand::Rate(rate) => playback.set_rate(rate),
        TourCommand::Quit | TourCommand::Empty => Ok(()),
    };
    result.map_err(|e| CliError::Playback(e.to_string()))
}
