//! Colombo CLI - Command-line interface
//!
//! Discovers landmarks near a coordinate and plays narrated stories about
//! them. Run `colombo init` once to create the configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::common::CategoryArg;
use commands::config::ConfigCommands;
use commands::discover::DiscoverArgs;
use commands::narrate::NarrateArgs;
use commands::play::PlayArgs;
use commands::tour::TourArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "colombo")]
#[command(version, about = "Landmark discovery and narrated audio tours", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the configuration file
    Init,

    /// View or modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List landmarks with encyclopedia articles near a coordinate
    Discover {
        /// Latitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Search radius in meters (default from config)
        #[arg(long)]
        radius: Option<f64>,

        /// Kind of places to search for (default from config)
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
    },

    /// Print the narration for a nearby landmark
    Narrate {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Landmark id from `discover` (nearest when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Narration language, e.g. "en" or "fr"
        #[arg(long)]
        language: Option<String>,
    },

    /// Narrate a nearby landmark and follow its playback
    Play {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Landmark id from `discover` (nearest when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Narration language, e.g. "en" or "fr"
        #[arg(long)]
        language: Option<String>,

        /// Playback rate between 0.25 and 4
        #[arg(long)]
        rate: Option<f64>,

        /// Follow the playhead without opening an audio device
        #[arg(long)]
        silent: bool,
    },

    /// Read "lat,lon" fixes from stdin and follow nearby landmarks
    Tour {
        /// Search radius in meters (default from config)
        #[arg(long)]
        radius: Option<f64>,

        /// Kind of places to search for (default from config)
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,

        /// Narration language, e.g. "en" or "fr"
        #[arg(long)]
        language: Option<String>,

        /// Narrate the nearest landmark automatically
        #[arg(long)]
        auto_play: bool,

        /// Follow the playhead without opening an audio device
        #[arg(long)]
        silent: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let verbose = cli.verbose;

    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Discover {
            latitude,
            longitude,
            radius,
            category,
        } => commands::discover::run(DiscoverArgs {
            latitude,
            longitude,
            radius,
            category,
            verbose,
        }),
        Commands::Narrate {
            latitude,
            longitude,
            id,
            language,
        } => commands::narrate::run(NarrateArgs {
            latitude,
            longitude,
            id,
            language,
            verbose,
        }),
        Commands::Play {
            latitude,
            longitude,
            id,
            language,
            rate,
            silent,
        } => commands::play::run(PlayArgs {
            latitude,
            longitude,
            id,
            language,
            rate,
            silent,
            verbose,
        }),
        Commands::Tour {
            radius,
            category,
            language,
            auto_play,
            silent,
        } => commands::tour::run(TourArgs {
            radius,
            category,
            language,
            auto_play,
            silent,
            verbose,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let cli = Cli::try_parse_from(["colombo", "discover", "-33.8568", "151.2153"]).unwrap();
        match cli.command {
            Commands::Discover {
                latitude,
                longitude,
                ..
            } => {
                assert_eq!(latitude, -33.8568);
                assert_eq!(longitude, 151.2153);
            }
            _ => panic!("Expected discover"),
        }
    }

    #[test]
    fn test_parse_tour_flags() {
        let cli = Cli::try_parse_from([
            "colombo", "tour", "--auto-play", "--category", "museum", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Tour {
                auto_play: true,
                category: Some(CategoryArg::Museum),
                silent: false,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_play_silent() {
        let cli = Cli::try_parse_from([
            "colombo", "play", "48.8584", "2.2945", "--rate", "1.5", "--silent",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Play {
                silent: true,
                rate: Some(_),
                ..
            }
        ));
    }
}
