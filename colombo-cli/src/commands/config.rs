//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`
//! for viewing and modifying settings from the command line.

use clap::Subcommand;
use colombo::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., discovery.search_radius_m)
        key: String,
    },

    /// Set a configuration value (an empty value clears optional keys)
    Set {
        /// Configuration key in format section.key (e.g., discovery.search_radius_m)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List {
        /// Show credential values instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List { show_secrets } => run_list(show_secrets),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'colombo config list' to see available keys.",
            key
        ))
    })
}

/// Renders a value for display, masking credentials.
fn display_value(key: ConfigKey, value: &str, show_secrets: bool) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else if key.is_secret() && !show_secrets {
        "(hidden)".to_string()
    } else {
        value.to_string()
    }
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load()?;

    // An explicit get prints the real value.
    println!("{}", display_value(config_key, &config_key.get(&config), true));
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load()?;
    config_key.set(&mut config, value)?;
    config.save()?;

    println!(
        "Set {} = {}",
        config_key.name(),
        display_value(config_key, &config_key.get(&config), false)
    );
    Ok(())
}

fn run_list(show_secrets: bool) -> Result<(), CliError> {
    let config = ConfigFile::load()?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();

        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        println!(
            "  {} = {}",
            key.key_name(),
            display_value(*key, &key.get(&config), show_secrets)
        );
    }

    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
