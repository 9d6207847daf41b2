//! Init command - write a configuration file with every default spelled out.

use colombo::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Existing settings are kept; missing keys are filled with defaults.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = path.exists();

    let config = ConfigFile::load()?;
    config.save()?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();

    if config.narration.access_token.is_none() {
        println!("Narration requires an access token. Set one with:");
        println!("  colombo config set narration.access_token <token>");
        println!("or export COLOMBO_ACCESS_TOKEN.");
        println!();
    }

    println!("Edit this file to customize Colombo settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
