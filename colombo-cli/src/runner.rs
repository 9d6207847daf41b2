//! Shared setup for commands that talk to the network.
//!
//! Loads the config file, installs logging and owns the Tokio runtime.

use std::future::Future;

use colombo::app::AppConfig;
use colombo::config::ConfigFile;
use colombo::logging::{self, WorkerGuard};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

pub struct CliRunner {
    config: ConfigFile,
    runtime: Runtime,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Loads configuration and initializes logging.
    ///
    /// `verbose` forces debug-level logging regardless of the config file.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let level = if verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        };
        let log_guard = logging::init(level, config.logging.directory.as_deref())?;

        let runtime = Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            config,
            runtime,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Component configuration derived from the config file.
    pub fn app_config(&self) -> AppConfig {
        AppConfig::from_config_file(&self.config)
    }

    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            version = colombo::VERSION,
            command,
            config = %colombo::config::config_file_path().display(),
            "Colombo starting"
        );
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Returns a token cancelled on Ctrl+C.
    pub fn interrupt_token(&self) -> Result<CancellationToken, CliError> {
        let token = CancellationToken::new();
        let handler_token = token.clone();

        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Received interrupt, shutting down...");
            handler_token.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        Ok(token)
    }
}
