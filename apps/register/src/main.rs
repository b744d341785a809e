//! # Peelo Register Entry Point
//!
//! ```text
//! peelo-register [--config <path>] [--terminal <id>]
//!
//!   1. Initialize tracing (stderr)
//!   2. Load RegisterConfig: defaults → register.toml → PEELO_* env → flags
//!   3. Run the shell until `quit` or EOF
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use peelo_register::{init_tracing, run, ConfigError, RegisterConfig};

/// Point-of-sale register for Peelo shops.
#[derive(Debug, Parser)]
#[command(name = "peelo-register", version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/register.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Terminal id, overriding the config file and PEELO_TERMINAL_ID.
    #[arg(long, value_name = "ID")]
    terminal: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Register stopped");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<RegisterConfig, ConfigError> {
    RegisterConfig::load(cli.config.clone(), cli.terminal.clone())
}
