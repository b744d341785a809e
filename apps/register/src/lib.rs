//! # Peelo Register Library
//!
//! The register application: configuration, state, commands and the
//! terminal shell.
//!
//! ## Module Organization
//! ```text
//! peelo_register/
//! ├── lib.rs          ◄─── You are here (tracing setup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── Register<A> application state
//! │   └── config.rs   ◄─── RegisterConfig (TOML + env)
//! ├── commands/
//! │   ├── login.rs    ◄─── Terminal entry, PIN sign-in
//! │   ├── catalog.rs  ◄─── Product load and browsing
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   └── checkout.rs ◄─── Tender and submission
//! ├── shell.rs        ◄─── Line-driven front-end
//! └── error.rs        ◄─── AppError for commands
//! ```

pub mod commands;
pub mod error;
pub mod shell;
pub mod state;

#[cfg(test)]
mod testing;

use tracing::info;
use tracing_subscriber::EnvFilter;

use peelo_api::CommerceClient;

pub use error::{AppError, AppResult, ErrorCode};
pub use state::{ConfigError, Register, RegisterConfig};

/// Runs the register against the live commerce API.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Build the commerce client (base URL, timeout)                       │
/// │  2. Create Register state for the configured terminal                  │
/// │  3. Enter the terminal: shop + roster (a failure is shown, not fatal)  │
/// │  4. Hand stdin/stdout to the shell until `quit` or EOF                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config: RegisterConfig) -> AppResult<()> {
    info!(
        terminal_id = %config.terminal_id(),
        api = %config.api.base_url,
        "Starting Peelo register"
    );

    let client = CommerceClient::new(&config.api)?;
    let register = Register::new(client, config)?;

    let mut shell = shell::Shell::new(register);
    shell.run().await
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=peelo=trace` - Show trace for peelo crates only
/// - Default: INFO, DEBUG for peelo crates
///
/// Logs go to stderr so they do not interleave with shell output.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,peelo=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
