//! # Register Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. CLI flags (highest priority)                                       │
//! │     --terminal 69177048073213c297170052                                │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     PEELO_API_URL, PEELO_API_TIMEOUT_SECS, PEELO_TERMINAL_ID,          │
//! │     PEELO_TAX_RATE_BPS, PEELO_CURRENCY_SYMBOL                          │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/peelo-pos/register.toml (Linux)                          │
//! │     ~/Library/Application Support/xyz.aipeelo.peelo-pos/register.toml  │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "https://apicommerce.aipeelo.xyz/api"
//! timeout_secs = 30
//!
//! [terminal]
//! id = "69177048073213c297170052"
//!
//! [pricing]
//! tax_rate_bps = 0
//! currency_symbol = "F"
//! quick_amounts = [1000, 2000, 5000, 10000]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use peelo_api::ClientConfig;
use peelo_core::money::format_grouped;
use peelo_core::validation::{validate_tax_rate_bps, validate_terminal_id};
use peelo_core::{Money, TaxRate, DEFAULT_QUICK_AMOUNTS};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Which terminal this register operates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Commerce API terminal (chatbot) identifier.
    #[serde(default)]
    pub id: String,
}

/// Tax, currency display and tender shortcuts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Tax rate in basis points applied to the subtotal.
    #[serde(default)]
    pub tax_rate_bps: u32,

    /// Suffix shown after amounts.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Quick-amount chips on the tender panel.
    #[serde(default = "default_quick_amounts")]
    pub quick_amounts: Vec<i64>,
}

fn default_currency_symbol() -> String {
    "F".to_string()
}

fn default_quick_amounts() -> Vec<i64> {
    DEFAULT_QUICK_AMOUNTS.to_vec()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            tax_rate_bps: 0,
            currency_symbol: default_currency_symbol(),
            quick_amounts: default_quick_amounts(),
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub api: ClientConfig,

    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub pricing: PricingSettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment and CLI flag, then validates it.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (register.toml), if present
    /// 3. Environment variables
    /// 4. `--terminal` flag
    pub fn load(config_path: Option<PathBuf>, terminal: Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        if let Some(id) = terminal {
            debug!(terminal_id = %id, "Overriding terminal ID from command line");
            config.terminal.id = id;
        }
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file body without touching the environment.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.api
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        validate_terminal_id(&self.terminal.id)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        validate_tax_rate_bps(self.pricing.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.pricing.quick_amounts.iter().any(|a| *a <= 0) {
            return Err(ConfigError::Invalid(
                "quick_amounts must all be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("PEELO_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("PEELO_API_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid PEELO_API_TIMEOUT_SECS"),
            }
        }

        if let Ok(id) = std::env::var("PEELO_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Ok(bps) = std::env::var("PEELO_TAX_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(bps) => self.pricing.tax_rate_bps = bps,
                Err(_) => warn!(value = %bps, "Ignoring invalid PEELO_TAX_RATE_BPS"),
            }
        }

        if let Ok(symbol) = std::env::var("PEELO_CURRENCY_SYMBOL") {
            self.pricing.currency_symbol = symbol;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("xyz", "aipeelo", "peelo-pos")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn terminal_id(&self) -> &str {
        &self.terminal.id
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.pricing.tax_rate_bps)
    }

    pub fn quick_amounts(&self) -> Vec<Money> {
        self.pricing
            .quick_amounts
            .iter()
            .copied()
            .map(Money::from_units)
            .collect()
    }

    /// Formats an amount for display, e.g. `12 500 F`.
    pub fn format_currency(&self, amount: Money) -> String {
        format!(
            "{} {}",
            format_grouped(amount.units()),
            self.pricing.currency_symbol
        )
    }
}
