//! Budget control configuration management.
//!
//! The configuration is loaded once at process start and handed to the
//! controller by value. Nothing in the engine reads settings from global state.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Currency;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not acceptable.
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Which optional dimension fields participate in the budget key.
///
/// Cost center and account always participate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EnforceScope {
    /// Include the project dimension.
    #[serde(default)]
    pub project: bool,
    /// Include the branch dimension.
    #[serde(default)]
    pub branch: bool,
}

/// Budget control settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetControlConfig {
    /// Master switch. When off, every lifecycle event is bypassed.
    #[serde(default = "default_enable_budget_lock")]
    pub enable_budget_lock: bool,
    /// Workflow state name that triggers a reservation.
    #[serde(default = "default_lock_on_state")]
    pub lock_on_state: String,
    /// Optional dimensions included in the key.
    #[serde(default)]
    pub enforce_scope: EnforceScope,
    /// Restrict the allocated envelope by account as well as cost center.
    #[serde(default = "default_control_by_account")]
    pub control_by_account: bool,
    /// Role allowed to reserve past the available amount.
    #[serde(default = "default_overrun_role")]
    pub overrun_role: String,
    /// Maximum tolerated difference between an allocation total and a document total.
    #[serde(default = "default_rounding_tolerance")]
    pub rounding_tolerance: Decimal,
    /// Currency used for rounding slices to the minor unit.
    #[serde(default)]
    pub currency: Currency,
    /// Fiscal period used when neither the document nor the caller supplies one.
    #[serde(default)]
    pub default_fiscal_period: Option<String>,
    /// How long to wait for a dimension key lock before giving up.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Time-to-live of cached posted actuals. Zero reads live every time.
    #[serde(default)]
    pub actuals_cache_ttl_secs: u64,
    /// Number of ordered worker queues used by the event dispatcher.
    #[serde(default = "default_dispatch_workers")]
    pub dispatch_workers: usize,
}

fn default_enable_budget_lock() -> bool {
    true
}

fn default_lock_on_state() -> String {
    "Approved".to_string()
}

fn default_control_by_account() -> bool {
    true
}

fn default_overrun_role() -> String {
    "Budget Manager".to_string()
}

fn default_rounding_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

fn default_lock_timeout_ms() -> u64 {
    2000
}

fn default_dispatch_workers() -> usize {
    4
}

impl Default for BudgetControlConfig {
    fn default() -> Self {
        Self {
            enable_budget_lock: default_enable_budget_lock(),
            lock_on_state: default_lock_on_state(),
            enforce_scope: EnforceScope::default(),
            control_by_account: default_control_by_account(),
            overrun_role: default_overrun_role(),
            rounding_tolerance: default_rounding_tolerance(),
            currency: Currency::default(),
            default_fiscal_period: None,
            lock_timeout_ms: default_lock_timeout_ms(),
            actuals_cache_ttl_secs: 0,
            dispatch_workers: default_dispatch_workers(),
        }
    }
}

impl BudgetControlConfig {
    /// Loads configuration from config files and environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default.toml`, `config/{RUN_MODE}.toml`, `LEDGERLOCK__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEDGERLOCK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parses configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects values the engine cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_on_state.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "lock_on_state",
                reason: "must not be empty".to_string(),
            });
        }
        if self.rounding_tolerance.is_sign_negative() {
            return Err(ConfigError::Invalid {
                field: "rounding_tolerance",
                reason: format!("must not be negative, got {}", self.rounding_tolerance),
            });
        }
        if self.dispatch_workers == 0 {
            return Err(ConfigError::Invalid {
                field: "dispatch_workers",
                reason: "at least one worker is required".to_string(),
            });
        }
        Ok(())
    }

    /// Decimal places slices are rounded to.
    #[must_use]
    pub fn precision(&self) -> u32 {
        self.currency.minor_units()
    }

    /// How long to wait for a scope or document lock.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// TTL of the actuals cache. Zero means live reads.
    #[must_use]
    pub fn actuals_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.actuals_cache_ttl_secs)
    }
}
