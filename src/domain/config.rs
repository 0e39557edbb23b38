//! Engine configuration: validated, explicit, passed into constructors.
//!
//! The short-selling floor is a required input when shorting is enabled;
//! there is no built-in default.

use crate::domain::error::PapertraderError;
use crate::domain::ledger::LedgerPolicy;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;

/// Everything the engine and its collaborators need from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub strategy_name: String,
    pub lookback_window: usize,
    pub threshold: f64,
    pub breakout_margin: f64,
    pub order_size: f64,
    pub allow_shorting: bool,
    pub short_floor: f64,
    pub default_parent: String,
    pub alert_notional: f64,
}

impl EngineConfig {
    /// Parameters for the named strategy: mean-reversion reads `threshold`,
    /// breakout reads `breakout_margin`.
    pub fn strategy_params(&self, strategy_name: &str) -> StrategyParams {
        let threshold = if strategy_name == "breakout" {
            self.breakout_margin
        } else {
            self.threshold
        };
        StrategyParams {
            lookback_window: self.lookback_window,
            threshold,
            order_size: self.order_size,
        }
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy {
            allow_shorting: self.allow_shorting,
            short_floor: self.short_floor,
            default_parent: self.default_parent.clone(),
        }
    }
}

/// Validate and materialise the engine config from a config source.
pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, PapertraderError> {
    let strategy_name = require_string(config, "strategy", "name")?;

    let lookback_window = config.get_int("strategy", "lookback_window", 0);
    if lookback_window < 2 {
        return Err(invalid(
            "strategy",
            "lookback_window",
            "lookback_window must be at least 2",
        ));
    }

    let threshold = config.get_double("strategy", "threshold", 0.0);
    if threshold <= 0.0 {
        return Err(invalid("strategy", "threshold", "threshold must be positive"));
    }

    let breakout_margin = config.get_double("strategy", "breakout_margin", 0.0);
    if breakout_margin <= 0.0 {
        return Err(invalid(
            "strategy",
            "breakout_margin",
            "breakout_margin must be positive",
        ));
    }

    let order_size = config.get_double("strategy", "order_size", 0.0);
    if order_size <= 0.0 {
        return Err(invalid(
            "strategy",
            "order_size",
            "order_size must be positive",
        ));
    }

    let allow_shorting = match config.get_string("ledger", "allow_shorting") {
        Some(_) => config.get_bool("ledger", "allow_shorting", false),
        None => {
            return Err(PapertraderError::ConfigMissing {
                section: "ledger".into(),
                key: "allow_shorting".into(),
            })
        }
    };

    let short_floor = if allow_shorting {
        match config.get_string("ledger", "short_floor") {
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                invalid("ledger", "short_floor", "short_floor must be a number")
            })?,
            None => {
                return Err(PapertraderError::ConfigMissing {
                    section: "ledger".into(),
                    key: "short_floor".into(),
                })
            }
        }
    } else {
        0.0
    };
    if allow_shorting && short_floor > 0.0 {
        return Err(invalid(
            "ledger",
            "short_floor",
            "short_floor must be zero or negative",
        ));
    }

    let default_parent = config
        .get_string("ledger", "default_parent")
        .unwrap_or_default();

    let alert_notional = config.get_double("alerts", "notional_threshold", f64::MAX);

    Ok(EngineConfig {
        strategy_name,
        lookback_window: lookback_window as usize,
        threshold,
        breakout_margin,
        order_size,
        allow_shorting,
        short_floor,
        default_parent,
        alert_notional,
    })
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, PapertraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(PapertraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> PapertraderError {
    PapertraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
