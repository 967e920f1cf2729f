//! Simulation parameter bag and validation.
//!
//! All rate parameters are fractional: `stop_loss_pct = 0.05` means 5%.
//! `validate` runs before any computation; nothing downstream re-checks.

use crate::ports::config_port::ConfigPort;

use super::error::AdaptraderError;
use super::weights::{WeightMode, WeightVector};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub short_ma: usize,
    pub long_ma: usize,
    pub oscillator_period: usize,
    pub band_period: usize,
    pub band_std_dev: f64,
    pub initial_capital: f64,
    pub risk_per_trade_pct: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trade_cost_rate_pct: f64,
    pub weight_mode: WeightMode,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub oversold_level: f64,
    pub overbought_level: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            short_ma: 20,
            long_ma: 50,
            oscillator_period: 14,
            band_period: 20,
            band_std_dev: 2.0,
            initial_capital: 100_000.0,
            risk_per_trade_pct: 0.02,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.10,
            trade_cost_rate_pct: 0.001,
            weight_mode: WeightMode::Fixed,
            buy_threshold: 0.5,
            sell_threshold: 0.5,
            oversold_level: 30.0,
            overbought_level: 70.0,
        }
    }
}

impl SimulationConfig {
    /// Build from an INI-style config source. Missing keys fall back to the
    /// defaults above; `weight_mode = manual` reads the `[weights]` section.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AdaptraderError> {
        let defaults = SimulationConfig::default();
        let section = "simulation";

        let weight_mode = match config
            .get_string(section, "weight_mode")
            .unwrap_or_else(|| "fixed".to_string())
            .to_lowercase()
            .as_str()
        {
            "fixed" => WeightMode::Fixed,
            "adaptive" => WeightMode::Adaptive,
            "manual" => {
                let keys = ["trend", "oscillator", "band", "momentum", "volume"];
                if keys
                    .iter()
                    .all(|key| config.get_string("weights", key).is_none())
                {
                    return Err(AdaptraderError::ConfigMissing {
                        section: "weights".into(),
                        key: "trend".into(),
                    });
                }
                WeightMode::Manual(WeightVector::new(
                    config.get_double("weights", "trend", 0.0),
                    config.get_double("weights", "oscillator", 0.0),
                    config.get_double("weights", "band", 0.0),
                    config.get_double("weights", "momentum", 0.0),
                    config.get_double("weights", "volume", 0.0),
                ))
            }
            other => {
                return Err(AdaptraderError::ConfigInvalid {
                    section: section.into(),
                    key: "weight_mode".into(),
                    reason: format!("unknown mode {other:?}, expected fixed/adaptive/manual"),
                });
            }
        };

        Ok(SimulationConfig {
            short_ma: config.get_int(section, "short_ma", defaults.short_ma as i64) as usize,
            long_ma: config.get_int(section, "long_ma", defaults.long_ma as i64) as usize,
            oscillator_period: config.get_int(
                section,
                "oscillator_period",
                defaults.oscillator_period as i64,
            ) as usize,
            band_period: config.get_int(section, "band_period", defaults.band_period as i64)
                as usize,
            band_std_dev: config.get_double(section, "band_std_dev", defaults.band_std_dev),
            initial_capital: config.get_double(
                section,
                "initial_capital",
                defaults.initial_capital,
            ),
            risk_per_trade_pct: config.get_double(
                section,
                "risk_per_trade_pct",
                defaults.risk_per_trade_pct,
            ),
            stop_loss_pct: config.get_double(section, "stop_loss_pct", defaults.stop_loss_pct),
            take_profit_pct: config.get_double(
                section,
                "take_profit_pct",
                defaults.take_profit_pct,
            ),
            trade_cost_rate_pct: config.get_double(
                section,
                "trade_cost_rate_pct",
                defaults.trade_cost_rate_pct,
            ),
            weight_mode,
            buy_threshold: config.get_double(section, "buy_threshold", defaults.buy_threshold),
            sell_threshold: config.get_double(section, "sell_threshold", defaults.sell_threshold),
            oversold_level: config.get_double(section, "oversold_level", defaults.oversold_level),
            overbought_level: config.get_double(
                section,
                "overbought_level",
                defaults.overbought_level,
            ),
        })
    }

    /// Reject bad parameters before any computation begins.
    pub fn validate(&self) -> Result<(), AdaptraderError> {
        self.validate_windows()?;
        self.validate_capital_and_risk()?;
        self.validate_thresholds()?;
        if let WeightMode::Manual(vector) = &self.weight_mode {
            vector.normalized()?;
        }
        Ok(())
    }

    fn validate_windows(&self) -> Result<(), AdaptraderError> {
        if self.short_ma == 0 {
            return Err(invalid("short_ma", "must be positive"));
        }
        if self.long_ma == 0 {
            return Err(invalid("long_ma", "must be positive"));
        }
        if self.short_ma >= self.long_ma {
            return Err(invalid("short_ma", "must be smaller than long_ma"));
        }
        if self.oscillator_period < 2 {
            return Err(invalid("oscillator_period", "must be at least 2"));
        }
        if self.band_period < 2 {
            return Err(invalid("band_period", "must be at least 2"));
        }
        if !self.band_std_dev.is_finite() || self.band_std_dev <= 0.0 {
            return Err(invalid("band_std_dev", "must be positive"));
        }
        Ok(())
    }

    fn validate_capital_and_risk(&self) -> Result<(), AdaptraderError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(invalid("initial_capital", "must be positive"));
        }
        if !(self.risk_per_trade_pct > 0.0 && self.risk_per_trade_pct <= 1.0) {
            return Err(invalid("risk_per_trade_pct", "must be in (0, 1]"));
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return Err(invalid("stop_loss_pct", "must be in (0, 1)"));
        }
        if !self.take_profit_pct.is_finite() || self.take_profit_pct <= 0.0 {
            return Err(invalid("take_profit_pct", "must be positive"));
        }
        if !(self.trade_cost_rate_pct >= 0.0 && self.trade_cost_rate_pct < 1.0) {
            return Err(invalid("trade_cost_rate_pct", "must be in [0, 1)"));
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), AdaptraderError> {
        if !(self.buy_threshold > 0.0 && self.buy_threshold <= 2.0) {
            return Err(invalid("buy_threshold", "must be in (0, 2]"));
        }
        if !(self.sell_threshold > 0.0 && self.sell_threshold <= 2.0) {
            return Err(invalid("sell_threshold", "must be in (0, 2]"));
        }
        if !(self.oversold_level > 0.0 && self.oversold_level < 100.0) {
            return Err(invalid("oversold_level", "must be in (0, 100)"));
        }
        if !(self.overbought_level > 0.0 && self.overbought_level < 100.0) {
            return Err(invalid("overbought_level", "must be in (0, 100)"));
        }
        if self.oversold_level >= self.overbought_level {
            return Err(invalid("oversold_level", "must be below overbought_level"));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> AdaptraderError {
    AdaptraderError::InvalidParameter {
        name: name.into(),
        reason: reason.into(),
    }
}
