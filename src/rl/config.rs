//! RL Configuration
//!
//! Configuration structs for the trading environment.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Trading environment configuration
///
/// Fixed for the lifetime of an environment instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingEnvConfig {
    /// Maximum absolute position (units of protection)
    pub max_units: i64,
    /// Starting account value
    pub initial_balance: f64,
    /// Transaction cost as a fraction of the per-unit multiplier
    pub transaction_cost_rate: f64,
    /// Currency P&L per unit per one unit of spread movement (DV01/CS01)
    pub unit_pnl_multiplier: f64,
    /// Episode stops once balance falls below this fraction of the initial balance
    pub min_balance_fraction: f64,
    /// Leading rows reserved for indicator warm-up (earliest start index)
    pub warmup_rows: usize,
    /// Minimum number of rows after the start index
    pub min_episode_len: usize,
    /// Ruin penalty as a fraction of the initial balance
    pub ruin_penalty_fraction: f64,
    /// Drawdown-stop penalty as a fraction of the initial balance
    pub drawdown_penalty_fraction: f64,
}

impl Default for TradingEnvConfig {
    fn default() -> Self {
        Self {
            max_units: 10,
            initial_balance: 10_000.0,
            transaction_cost_rate: 0.0005,
            unit_pnl_multiplier: 100_000.0,
            min_balance_fraction: 0.5,
            warmup_rows: 14,
            min_episode_len: 100,
            ruin_penalty_fraction: 0.5,
            drawdown_penalty_fraction: 0.1,
        }
    }
}

impl TradingEnvConfig {
    /// Cost charged to balance per unit opened or closed
    pub fn cost_per_unit(&self) -> f64 {
        self.unit_pnl_multiplier * self.transaction_cost_rate
    }

    /// Balance below which the drawdown stop fires
    pub fn drawdown_floor(&self) -> f64 {
        self.min_balance_fraction * self.initial_balance
    }

    /// Reward contribution on ruin (negative)
    pub fn ruin_penalty(&self) -> f64 {
        -self.ruin_penalty_fraction * self.initial_balance
    }

    /// Reward contribution on a drawdown stop (negative)
    pub fn drawdown_penalty(&self) -> f64 {
        -self.drawdown_penalty_fraction * self.initial_balance
    }

    /// Smallest series length that allows warm-up plus one step
    pub fn min_series_len(&self) -> usize {
        self.warmup_rows + 2
    }

    /// Check the configuration for values the environment cannot run with
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.max_units <= 0 {
            errors.push(format!("max_units must be positive, got {}", self.max_units));
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            errors.push(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            ));
        }
        if !(self.transaction_cost_rate.is_finite() && self.transaction_cost_rate >= 0.0) {
            errors.push(format!(
                "transaction_cost_rate must be non-negative, got {}",
                self.transaction_cost_rate
            ));
        }
        if !(self.unit_pnl_multiplier.is_finite() && self.unit_pnl_multiplier > 0.0) {
            errors.push(format!(
                "unit_pnl_multiplier must be positive, got {}",
                self.unit_pnl_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.min_balance_fraction) {
            errors.push(format!(
                "min_balance_fraction must be within [0, 1], got {}",
                self.min_balance_fraction
            ));
        }
        for (name, value) in [
            ("ruin_penalty_fraction", self.ruin_penalty_fraction),
            ("drawdown_penalty_fraction", self.drawdown_penalty_fraction),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be non-negative, got {value}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::Configuration(errors.join("; ")))
        }
    }
}
