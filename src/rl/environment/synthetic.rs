//! Synthetic credit-spread paths for training and smoke runs.
//!
//! Generates a mean-reverting spread with occasional jumps. The path is a
//! deterministic function of the config and the seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::series::Series;
use crate::error::{Result, SimError};

/// Parameters of the synthetic spread process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Number of rows to generate
    pub rows: usize,
    /// Spread at row 0
    pub initial_spread: f64,
    /// Long-run level the spread reverts to
    pub mean_spread: f64,
    /// Fraction of the gap to the mean closed per row
    pub reversion_speed: f64,
    /// Standard deviation of the per-row shock
    pub volatility: f64,
    /// Probability of a jump on any row
    pub jump_probability: f64,
    /// Standard deviation of a jump
    pub jump_scale: f64,
    /// Spread floor
    pub min_spread: f64,
    /// RSI look-back
    pub rsi_period: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 1_000,
            initial_spread: 0.60,
            mean_spread: 0.60,
            reversion_speed: 0.02,
            volatility: 0.004,
            jump_probability: 0.01,
            jump_scale: 0.03,
            min_spread: 0.05,
            rsi_period: 14,
        }
    }
}

impl SyntheticConfig {
    /// Reject parameters the generator cannot sample from
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("initial_spread", self.initial_spread),
            ("mean_spread", self.mean_spread),
            ("reversion_speed", self.reversion_speed),
            ("min_spread", self.min_spread),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name} must be finite, got {value}"));
            }
        }
        for (name, value) in [
            ("volatility", self.volatility),
            ("jump_scale", self.jump_scale),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be non-negative, got {value}"));
            }
        }
        if !(0.0..=1.0).contains(&self.jump_probability) {
            errors.push(format!(
                "jump_probability must be within [0, 1], got {}",
                self.jump_probability
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::Configuration(errors.join("; ")))
        }
    }
}

/// Generate a spread series from `config`, seeded with `seed`.
pub fn generate_spread_series(config: &SyntheticConfig, seed: u64) -> Result<Series> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let shock = Normal::new(0.0, config.volatility).map_err(|e| {
        SimError::Configuration(format!("invalid volatility {}: {e}", config.volatility))
    })?;
    let jump = Normal::new(0.0, config.jump_scale).map_err(|e| {
        SimError::Configuration(format!("invalid jump_scale {}: {e}", config.jump_scale))
    })?;

    let mut prices = Vec::with_capacity(config.rows);
    let mut spread = config.initial_spread.max(config.min_spread);

    for i in 0..config.rows {
        if i > 0 {
            let mut change = config.reversion_speed * (config.mean_spread - spread)
                + shock.sample(&mut rng);
            if rng.gen_bool(config.jump_probability) {
                change += jump.sample(&mut rng);
            }
            spread = (spread + change).max(config.min_spread);
        }
        prices.push(spread);
    }

    Series::from_prices(&prices, config.rsi_period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let config = SyntheticConfig {
            rows: 200,
            ..Default::default()
        };
        let a = generate_spread_series(&config, 7).unwrap();
        let b = generate_spread_series(&config, 7).unwrap();
        let c = generate_spread_series(&config, 8).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.prices(), c.prices());
        assert_eq!(a.len(), 200);
    }

    #[test]
    fn test_spread_respects_floor() {
        let config = SyntheticConfig {
            rows: 500,
            initial_spread: 0.06,
            mean_spread: 0.0,
            volatility: 0.05,
            min_spread: 0.05,
            ..Default::default()
        };
        let series = generate_spread_series(&config, 1).unwrap();
        assert!(series.rows().iter().all(|row| row.price >= 0.05));
    }

    #[test]
    fn test_invalid_volatility() {
        let config = SyntheticConfig {
            volatility: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            generate_spread_series(&config, 1),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_nan_jump_probability_is_rejected() {
        let config: SyntheticConfig =
            toml::from_str("rows = 50\njump_probability = nan").unwrap();
        let err = generate_spread_series(&config, 1).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
        assert!(err.to_string().contains("jump_probability"));
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = SyntheticConfig {
            jump_probability: 1.5,
            mean_spread: f64::INFINITY,
            jump_scale: f64::NAN,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("jump_probability"));
        assert!(err.contains("mean_spread"));
        assert!(err.contains("jump_scale"));
        assert!(SyntheticConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let config = SyntheticConfig {
            rows: 0,
            ..Default::default()
        };
        assert!(generate_spread_series(&config, 1).is_err());
    }
}
