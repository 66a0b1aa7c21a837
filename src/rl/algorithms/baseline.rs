//! Baseline Policies
//!
//! Simple controllers used to exercise the environment and to give learned
//! policies something to beat.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::rl::core::{EnvAction, Observation, NUM_ACTIONS};

/// Maps an observation to an action
pub trait Policy: Send {
    /// Choose the next action
    fn select_action(&mut self, observation: &Observation) -> EnvAction;

    /// Short name for logs and reports
    fn name(&self) -> &'static str;
}

/// Available baseline policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Never trade
    Hold,
    /// Uniformly random actions
    Random,
    /// Fade RSI extremes
    #[default]
    RsiReversion,
}

impl PolicyKind {
    /// Build a boxed policy; `seed` only affects random policies
    pub fn build(self, seed: u64) -> Box<dyn Policy> {
        match self {
            Self::Hold => Box::new(HoldPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::RsiReversion => Box::new(RsiReversionPolicy::default()),
        }
    }
}

/// Always holds
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPolicy;

impl Policy for HoldPolicy {
    fn select_action(&mut self, _observation: &Observation) -> EnvAction {
        EnvAction::Hold
    }

    fn name(&self) -> &'static str {
        "hold"
    }
}

/// Picks actions uniformly at random from a seeded RNG
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, _observation: &Observation) -> EnvAction {
        let index = self.rng.gen_range(0..NUM_ACTIONS);
        EnvAction::from_index(index).unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Mean-reversion on the spread RSI.
///
/// Buys protection when the spread looks oversold (expecting it to widen),
/// sells protection when overbought, and works the position back to flat
/// once RSI crosses the midline.
#[derive(Debug, Clone, Copy)]
pub struct RsiReversionPolicy {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiReversionPolicy {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl Policy for RsiReversionPolicy {
    fn select_action(&mut self, observation: &Observation) -> EnvAction {
        let rsi = observation.indicator;
        let position = observation.shares_held;

        if rsi <= self.oversold {
            EnvAction::BuyProtection
        } else if rsi >= self.overbought {
            EnvAction::SellProtection
        } else if position > 0 && rsi >= 50.0 {
            EnvAction::SellProtection
        } else if position < 0 && rsi <= 50.0 {
            EnvAction::BuyProtection
        } else {
            EnvAction::Hold
        }
    }

    fn name(&self) -> &'static str {
        "rsi_reversion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(indicator: f64, shares_held: i64) -> Observation {
        Observation {
            price: 1.0,
            indicator,
            shares_held,
            balance: 10_000.0,
            price_delta: 0.0,
        }
    }

    #[test]
    fn test_rsi_reversion_signals() {
        let mut policy = RsiReversionPolicy::default();
        assert_eq!(policy.select_action(&obs(20.0, 0)), EnvAction::BuyProtection);
        assert_eq!(policy.select_action(&obs(80.0, 0)), EnvAction::SellProtection);
        assert_eq!(policy.select_action(&obs(45.0, 0)), EnvAction::Hold);
        assert_eq!(policy.select_action(&obs(55.0, 2)), EnvAction::SellProtection);
        assert_eq!(policy.select_action(&obs(45.0, -2)), EnvAction::BuyProtection);
        assert_eq!(policy.select_action(&obs(45.0, 2)), EnvAction::Hold);
    }

    #[test]
    fn test_random_policy_is_seeded() {
        let mut a = RandomPolicy::new(11);
        let mut b = RandomPolicy::new(11);
        let o = obs(50.0, 0);
        let left: Vec<_> = (0..32).map(|_| a.select_action(&o)).collect();
        let right: Vec<_> = (0..32).map(|_| b.select_action(&o)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_build_from_kind() {
        assert_eq!(PolicyKind::Hold.build(0).name(), "hold");
        assert_eq!(PolicyKind::Random.build(0).name(), "random");
        assert_eq!(PolicyKind::default().build(0).name(), "rsi_reversion");
    }
}
