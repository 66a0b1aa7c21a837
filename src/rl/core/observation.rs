//! Observation vector handed to the controller after every reset/step.

use serde::{Deserialize, Serialize};

/// Length of the observation vector
pub const OBSERVATION_DIM: usize = 5;

/// `[price, indicator, shares_held, balance, price_delta]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Price (spread) at the current index
    pub price: f64,
    /// Indicator value (RSI) at the current index
    pub indicator: f64,
    /// Signed position in units
    pub shares_held: i64,
    /// Account balance
    pub balance: f64,
    /// Price change over the last transition
    pub price_delta: f64,
}

impl Observation {
    /// Fixed-order numeric representation
    pub fn as_array(&self) -> [f64; OBSERVATION_DIM] {
        [
            self.price,
            self.indicator,
            self.shares_held as f64,
            self.balance,
            self.price_delta,
        ]
    }

    /// Feature vector in the precision learners usually consume
    pub fn to_features(&self) -> Vec<f32> {
        self.as_array().iter().map(|v| *v as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        let obs = Observation {
            price: 1.5,
            indicator: 40.0,
            shares_held: -2,
            balance: 9_900.0,
            price_delta: 0.25,
        };
        assert_eq!(obs.as_array(), [1.5, 40.0, -2.0, 9_900.0, 0.25]);
        assert_eq!(obs.to_features().len(), OBSERVATION_DIM);
    }
}
