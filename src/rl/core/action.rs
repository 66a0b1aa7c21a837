//! Action Space
//!
//! Discrete action space for the protection trading environment.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Number of discrete actions
pub const NUM_ACTIONS: usize = 3;

/// Discrete action taken at each step
///
/// In credit terms, buying protection is a bet that spreads widen and
/// selling protection is a bet that spreads tighten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnvAction {
    /// Do nothing beyond marking to market
    #[default]
    Hold = 0,
    /// Add one unit of long protection (or cover one short unit)
    BuyProtection = 1,
    /// Close one long unit, or add one unit of short protection
    SellProtection = 2,
}

impl EnvAction {
    /// Convert from action index
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Hold),
            1 => Some(Self::BuyProtection),
            2 => Some(Self::SellProtection),
            _ => None,
        }
    }

    /// Convert to action index
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Get all possible actions
    pub fn all() -> &'static [EnvAction] {
        &[Self::Hold, Self::BuyProtection, Self::SellProtection]
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Hold => "Hold current position",
            Self::BuyProtection => "Buy one unit of protection",
            Self::SellProtection => "Sell one unit of protection",
        }
    }
}

impl TryFrom<usize> for EnvAction {
    type Error = SimError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(SimError::InvalidAction(index))
    }
}

impl std::fmt::Display for EnvAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Hold => "hold",
            Self::BuyProtection => "buy_protection",
            Self::SellProtection => "sell_protection",
        };
        f.write_str(name)
    }
}
