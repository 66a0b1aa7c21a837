//! Policies that drive the trading environment.

pub mod baseline;

pub use baseline::{HoldPolicy, Policy, PolicyKind, RandomPolicy, RsiReversionPolicy};
