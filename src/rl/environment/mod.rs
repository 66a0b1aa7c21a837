//! Simulated Trading Environment for RL Training
//!
//! This module provides a gym-like environment that replays a precomputed
//! spread series, plus the pieces needed to build and inspect one.

mod history;
pub mod indicators;
mod series;
mod synthetic;
mod trading;

pub use history::{EpisodeHistory, StepRecord};
pub use series::{Series, SeriesRow};
pub use synthetic::{generate_spread_series, SyntheticConfig};
pub use trading::{
    EpisodeStatus, Environment, ResetInfo, StepInfo, StepResult, TerminationReason,
    TradingEnvironment,
};
