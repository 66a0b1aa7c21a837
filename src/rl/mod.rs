//! Reinforcement Learning Module
//!
//! Episodic trading environment for CDS protection, with the policies and
//! runners used to drive it.
//!
//! # Features
//!
//! - **Environment**: step/reset/observe over a precomputed spread series
//! - **Action Space**: Discrete (Hold / Buy protection / Sell protection)
//! - **Baselines**: hold, random and RSI mean-reversion policies
//! - **Runner**: sequential and parallel episode collection with summaries

pub mod algorithms;
pub mod config;
pub mod core;
pub mod environment;
pub mod training;

// Config exports
pub use config::TradingEnvConfig;

// Core exports
pub use core::{EnvAction, Observation, NUM_ACTIONS, OBSERVATION_DIM};

// Environment exports
pub use environment::{
    EpisodeHistory, EpisodeStatus, Environment, ResetInfo, Series, SeriesRow, StepInfo,
    StepRecord, StepResult, TerminationReason, TradingEnvironment,
};

// Algorithm exports
pub use algorithms::{Policy, PolicyKind};

// Training exports
pub use training::{EpisodeResult, EpisodeSummary};
