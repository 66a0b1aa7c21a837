//! Core RL Types
//!
//! Action and observation spaces shared by the environment, policies and runner.

pub mod action;
pub mod observation;

pub use action::{EnvAction, NUM_ACTIONS};
pub use observation::{Observation, OBSERVATION_DIM};
