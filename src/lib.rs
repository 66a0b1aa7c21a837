pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod rl;

pub use config::AppConfig;
pub use error::{Result, SimError};
pub use rl::{
    EnvAction, Environment, Observation, Series, StepResult, TerminationReason, TradingEnvConfig,
    TradingEnvironment,
};
