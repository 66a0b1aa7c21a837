//! Trading Environment for RL Training
//!
//! Provides a gym-like interface with step/reset over a precomputed spread
//! series. One unit of exposure earns `unit_pnl_multiplier` per unit of
//! spread movement; every unit opened or closed costs
//! `unit_pnl_multiplier * transaction_cost_rate`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::history::{EpisodeHistory, StepRecord};
use super::series::{Series, SeriesRow};
use crate::error::{Result, SimError};
use crate::rl::config::TradingEnvConfig;
use crate::rl::core::{EnvAction, Observation, NUM_ACTIONS, OBSERVATION_DIM};

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Balance went below zero
    Ruin,
    /// Balance fell under the drawdown floor
    Drawdown,
    /// The series has no row after the current one
    EndOfData,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ruin => "ruin",
            Self::Drawdown => "drawdown",
            Self::EndOfData => "end_of_data",
        };
        f.write_str(name)
    }
}

/// Episode lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// Constructed, never reset
    NotStarted,
    /// Reset, no step taken yet
    Ready,
    /// At least one step taken, not terminated
    Running,
    /// Terminal until the next reset
    Terminated(TerminationReason),
}

impl EpisodeStatus {
    /// Whether only `reset` can leave this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

/// Auxiliary information returned by `reset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetInfo {
    pub initial_balance: f64,
    /// Series index the episode starts from
    pub start_index: usize,
    /// Seed the episode RNG was drawn from
    pub seed: u64,
}

/// Additional step information
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Balance after the step
    pub balance: f64,
    /// Position after the step
    pub shares_held: i64,
    /// Series index after the step
    pub index: usize,
    /// Mark-to-market P&L of the transition
    pub pnl: f64,
    /// Whether the action changed the position
    pub executed: bool,
    /// Set when this step ended the episode
    pub termination: Option<TerminationReason>,
}

/// Result of taking a step in the environment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// New observation after action
    pub observation: Observation,
    /// Reward signal
    pub reward: f64,
    /// Whether episode is done
    pub done: bool,
    /// Always false; episodes end only through termination conditions
    pub truncated: bool,
    /// Additional info
    pub info: StepInfo,
}

/// Step/reset/observe contract consumed by episode runners.
pub trait Environment {
    /// Start a new episode
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, ResetInfo)>;

    /// Advance one step with `action`
    fn step(&mut self, action: EnvAction) -> Result<StepResult>;

    /// Current observation, without side effects
    fn observe(&self) -> Observation;

    /// Number of discrete actions
    fn action_dim(&self) -> usize {
        NUM_ACTIONS
    }

    /// Observation vector length
    fn observation_dim(&self) -> usize {
        OBSERVATION_DIM
    }
}

/// Trading environment for RL training
#[derive(Debug, Clone)]
pub struct TradingEnvironment {
    config: TradingEnvConfig,
    series: Series,
    rng: StdRng,
    seed: u64,
    start_index: usize,
    current_index: usize,
    shares_held: i64,
    balance: f64,
    price_delta: f64,
    status: EpisodeStatus,
    history: EpisodeHistory,
}

impl TradingEnvironment {
    /// Create a new trading environment with an entropy-seeded RNG
    pub fn new(series: Series, config: TradingEnvConfig) -> Result<Self> {
        Self::with_rng(series, config, StdRng::from_entropy())
    }

    /// Create a new trading environment whose unseeded resets are reproducible
    pub fn with_rng_seed(series: Series, config: TradingEnvConfig, rng_seed: u64) -> Result<Self> {
        Self::with_rng(series, config, StdRng::seed_from_u64(rng_seed))
    }

    fn with_rng(series: Series, config: TradingEnvConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        check_series_len(&series, &config)?;

        let balance = config.initial_balance;
        let start_index = config.warmup_rows;

        Ok(Self {
            config,
            series,
            rng,
            seed: 0,
            start_index,
            current_index: start_index,
            shares_held: 0,
            balance,
            price_delta: 0.0,
            status: EpisodeStatus::NotStarted,
            history: EpisodeHistory::new(),
        })
    }

    /// Reset the environment for a new episode
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, ResetInfo)> {
        check_series_len(&self.series, &self.config)?;

        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = seed;

        let min_start = self.config.warmup_rows;
        let start_index = match self
            .series
            .last_index()
            .checked_sub(self.config.min_episode_len)
        {
            Some(max_start) if max_start >= min_start => self.rng.gen_range(min_start..=max_start),
            _ => min_start,
        };

        self.start_index = start_index;
        self.current_index = start_index;
        self.shares_held = 0;
        self.balance = self.config.initial_balance;
        self.price_delta = self.row(start_index).delta;
        self.status = EpisodeStatus::Ready;
        self.history.clear();

        debug!(
            seed,
            start_index,
            max_steps = self.max_steps(),
            "Episode reset"
        );

        let info = ResetInfo {
            initial_balance: self.config.initial_balance,
            start_index,
            seed,
        };

        Ok((self.observe(), info))
    }

    /// Take a step in the environment
    pub fn step(&mut self, action: EnvAction) -> Result<StepResult> {
        match self.status {
            EpisodeStatus::NotStarted => {
                return Err(SimError::IllegalState(
                    "step called before reset".to_string(),
                ))
            }
            EpisodeStatus::Terminated(reason) => {
                return Err(SimError::IllegalState(format!(
                    "episode already terminated ({reason}); call reset first"
                )))
            }
            EpisodeStatus::Ready | EpisodeStatus::Running => {}
        }

        let previous_price = self.row(self.current_index).price;
        let next_index = self.current_index + 1;

        // Out of data: no P&L on this transition
        if next_index > self.series.last_index() {
            self.status = EpisodeStatus::Terminated(TerminationReason::EndOfData);
            debug!(
                index = self.current_index,
                balance = self.balance,
                shares_held = self.shares_held,
                "Episode terminated: end of data"
            );
            return Ok(StepResult {
                observation: self.observe(),
                reward: 0.0,
                done: true,
                truncated: false,
                info: self.info(0.0, false, Some(TerminationReason::EndOfData)),
            });
        }

        self.current_index = next_index;
        self.status = EpisodeStatus::Running;

        let row = *self.row(next_index);
        let price_delta = row.price - previous_price;
        self.price_delta = price_delta;

        // Mark-to-market
        let pnl = self.shares_held as f64 * price_delta * self.config.unit_pnl_multiplier;
        self.balance += pnl;

        let executed = self.execute_action(action);

        // Transaction costs hit balance only, not reward
        let mut reward = pnl;

        let termination = if self.balance < 0.0 {
            reward += self.config.ruin_penalty();
            Some(TerminationReason::Ruin)
        } else if self.balance < self.config.drawdown_floor() {
            reward += self.config.drawdown_penalty();
            Some(TerminationReason::Drawdown)
        } else {
            None
        };

        if let Some(reason) = termination {
            self.status = EpisodeStatus::Terminated(reason);
            debug!(
                %reason,
                index = self.current_index,
                balance = self.balance,
                shares_held = self.shares_held,
                "Episode terminated"
            );
        }

        self.history.push(StepRecord {
            index: self.current_index,
            price: row.price,
            indicator: row.indicator,
            action,
            executed,
            balance: self.balance,
            shares_held: self.shares_held,
            reward,
        });

        trace!(
            index = self.current_index,
            %action,
            executed,
            pnl,
            reward,
            balance = self.balance,
            shares_held = self.shares_held,
            "Step"
        );

        Ok(StepResult {
            observation: self.observe(),
            reward,
            done: termination.is_some(),
            truncated: false,
            info: self.info(pnl, executed, termination),
        })
    }

    /// Take a step with a raw action index from a learner
    pub fn step_index(&mut self, action: usize) -> Result<StepResult> {
        let action = EnvAction::try_from(action)?;
        self.step(action)
    }

    /// Apply the position change for `action`; returns whether it executed
    fn execute_action(&mut self, action: EnvAction) -> bool {
        let cost = self.config.cost_per_unit();
        let max_units = self.config.max_units;

        match action {
            EnvAction::Hold => false,

            EnvAction::BuyProtection => {
                if self.shares_held >= max_units || self.balance < cost {
                    return false;
                }
                self.balance -= cost;
                self.shares_held += 1;
                true
            }

            EnvAction::SellProtection => {
                if self.shares_held > 0 {
                    // Closing a long reduces risk and is always allowed
                    self.balance -= cost;
                    self.shares_held -= 1;
                    true
                } else if self.shares_held > -max_units && self.balance >= cost {
                    self.balance -= cost;
                    self.shares_held -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Get current observation
    pub fn observe(&self) -> Observation {
        let row = self.row(self.current_index);
        Observation {
            price: row.price,
            indicator: row.indicator,
            shares_held: self.shares_held,
            balance: self.balance,
            price_delta: self.price_delta,
        }
    }

    fn info(&self, pnl: f64, executed: bool, termination: Option<TerminationReason>) -> StepInfo {
        StepInfo {
            balance: self.balance,
            shares_held: self.shares_held,
            index: self.current_index,
            pnl,
            executed,
            termination,
        }
    }

    fn row(&self, index: usize) -> &SeriesRow {
        &self.series.rows()[index]
    }

    /// Get configuration
    pub fn config(&self) -> &TradingEnvConfig {
        &self.config
    }

    /// Get the underlying series
    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Get episode status
    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    /// Get current balance
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Get current position
    pub fn shares_held(&self) -> i64 {
        self.shares_held
    }

    /// Get current series index
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Get the start index of the current episode
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Get the seed of the current episode
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Steps taken that advanced the index
    pub fn step_count(&self) -> usize {
        self.current_index - self.start_index
    }

    /// Upper bound on `step` calls in the current episode, including the
    /// final out-of-data step
    pub fn max_steps(&self) -> usize {
        self.series.last_index() - self.start_index + 1
    }

    /// Step history of the current episode
    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }
}

impl Environment for TradingEnvironment {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, ResetInfo)> {
        TradingEnvironment::reset(self, seed)
    }

    fn step(&mut self, action: EnvAction) -> Result<StepResult> {
        TradingEnvironment::step(self, action)
    }

    fn observe(&self) -> Observation {
        TradingEnvironment::observe(self)
    }
}

fn check_series_len(series: &Series, config: &TradingEnvConfig) -> Result<()> {
    let required = config.min_series_len();
    if series.len() < required {
        return Err(SimError::Configuration(format!(
            "series has {} rows, need at least {} ({} warm-up rows plus one step)",
            series.len(),
            required,
            config.warmup_rows
        )));
    }
    Ok(())
}
