//! Append-only per-step log for post-episode reporting.
//!
//! The environment only ever pushes to this log; nothing in the step logic
//! reads it back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rl::core::EnvAction;

/// Snapshot taken after each non-terminal-data step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Series index after the step
    pub index: usize,
    /// Price at `index`
    pub price: f64,
    /// Indicator at `index`
    pub indicator: f64,
    /// Action requested by the controller
    pub action: EnvAction,
    /// Whether the action changed the position
    pub executed: bool,
    /// Balance after the step
    pub balance: f64,
    /// Position after the step
    pub shares_held: i64,
    /// Reward returned for the step
    pub reward: f64,
}

/// Step history of one episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeHistory {
    records: Vec<StepRecord>,
}

impl EpisodeHistory {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// All records in step order
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of steps whose action changed the position
    pub fn num_trades(&self) -> usize {
        self.records.iter().filter(|r| r.executed).count()
    }

    /// Balance after each step
    pub fn equity_curve(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.balance).collect()
    }

    /// Sum of step rewards
    pub fn total_reward(&self) -> f64 {
        self.records.iter().map(|r| r.reward).sum()
    }

    /// Largest peak-to-trough balance decline, as a fraction of the peak
    pub fn max_drawdown(&self, initial_balance: f64) -> f64 {
        let mut peak = initial_balance;
        let mut max_drawdown = 0.0f64;
        for balance in self.records.iter().map(|r| r.balance) {
            if balance > peak {
                peak = balance;
            }
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - balance) / peak);
            }
        }
        max_drawdown
    }

    /// Write the records as a JSON array
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
