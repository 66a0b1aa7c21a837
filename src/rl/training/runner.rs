//! Episode Runner
//!
//! Drives environments with a policy and aggregates per-episode results.

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{Result, SimError};
use crate::rl::algorithms::{Policy, PolicyKind};
use crate::rl::config::TradingEnvConfig;
use crate::rl::environment::{Environment, Series, TerminationReason, TradingEnvironment};

/// Outcome of a single episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    /// Episode number within the run
    pub episode: usize,
    /// Seed passed to `reset`
    pub seed: u64,
    /// Series index the episode started from
    pub start_index: usize,
    /// Sum of rewards, penalties included
    pub total_reward: f64,
    /// Number of `step` calls
    pub length: usize,
    /// Balance when the episode ended
    pub final_balance: f64,
    /// Final balance minus initial balance
    pub pnl: f64,
    /// Steps whose action changed the position
    pub num_trades: usize,
    /// Largest peak-to-trough balance decline, as a fraction of the peak
    pub max_drawdown: f64,
    /// Why the episode ended
    pub termination: TerminationReason,
}

/// Run one episode to termination
pub fn run_episode<E: Environment + ?Sized>(
    env: &mut E,
    policy: &mut dyn Policy,
    episode: usize,
    seed: u64,
) -> Result<EpisodeResult> {
    let (mut obs, reset_info) = env.reset(Some(seed))?;
    let initial_balance = reset_info.initial_balance;

    let mut total_reward = 0.0;
    let mut length = 0;
    let mut num_trades = 0;
    let mut peak = initial_balance;
    let mut max_drawdown = 0.0f64;

    let termination = loop {
        let action = policy.select_action(&obs);
        let result = env.step(action)?;

        length += 1;
        total_reward += result.reward;
        if result.info.executed {
            num_trades += 1;
        }

        let balance = result.info.balance;
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - balance) / peak);
        }

        obs = result.observation;

        if result.done || result.truncated {
            break result
                .info
                .termination
                .unwrap_or(TerminationReason::EndOfData);
        }
    };

    let final_balance = obs.balance;

    debug!(
        episode,
        seed,
        length,
        total_reward,
        final_balance,
        %termination,
        "Episode complete"
    );

    Ok(EpisodeResult {
        episode,
        seed,
        start_index: reset_info.start_index,
        total_reward,
        length,
        final_balance,
        pnl: final_balance - initial_balance,
        num_trades,
        max_drawdown,
        termination,
    })
}

/// Seed used for episode `episode` of a run seeded with `base_seed`
pub fn episode_seed(base_seed: u64, episode: usize) -> u64 {
    base_seed.wrapping_add(episode as u64)
}

/// Run `num_episodes` episodes sequentially on one environment
pub fn run_episodes<E: Environment + ?Sized>(
    env: &mut E,
    policy: &mut dyn Policy,
    num_episodes: usize,
    base_seed: u64,
) -> Result<Vec<EpisodeResult>> {
    let mut results = Vec::with_capacity(num_episodes);

    for episode in 0..num_episodes {
        let result = run_episode(env, policy, episode, episode_seed(base_seed, episode))?;

        if (episode + 1) % 10 == 0 {
            info!(
                "Episode {}/{}: reward={:.2}, pnl={:.2}, trades={}, end={}",
                episode + 1,
                num_episodes,
                result.total_reward,
                result.pnl,
                result.num_trades,
                result.termination
            );
        }

        results.push(result);
    }

    Ok(results)
}

/// Run episodes on `workers` independent environments sharing one series.
///
/// Each episode gets its own reset seed and a freshly built policy, so the
/// results do not depend on the number of workers. Results come back in
/// episode order.
pub async fn run_parallel(
    series: Series,
    config: TradingEnvConfig,
    policy: PolicyKind,
    num_episodes: usize,
    workers: usize,
    base_seed: u64,
) -> Result<Vec<EpisodeResult>> {
    if workers == 0 {
        return Err(SimError::Configuration(
            "workers must be at least 1".to_string(),
        ));
    }

    let workers = workers.min(num_episodes.max(1));
    let mut tasks = JoinSet::new();

    for worker in 0..workers {
        let series = series.clone();
        let config = config.clone();

        tasks.spawn_blocking(move || -> Result<Vec<EpisodeResult>> {
            let mut env = TradingEnvironment::with_rng_seed(series, config, base_seed)?;
            let mut results = Vec::new();

            for episode in (worker..num_episodes).step_by(workers) {
                let seed = episode_seed(base_seed, episode);
                let mut agent = policy.build(seed);
                results.push(run_episode(&mut env, agent.as_mut(), episode, seed)?);
            }

            debug!(worker, episodes = results.len(), "Worker finished");
            Ok(results)
        });
    }

    let mut results = Vec::with_capacity(num_episodes);
    while let Some(joined) = tasks.join_next().await {
        results.extend(joined??);
    }
    results.sort_by_key(|r| r.episode);

    info!(
        episodes = results.len(),
        workers,
        policy = ?policy,
        "Parallel run complete"
    );

    Ok(results)
}

/// Summary statistics across episodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Number of episodes
    pub num_episodes: usize,
    /// Average reward per episode
    pub avg_reward: f64,
    /// Average PnL per episode
    pub avg_pnl: f64,
    /// Total cumulative PnL
    pub total_pnl: f64,
    /// Average episode length
    pub avg_length: f64,
    /// Average trades per episode
    pub avg_trades: f64,
    /// Fraction of episodes with positive PnL
    pub episode_win_rate: f64,
    /// Profit factor (wins / losses)
    pub profit_factor: f64,
    /// Worst intra-episode drawdown
    pub max_drawdown: f64,
    /// Episodes ended by ruin
    pub ruin_count: usize,
    /// Episodes ended by the drawdown stop
    pub drawdown_count: usize,
    /// Episodes that ran out of data
    pub end_of_data_count: usize,
}

/// Summarize episode results
pub fn summarize_results(results: &[EpisodeResult]) -> EpisodeSummary {
    if results.is_empty() {
        return EpisodeSummary::default();
    }

    let n = results.len() as f64;

    let avg_reward = results.iter().map(|r| r.total_reward).sum::<f64>() / n;
    let total_pnl: f64 = results.iter().map(|r| r.pnl).sum();
    let avg_length = results.iter().map(|r| r.length as f64).sum::<f64>() / n;
    let avg_trades = results.iter().map(|r| r.num_trades as f64).sum::<f64>() / n;

    // Profit factor
    let total_wins: f64 = results.iter().filter(|r| r.pnl > 0.0).map(|r| r.pnl).sum();
    let total_losses: f64 = results.iter().filter(|r| r.pnl < 0.0).map(|r| -r.pnl).sum();
    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else {
        f64::INFINITY
    };

    let winning_episodes = results.iter().filter(|r| r.pnl > 0.0).count();
    let count = |reason: TerminationReason| {
        results
            .iter()
            .filter(|r| r.termination == reason)
            .count()
    };

    EpisodeSummary {
        num_episodes: results.len(),
        avg_reward,
        avg_pnl: total_pnl / n,
        total_pnl,
        avg_length,
        avg_trades,
        episode_win_rate: winning_episodes as f64 / n,
        profit_factor,
        max_drawdown: results
            .iter()
            .map(|r| r.max_drawdown)
            .fold(0.0, f64::max),
        ruin_count: count(TerminationReason::Ruin),
        drawdown_count: count(TerminationReason::Drawdown),
        end_of_data_count: count(TerminationReason::EndOfData),
    }
}
