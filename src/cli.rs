use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::info;

use crate::config::AppConfig;
use crate::error::Result;
use crate::rl::algorithms::PolicyKind;
use crate::rl::environment::{generate_spread_series, Series, TradingEnvironment};
use crate::rl::training::{
    episode_seed, run_episode, run_parallel, summarize_results, EpisodeResult, EpisodeSummary,
};

#[derive(Parser)]
#[command(name = "cdsim")]
#[command(version)]
#[command(about = "Episodic CDS protection trading environment", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory
    #[arg(short, long, default_value = "config", global = true)]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run episodes with a baseline policy and print a summary
    Run {
        /// Number of episodes
        #[arg(short, long)]
        episodes: Option<usize>,
        /// Base seed for episode resets
        #[arg(short, long)]
        seed: Option<u64>,
        /// Baseline policy
        #[arg(short, long, value_enum)]
        policy: Option<PolicyKind>,
        /// Parallel environment instances
        #[arg(short, long)]
        workers: Option<usize>,
        /// JSON series file (defaults to a synthetic series)
        #[arg(long)]
        series: Option<PathBuf>,
        /// Write the first episode's step history to this JSON file
        #[arg(long)]
        history: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a synthetic spread series and write it as JSON
    Generate {
        /// Output file
        #[arg(short, long, default_value = "data/series.json")]
        output: PathBuf,
        /// Number of rows
        #[arg(short, long)]
        rows: Option<usize>,
        /// Generator seed
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match &self.command {
            Commands::Run {
                episodes,
                seed,
                policy,
                workers,
                series,
                history,
                ..
            } => {
                if let Some(episodes) = episodes {
                    config.run.episodes = *episodes;
                }
                if let Some(seed) = seed {
                    config.run.seed = *seed;
                }
                if let Some(policy) = policy {
                    config.run.policy = *policy;
                }
                if let Some(workers) = workers {
                    config.run.workers = *workers;
                }
                if series.is_some() {
                    config.data.series_path = series.clone();
                }
                if history.is_some() {
                    config.run.history_path = history.clone();
                }
            }
            Commands::Generate { rows, seed, .. } => {
                if let Some(rows) = rows {
                    config.data.synthetic.rows = *rows;
                }
                if let Some(seed) = seed {
                    config.data.seed = *seed;
                }
            }
            Commands::Config => {}
        }
    }
}

/// Load the configured series, or generate a synthetic one
pub fn load_series(config: &AppConfig) -> Result<Series> {
    match &config.data.series_path {
        Some(path) => {
            let series = Series::read_json(path)?;
            info!(path = %path.display(), rows = series.len(), "Loaded series");
            Ok(series)
        }
        None => {
            let series = generate_spread_series(&config.data.synthetic, config.data.seed)?;
            info!(
                rows = series.len(),
                seed = config.data.seed,
                "Generated synthetic series"
            );
            Ok(series)
        }
    }
}

/// Run the configured episodes and print the results
pub async fn run_simulation(config: &AppConfig, json: bool) -> Result<()> {
    let series = load_series(config)?;

    info!(
        episodes = config.run.episodes,
        workers = config.run.workers,
        policy = ?config.run.policy,
        "Starting episode run"
    );

    let results = run_parallel(
        series.clone(),
        config.environment.clone(),
        config.run.policy,
        config.run.episodes,
        config.run.workers,
        config.run.seed,
    )
    .await?;
    let summary = summarize_results(&results);

    if let Some(path) = &config.run.history_path {
        export_history(series, config, path)?;
    }

    if json {
        print_json(&RunReport {
            summary: &summary,
            episodes: &results,
        })?;
    } else {
        print_results(&results, &summary)?;
    }

    Ok(())
}

/// Replay episode 0 and write its step history
fn export_history(series: Series, config: &AppConfig, path: &Path) -> Result<()> {
    let mut env =
        TradingEnvironment::with_rng_seed(series, config.environment.clone(), config.run.seed)?;
    let seed = episode_seed(config.run.seed, 0);
    let mut policy = config.run.policy.build(seed);
    run_episode(&mut env, policy.as_mut(), 0, seed)?;

    env.history().write_json(path)?;
    info!(
        path = %path.display(),
        steps = env.history().len(),
        "Wrote episode history"
    );
    Ok(())
}

/// Generate a synthetic series and write it to `output`
pub fn generate_series(config: &AppConfig, output: &Path) -> Result<()> {
    let series = generate_spread_series(&config.data.synthetic, config.data.seed)?;
    series.write_json(output)?;
    println!(
        "Wrote {} rows to {} (seed {})",
        series.len(),
        output.display(),
        config.data.seed
    );
    Ok(())
}

/// Print the effective configuration
pub fn show_config(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config)?;
    println!("{rendered}");
    Ok(())
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: &'a EpisodeSummary,
    episodes: &'a [EpisodeResult],
}

#[derive(Tabled)]
struct EpisodeRow {
    #[tabled(rename = "Episode")]
    episode: usize,
    #[tabled(rename = "Start")]
    start: usize,
    #[tabled(rename = "Steps")]
    steps: usize,
    #[tabled(rename = "Trades")]
    trades: usize,
    #[tabled(rename = "Reward")]
    reward: String,
    #[tabled(rename = "PnL")]
    pnl: String,
    #[tabled(rename = "Max DD")]
    max_drawdown: String,
    #[tabled(rename = "End")]
    termination: String,
}

impl From<&EpisodeResult> for EpisodeRow {
    fn from(r: &EpisodeResult) -> Self {
        Self {
            episode: r.episode,
            start: r.start_index,
            steps: r.length,
            trades: r.num_trades,
            reward: format!("{:.2}", r.total_reward),
            pnl: format!("{:.2}", r.pnl),
            max_drawdown: format!("{:.1}%", r.max_drawdown * 100.0),
            termination: r.termination.to_string(),
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn summary_rows(summary: &EpisodeSummary) -> Vec<SummaryRow> {
    let row = |metric, value| SummaryRow { metric, value };
    vec![
        row("Episodes", summary.num_episodes.to_string()),
        row("Avg reward", format!("{:.2}", summary.avg_reward)),
        row("Avg PnL", format!("{:.2}", summary.avg_pnl)),
        row("Total PnL", format!("{:.2}", summary.total_pnl)),
        row("Avg length", format!("{:.1}", summary.avg_length)),
        row("Avg trades", format!("{:.1}", summary.avg_trades)),
        row(
            "Episode win rate",
            format!("{:.1}%", summary.episode_win_rate * 100.0),
        ),
        row("Profit factor", format!("{:.2}", summary.profit_factor)),
        row(
            "Max drawdown",
            format!("{:.1}%", summary.max_drawdown * 100.0),
        ),
        row("Ruin", summary.ruin_count.to_string()),
        row("Drawdown stop", summary.drawdown_count.to_string()),
        row("End of data", summary.end_of_data_count.to_string()),
    ]
}

/// Per-episode rows are only printed for short runs
const MAX_EPISODE_ROWS: usize = 25;

fn print_results(results: &[EpisodeResult], summary: &EpisodeSummary) -> anyhow::Result<()> {
    if results.len() <= MAX_EPISODE_ROWS {
        let rows: Vec<EpisodeRow> = results.iter().map(EpisodeRow::from).collect();
        println!("{}", Table::new(rows));
    }
    println!("{}", Table::new(summary_rows(summary)));
    Ok(())
}

fn print_json<T: Serialize>(item: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(item)?;
    println!("{json}");
    Ok(())
}
