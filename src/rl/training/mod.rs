//! Training Infrastructure
//!
//! Episode runners and result summaries.

pub mod runner;

pub use runner::{
    episode_seed, run_episode, run_episodes, run_parallel, summarize_results, EpisodeResult,
    EpisodeSummary,
};
