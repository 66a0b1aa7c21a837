use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rl::algorithms::PolicyKind;
use crate::rl::config::TradingEnvConfig;
use crate::rl::environment::SyntheticConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trading environment parameters
    #[serde(default)]
    pub environment: TradingEnvConfig,
    /// Where the series comes from
    #[serde(default)]
    pub data: DataConfig,
    /// Episode run parameters
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON series file; a synthetic series is generated when unset
    pub series_path: Option<PathBuf>,
    /// Seed for the synthetic series
    pub seed: u64,
    /// Synthetic series parameters
    pub synthetic: SyntheticConfig,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            series_path: None,
            seed: 7,
            synthetic: SyntheticConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of episodes to run
    pub episodes: usize,
    /// Base seed; episode `i` resets with `seed + i`
    pub seed: u64,
    /// Baseline policy driving the environment
    pub policy: PolicyKind,
    /// Independent environment instances run in parallel
    pub workers: usize,
    /// Write the step history of the first episode here
    pub history_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            episodes: 20,
            seed: 42,
            policy: PolicyKind::default(),
            workers: 4,
            history_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json: bool,
    /// Directory for daily-rotated log files; console only when unset
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load profile-specific config (e.g., config/stress.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("CDSIM_PROFILE").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (CDSIM_ENVIRONMENT__MAX_UNITS, etc.)
            .add_source(
                Environment::with_prefix("CDSIM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.environment.validate() {
            errors.push(e.to_string());
        }

        if self.run.episodes == 0 {
            errors.push("run.episodes must be at least 1".to_string());
        }
        if self.run.workers == 0 {
            errors.push("run.workers must be at least 1".to_string());
        }

        if self.data.series_path.is_none() {
            if let Err(e) = self.data.synthetic.validate() {
                errors.push(e.to_string());
            }
            let required = self.environment.min_series_len();
            if self.data.synthetic.rows < required {
                errors.push(format!(
                    "data.synthetic.rows ({}) must be at least {}",
                    self.data.synthetic.rows, required
                ));
            }
            if self.data.synthetic.rsi_period > self.environment.warmup_rows {
                errors.push(format!(
                    "data.synthetic.rsi_period ({}) exceeds environment.warmup_rows ({})",
                    self.data.synthetic.rsi_period, self.environment.warmup_rows
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
