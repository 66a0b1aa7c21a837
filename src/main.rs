use clap::Parser;
use cdsim::cli::{self, Cli, Commands};
use cdsim::config::AppConfig;
use cdsim::error::{Result, SimError};
use cdsim::logging::{init_logging, init_logging_simple};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)?;
    cli.apply_overrides(&mut config);

    let _log_guard = match &cli.command {
        Commands::Run { .. } => init_logging(&config.logging),
        Commands::Generate { .. } | Commands::Config => {
            init_logging_simple();
            None
        }
    };

    if let Err(problems) = config.validate() {
        for problem in &problems {
            error!("Invalid configuration: {}", problem);
        }
        return Err(SimError::Configuration(problems.join("; ")));
    }

    match &cli.command {
        Commands::Run { json, .. } => cli::run_simulation(&config, *json).await?,
        Commands::Generate { output, .. } => cli::generate_series(&config, output)?,
        Commands::Config => cli::show_config(&config)?,
    }

    Ok(())
}
