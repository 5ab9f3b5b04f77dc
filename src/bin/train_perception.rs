#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pong_actor_critic::checkpoint::CheckpointStore;
use pong_actor_critic::config::AppConfig;
use pong_actor_critic::training::perception_trainer::PerceptionTrainer;

/// Fit the four position regressors on simulator frames.
#[derive(Parser)]
#[command(name = "train_perception", about = "Train the Pong perception networks")]
struct Cli {
    /// Directory to write the weights_*.mdl files into
    dir: PathBuf,

    /// Override the number of optimizer steps
    #[arg(long)]
    steps: Option<usize>,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Seed the data-collecting players and the simulator
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(steps) = cli.steps {
        app_config.perception.steps = steps;
    }
    if let Some(seed) = cli.seed {
        app_config.perception.seed = Some(seed);
        app_config.environment.seed = Some(seed);
    }
    app_config.validate().context("validating configuration")?;

    let mut trainer = PerceptionTrainer::new(app_config.perception.clone(), app_config.environment.clone());
    let (stack, losses) = trainer.train().context("training perception networks")?;

    let store = CheckpointStore::new(&cli.dir);
    stack
        .save(&store)
        .with_context(|| format!("saving perception weights to {}", cli.dir.display()))?;
    info!(
        dir = %cli.dir.display(),
        mean_loss = losses.mean(),
        "perception networks saved"
    );
    Ok(())
}
