#![recursion_limit = "256"]

use std::io::Stdout;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pong_actor_critic::ai::backend::default_device;
use pong_actor_critic::ai::{ActorCriticAgent, AgentSpec, PerceptionStack, PolicyInput};
use pong_actor_critic::checkpoint::{CheckpointMetrics, CheckpointStore, REWARD_HISTORY_FILE};
use pong_actor_critic::config::AppConfig;
use pong_actor_critic::training::dashboard_msg::TrainingUpdate;
use pong_actor_critic::training::environment::PongEnvironment;
use pong_actor_critic::training::metrics::RewardHistory;
use pong_actor_critic::training::trainer::{Trainer, TrainingSummary};
use pong_actor_critic::ui::training_dashboard::{DashboardState, TrainingStatus};
use pong_actor_critic::ui::{reward_chart, training_view};

/// Train a Pong actor-critic agent against a fixed opponent.
#[derive(Parser)]
#[command(name = "train", about = "Train a Pong actor-critic agent")]
struct Cli {
    /// Checkpoint directory of the agent being trained (holds the perception weights)
    dir1: PathBuf,

    /// Checkpoint directory of a frozen opponent; the scripted AI when omitted
    dir2: Option<PathBuf>,

    /// Show the live training dashboard
    #[arg(short, long)]
    render: bool,

    /// Number of episodes to play
    #[arg(short, long, default_value_t = 100)]
    games: usize,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Continue from the policy, optimizer and reward history saved in the
    /// save directory
    #[arg(long)]
    resume: bool,

    /// Where to write the trained policy (defaults to dir1)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Seed the policy and the simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the reward chart at the end
    #[arg(long)]
    no_plot: bool,
}

type Term = Terminal<CrosstermBackend<Stdout>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.render { "warn" } else { "info" });

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    app_config.training.num_episodes = cli.games;
    if let Some(lr) = cli.lr {
        app_config.agent.learning_rate = lr;
    }
    if let Some(seed) = cli.seed {
        app_config.agent.seed = Some(seed);
        app_config.environment.seed = Some(seed);
    }
    app_config.validate().context("validating configuration")?;

    let save_store = CheckpointStore::new(cli.save_dir.clone().unwrap_or_else(|| cli.dir1.clone()));
    let perception_config = app_config.perception.network_config(&app_config.environment);

    // Perception always comes from dir1; the policy is read from the save
    // directory when resuming.
    let mut agent = ActorCriticAgent::new(app_config.agent.clone(), perception_config.clone())
        .with_checkpoint(save_store.clone());
    if app_config.agent.policy_input == PolicyInput::Positions {
        let perception = PerceptionStack::load(
            &CheckpointStore::new(&cli.dir1),
            &perception_config,
            &default_device(),
        )
        .with_context(|| format!("loading perception weights from {}", cli.dir1.display()))?;
        agent = agent.with_perception(perception);
    }

    let mut history = RewardHistory::new();
    if cli.resume {
        let adopted = agent
            .load_policy()
            .with_context(|| format!("resuming from {}", save_store.dir().display()))?;
        if save_store.exists(REWARD_HISTORY_FILE) {
            history = save_store
                .load_json(REWARD_HISTORY_FILE)
                .context("loading reward history")?;
        }
        info!(
            adopted,
            episodes = agent.episode_count(),
            history = history.len(),
            "resumed training"
        );
    }

    let opponent = AgentSpec::from_dir(cli.dir2.clone())
        .build(&app_config.agent, &perception_config, &app_config.environment)
        .context("building opponent")?;

    let env = PongEnvironment::new(app_config.environment.clone());
    let trainer = Trainer::new(app_config.training.clone(), env, opponent).with_history(history);

    let (agent, summary) = if cli.render {
        run_dashboard(agent, trainer, app_config.training.num_episodes)?
    } else {
        let mut trainer = trainer;
        let summary = trainer.train(&mut agent).context("training")?;
        (agent, summary)
    };

    if summary.interrupted {
        warn!(episodes = summary.episodes, "training interrupted, saving progress");
    }

    let metrics = CheckpointMetrics {
        episodes: agent.episode_count(),
        average_reward: summary.history.average(),
        last_loss: summary.last_loss,
    };
    let path = agent
        .save(&save_store, metrics)
        .with_context(|| format!("saving checkpoint to {}", save_store.dir().display()))?;
    save_store
        .save_json(REWARD_HISTORY_FILE, &summary.history)
        .context("saving reward history")?;
    info!(
        path = %path.display(),
        episodes = summary.episodes,
        skipped = summary.skipped_updates,
        average = summary.history.average(),
        "checkpoint saved"
    );

    if !cli.no_plot && !summary.history.is_empty() {
        with_terminal(|terminal| {
            reward_chart::run(terminal, &summary.history).context("drawing reward chart")
        })?;
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Set up the alternate screen, run `body`, and always restore the terminal.
fn with_terminal<T>(body: impl FnOnce(&mut Term) -> Result<T>) -> Result<T> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    let result = body(&mut terminal);

    // Terminal cleanup: use let _ = to avoid double-panic
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
    result
}

fn run_dashboard(
    agent: ActorCriticAgent,
    trainer: Trainer<PongEnvironment>,
    total_episodes: usize,
) -> Result<(ActorCriticAgent, TrainingSummary)> {
    let (update_tx, update_rx) = mpsc::channel::<TrainingUpdate>();

    let pause = Arc::new(AtomicBool::new(false));
    let quit = Arc::new(AtomicBool::new(false));

    let pause_clone = pause.clone();
    let quit_clone = quit.clone();

    let training_handle = std::thread::spawn(move || {
        let mut agent = agent;
        let mut trainer = trainer;
        let result = trainer.train_with_dashboard(&mut agent, update_tx, pause_clone, quit_clone);
        (agent, result)
    });

    let ui_result = with_terminal(|terminal| {
        run_dashboard_ui(terminal, update_rx, pause, quit.clone(), total_episodes)
    });
    if ui_result.is_err() {
        // Let the worker stop at the next episode boundary before joining.
        quit.store(true, Ordering::Relaxed);
    }

    let (agent, result) = training_handle
        .join()
        .map_err(|_| anyhow!("training thread panicked"))?;
    ui_result?;
    let summary = result.context("training")?;
    Ok((agent, summary))
}

fn run_dashboard_ui(
    terminal: &mut Term,
    update_rx: mpsc::Receiver<TrainingUpdate>,
    pause: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
    total_episodes: usize,
) -> Result<()> {
    let mut dashboard = DashboardState::new(total_episodes);
    let frame_duration = Duration::from_millis(100);

    loop {
        while let Ok(update) = update_rx.try_recv() {
            match update {
                TrainingUpdate::Metrics(snap) => dashboard.apply_metrics(&snap),
                TrainingUpdate::Live(live) => dashboard.apply_live(live),
                TrainingUpdate::Skipped { episode, reason } => dashboard.apply_skip(episode, reason),
                TrainingUpdate::Finished => {
                    if dashboard.status != TrainingStatus::Failed {
                        dashboard.status = TrainingStatus::Finished;
                    }
                }
                TrainingUpdate::Failed(message) => dashboard.fail(message),
            }
        }

        terminal
            .draw(|f| training_view::render(f, &dashboard))
            .context("drawing dashboard")?;

        if event::poll(frame_duration).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => {
                        quit.store(true, Ordering::Relaxed);
                        break;
                    }
                    KeyCode::Char('p') | KeyCode::Char('P') => {
                        let was_paused = pause.load(Ordering::Relaxed);
                        pause.store(!was_paused, Ordering::Relaxed);
                        dashboard.status = if was_paused {
                            TrainingStatus::Running
                        } else {
                            TrainingStatus::Paused
                        };
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
