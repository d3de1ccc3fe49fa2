use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use conveyor_config::EngineConfig;
use conveyor_engine::{Collaborators, TriggerOrchestrator};
use conveyor_model::DefaultWorkflowParser;
use conveyor_testkit::{FakeScm, Fixture, InMemoryStore};

/// Conveyor - downstream trigger engine for a CI build orchestrator
#[derive(Parser)]
#[command(name = "conveyor")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the engine config file (default: built-in defaults)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Load a fixture and run one trigger decision
  Run {
    /// Path to the fixture file (JSON)
    fixture: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run { fixture }) => run(fixture, cli.config)?,
    None => {
      println!("conveyor - use --help to see available commands");
    }
  }

  Ok(())
}

fn run(fixture_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_async(fixture_path, config_path).await })
}

async fn run_async(fixture_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
  let fixture_content = tokio::fs::read_to_string(&fixture_path)
    .await
    .with_context(|| format!("failed to read fixture file: {}", fixture_path.display()))?;

  let fixture: Fixture = serde_json::from_str(&fixture_content)
    .with_context(|| format!("failed to parse fixture file: {}", fixture_path.display()))?;

  eprintln!("Loaded fixture: {} pipeline(s), {} build(s)", fixture.pipelines.len(), fixture.builds.len());

  let config = match config_path {
    Some(path) => {
      let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
      serde_json::from_str(&content).with_context(|| format!("failed to parse config file: {}", path.display()))?
    }
    None => EngineConfig::default(),
  };

  let store = Arc::new(fixture.load().await);

  let trigger_build = conveyor_engine::BuildFactory::get(store.as_ref(), fixture.trigger_build_id)
    .await
    .context("failed to load the fixture's trigger build")?
    .with_context(|| format!("fixture names a trigger_build_id ({}) with no matching build", fixture.trigger_build_id))?;

  let orchestrator = TriggerOrchestrator::new(Collaborators {
    pipelines: store.clone(),
    jobs: store.clone(),
    events: store.clone(),
    builds: store.clone(),
    scm: Arc::new(FakeScm),
    parser: Arc::new(DefaultWorkflowParser),
    config,
  });

  eprintln!("Triggering downstream jobs for build {}", trigger_build.id);
  let triggered = orchestrator
    .trigger_next_jobs(&trigger_build)
    .await
    .context("trigger_next_jobs failed")?;

  eprintln!("{} downstream build(s) created, updated, or started", triggered.len());

  println!("{}", serde_json::to_string_pretty(&triggered)?);

  Ok(())
}
