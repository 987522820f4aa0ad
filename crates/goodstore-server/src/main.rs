//! goodstore server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `GOODSTORE_*` environment variables, opens the SQLite store, and either
//! serves the HTTP API or runs a one-shot job.
//!
//! ```
//! goodstore serve --seed --pull
//! goodstore seed
//! goodstore recompute-scores
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use goodstore_core::repository::StoreRepository;
use goodstore_server::{ServerConfig, app, jobs};
use goodstore_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "goodstore reconciliation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve {
    /// Bulk-load the configured seed sources before serving.
    #[arg(long)]
    seed: bool,

    /// Pull from the classification service before serving.
    #[arg(long)]
    pull: bool,
  },
  /// Load the configured seed sources and exit.
  Seed,
  /// Pull from the classification service, reconcile, and exit.
  Pull,
  /// Rewrite every score from its certification count and exit.
  RecomputeScores,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GOODSTORE"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // The Kakao key is commonly exported under its own name.
  if cfg.kakao_api_key.is_none() {
    cfg.kakao_api_key = std::env::var("KAKAO_API_KEY").ok();
  }

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let geocoder = cfg.geocoder()?;
  if !geocoder.is_enabled() {
    tracing::warn!("no Kakao API key configured; geocoding disabled");
  }

  jobs::seed_taxonomy(&store).await?;

  let (seed, pull) = match cli.command.unwrap_or(Command::Serve { seed: false, pull: false }) {
    Command::Serve { seed, pull } => (seed, pull),
    Command::Seed => {
      run_seed(&store, &geocoder, &cfg).await?;
      return Ok(());
    }
    Command::Pull => {
      jobs::pull(&store, &geocoder, &cfg.classifier()?).await;
      return Ok(());
    }
    Command::RecomputeScores => {
      let updated = store.recompute_score_from_certifications().await?;
      tracing::info!(updated, "scores recomputed");
      return Ok(());
    }
  };

  if seed {
    run_seed(&store, &geocoder, &cfg).await?;
  }
  if pull {
    jobs::pull(&store, &geocoder, &cfg.classifier()?).await;
  }

  let app = app(Arc::new(store), Arc::new(geocoder));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn run_seed(
  store: &SqliteStore,
  geocoder: &goodstore_server::KakaoGeocoder,
  cfg: &ServerConfig,
) -> anyhow::Result<()> {
  let seed_dir = expand_tilde(&cfg.seed_dir);
  let report = jobs::load_sources(store, geocoder, &cfg.seed_sources, &seed_dir, cfg.batch_size)
    .await
    .context("seed load failed")?;
  tracing::info!(
    created = report.created,
    existing = report.existing,
    linked = report.linked,
    skipped = report.skipped,
    failed = report.failed,
    "seed sources loaded"
  );
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
