//! encore-server binary.
//!
//! Reads `encore.toml` (or the path given with `--config`) under `ENCORE_*`
//! environment overrides, opens the SQLite store, and then either serves the
//! admin API or runs a single command against the store.
//!
//! ```text
//! encore-server serve                 # admin API on host:port
//! encore-server score                 # one scoring pass, JSON report on stdout
//! encore-server reset-show <show-id>
//! encore-server import schedule.json
//! ```
//!
//! `score` is meant to be run from cron; overlapping runs are safe.

mod import;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use encore_engine::{RetryingStore, SubmissionStateManager};
use encore_setlist::SetlistClient;
use encore_store_sqlite::SqliteStore;
use settings::{ServerConfig, expand_tilde};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type Store = RetryingStore<SqliteStore>;
type Manager = SubmissionStateManager<Store, SetlistClient>;

#[derive(Parser)]
#[command(author, version, about = "Encore show scoring server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "encore.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the admin API.
  Serve,
  /// Run one scoring pass and print its report.
  Score,
  /// Clear all derived scoring state of a show.
  ResetShow { show_id: Uuid },
  /// Upsert a tour, its shows and the song catalog from a JSON file.
  Import { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = settings::load(&cli.config)?;
  let store = open_store(&cfg).await?;

  match cli.command {
    Command::Serve => serve(&cfg, manager(&cfg, store)?).await,
    Command::Score => {
      let report = manager(&cfg, store)?.run_pass().await.context("scoring pass failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }
    Command::ResetShow { show_id } => {
      let summary = manager(&cfg, store)?
        .reset_show(show_id)
        .await
        .with_context(|| format!("failed to reset show {show_id}"))?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
      Ok(())
    }
    Command::Import { path } => {
      let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {path:?}"))?;
      let summary = import::apply(&store, import::parse(&json)?).await?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
      Ok(())
    }
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<Store> {
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(dir)
      .await
      .with_context(|| format!("failed to create {dir:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  Ok(RetryingStore::new(store, cfg.retry))
}

fn manager(cfg: &ServerConfig, store: Store) -> anyhow::Result<Manager> {
  if cfg.setlist.api_key.is_empty() {
    tracing::warn!("no setlist API key configured; feed requests will likely fail");
  }
  let source = SetlistClient::new(cfg.setlist.clone()).context("failed to build setlist client")?;
  Ok(SubmissionStateManager::new(
    Arc::new(store),
    Arc::new(source),
    cfg.lock.clone(),
    cfg.scoring.clone(),
  ))
}

async fn serve(cfg: &ServerConfig, manager: Manager) -> anyhow::Result<()> {
  if cfg.test_tools_enabled {
    tracing::warn!("test tools are enabled");
  }
  let app = Router::new()
    .nest("/api", encore_api::api_router(manager, cfg.test_tools_enabled))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("Listening on http://{address}/api");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
