//! Runtime configuration: an optional TOML file under `ENCORE_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File};
use encore_core::lock::LockSettings;
use encore_engine::{RetryPolicy, ScoringSettings};
use encore_setlist::SetlistSettings;
use serde::Deserialize;

/// Everything the server needs, deserialised from `encore.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Enables test-only admin tooling such as forced test scores.
  pub test_tools_enabled: bool,
  pub lock:               LockSettings,
  pub scoring:            ScoringSettings,
  pub retry:              RetryPolicy,
  pub setlist:            SetlistSettings,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".into(),
      port:               8080,
      store_path:         PathBuf::from("~/.local/share/encore/encore.db"),
      test_tools_enabled: false,
      lock:               LockSettings::default(),
      scoring:            ScoringSettings::default(),
      retry:              RetryPolicy::default(),
      setlist:            SetlistSettings::default(),
    }
  }
}

fn environment() -> Environment {
  Environment::with_prefix("ENCORE")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

/// Read `path` (if it exists) and overlay `ENCORE_*` variables, e.g.
/// `ENCORE_SCORING__POINTS__OPENER=10`.
pub fn load(path: &Path) -> anyhow::Result<ServerConfig> {
  Config::builder()
    .add_source(File::from(path).required(false))
    .add_source(environment())
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

/// Parse a TOML document without consulting the environment.
#[cfg(test)]
fn parse(toml: &str) -> anyhow::Result<ServerConfig> {
  Config::builder()
    .add_source(File::from_str(toml, config::FileFormat::Toml))
    .build()?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
