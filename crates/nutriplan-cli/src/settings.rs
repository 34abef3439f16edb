//! Layered configuration: an optional TOML file overridden by `NUTRIPLAN_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use nutriplan_core::catalog::{Category, DEFAULT_MIN_SCORE};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Undo steps kept per session; unbounded when unset.
  #[serde(default)]
  pub history_limit:        Option<usize>,
  #[serde(default = "default_min_score")]
  pub suggestion_min_score: i64,
  /// Categories inserted into the store on startup unless already present.
  #[serde(default = "default_categories")]
  pub categories:           Vec<Category>,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/nutriplan/nutriplan.db") }

fn default_min_score() -> i64 { DEFAULT_MIN_SCORE }

fn default_categories() -> Vec<Category> {
  vec![
    Category::new("dairy", "Nabiał")
      .with_keywords(["mleko", "jogurt", "kefir", "ser", "twaróg", "masło", "śmietana"]),
    Category::new("bakery", "Pieczywo").with_keywords(["chleb", "bułka", "bagietka"]),
    Category::new("produce", "Owoce i warzywa").with_keywords([
      "jabłko", "banan", "pomidor", "ogórek", "marchew", "cebula", "sałata",
    ]),
    Category::new("meat", "Mięso i ryby")
      .with_keywords(["kurczak", "indyk", "wołowina", "łosoś", "dorsz"]),
    Category::new("grains", "Kasze i makarony")
      .with_keywords(["ryż", "kasza", "makaron", "płatki", "mąka"]),
    Category::new("other", "Inne"),
  ]
}

impl Settings {
  /// Read `path` (missing file is fine) and then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("NUTRIPLAN"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
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
