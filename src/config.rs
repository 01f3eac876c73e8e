use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::filter::{DurationClass, FilterCriteria};

/// User preferences persisted in `config.toml`. Every field is optional; CLI flags
/// win over these, and these win over built-in defaults.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub api_key: Option<String>,
  pub api_base_url: Option<String>,
  pub lookback_days: Option<u32>,
  pub max_subscribers: Option<u64>,
  pub min_views: Option<u64>,
  pub shorts_threshold_secs: Option<u64>,
  pub duration_class: Option<DurationClass>,
  pub search_max_results: Option<u32>,
  pub keyword_concurrency: Option<usize>,
  pub request_timeout_secs: Option<u64>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "tubescout")
}

pub fn config_path() -> Option<PathBuf> {
  project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Directory for rolling log files.
pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_local_dir().join("logs"))
}

impl Config {
  pub fn load() -> Self {
    if let Some(path) = config_path()
      && let Ok(content) = std::fs::read_to_string(path)
      && let Ok(config) = Self::parse(&content)
    {
      return config;
    }
    Self::default()
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Persist the given criteria as the new defaults, keeping other settings.
  pub fn remember(&mut self, criteria: &FilterCriteria) {
    self.lookback_days = Some(criteria.lookback_days);
    self.max_subscribers = Some(criteria.max_subscribers);
    self.min_views = Some(criteria.min_views);
    self.shorts_threshold_secs = Some(criteria.shorts_threshold_secs);
    self.duration_class = Some(criteria.duration_class);
  }

  pub fn save(&self) -> anyhow::Result<PathBuf> {
    use anyhow::Context;

    let path = config_path().context("No config directory available on this platform")?;
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize config")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
  }
}
