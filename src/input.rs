use anyhow::{Context, Result};
use clap::{Args, value_parser};
use std::path::PathBuf;

use crate::config::Config;
use crate::constants::constants;
use crate::filter::{DurationClass, FilterCriteria};

/// Split free text into keywords on commas and newlines.
/// Entries are trimmed, empties dropped, duplicates kept.
pub fn parse_keywords(raw: &str) -> Vec<String> {
  raw.replace('\n', ",").split(',').map(str::trim).filter(|k| !k.is_empty()).map(str::to_string).collect()
}

/// Search inputs: keywords plus the filter thresholds.
#[derive(Args, Debug, Default, Clone)]
pub struct SearchArgs {
  /// Topics to search, comma or newline separated
  #[arg(value_name = "KEYWORDS")]
  pub keywords: Vec<String>,

  /// Read additional keywords from a file
  #[arg(short = 'f', long, value_name = "PATH")]
  pub keywords_file: Option<PathBuf>,

  /// Only videos published in the last N days (1-365)
  #[arg(short, long, value_parser = value_parser!(u32).range(1..=365))]
  pub days: Option<u32>,

  /// Only channels with fewer subscribers than this
  #[arg(short = 's', long)]
  pub max_subs: Option<u64>,

  /// Only videos with at least this many views
  #[arg(short = 'v', long)]
  pub min_views: Option<u64>,

  /// Videos this many seconds or shorter count as shorts (10-300)
  #[arg(long, value_parser = value_parser!(u64).range(10..=300))]
  pub shorts_threshold: Option<u64>,

  /// Which videos to keep: all, long, or short
  #[arg(long, value_enum)]
  pub duration: Option<DurationClass>,
}

impl SearchArgs {
  /// Positional keywords and the keywords file, as one block of text.
  pub fn keyword_text(&self) -> Result<String> {
    let mut text = self.keywords.join("\n");
    if let Some(path) = &self.keywords_file {
      let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read keywords file {}", path.display()))?;
      text.push('\n');
      text.push_str(&content);
    }
    Ok(text)
  }

  /// Merge flags over config-file values over built-in defaults, then validate.
  pub fn criteria(&self, config: &Config) -> Result<FilterCriteria> {
    let c = constants();
    let criteria = FilterCriteria {
      lookback_days: self.days.or(config.lookback_days).unwrap_or(c.default_lookback_days),
      max_subscribers: self.max_subs.or(config.max_subscribers).unwrap_or(c.default_max_subscribers),
      min_views: self.min_views.or(config.min_views).unwrap_or(c.default_min_views),
      shorts_threshold_secs: self
        .shorts_threshold
        .or(config.shorts_threshold_secs)
        .unwrap_or(c.default_shorts_threshold_secs),
      duration_class: self.duration.or(config.duration_class).unwrap_or_default(),
    };
    criteria.validate().context("Invalid search settings")?;
    Ok(criteria)
  }
}
