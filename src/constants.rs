//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file I/O.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// Tuneable defaults and upstream limits.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Upstream API
  pub api_base_url: String,
  pub watch_url_prefix: String,
  pub batch_size_ceiling: usize,
  pub first_upload_lookup_limit: u64,

  // Pipeline defaults
  pub search_max_results: u32,
  pub request_timeout_secs: u64,
  pub keyword_concurrency: usize,

  // Filter defaults
  pub default_lookback_days: u32,
  pub default_max_subscribers: u64,
  pub default_min_views: u64,
  pub default_shorts_threshold_secs: u64,

  // Output
  pub description_preview_chars: usize,
  pub title_column_width: usize,
  pub log_file_prefix: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails the first test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
