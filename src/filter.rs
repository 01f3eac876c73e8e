use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hydrate::{ChannelDetail, VideoDetail};

/// Which side of the shorts threshold a result must fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationClass {
  #[default]
  All,
  Long,
  Short,
}

impl DurationClass {
  pub fn admits(self, is_short: bool) -> bool {
    match self {
      DurationClass::All => true,
      DurationClass::Long => !is_short,
      DurationClass::Short => is_short,
    }
  }
}

/// Immutable per-run filter settings, shared read-only by every keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
  pub lookback_days: u32,
  pub max_subscribers: u64,
  pub min_views: u64,
  pub shorts_threshold_secs: u64,
  pub duration_class: DurationClass,
}

pub const LOOKBACK_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=365;
pub const SHORTS_THRESHOLD_RANGE: std::ops::RangeInclusive<u64> = 10..=300;

impl FilterCriteria {
  /// Reject out-of-range settings before any network activity.
  pub fn validate(&self) -> Result<()> {
    if !LOOKBACK_DAYS_RANGE.contains(&self.lookback_days) {
      bail!("lookback days must be between 1 and 365 (got {})", self.lookback_days);
    }
    if !SHORTS_THRESHOLD_RANGE.contains(&self.shorts_threshold_secs) {
      bail!("shorts threshold must be between 10 and 300 seconds (got {})", self.shorts_threshold_secs);
    }
    Ok(())
  }

  pub fn is_short(&self, duration_secs: u64) -> bool {
    duration_secs <= self.shorts_threshold_secs
  }

  /// Apply the predicates cheapest first, stopping at the first failure.
  /// Returns the short/long classification for accepted candidates.
  pub fn check(&self, video: &VideoDetail, channel: &ChannelDetail) -> Result<bool, Rejection> {
    let subs = channel.subscriber_count;
    // Zero covers both hidden and unknown counts; neither can be verified.
    if subs == 0 {
      return Err(Rejection::UnverifiableSubscribers);
    }
    if subs >= self.max_subscribers {
      return Err(Rejection::TooManySubscribers(subs));
    }
    if video.view_count < self.min_views {
      return Err(Rejection::TooFewViews(video.view_count));
    }
    let is_short = self.is_short(video.duration_secs);
    if !self.duration_class.admits(is_short) {
      return Err(Rejection::DurationClass { is_short });
    }
    Ok(is_short)
  }
}

/// Why a candidate was dropped. Only used for debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  UnverifiableSubscribers,
  TooManySubscribers(u64),
  TooFewViews(u64),
  DurationClass { is_short: bool },
}

impl fmt::Display for Rejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Rejection::UnverifiableSubscribers => write!(f, "subscriber count hidden or unknown"),
      Rejection::TooManySubscribers(n) => write!(f, "{} subscribers at or above ceiling", n),
      Rejection::TooFewViews(n) => write!(f, "{} views below floor", n),
      Rejection::DurationClass { is_short: true } => write!(f, "short excluded"),
      Rejection::DurationClass { is_short: false } => write!(f, "long-form excluded"),
    }
  }
}
