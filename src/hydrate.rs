use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::age::parse_timestamp;
use crate::duration::parse_duration;
use crate::search::SearchCandidate;
use crate::youtube::{ChannelItem, VideoItem, VideoPlatform};

/// Typed per-video record. Absent data defaults to zero / `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetail {
  pub video_id: String,
  pub view_count: u64,
  pub duration_secs: u64,
  pub published_at: Option<DateTime<Utc>>,
}

impl VideoDetail {
  pub fn missing(video_id: &str) -> Self {
    Self { video_id: video_id.to_string(), view_count: 0, duration_secs: 0, published_at: None }
  }
}

impl From<VideoItem> for VideoDetail {
  fn from(item: VideoItem) -> Self {
    Self {
      view_count: item.statistics.view_count.unwrap_or(0),
      duration_secs: parse_duration(item.content_details.duration.as_deref()),
      published_at: parse_timestamp(item.snippet.published_at.as_deref()),
      video_id: item.id,
    }
  }
}

/// Typed per-channel record. A subscriber count of 0 means hidden or unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetail {
  pub channel_id: String,
  pub subscriber_count: u64,
  pub total_video_count: u64,
  pub created_at: Option<DateTime<Utc>>,
  pub uploads_playlist_id: Option<String>,
}

impl ChannelDetail {
  pub fn missing(channel_id: &str) -> Self {
    Self {
      channel_id: channel_id.to_string(),
      subscriber_count: 0,
      total_video_count: 0,
      created_at: None,
      uploads_playlist_id: None,
    }
  }
}

impl From<ChannelItem> for ChannelDetail {
  fn from(item: ChannelItem) -> Self {
    if item.statistics.hidden_subscriber_count {
      debug!(channel = %item.id, "hydrate: subscriber count hidden");
    }
    Self {
      subscriber_count: item.statistics.subscriber_count.unwrap_or(0),
      total_video_count: item.statistics.video_count.unwrap_or(0),
      created_at: parse_timestamp(item.snippet.published_at.as_deref()),
      uploads_playlist_id: item.content_details.related_playlists.uploads.filter(|p| !p.is_empty()),
      channel_id: item.id,
    }
  }
}

/// Lookup tables for one keyword, keyed by video and channel ID.
#[derive(Debug, Default)]
pub struct Hydrated {
  pub videos: HashMap<String, VideoDetail>,
  pub channels: HashMap<String, ChannelDetail>,
}

impl Hydrated {
  pub fn video(&self, video_id: &str) -> VideoDetail {
    self.videos.get(video_id).cloned().unwrap_or_else(|| VideoDetail::missing(video_id))
  }

  pub fn channel(&self, channel_id: &str) -> ChannelDetail {
    self.channels.get(channel_id).cloned().unwrap_or_else(|| ChannelDetail::missing(channel_id))
  }
}

/// Unique IDs in first-seen order.
fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
  let mut seen = HashSet::new();
  ids.filter(|id| seen.insert(*id)).map(str::to_string).collect()
}

/// Keep candidates, in order, while their unique video and channel IDs both fit
/// in one batch. Later candidates that would need a second batch are dropped.
pub fn fit_to_batch(candidates: Vec<SearchCandidate>, ceiling: usize) -> Vec<SearchCandidate> {
  let mut videos = HashSet::new();
  let mut channels = HashSet::new();
  let total = candidates.len();
  let kept: Vec<SearchCandidate> = candidates
    .into_iter()
    .filter(|c| {
      let new_video = !videos.contains(&c.video_id);
      let new_channel = !channels.contains(&c.channel_id);
      if (new_video && videos.len() >= ceiling) || (new_channel && channels.len() >= ceiling) {
        return false;
      }
      videos.insert(c.video_id.clone());
      channels.insert(c.channel_id.clone());
      true
    })
    .collect();
  if kept.len() < total {
    warn!(total, kept = kept.len(), ceiling, "hydrate: candidates beyond batch ceiling dropped");
  }
  kept
}

/// Fetch video and channel details for all candidates with exactly one call each.
///
/// Both calls run concurrently and must both succeed. IDs missing from a response
/// fall back to zero-valued records at lookup time.
pub async fn hydrate<P: VideoPlatform>(api: &P, candidates: &[SearchCandidate]) -> Result<Hydrated> {
  let video_ids = unique_ids(candidates.iter().map(|c| c.video_id.as_str()));
  let channel_ids = unique_ids(candidates.iter().map(|c| c.channel_id.as_str()));
  if video_ids.is_empty() {
    return Ok(Hydrated::default());
  }

  let (videos, channels) = tokio::join!(api.list_videos(&video_ids), api.list_channels(&channel_ids));
  let videos = videos.context("video batch lookup failed")?;
  let channels = channels.context("channel batch lookup failed")?;

  let hydrated = Hydrated {
    videos: videos.items.into_iter().map(VideoDetail::from).map(|v| (v.video_id.clone(), v)).collect(),
    channels: channels.items.into_iter().map(ChannelDetail::from).map(|c| (c.channel_id.clone(), c)).collect(),
  };
  info!(
    requested_videos = video_ids.len(),
    videos = hydrated.videos.len(),
    requested_channels = channel_ids.len(),
    channels = hydrated.channels.len(),
    "hydrate: batch lookups complete"
  );
  Ok(hydrated)
}
