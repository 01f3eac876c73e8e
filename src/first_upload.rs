use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::age::parse_timestamp;
use crate::constants::constants;
use crate::hydrate::ChannelDetail;
use crate::youtube::VideoPlatform;

/// Where a channel's first-activity timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstActivitySource {
  /// Channel creation date (no uploads, or the playlist lookup failed).
  ChannelCreation,
  /// Oldest item of the uploads playlist.
  FirstUpload,
  /// Channel creation date; catalog too large to look up cheaply.
  ChannelCreationCapped { limit: u64 },
}

impl FirstActivitySource {
  pub fn label(self) -> String {
    match self {
      FirstActivitySource::ChannelCreation => "Channel Creation".to_string(),
      FirstActivitySource::FirstUpload => "First Upload".to_string(),
      FirstActivitySource::ChannelCreationCapped { limit } => format!("Channel Creation (>{} vids)", limit),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstActivity {
  pub source: FirstActivitySource,
  pub at: Option<DateTime<Utc>>,
}

impl FirstActivity {
  fn channel_creation(channel: &ChannelDetail) -> Self {
    Self { source: FirstActivitySource::ChannelCreation, at: channel.created_at }
  }
}

/// Uploads playlist for a channel, derived from the `UC…` channel ID when the
/// channel record did not carry one.
pub fn uploads_playlist_id(channel: &ChannelDetail) -> Option<String> {
  channel
    .uploads_playlist_id
    .clone()
    .or_else(|| channel.channel_id.strip_prefix("UC").map(|rest| format!("UU{}", rest)))
}

/// Resolves first-upload dates for surviving candidates, one playlist call per
/// distinct small channel. Lives for a single keyword.
pub struct FirstUploadResolver<'a, P> {
  api: &'a P,
  limit: u64,
  cache: HashMap<String, FirstActivity>,
}

impl<'a, P: VideoPlatform> FirstUploadResolver<'a, P> {
  pub fn new(api: &'a P) -> Self {
    Self { api, limit: constants().first_upload_lookup_limit, cache: HashMap::new() }
  }

  pub async fn resolve(&mut self, channel: &ChannelDetail) -> FirstActivity {
    if let Some(hit) = self.cache.get(&channel.channel_id) {
      return hit.clone();
    }
    let resolved = self.lookup(channel).await;
    self.cache.insert(channel.channel_id.clone(), resolved.clone());
    resolved
  }

  async fn lookup(&self, channel: &ChannelDetail) -> FirstActivity {
    let count = channel.total_video_count;
    if count == 0 {
      return FirstActivity::channel_creation(channel);
    }
    if count > self.limit {
      debug!(channel = %channel.channel_id, count, "first-upload: catalog too large, using creation date");
      return FirstActivity {
        source: FirstActivitySource::ChannelCreationCapped { limit: self.limit },
        at: channel.created_at,
      };
    }

    let Some(playlist_id) = uploads_playlist_id(channel) else {
      debug!(channel = %channel.channel_id, "first-upload: no uploads playlist");
      return FirstActivity::channel_creation(channel);
    };

    let max_results = u32::try_from(self.limit).unwrap_or(u32::MAX);
    match self.api.list_playlist_items(&playlist_id, max_results).await {
      // The whole catalog fits in one newest-first page, so the last item is the oldest.
      Ok(page) => match page.items.last().and_then(|item| parse_timestamp(item.snippet.published_at.as_deref())) {
        Some(at) => FirstActivity { source: FirstActivitySource::FirstUpload, at: Some(at) },
        None => {
          debug!(channel = %channel.channel_id, "first-upload: empty playlist page");
          FirstActivity::channel_creation(channel)
        }
      },
      Err(e) => {
        let err = format!("{:#}", e);
        warn!(channel = %channel.channel_id, err = %err, "first-upload: playlist lookup failed");
        FirstActivity::channel_creation(channel)
      }
    }
  }
}
