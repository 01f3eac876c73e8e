//! In-memory `VideoPlatform` for tests.

use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::youtube::{
  ChannelContentDetails, ChannelItem, ChannelListResponse, ChannelStatistics, PlaylistItem, PlaylistItemListResponse,
  PublishedSnippet, RelatedPlaylists, SearchItem, SearchItemId, SearchListResponse, SearchQuery, SearchSnippet,
  Thumbnail, Thumbnails, VideoContentDetails, VideoItem, VideoListResponse, VideoPlatform, VideoStatistics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
  Search,
  Videos,
  Channels,
  PlaylistItems,
}

#[derive(Default)]
pub struct FakePlatform {
  pub searches: HashMap<String, Vec<SearchItem>>,
  pub videos: HashMap<String, VideoItem>,
  pub channels: HashMap<String, ChannelItem>,
  pub playlists: HashMap<String, Vec<PlaylistItem>>,
  pub failing: HashSet<Endpoint>,
  pub failing_keywords: HashSet<String>,
  calls: Mutex<Vec<(Endpoint, String)>>,
  queries: Mutex<Vec<SearchQuery>>,
}

impl FakePlatform {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register one search hit plus its video and channel records.
  pub fn add_hit(&mut self, keyword: &str, video: VideoItem, channel: ChannelItem) {
    let hit = search_item(&video.id, &channel.id);
    self.searches.entry(keyword.to_string()).or_default().push(hit);
    self.videos.insert(video.id.clone(), video);
    self.channels.insert(channel.id.clone(), channel);
  }

  pub fn fail(&mut self, endpoint: Endpoint) {
    self.failing.insert(endpoint);
  }

  fn record(&self, endpoint: Endpoint, arg: String) -> Result<()> {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push((endpoint, arg));
    }
    if self.failing.contains(&endpoint) {
      return Err(anyhow!("simulated {:?} failure (403 Forbidden)", endpoint));
    }
    Ok(())
  }

  pub fn calls(&self, endpoint: Endpoint) -> usize {
    self.calls.lock().map(|c| c.iter().filter(|(e, _)| *e == endpoint).count()).unwrap_or(0)
  }

  /// Every search query received, in call order.
  pub fn search_queries(&self) -> Vec<SearchQuery> {
    self.queries.lock().map(|q| q.clone()).unwrap_or_default()
  }

  /// Arguments of every call to `endpoint`, in call order.
  pub fn call_args(&self, endpoint: Endpoint) -> Vec<String> {
    self
      .calls
      .lock()
      .map(|c| c.iter().filter(|(e, _)| *e == endpoint).map(|(_, a)| a.clone()).collect())
      .unwrap_or_default()
  }
}

impl VideoPlatform for FakePlatform {
  async fn search_videos(&self, query: &SearchQuery) -> Result<SearchListResponse> {
    if let Ok(mut queries) = self.queries.lock() {
      queries.push(query.clone());
    }
    self.record(Endpoint::Search, query.q.clone())?;
    if self.failing_keywords.contains(&query.q) {
      return Err(anyhow!("quotaExceeded (403 Forbidden)"));
    }
    let mut items = self.searches.get(&query.q).cloned().unwrap_or_default();
    items.truncate(query.max_results as usize);
    Ok(SearchListResponse { items, next_page_token: None })
  }

  async fn list_videos(&self, ids: &[String]) -> Result<VideoListResponse> {
    self.record(Endpoint::Videos, ids.join(","))?;
    Ok(VideoListResponse { items: ids.iter().filter_map(|id| self.videos.get(id).cloned()).collect() })
  }

  async fn list_channels(&self, ids: &[String]) -> Result<ChannelListResponse> {
    self.record(Endpoint::Channels, ids.join(","))?;
    Ok(ChannelListResponse { items: ids.iter().filter_map(|id| self.channels.get(id).cloned()).collect() })
  }

  async fn list_playlist_items(&self, playlist_id: &str, max_results: u32) -> Result<PlaylistItemListResponse> {
    self.record(Endpoint::PlaylistItems, playlist_id.to_string())?;
    let mut items =
      self.playlists.get(playlist_id).cloned().ok_or_else(|| anyhow!("playlistNotFound (404 Not Found)"))?;
    items.truncate(max_results as usize);
    Ok(PlaylistItemListResponse { items })
  }
}

// --- Fixture builders ---

pub fn search_item(video_id: &str, channel_id: &str) -> SearchItem {
  SearchItem {
    id: SearchItemId { video_id: Some(video_id.to_string()) },
    snippet: Some(SearchSnippet {
      channel_id: Some(channel_id.to_string()),
      title: Some(format!("Video {}", video_id)),
      description: Some(format!("Description of {}", video_id)),
      channel_title: Some(format!("Channel {}", channel_id)),
      thumbnails: Thumbnails {
        medium: Some(Thumbnail { url: Some(format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", video_id)) }),
        ..Thumbnails::default()
      },
    }),
  }
}

pub fn video_item(id: &str, views: u64, duration: &str, published_at: &str) -> VideoItem {
  VideoItem {
    id: id.to_string(),
    statistics: VideoStatistics { view_count: Some(views) },
    content_details: VideoContentDetails { duration: Some(duration.to_string()) },
    snippet: PublishedSnippet { published_at: Some(published_at.to_string()) },
  }
}

pub fn channel_item(id: &str, subs: Option<u64>, video_count: u64, created_at: &str, uploads: Option<&str>) -> ChannelItem {
  ChannelItem {
    id: id.to_string(),
    statistics: ChannelStatistics {
      subscriber_count: subs,
      video_count: Some(video_count),
      hidden_subscriber_count: subs.is_none(),
    },
    snippet: PublishedSnippet { published_at: Some(created_at.to_string()) },
    content_details: ChannelContentDetails { related_playlists: RelatedPlaylists { uploads: uploads.map(String::from) } },
  }
}

/// Playlist page from publish timestamps, newest first.
pub fn playlist(published_newest_first: &[&str]) -> Vec<PlaylistItem> {
  published_newest_first
    .iter()
    .map(|p| PlaylistItem { snippet: PublishedSnippet { published_at: Some(p.to_string()) } })
    .collect()
}
