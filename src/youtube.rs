use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

// --- Wire types ---
//
// Field names follow the upstream Data API v3 contract. Everything is optional
// or defaulted; shape validation happens when these are turned into typed records.

/// Parameters for one page of `search.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  pub q: String,
  /// RFC 3339 lower bound on the publish date.
  pub published_after: String,
  pub max_results: u32,
  pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchListResponse {
  pub items: Vec<SearchItem>,
  pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchItem {
  pub id: SearchItemId,
  pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchItemId {
  pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSnippet {
  pub channel_id: Option<String>,
  pub title: Option<String>,
  pub description: Option<String>,
  pub channel_title: Option<String>,
  pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
  pub default: Option<Thumbnail>,
  pub medium: Option<Thumbnail>,
  pub high: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
  pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoListResponse {
  pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoItem {
  pub id: String,
  pub statistics: VideoStatistics,
  pub content_details: VideoContentDetails,
  pub snippet: PublishedSnippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoStatistics {
  #[serde(deserialize_with = "count")]
  pub view_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoContentDetails {
  pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishedSnippet {
  pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelListResponse {
  pub items: Vec<ChannelItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelItem {
  pub id: String,
  pub statistics: ChannelStatistics,
  pub snippet: PublishedSnippet,
  pub content_details: ChannelContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelStatistics {
  #[serde(deserialize_with = "count")]
  pub subscriber_count: Option<u64>,
  #[serde(deserialize_with = "count")]
  pub video_count: Option<u64>,
  pub hidden_subscriber_count: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelContentDetails {
  pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelatedPlaylists {
  pub uploads: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistItemListResponse {
  pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistItem {
  pub snippet: PublishedSnippet,
}

/// Upstream error envelope: `{"error": {"message": ...}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
  message: Option<String>,
}

/// Statistics counts arrive as JSON strings ("1234"), occasionally as numbers.
/// Anything unparseable is treated as absent.
fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Number(u64),
    Text(String),
    Other(IgnoredAny),
  }

  Ok(match Option::<Raw>::deserialize(deserializer)? {
    Some(Raw::Number(n)) => Some(n),
    Some(Raw::Text(s)) => s.trim().parse().ok(),
    Some(Raw::Other(_)) | None => None,
  })
}

// --- Platform seam ---

/// The upstream video platform as seen by the discovery pipeline.
#[allow(async_fn_in_trait)]
pub trait VideoPlatform {
  /// One page of a `type=video`, `order=viewCount` search.
  async fn search_videos(&self, query: &SearchQuery) -> Result<SearchListResponse>;

  /// Batched video lookup (`statistics,contentDetails,snippet`).
  async fn list_videos(&self, ids: &[String]) -> Result<VideoListResponse>;

  /// Batched channel lookup (`statistics,snippet,contentDetails`).
  async fn list_channels(&self, ids: &[String]) -> Result<ChannelListResponse>;

  /// First page of a playlist, newest first.
  async fn list_playlist_items(&self, playlist_id: &str, max_results: u32) -> Result<PlaylistItemListResponse>;
}

/// Data API v3 client over `reqwest`.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
  http: Client,
  base_url: String,
  api_key: String,
}

impl YouTubeClient {
  pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let http = Client::builder()
      .timeout(timeout)
      .user_agent(concat!("tubescout/", env!("CARGO_PKG_VERSION")))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), api_key: api_key.into() })
  }

  fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url> {
    let base = format!("{}/{}", self.base_url, resource);
    let key = [("key", self.api_key.as_str())];
    Url::parse_with_params(&base, params.iter().chain(key.iter()))
      .with_context(|| format!("Invalid API endpoint URL: {}", base))
  }

  // --- Request builders ---

  fn search_url(&self, query: &SearchQuery) -> Result<Url> {
    let max_results = query.max_results.to_string();
    let mut params = vec![
      ("part", "snippet"),
      ("q", query.q.as_str()),
      ("type", "video"),
      ("order", "viewCount"),
      ("publishedAfter", query.published_after.as_str()),
      ("maxResults", max_results.as_str()),
    ];
    if let Some(token) = query.page_token.as_deref() {
      params.push(("pageToken", token));
    }
    self.endpoint("search", &params)
  }

  fn videos_url(&self, ids: &[String]) -> Result<Url> {
    let joined = ids.join(",");
    self.endpoint("videos", &[("part", "statistics,contentDetails,snippet"), ("id", joined.as_str())])
  }

  fn channels_url(&self, ids: &[String]) -> Result<Url> {
    let joined = ids.join(",");
    self.endpoint("channels", &[("part", "statistics,snippet,contentDetails"), ("id", joined.as_str())])
  }

  fn playlist_items_url(&self, playlist_id: &str, max_results: u32) -> Result<Url> {
    let max_results = max_results.to_string();
    self.endpoint(
      "playlistItems",
      &[("part", "snippet"), ("playlistId", playlist_id), ("maxResults", max_results.as_str())],
    )
  }

  /// GET and decode. Transport errors drop their URL, which carries the API key.
  async fn get_json<T: DeserializeOwned>(&self, resource: &str, url: Url) -> Result<T> {
    debug!(resource, "youtube: GET");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(reqwest::Error::without_url)
      .with_context(|| format!("Request to '{}' endpoint failed", resource))?;
    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(reqwest::Error::without_url)
      .with_context(|| format!("Failed to read '{}' response body", resource))?;

    if !status.is_success() {
      return Err(anyhow!("{} ({})", error_message(&body), status));
    }
    serde_json::from_str(&body).with_context(|| format!("Malformed JSON from '{}' endpoint", resource))
  }
}

/// Extract `error.message` from an upstream error body.
pub fn error_message(body: &str) -> String {
  serde_json::from_str::<ErrorEnvelope>(body)
    .ok()
    .and_then(|e| e.error.message)
    .filter(|m| !m.is_empty())
    .unwrap_or_else(|| "Unknown Error".to_string())
}

impl VideoPlatform for YouTubeClient {
  async fn search_videos(&self, query: &SearchQuery) -> Result<SearchListResponse> {
    self.get_json("search", self.search_url(query)?).await
  }

  async fn list_videos(&self, ids: &[String]) -> Result<VideoListResponse> {
    self.get_json("videos", self.videos_url(ids)?).await
  }

  async fn list_channels(&self, ids: &[String]) -> Result<ChannelListResponse> {
    self.get_json("channels", self.channels_url(ids)?).await
  }

  async fn list_playlist_items(&self, playlist_id: &str, max_results: u32) -> Result<PlaylistItemListResponse> {
    self.get_json("playlistItems", self.playlist_items_url(playlist_id, max_results)?).await
  }
}
