use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::constants::constants;
use crate::youtube::{SearchItem, SearchListResponse, SearchQuery, VideoPlatform};

/// A search hit not yet confirmed to satisfy the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
  pub video_id: String,
  pub channel_id: String,
  pub title: String,
  pub description: String,
  pub channel_title: String,
  pub thumbnail_url: String,
}

impl SearchCandidate {
  /// Requires both a video ID and an owning channel ID; other fields default to empty.
  fn from_item(item: SearchItem) -> Option<Self> {
    let video_id = item.id.video_id.filter(|id| !id.is_empty())?;
    let snippet = item.snippet?;
    let channel_id = snippet.channel_id.filter(|id| !id.is_empty())?;
    let thumbs = snippet.thumbnails;
    let thumbnail_url = [thumbs.medium, thumbs.high, thumbs.default]
      .into_iter()
      .flatten()
      .find_map(|t| t.url)
      .unwrap_or_default();
    Some(Self {
      video_id,
      channel_id,
      title: snippet.title.unwrap_or_default(),
      description: snippet.description.unwrap_or_default(),
      channel_title: snippet.channel_title.unwrap_or_default(),
      thumbnail_url,
    })
  }
}

/// RFC 3339 publish-date lower bound for a lookback window.
pub fn published_after(now: DateTime<Utc>, lookback_days: u32) -> String {
  (now - Duration::days(i64::from(lookback_days))).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Keep upstream order; drop items that are not videos or lack a channel.
pub fn candidates_from(response: SearchListResponse) -> Vec<SearchCandidate> {
  response.items.into_iter().filter_map(SearchCandidate::from_item).collect()
}

/// Run one most-viewed search for `keyword` within the lookback window.
///
/// Over-fetches relative to the expected result count since most hits are
/// rejected downstream. Only a single page is ever requested.
pub async fn search_keyword<P: VideoPlatform>(
  api: &P,
  keyword: &str,
  lookback_days: u32,
  max_results: u32,
  now: DateTime<Utc>,
) -> Result<Vec<SearchCandidate>> {
  let ceiling = u32::try_from(constants().batch_size_ceiling).unwrap_or(u32::MAX);
  let query = SearchQuery {
    q: keyword.to_string(),
    published_after: published_after(now, lookback_days),
    max_results: max_results.clamp(1, ceiling),
    page_token: None,
  };

  let response = api.search_videos(&query).await.with_context(|| format!("search for '{}' failed", keyword))?;
  if let Some(token) = response.next_page_token.as_deref() {
    debug!(keyword = %keyword, token, "search: more pages available, not followed");
  }

  let raw = response.items.len();
  let candidates = candidates_from(response);
  info!(keyword = %keyword, raw, candidates = candidates.len(), "search: fetched candidates");
  Ok(candidates)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{Endpoint, FakePlatform, search_item};
  use crate::youtube::SearchItemId;
  use chrono::TimeZone;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 8, 9, 30, 0).unwrap()
  }

  #[test]
  fn published_after_subtracts_days() {
    assert_eq!(published_after(now(), 7), "2025-06-01T09:30:00Z");
    assert_eq!(published_after(now(), 365), "2024-06-08T09:30:00Z");
  }

  #[test]
  fn drops_items_without_video_or_channel() {
    let mut no_channel = search_item("v3", "c3");
    if let Some(s) = no_channel.snippet.as_mut() {
      s.channel_id = None;
    }
    let response = SearchListResponse {
      items: vec![
        search_item("v1", "c1"),
        SearchItem { id: SearchItemId { video_id: None }, ..search_item("x", "c2") },
        no_channel,
        SearchItem { snippet: None, ..search_item("v4", "c4") },
        search_item("v5", "c5"),
      ],
      next_page_token: Some("next".to_string()),
    };
    let ids: Vec<String> = candidates_from(response).into_iter().map(|c| c.video_id).collect();
    assert_eq!(ids, vec!["v1", "v5"]);
  }

  #[test]
  fn thumbnail_falls_back_past_missing_medium() {
    let mut item = search_item("v1", "c1");
    if let Some(s) = item.snippet.as_mut() {
      s.thumbnails.medium = None;
      s.thumbnails.default = Some(crate::youtube::Thumbnail { url: Some("https://thumb/default.jpg".to_string()) });
    }
    let c = candidates_from(SearchListResponse { items: vec![item], next_page_token: None });
    assert_eq!(c[0].thumbnail_url, "https://thumb/default.jpg");
  }

  #[tokio::test]
  async fn search_keyword_preserves_ranking() {
    let mut api = FakePlatform::new();
    api.searches.insert("rust".to_string(), vec![search_item("a", "c1"), search_item("b", "c2"), search_item("c", "c1")]);
    let got = search_keyword(&api, "rust", 7, 15, now()).await.unwrap();
    let ids: Vec<&str> = got.iter().map(|c| c.video_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(got[0].title, "Video a");
    assert_eq!(api.calls(Endpoint::Search), 1);
  }

  #[tokio::test]
  async fn search_keyword_sends_lookback_bound_and_single_page() {
    let api = FakePlatform::new();
    search_keyword(&api, "rust", 30, 15, now()).await.unwrap();
    let queries = api.search_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
      queries[0],
      SearchQuery {
        q: "rust".to_string(),
        published_after: "2025-05-09T09:30:00Z".to_string(),
        max_results: 15,
        page_token: None,
      }
    );
  }

  #[tokio::test]
  async fn search_keyword_clamps_max_results_to_batch_ceiling() {
    let api = FakePlatform::new();
    search_keyword(&api, "a", 7, 200, now()).await.unwrap();
    search_keyword(&api, "b", 7, 0, now()).await.unwrap();
    let sizes: Vec<u32> = api.search_queries().iter().map(|q| q.max_results).collect();
    assert_eq!(sizes, vec![50, 1]);
  }

  #[tokio::test]
  async fn search_keyword_propagates_upstream_failure() {
    let mut api = FakePlatform::new();
    api.fail(Endpoint::Search);
    let err = search_keyword(&api, "rust", 7, 15, now()).await.unwrap_err();
    assert!(format!("{:#}", err).contains("search for 'rust' failed"));
  }

  #[tokio::test]
  async fn unknown_keyword_yields_no_candidates() {
    let api = FakePlatform::new();
    assert!(search_keyword(&api, "nothing", 7, 15, now()).await.unwrap().is_empty());
  }
}
