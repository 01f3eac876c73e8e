use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::age::age_of;
use crate::constants::constants;
use crate::duration::format_seconds;
use crate::filter::FilterCriteria;
use crate::first_upload::{FirstActivity, FirstUploadResolver};
use crate::hydrate::{ChannelDetail, VideoDetail, fit_to_batch, hydrate};
use crate::search::{SearchCandidate, search_keyword};
use crate::youtube::VideoPlatform;

// --- Output types ---

/// A candidate that passed every filter, joined with its hydrated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedResult {
  pub video_id: String,
  pub url: String,
  pub title: String,
  pub description: String,
  pub channel_id: String,
  pub channel_title: String,
  pub thumbnail_url: String,
  pub view_count: u64,
  pub subscriber_count: u64,
  pub duration_secs: u64,
  pub duration_display: String,
  pub is_short: bool,
  pub published_at: Option<DateTime<Utc>>,
  pub video_age: String,
  pub first_activity_label: String,
  pub first_activity_age: String,
}

impl EnrichedResult {
  fn new(
    candidate: SearchCandidate,
    video: &VideoDetail,
    channel: &ChannelDetail,
    is_short: bool,
    first: &FirstActivity,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      url: format!("{}{}", constants().watch_url_prefix, candidate.video_id),
      video_id: candidate.video_id,
      title: candidate.title,
      description: candidate.description,
      channel_id: candidate.channel_id,
      channel_title: candidate.channel_title,
      thumbnail_url: candidate.thumbnail_url,
      view_count: video.view_count,
      subscriber_count: channel.subscriber_count,
      duration_secs: video.duration_secs,
      duration_display: format_seconds(video.duration_secs),
      is_short,
      published_at: video.published_at,
      video_age: age_of(video.published_at, now),
      first_activity_label: first.source.label(),
      first_activity_age: age_of(first.at, now),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordResults {
  pub keyword: String,
  pub results: Vec<EnrichedResult>,
}

/// Non-fatal problems surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
  /// No keywords were supplied; nothing was requested upstream.
  EmptyInput,
  /// An upstream call for this keyword failed; it contributed no results.
  Keyword { keyword: String, message: String },
}

impl fmt::Display for RunWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunWarning::EmptyInput => write!(f, "Please enter at least one keyword."),
      RunWarning::Keyword { keyword, message } => write!(f, "API Error for '{}': {}", keyword, message),
    }
  }
}

/// Everything one run produced, grouped by keyword in input order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub groups: Vec<KeywordResults>,
  pub warnings: Vec<RunWarning>,
  pub keywords_processed: usize,
  pub total_results: usize,
  pub any_results: bool,
}

impl RunReport {
  fn new(groups: Vec<KeywordResults>, warnings: Vec<RunWarning>) -> Self {
    let total_results = groups.iter().map(|g| g.results.len()).sum();
    Self { keywords_processed: groups.len(), total_results, any_results: total_results > 0, groups, warnings }
  }
}

/// Progress notifications, sent as each stage of the run completes.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
  Started { keywords: usize, lookback_days: u32 },
  KeywordFinished { index: usize, total: usize, keyword: String, results: usize },
  KeywordFailed { index: usize, total: usize, keyword: String, message: String },
}

// --- Pipeline ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
  pub search_max_results: u32,
  /// Keywords processed at once. 1 runs them strictly one after another.
  pub keyword_concurrency: usize,
}

/// search -> hydrate -> filter -> first-upload, per keyword.
pub struct Pipeline<P> {
  api: P,
  criteria: FilterCriteria,
  options: PipelineOptions,
}

impl<P: VideoPlatform> Pipeline<P> {
  pub fn new(api: P, criteria: FilterCriteria, options: PipelineOptions) -> Self {
    Self { api, criteria, options }
  }

  #[cfg(test)]
  pub fn api(&self) -> &P {
    &self.api
  }

  /// Process every keyword and collect the results. Never fails: upstream errors
  /// become per-keyword warnings with an empty result for that keyword.
  pub async fn run(
    &self,
    keywords: &[String],
    now: DateTime<Utc>,
    progress: Option<mpsc::UnboundedSender<PipelineEvent>>,
  ) -> RunReport {
    if keywords.is_empty() {
      warn!("pipeline: no keywords supplied");
      return RunReport::new(Vec::new(), vec![RunWarning::EmptyInput]);
    }

    let total = keywords.len();
    info!(
      keywords = total,
      lookback_days = self.criteria.lookback_days,
      concurrency = self.options.keyword_concurrency,
      "pipeline: run started"
    );
    notify(&progress, PipelineEvent::Started { keywords: total, lookback_days: self.criteria.lookback_days });

    // `buffered` yields in input order regardless of completion order.
    let outcomes: Vec<(String, Result<Vec<EnrichedResult>>)> = stream::iter(keywords.iter().enumerate())
      .map(|(index, keyword)| {
        let progress = progress.clone();
        async move {
          let outcome = self.process_keyword(keyword, now).await;
          let event = match &outcome {
            Ok(results) => {
              PipelineEvent::KeywordFinished { index, total, keyword: keyword.clone(), results: results.len() }
            }
            Err(e) => PipelineEvent::KeywordFailed { index, total, keyword: keyword.clone(), message: format!("{:#}", e) },
          };
          notify(&progress, event);
          (keyword.clone(), outcome)
        }
      })
      .buffered(self.options.keyword_concurrency.max(1))
      .collect()
      .await;

    let mut groups = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();
    for (keyword, outcome) in outcomes {
      let results = match outcome {
        Ok(results) => results,
        Err(e) => {
          let message = format!("{:#}", e);
          warn!(keyword = %keyword, err = %message, "pipeline: keyword failed");
          warnings.push(RunWarning::Keyword { keyword: keyword.clone(), message });
          Vec::new()
        }
      };
      groups.push(KeywordResults { keyword, results });
    }

    let report = RunReport::new(groups, warnings);
    info!(
      keywords = report.keywords_processed,
      results = report.total_results,
      warnings = report.warnings.len(),
      "pipeline: run complete"
    );
    report
  }

  /// One keyword end to end. Costs one search call, at most two batch calls, and
  /// at most one playlist call per distinct surviving small channel.
  pub async fn process_keyword(&self, keyword: &str, now: DateTime<Utc>) -> Result<Vec<EnrichedResult>> {
    let candidates =
      search_keyword(&self.api, keyword, self.criteria.lookback_days, self.options.search_max_results, now).await?;
    if candidates.is_empty() {
      return Ok(Vec::new());
    }

    let candidates = fit_to_batch(candidates, constants().batch_size_ceiling);
    let hydrated = hydrate(&self.api, &candidates).await?;

    let mut resolver = FirstUploadResolver::new(&self.api);
    let mut results = Vec::new();
    for candidate in candidates {
      let video = hydrated.video(&candidate.video_id);
      let channel = hydrated.channel(&candidate.channel_id);
      let is_short = match self.criteria.check(&video, &channel) {
        Ok(is_short) => is_short,
        Err(reason) => {
          debug!(keyword = %keyword, video = %candidate.video_id, reason = %reason, "filter: rejected");
          continue;
        }
      };
      // Only survivors pay for the playlist lookup.
      let first = resolver.resolve(&channel).await;
      results.push(EnrichedResult::new(candidate, &video, &channel, is_short, &first, now));
    }

    info!(keyword = %keyword, results = results.len(), "pipeline: keyword complete");
    Ok(results)
  }
}

fn notify(progress: &Option<mpsc::UnboundedSender<PipelineEvent>>, event: PipelineEvent) {
  if let Some(tx) = progress {
    let _ = tx.send(event);
  }
}
