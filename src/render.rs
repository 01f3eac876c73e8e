use std::fmt::Write as _;
use unicode_width::UnicodeWidthChar;

use crate::constants::constants;
use crate::pipeline::{EnrichedResult, PipelineEvent, RunReport};

/// Truncate to `max_width` terminal columns (double-width CJK aware), appending "…" if cut.
pub fn truncate_width(s: &str, max_width: usize) -> String {
  let full: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
  if full <= max_width {
    return s.to_string();
  }
  let budget = max_width.saturating_sub(1);
  let mut used = 0;
  let mut out = String::new();
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w > budget {
      break;
    }
    used += w;
    out.push(c);
  }
  out.push('…');
  out
}

/// `1234567` -> `1,234,567`.
pub fn format_count(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

/// First `max_chars` characters of a description followed by "...".
pub fn description_preview(description: &str, max_chars: usize) -> String {
  let flat = description.split_whitespace().collect::<Vec<_>>().join(" ");
  let head: String = flat.chars().take(max_chars).collect();
  format!("{}...", head)
}

/// One status line per progress event.
pub fn progress_line(event: &PipelineEvent) -> String {
  match event {
    PipelineEvent::Started { keywords, lookback_days } => {
      format!("Searching across {} keywords for the last {} days...", keywords, lookback_days)
    }
    PipelineEvent::KeywordFinished { index, total, keyword, results } => {
      format!("[{}/{}] '{}': {} match(es)", index + 1, total, keyword, results)
    }
    PipelineEvent::KeywordFailed { index, total, keyword, message } => {
      format!("[{}/{}] '{}': failed ({})", index + 1, total, keyword, message)
    }
  }
}

fn render_result(out: &mut String, r: &EnrichedResult) {
  let c = constants();
  let kind = if r.is_short { "short" } else { "long" };
  let _ = writeln!(out, "  {}", truncate_width(&r.title, c.title_column_width));
  let _ = writeln!(out, "    {}", r.url);
  let _ = writeln!(out, "    Channel: {}", r.channel_title);
  let _ = writeln!(
    out,
    "    Views: {} | Subs: {} | {} ({}) | {}",
    format_count(r.view_count),
    format_count(r.subscriber_count),
    r.duration_display,
    kind,
    r.video_age
  );
  let _ = writeln!(out, "    {}: {}", r.first_activity_label, r.first_activity_age);
  if !r.description.trim().is_empty() {
    let _ = writeln!(out, "    {}", description_preview(&r.description, c.description_preview_chars));
  }
}

/// Human-readable report: per-keyword warnings, result cards, then a summary line.
pub fn render_report(report: &RunReport) -> String {
  let mut out = String::new();

  for warning in &report.warnings {
    let _ = writeln!(out, "warning: {}", warning);
  }

  for group in report.groups.iter().filter(|g| !g.results.is_empty()) {
    let _ = writeln!(out, "\nResults for: '{}'", group.keyword);
    for r in &group.results {
      render_result(&mut out, r);
      out.push('\n');
    }
  }

  if report.any_results {
    let _ = writeln!(out, "Search Complete! Total videos found: {}", report.total_results);
  } else if report.keywords_processed > 0 {
    let _ = writeln!(
      out,
      "No videos found matching your criteria (Low Subscribers + High Views). Try increasing days or subscriber limit."
    );
  }
  out
}
