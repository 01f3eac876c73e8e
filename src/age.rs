use chrono::{DateTime, Utc};

/// Label used for absent or malformed timestamps.
pub const UNKNOWN: &str = "Unknown";

/// Parse an upstream RFC 3339 timestamp. Malformed input yields `None`.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
  let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
  DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Bucket the time elapsed since `timestamp` into the coarsest unit that applies.
///
/// Uses integer division throughout: 729 days is "1 year(s) ago".
/// Timestamps in the future count as "Just now".
pub fn age_of(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
  let Some(ts) = timestamp else {
    return UNKNOWN.to_string();
  };
  let elapsed = now.signed_duration_since(ts);
  let days = elapsed.num_days();
  let hours = elapsed.num_hours();

  if days >= 365 {
    format!("{} year(s) ago", days / 365)
  } else if days >= 30 {
    format!("{} month(s) ago", days / 30)
  } else if days > 0 {
    format!("{} day(s) ago", days)
  } else if hours > 0 {
    format!("{} hour(s) ago", hours)
  } else {
    "Just now".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
  }

  fn ago(d: Duration) -> Option<DateTime<Utc>> {
    Some(now() - d)
  }

  #[test]
  fn year_boundary() {
    assert_eq!(age_of(ago(Duration::days(365)), now()), "1 year(s) ago");
    assert_eq!(age_of(ago(Duration::days(364)), now()), "12 month(s) ago");
    assert_eq!(age_of(ago(Duration::days(729)), now()), "1 year(s) ago");
    assert_eq!(age_of(ago(Duration::days(730)), now()), "2 year(s) ago");
  }

  #[test]
  fn month_boundary() {
    assert_eq!(age_of(ago(Duration::days(30)), now()), "1 month(s) ago");
    assert_eq!(age_of(ago(Duration::days(29)), now()), "29 day(s) ago");
  }

  #[test]
  fn days_and_hours() {
    assert_eq!(age_of(ago(Duration::days(1)), now()), "1 day(s) ago");
    assert_eq!(age_of(ago(Duration::hours(23)), now()), "23 hour(s) ago");
    assert_eq!(age_of(ago(Duration::hours(1)), now()), "1 hour(s) ago");
  }

  #[test]
  fn just_now() {
    assert_eq!(age_of(ago(Duration::zero()), now()), "Just now");
    assert_eq!(age_of(ago(Duration::minutes(59)), now()), "Just now");
    assert_eq!(age_of(Some(now() + Duration::hours(3)), now()), "Just now");
  }

  #[test]
  fn unknown_when_absent() {
    assert_eq!(age_of(None, now()), UNKNOWN);
  }

  #[test]
  fn parse_timestamp_variants() {
    assert_eq!(parse_timestamp(Some("2025-06-01T12:00:00Z")), Some(now()));
    assert_eq!(parse_timestamp(Some("2025-06-01T14:00:00+02:00")), Some(now()));
    assert_eq!(parse_timestamp(Some("2025-06-01")), None);
    assert_eq!(parse_timestamp(Some("")), None);
    assert_eq!(parse_timestamp(None), None);
  }

  #[test]
  fn malformed_timestamp_reports_unknown() {
    assert_eq!(age_of(parse_timestamp(Some("yesterday")), now()), "Unknown");
  }
}
