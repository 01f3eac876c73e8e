/// Parse a compact `PT[nH][nM][nS]` duration code into total seconds.
///
/// Each field is optional but must appear in H, M, S order and at most once.
/// Empty, absent, or unmatched input yields 0 so the video is still filterable
/// (it classifies as a short).
pub fn parse_duration(code: Option<&str>) -> u64 {
  let Some(rest) = code.map(str::trim).and_then(|c| c.strip_prefix("PT")) else {
    return 0;
  };

  let mut total: u64 = 0;
  let mut number = String::new();
  // Index into "HMS" of the last unit consumed, to enforce ordering.
  let mut next_unit = 0;

  for ch in rest.chars() {
    if ch.is_ascii_digit() {
      number.push(ch);
      continue;
    }
    let Some(pos) = "HMS".find(ch) else { return 0 };
    if pos < next_unit || number.is_empty() {
      return 0;
    }
    let Ok(value) = number.parse::<u64>() else { return 0 };
    let scale = match ch {
      'H' => 3600,
      'M' => 60,
      _ => 1,
    };
    total = total.saturating_add(value.saturating_mul(scale));
    number.clear();
    next_unit = pos + 1;
  }

  // Trailing digits without a unit ("PT12") do not match the format.
  if !number.is_empty() {
    return 0;
  }
  total
}

/// Format seconds as `H:MM:SS` when there is at least one hour, else `M:SS`.
pub fn format_seconds(total: u64) -> String {
  let hours = total / 3600;
  let minutes = (total % 3600) / 60;
  let seconds = total % 60;
  if hours > 0 { format!("{}:{:02}:{:02}", hours, minutes, seconds) } else { format!("{}:{:02}", minutes, seconds) }
}
