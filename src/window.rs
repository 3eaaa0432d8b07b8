use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, TimelineError};
use crate::model::Timestamp;

// Date predicates shared by the fetch stop condition and every filter stage.

/// Builds are fetched from this far before the window start so a build whose
/// deploy happened long after it finished is still captured.
pub const LOOKBACK_DAYS: i64 = 365;

/// The `[start, end]` audit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
  pub start: Timestamp,
  pub end: Timestamp,
}

impl TimeWindow {
  pub fn new(start: Timestamp, end: Timestamp) -> Result<Self> {
    if start >= end {
      return Err(TimelineError::config(format!(
        "start time {} must be earlier than end time {}",
        start.to_rfc3339(),
        end.to_rfc3339()
      )));
    }
    Ok(Self { start, end })
  }

  /// Parse both bounds from CLI strings.
  pub fn parse(start: &str, end: &str) -> Result<Self> {
    Self::new(parse_time_arg(start)?, parse_time_arg(end)?)
  }

  /// Oldest `finished_from` bound requested from the build-status source.
  pub fn fetch_floor(&self) -> Timestamp {
    year_before(self.start)
  }
}

/// `true` when `d` is present and strictly earlier than `bound`.
///
/// An absent timestamp is never "early": it can neither end a scan nor pass a
/// strictly-before filter.
pub fn is_date_early(d: Option<Timestamp>, bound: Timestamp) -> bool {
  d.is_some_and(|t| t < bound)
}

pub fn year_before(t: Timestamp) -> Timestamp {
  t - chrono::Duration::days(LOOKBACK_DAYS)
}

/// Parse a window bound.
///
/// Accepts RFC3339 (`2019-12-01T00:00:00+11:00`), a naive timestamp
/// (`2019-12-01T00:00:00`, read as UTC) or a bare date (`2019-12-01`, UTC midnight).
pub fn parse_time_arg(raw: &str) -> Result<Timestamp> {
  let s = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
    return Ok(ndt.and_utc());
  }
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    if let Some(ndt) = d.and_hms_opt(0, 0, 0) {
      return Ok(ndt.and_utc());
    }
  }

  Err(TimelineError::config(format!(
    "invalid time {raw:?}; expected YYYY-MM-DD or RFC3339"
  )))
}

/// Parse an RFC3339 timestamp as returned by the remote APIs.
pub fn parse_api_time(raw: &str) -> Option<Timestamp> {
  DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}
