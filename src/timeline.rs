// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Trim fetched builds to the audit window and stamp each with the deploy that shipped it
// role: timeline/filter-and-propagate
// inputs: Newest-first Vec<BuildRecord> from the fetcher; TimeWindow
// outputs: Newest-first Vec<BuildRecord> whose deploy markers are resolved
// invariants:
// - Every stage takes and returns newest-first order (index 0 is the newest build); stages only remove or stamp
// - Propagation is a sequential left fold: a record only inherits deploys at or before it in the sequence
// - Before any deploy is seen, records get DeployMarker::NoDeploy (rendered as empty strings)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::debug;

use crate::model::{BuildRecord, DeployMarker, Timestamp};
use crate::window::{is_date_early, TimeWindow};

/// Keep only records that finished strictly before `end`.
///
/// Unfinished builds (no `finished_at`) are dropped. Order is preserved.
pub fn filter_in_before_end(mut records: Vec<BuildRecord>, end: Timestamp) -> Vec<BuildRecord> {
  records.retain(|r| is_date_early(r.finished_at, end));
  records
}

/// Cut the sequence just before the first record deployed strictly before `start`.
///
/// Scans from the newest end; with no such record everything is kept.
pub fn filter_in_after_start(mut records: Vec<BuildRecord>, start: Timestamp) -> Vec<BuildRecord> {
  if let Some(i) = records.iter().position(|r| is_date_early(r.deployed_at, start)) {
    records.truncate(i);
  }
  records
}

/// Drop the newest records that were never deployed (e.g. in-flight builds).
///
/// If no record carries a deploy time the sequence is returned unchanged; callers
/// treat that as "nothing ready to report".
pub fn filter_undeployed(mut records: Vec<BuildRecord>) -> Vec<BuildRecord> {
  match records.iter().position(|r| r.deployed_at.is_some()) {
    Some(i) => records.split_off(i),
    None => records,
  }
}

/// End-of-window, then start-of-window, then deployed-only.
pub fn apply_window(records: Vec<BuildRecord>, window: &TimeWindow) -> Vec<BuildRecord> {
  let fetched = records.len();
  let records = filter_in_before_end(records, window.end);
  let before_end = records.len();
  let records = filter_in_after_start(records, window.start);
  let after_start = records.len();
  let records = filter_undeployed(records);

  debug!(fetched, before_end, after_start, deployed = records.len(), "timeline filters");
  records
}

/// Stamp every record with the nearest deploy at or before it (newest-first).
///
/// A record with its own `deployed_at` becomes the current deploy; each record then
/// takes the current deploy's build id and time.
pub fn propagate_deploys(records: Vec<BuildRecord>) -> Vec<BuildRecord> {
  let capacity = records.len();

  let (_, out) = records.into_iter().fold(
    (DeployMarker::NoDeploy, Vec::with_capacity(capacity)),
    |(mut current, mut out), mut record| {
      if let Some(at) = record.deployed_at {
        current = DeployMarker::ShippedIn {
          build_id: record.build_id.clone(),
          deployed_at: at,
        };
      }
      record.deployed_at = current.deployed_at();
      record.deploy = current.clone();
      out.push(record);
      (current, out)
    },
  );

  out
}

/// Build number from a `<slug>/<number>` id.
pub fn build_number(build_id: &str) -> Option<u64> {
  build_id.rsplit('/').next().and_then(|n| n.parse().ok())
}

/// `true` when build numbers never increase along the sequence.
pub fn is_newest_first(records: &[BuildRecord]) -> bool {
  records
    .windows(2)
    .all(|w| match (build_number(&w[0].build_id), build_number(&w[1].build_id)) {
      (Some(a), Some(b)) => a >= b,
      _ => true,
    })
}
