// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Page through the build-status source until the window is bracketed or the source is exhausted
// role: fetch/paginated-builds
// inputs: BuildStatusSource, pipeline id, TimeWindow, stop predicate over normalized records
// outputs: Newest-first Vec<BuildRecord>, deduplicated by build_id (first occurrence wins)
// side_effects: Sequential remote calls, one per page
// invariants:
// - Pages are requested strictly in order; each stop decision depends on the page just fetched
// - Stops on a short page (fewer than page_size records) or when any record on the page matches the predicate
// - Server-side filter: finished_from = start - 365d, created_to = end
// errors: Propagates RemoteSource and MalformedRecord unchanged
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::Result;
use crate::model::BuildRecord;
use crate::normalize::BuildRecordNormalizer;
use crate::sources::buildkite::{BuildStatusSource, ListBuildsQuery, PipelineId};
use crate::window::{is_date_early, TimeWindow};

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  /// The last page was short.
  Exhausted,
  /// A record on the last page matched the stop predicate.
  Bracketed,
}

pub struct PaginatedBuildFetcher<'a> {
  source: &'a dyn BuildStatusSource,
  normalizer: &'a BuildRecordNormalizer,
  page_size: u32,
}

impl<'a> PaginatedBuildFetcher<'a> {
  pub fn new(source: &'a dyn BuildStatusSource, normalizer: &'a BuildRecordNormalizer, page_size: u32) -> Self {
    Self {
      source,
      normalizer,
      page_size: page_size.max(1),
    }
  }

  /// Fetch with the default stop condition: a record deployed before the window start.
  pub fn fetch_window(&self, pipeline: &PipelineId, window: &TimeWindow) -> Result<Vec<BuildRecord>> {
    let start = window.start;
    let (records, _) = self.fetch_until(pipeline, window, |r| is_date_early(r.deployed_at, start))?;
    Ok(records)
  }

  /// Fetch pages until the source is exhausted or `stop` matches a record on the current page.
  ///
  /// The caller owns termination when the source never returns a short page and
  /// `stop` never matches.
  pub fn fetch_until<F>(&self, pipeline: &PipelineId, window: &TimeWindow, stop: F) -> Result<(Vec<BuildRecord>, StopReason)>
  where
    F: Fn(&BuildRecord) -> bool,
  {
    let mut out: Vec<BuildRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut page = 1u32;

    loop {
      let query = ListBuildsQuery {
        finished_from: window.fetch_floor(),
        created_to: window.end,
        page,
        page_size: self.page_size,
      };

      let raw = self.source.list_builds(pipeline, &query)?;
      let records = self.normalizer.normalize_page(&raw)?;

      let exhausted = records.len() < self.page_size as usize;
      let bracketed = records.iter().any(&stop);

      debug!(page, fetched = records.len(), exhausted, bracketed, "build page");

      for r in records {
        if seen.insert(r.build_id.clone()) {
          out.push(r);
        }
      }

      let reason = if bracketed {
        Some(StopReason::Bracketed)
      } else if exhausted {
        Some(StopReason::Exhausted)
      } else {
        None
      };

      if let Some(reason) = reason {
        info!(%pipeline, pages = page, builds = out.len(), ?reason, "fetched builds");
        return Ok((out, reason));
      }

      page += 1;
    }
  }
}
