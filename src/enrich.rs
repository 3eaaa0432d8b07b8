// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Expand each deployed build into the commits of the pull request it was merged through
// role: enrichment/pull-requests
// inputs: Vec<BuildRecord> with resolved deploy markers; CodeHostSource; fan-out bound
// outputs: Flattened Vec<ReportRecord> (builds without a PR pass through unchanged)
// side_effects: Up to two remote calls per build, run on a dedicated bounded thread pool
// invariants:
// - build_id, repository and deploy fields are copied, never rewritten; only commit/committed_at are substituted
// - Per-build tasks are independent; the call blocks until all complete
// - Only the first PR the code host returns for a commit is used
// errors: The first failing lookup aborts the whole enrichment
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Result, TimelineError};
use crate::model::{BuildRecord, PullRequestCommitRecord, ReportRecord};
use crate::sources::github::CodeHostSource;

pub const DEFAULT_CONCURRENCY: usize = 8;

pub struct PullRequestEnricher<'a> {
  source: &'a dyn CodeHostSource,
  concurrency: usize,
}

impl<'a> PullRequestEnricher<'a> {
  pub fn new(source: &'a dyn CodeHostSource, concurrency: usize) -> Self {
    Self {
      source,
      concurrency: concurrency.max(1),
    }
  }

  /// Enrich every build concurrently (at most `concurrency` in flight) and flatten the results.
  pub fn enrich(&self, builds: Vec<BuildRecord>) -> Result<Vec<ReportRecord>> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.concurrency)
      .thread_name(|i| format!("pr-enrich-{i}"))
      .build()
      .map_err(|e| TimelineError::config(format!("cannot start enrichment workers: {e}")))?;

    let builds_in = builds.len();
    let expanded: Vec<Vec<ReportRecord>> =
      pool.install(|| builds.into_par_iter().map(|b| self.expand(b)).collect::<Result<Vec<_>>>())?;

    let out: Vec<ReportRecord> = expanded.into_iter().flatten().collect();
    info!(builds = builds_in, rows = out.len(), "pull request enrichment");

    Ok(out)
  }

  /// Replace one build by its PR's commits, or pass it through when no PR exists.
  pub fn expand(&self, build: BuildRecord) -> Result<Vec<ReportRecord>> {
    let Some(pr) = self.source.find_pull_request_for_commit(&build.repository, &build.commit)? else {
      debug!(build = %build.build_id, commit = %build.commit, "no pull request");
      return Ok(vec![ReportRecord::Build(build)]);
    };

    let commits = self.source.list_pull_request_commits(&pr.repository, pr.number)?;

    if commits.is_empty() {
      warn!(build = %build.build_id, pr = pr.number, "pull request lists no commits; build dropped from report");
    } else {
      debug!(build = %build.build_id, pr = pr.number, commits = commits.len(), "expanded pull request");
    }

    Ok(
      commits
        .iter()
        .map(|c| ReportRecord::PullRequestCommit(PullRequestCommitRecord::from_build(&build, c)))
        .collect(),
    )
  }
}
