// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Run fetch, window filters, deploy propagation and PR enrichment in order, then render and write the report
// role: processing/orchestrator
// inputs: EffectiveConfig; BuildStatusSource and CodeHostSource (HTTP-backed in production, fakes in tests)
// outputs: Vec<ReportRecord> in newest-first build order; report text on stdout or --out
// side_effects: Remote calls through the sources; writes the report
// invariants:
// - Stages run strictly in sequence; only enrichment fans out
// - No deployed build in the window ⇒ empty report plus a warning, never an error
// errors: The first malformed record or remote failure aborts the run
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::EffectiveConfig;
use crate::enrich::PullRequestEnricher;
use crate::error;
use crate::fetch::PaginatedBuildFetcher;
use crate::model::ReportRecord;
use crate::normalize::BuildRecordNormalizer;
use crate::params::{build_timeline_params, TimelineParams};
use crate::render::ReportRenderer;
use crate::sources::buildkite::{BuildStatusSource, BuildkiteHttpSource};
use crate::sources::github::{make_github_source, CodeHostSource};
use crate::timeline;
use crate::util;

/// Produce the ordered report records for one window.
pub fn build_timeline(
  params: &TimelineParams,
  builds: &dyn BuildStatusSource,
  code_host: &dyn CodeHostSource,
) -> error::Result<Vec<ReportRecord>> {
  let normalizer = BuildRecordNormalizer::new(params.prod_job.as_str());
  let fetched = PaginatedBuildFetcher::new(builds, &normalizer, params.page_size)
    .fetch_window(&params.pipeline, &params.window)?;

  if !timeline::is_newest_first(&fetched) {
    warn!(pipeline = %params.pipeline, "builds arrived out of newest-first order; deploy attribution may be wrong");
  }

  let windowed = timeline::apply_window(fetched, &params.window);

  if windowed.iter().all(|r| r.deployed_at.is_none()) {
    warn!(
      pipeline = %params.pipeline,
      prod_job = %params.prod_job,
      builds = windowed.len(),
      "no deployed builds in window; nothing to report"
    );
    return Ok(Vec::new());
  }

  let stamped = timeline::propagate_deploys(windowed);
  debug!(
    builds = stamped.len(),
    shipped = stamped.iter().filter(|r| r.deploy.is_shipped()).count(),
    "deploys propagated"
  );
  PullRequestEnricher::new(code_host, params.concurrency).enrich(stamped)
}

/// Wire HTTP sources from the config, build the timeline, render it and write it out.
pub fn run_report(cfg: &EffectiveConfig) -> Result<()> {
  let params = build_timeline_params(cfg);
  let builds = BuildkiteHttpSource::new(cfg.buildkite_api.as_str(), cfg.buildkite_token.as_str());
  let code_host = make_github_source(&cfg.github_api, cfg.github_token.clone());

  info!(
    pipeline = %params.pipeline,
    start = %params.window.start.to_rfc3339(),
    end = %params.window.end.to_rfc3339(),
    "building deploy timeline"
  );

  let records = build_timeline(&params, &builds, code_host.as_ref())?;
  let text = ReportRenderer::new(cfg.tz.as_str(), cfg.format)
    .render(&records)
    .context("rendering report")?;

  util::write_output(&cfg.out, &text)
}
