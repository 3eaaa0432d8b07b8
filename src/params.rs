use crate::cli::EffectiveConfig;
use crate::sources::buildkite::PipelineId;
use crate::window::TimeWindow;

/// The subset of the effective configuration the timeline stages consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineParams {
  pub pipeline: PipelineId,
  pub window: TimeWindow,
  pub prod_job: String,
  pub page_size: u32,
  pub concurrency: usize,
}

pub fn build_timeline_params(cfg: &EffectiveConfig) -> TimelineParams {
  TimelineParams {
    pipeline: cfg.pipeline.clone(),
    window: cfg.window,
    prod_job: cfg.prod_job.clone(),
    page_size: cfg.page_size,
    concurrency: cfg.concurrency,
  }
}
