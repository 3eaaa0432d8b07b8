use clap::Parser;

use crate::enrich::DEFAULT_CONCURRENCY;
use crate::error::{Result, TimelineError};
use crate::normalize::DEFAULT_PROD_JOB;
use crate::render::ReportFormat;
use crate::sources::buildkite::{PipelineId, DEFAULT_BUILDKITE_API, DEFAULT_PAGE_SIZE};
use crate::sources::github::DEFAULT_GITHUB_API;
use crate::util;
use crate::window::TimeWindow;

#[derive(Parser, Debug)]
#[command(
    name = "deploy-timeline",
    version,
    about = "Report which commits shipped in which production deploy of a Buildkite pipeline",
    long_about = None
)]
pub struct Cli {
  /// Window start, e.g. 2019-12-01 (UTC midnight) or an RFC3339 timestamp
  #[arg(long = "start-time", alias = "startTime")]
  pub start_time: Option<String>,

  /// Window end (exclusive for build finish times)
  #[arg(long = "end-time", alias = "endTime")]
  pub end_time: Option<String>,

  /// Buildkite pipeline as <organization>/<pipeline>
  #[arg(long)]
  pub pipeline: Option<String>,

  /// Substring identifying the production deploy job
  #[arg(long = "prod-job", alias = "prodJob", default_value = DEFAULT_PROD_JOB)]
  pub prod_job: String,

  /// Builds requested per page
  #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
  pub page_size: u32,

  /// Maximum concurrent pull-request lookups
  #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
  pub concurrency: usize,

  /// Timezone for rendered timestamps: utc, local, or an IANA name
  #[arg(long, default_value = "utc")]
  pub tz: String,

  /// Report format
  #[arg(long, value_enum, default_value_t = ReportFormat::Tsv)]
  pub format: ReportFormat,

  /// Output file (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Buildkite API token
  #[arg(long, env = "BUILDKITE_TOKEN", hide_env_values = true)]
  pub buildkite_token: Option<String>,

  /// Buildkite API base URL
  #[arg(long, env = "BUILDKITE_API", default_value = DEFAULT_BUILDKITE_API)]
  pub buildkite_api: String,

  /// GitHub API base URL
  #[arg(long, env = "GITHUB_API", default_value = DEFAULT_GITHUB_API)]
  pub github_api: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

pub struct EffectiveConfig {
  pub pipeline: PipelineId,
  pub window: TimeWindow,
  pub prod_job: String,
  pub page_size: u32,
  pub concurrency: usize,
  pub tz: String,
  pub format: ReportFormat,
  pub out: String,
  pub buildkite_api: String,
  pub buildkite_token: String,
  pub github_api: String,
  pub github_token: String,
}

/// Validate the CLI before any network call; every failure is a configuration error.
pub fn normalize(cli: Cli, github_token: Option<String>) -> Result<EffectiveConfig> {
  let (start, end, pipeline) = match (&cli.start_time, &cli.end_time, &cli.pipeline) {
    (Some(s), Some(e), Some(p)) => (s, e, p),
    _ => {
      return Err(TimelineError::config(
        "Provide --start-time, --end-time and --pipeline <organization>/<pipeline>",
      ))
    }
  };

  let window = TimeWindow::parse(start, end)?;
  let pipeline = PipelineId::parse(pipeline)?;

  if cli.prod_job.trim().is_empty() {
    return Err(TimelineError::config("--prod-job must not be empty"));
  }
  if cli.page_size == 0 {
    return Err(TimelineError::config("--page-size must be at least 1"));
  }
  if cli.concurrency == 0 {
    return Err(TimelineError::config("--concurrency must be at least 1"));
  }
  if !util::is_known_tz(&cli.tz) {
    return Err(TimelineError::config(format!(
      "unknown --tz {:?}; use utc, local, or an IANA zone name",
      cli.tz
    )));
  }

  let buildkite_token = cli
    .buildkite_token
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| TimelineError::config("Missing Buildkite token. Set BUILDKITE_TOKEN"))?;
  let github_token = github_token
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| TimelineError::config("Missing GitHub token. Set GITHUB_TOKEN or run: gh auth login"))?;

  Ok(EffectiveConfig {
    pipeline,
    window,
    prod_job: cli.prod_job,
    page_size: cli.page_size,
    concurrency: cli.concurrency,
    tz: cli.tz,
    format: cli.format,
    out: cli.out,
    buildkite_api: cli.buildkite_api,
    buildkite_token,
    github_api: cli.github_api,
    github_token,
  })
}

/// Logs go to stderr so stdout stays the report.
pub fn init_tracing(verbose: u8) {
  use tracing_subscriber::{fmt, EnvFilter};

  let filter = match verbose {
    0 => "deploy_timeline=info",
    1 => "deploy_timeline=debug",
    _ => "deploy_timeline=trace",
  };

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  let _ = fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}
