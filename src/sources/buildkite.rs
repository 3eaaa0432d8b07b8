// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Read-only access to Buildkite's build list for one pipeline, one page per call
// role: sources/build-status
// inputs: Pipeline id (org/pipeline); page query (finished_from, created_to, page, per_page); API token
// outputs: Raw build JSON objects in the source's default newest-first order
// side_effects: Network calls to the Buildkite REST API
// invariants: Page numbers are 1-based; a page that is not a JSON array is a remote error
// errors: RemoteSource for transport/status/payload failures; never retried
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;

use chrono::SecondsFormat;

use crate::error::{Result, TimelineError};
use crate::model::Timestamp;
use crate::sources::http;

pub const DEFAULT_BUILDKITE_API: &str = "https://api.buildkite.com";
pub const DEFAULT_PAGE_SIZE: u32 = 30;

const SOURCE_NAME: &str = "buildkite";

/// `<org>/<pipeline>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineId {
  pub org: String,
  pub pipeline: String,
}

impl PipelineId {
  pub fn parse(raw: &str) -> Result<Self> {
    match raw.trim().split('/').collect::<Vec<_>>().as_slice() {
      [org, pipeline] if !org.is_empty() && !pipeline.is_empty() => Ok(Self {
        org: org.to_string(),
        pipeline: pipeline.to_string(),
      }),
      _ => Err(TimelineError::config(format!(
        "invalid pipeline {raw:?}; expected <organization>/<pipeline>"
      ))),
    }
  }
}

impl fmt::Display for PipelineId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.org, self.pipeline)
  }
}

/// Server-side filters for one page of builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBuildsQuery {
  /// Only builds finished at or after this instant.
  pub finished_from: Timestamp,
  /// Only builds created at or before this instant.
  pub created_to: Timestamp,
  /// 1-based
  pub page: u32,
  pub page_size: u32,
}

pub trait BuildStatusSource: Send + Sync {
  fn list_builds(&self, pipeline: &PipelineId, query: &ListBuildsQuery) -> Result<Vec<serde_json::Value>>;
}

pub struct BuildkiteHttpSource {
  base_url: String,
  token: String,
  agent: ureq::Agent,
}

impl BuildkiteHttpSource {
  pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      token: token.into(),
      agent: http::new_agent(),
    }
  }

  fn builds_url(&self, pipeline: &PipelineId) -> String {
    format!(
      "{}/v2/organizations/{}/pipelines/{}/builds",
      self.base_url, pipeline.org, pipeline.pipeline
    )
  }
}

impl BuildStatusSource for BuildkiteHttpSource {
  fn list_builds(&self, pipeline: &PipelineId, query: &ListBuildsQuery) -> Result<Vec<serde_json::Value>> {
    let url = self.builds_url(pipeline);
    let auth = format!("Bearer {}", self.token);

    let params = [
      (
        "finished_from",
        query.finished_from.to_rfc3339_opts(SecondsFormat::Secs, true),
      ),
      ("created_to", query.created_to.to_rfc3339_opts(SecondsFormat::Secs, true)),
      ("page", query.page.to_string()),
      ("per_page", query.page_size.to_string()),
    ];

    let body = http::get_json(&self.agent, SOURCE_NAME, &url, &params, &[("Authorization", auth.as_str())])?;

    match body {
      serde_json::Value::Array(items) => Ok(items),
      other => Err(TimelineError::remote(
        SOURCE_NAME,
        url,
        format!("expected a JSON array of builds, got {}", json_kind(&other)),
      )),
    }
  }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
  match v {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "a boolean",
    serde_json::Value::Number(_) => "a number",
    serde_json::Value::String(_) => "a string",
    serde_json::Value::Array(_) => "an array",
    serde_json::Value::Object(_) => "an object",
  }
}
