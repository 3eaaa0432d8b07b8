// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Convert raw Buildkite build JSON into canonical BuildRecords
// role: normalize/build-records
// inputs: One raw build object per call; configured production-job marker
// outputs: BuildRecord with deploy marker Unresolved
// invariants:
// - committed_at comes from the CommitDate annotation when metadata is non-empty, else created_at
// - deployed_at is the finish time of the LAST passed job whose name contains the prod marker
// errors: MalformedRecord when identity fields are missing or non-empty metadata lacks a usable CommitDate
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TimelineError};
use crate::ext::serde_json::JsonFetch;
use crate::model::{BuildRecord, DeployMarker, Timestamp};

pub const DEFAULT_PROD_JOB: &str = "Prod";

/// Metadata key under which Buildkite stores `git show` output for the build's commit.
pub const COMMIT_METADATA_KEY: &str = "buildkite:git:commit";

static RE_COMMIT_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^CommitDate:[ \t]*(.+?)\s*$").unwrap());

static RE_REMOTE_URL: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^(?:[\w.-]+@[\w.-]+:|(?:https?|ssh|git)://(?:[^@/]+@)?[^/]+/)([^/]+)/([^/]+?)(?:\.git)?/?$").unwrap()
});

#[derive(Debug, Clone)]
pub struct BuildRecordNormalizer {
  prod_job: String,
}

impl Default for BuildRecordNormalizer {
  fn default() -> Self {
    Self::new(DEFAULT_PROD_JOB)
  }
}

impl BuildRecordNormalizer {
  pub fn new(prod_job: impl Into<String>) -> Self {
    Self {
      prod_job: prod_job.into(),
    }
  }

  pub fn normalize_page(&self, raw: &[serde_json::Value]) -> Result<Vec<BuildRecord>> {
    raw.iter().map(|b| self.normalize(b)).collect()
  }

  pub fn normalize(&self, raw: &serde_json::Value) -> Result<BuildRecord> {
    let build_id = build_id(raw)?;

    let commit = raw
      .fetch("commit")
      .to::<String>()
      .ok_or_else(|| TimelineError::malformed(&build_id, "missing commit"))?;

    let repository = raw
      .fetch("pipeline.provider.settings.repository")
      .str()
      .map(repository_slug)
      .ok_or_else(|| TimelineError::malformed(&build_id, "missing pipeline repository"))?;

    let committed_at = committed_at(&build_id, raw)?;

    Ok(BuildRecord {
      build_id,
      commit,
      committed_at,
      repository,
      finished_at: raw.fetch("finished_at").time(),
      deployed_at: self.deployed_at(raw),
      deploy: DeployMarker::Unresolved,
    })
  }

  fn deployed_at(&self, raw: &serde_json::Value) -> Option<Timestamp> {
    let jobs = raw.fetch("jobs").value()?.as_array()?;

    jobs
      .iter()
      .filter(|j| j.fetch("state").str() == Some("passed"))
      .filter(|j| j.fetch("name").str().is_some_and(|n| n.contains(&self.prod_job)))
      .last()
      .and_then(|j| j.fetch("finished_at").time())
  }
}

fn build_id(raw: &serde_json::Value) -> Result<String> {
  let slug = raw.fetch("pipeline.slug").str();
  let number = raw.fetch("number").text();

  match (slug, number) {
    (Some(s), Some(n)) => Ok(format!("{s}/{n}")),
    _ => Err(TimelineError::malformed(
      raw.fetch("id").text().unwrap_or_else(|| "<unknown>".into()),
      "missing pipeline slug or build number",
    )),
  }
}

fn committed_at(build_id: &str, raw: &serde_json::Value) -> Result<Timestamp> {
  let has_metadata = raw
    .fetch("meta_data")
    .value()
    .and_then(|m| m.as_object())
    .is_some_and(|m| !m.is_empty());

  if !has_metadata {
    return raw
      .fetch("created_at")
      .time()
      .ok_or_else(|| TimelineError::malformed(build_id, "missing created_at"));
  }

  // The key contains dots, so it is looked up directly rather than via a dotted path.
  let blob = raw
    .get("meta_data")
    .and_then(|m| m.get(COMMIT_METADATA_KEY))
    .and_then(|v| v.as_str())
    .ok_or_else(|| TimelineError::malformed(build_id, format!("metadata lacks {COMMIT_METADATA_KEY}")))?;

  let date_text = commit_date_annotation(blob)
    .ok_or_else(|| TimelineError::malformed(build_id, "metadata lacks a CommitDate: line"))?;

  parse_commit_date(date_text)
    .ok_or_else(|| TimelineError::malformed(build_id, format!("unparseable CommitDate {date_text:?}")))
}

/// Locate the value of the `CommitDate:` line in `git show --pretty=fuller` output.
pub fn commit_date_annotation(blob: &str) -> Option<&str> {
  RE_COMMIT_DATE
    .captures(blob)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str())
}

/// Accepts RFC3339, git's default format (`Mon Dec 2 10:11:12 2019 +1100`) and git's iso format.
pub fn parse_commit_date(s: &str) -> Option<Timestamp> {
  let s = s.trim();

  DateTime::parse_from_rfc3339(s)
    .or_else(|_| DateTime::parse_from_str(s, "%a %b %e %H:%M:%S %Y %z"))
    .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z"))
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// Reduce git remote URLs to `owner/name`; anything else is returned trimmed.
pub fn repository_slug(raw: &str) -> String {
  let s = raw.trim();

  match RE_REMOTE_URL.captures(s) {
    Some(c) => format!("{}/{}", &c[1], &c[2]),
    None => s.to_string(),
  }
}
