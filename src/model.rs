// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the build/deploy/pull-request records flowing through the timeline pipeline
// role: model/types
// outputs: BuildRecord, DeployMarker, PullRequestCommitRecord, ReportRecord and code-host value types
// invariants: build_id and repository are never rewritten after normalization; sequences are newest-first
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type Timestamp = DateTime<Utc>;

/// Which deploy shipped a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeployMarker {
  /// Deploy propagation has not run yet.
  Unresolved,
  /// Propagation ran but no deploy had been observed at or before this record.
  NoDeploy,
  /// The nearest deploy at or before this record (newest-first order).
  ShippedIn { build_id: String, deployed_at: Timestamp },
}

impl DeployMarker {
  /// Deploy build id, or the empty string for the sentinel states.
  pub fn build_id(&self) -> &str {
    match self {
      DeployMarker::ShippedIn { build_id, .. } => build_id,
      _ => "",
    }
  }

  pub fn deployed_at(&self) -> Option<Timestamp> {
    match self {
      DeployMarker::ShippedIn { deployed_at, .. } => Some(*deployed_at),
      _ => None,
    }
  }

  pub fn is_shipped(&self) -> bool {
    matches!(self, DeployMarker::ShippedIn { .. })
  }
}

/// One build of the audited pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
  /// `<pipelineSlug>/<buildNumber>`
  pub build_id: String,
  pub commit: String,
  pub committed_at: Timestamp,
  /// `owner/name`
  pub repository: String,
  pub finished_at: Option<Timestamp>,
  /// Finish time of the build's own production job; after propagation, the shipping deploy's time.
  pub deployed_at: Option<Timestamp>,
  pub deploy: DeployMarker,
}

/// A build expanded to one of the commits of its pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestCommitRecord {
  pub build_id: String,
  pub repository: String,
  pub finished_at: Option<Timestamp>,
  pub deployed_at: Option<Timestamp>,
  pub deploy: DeployMarker,
  pub commit: String,
  pub committed_at: Timestamp,
}

impl PullRequestCommitRecord {
  pub fn from_build(build: &BuildRecord, pr_commit: &PullRequestCommit) -> Self {
    Self {
      build_id: build.build_id.clone(),
      repository: build.repository.clone(),
      finished_at: build.finished_at,
      deployed_at: build.deployed_at,
      deploy: build.deploy.clone(),
      commit: pr_commit.sha.clone(),
      committed_at: pr_commit.authored_at,
    }
  }
}

/// A row of the final report: either a build passed through or one PR commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRecord {
  Build(BuildRecord),
  PullRequestCommit(PullRequestCommitRecord),
}

impl ReportRecord {
  pub fn kind(&self) -> &'static str {
    match self {
      ReportRecord::Build(_) => "build",
      ReportRecord::PullRequestCommit(_) => "pull_request_commit",
    }
  }

  pub fn build_id(&self) -> &str {
    match self {
      ReportRecord::Build(b) => &b.build_id,
      ReportRecord::PullRequestCommit(c) => &c.build_id,
    }
  }

  pub fn repository(&self) -> &str {
    match self {
      ReportRecord::Build(b) => &b.repository,
      ReportRecord::PullRequestCommit(c) => &c.repository,
    }
  }

  pub fn commit(&self) -> &str {
    match self {
      ReportRecord::Build(b) => &b.commit,
      ReportRecord::PullRequestCommit(c) => &c.commit,
    }
  }

  pub fn committed_at(&self) -> Timestamp {
    match self {
      ReportRecord::Build(b) => b.committed_at,
      ReportRecord::PullRequestCommit(c) => c.committed_at,
    }
  }

  pub fn finished_at(&self) -> Option<Timestamp> {
    match self {
      ReportRecord::Build(b) => b.finished_at,
      ReportRecord::PullRequestCommit(c) => c.finished_at,
    }
  }

  pub fn deployed_at(&self) -> Option<Timestamp> {
    match self {
      ReportRecord::Build(b) => b.deployed_at,
      ReportRecord::PullRequestCommit(c) => c.deployed_at,
    }
  }

  pub fn deploy(&self) -> &DeployMarker {
    match self {
      ReportRecord::Build(b) => &b.deploy,
      ReportRecord::PullRequestCommit(c) => &c.deploy,
    }
  }
}

/// The pull request a commit was merged through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PullRequestRef {
  pub number: i64,
  /// Base repository (`owner/name`) that owns the PR number.
  pub repository: String,
}

/// One commit contributed by a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestCommit {
  pub sha: String,
  pub authored_at: Timestamp,
}
