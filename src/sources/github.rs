// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: GitHub helpers used by pull-request enrichment (token discovery, commit→PR lookup, PR commit listing)
// role: sources/code-host
// inputs: owner/name repository, commit SHA or PR number; env GITHUB_TOKEN/GH_TOKEN; optional `gh` CLI for token fallback
// outputs: PullRequestRef for a commit (first candidate only) and every commit of a PR
// side_effects: Network calls to the GitHub REST API; spawns `gh` subprocess when discovering a token
// invariants:
// - Only the first PR returned for a commit is used; multi-PR histories are not disambiguated
// - PR commit listing pages until a short page
// - The cached wrapper is shared across enrichment threads and only caches successes
// errors: RemoteSource for transport/status/payload failures; never retried
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Result, TimelineError};
use crate::ext::serde_json::JsonFetch;
use crate::model::{PullRequestCommit, PullRequestRef};
use crate::sources::http;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const PR_COMMITS_PAGE_SIZE: u32 = 100;

const SOURCE_NAME: &str = "github";

/// Discover a GitHub token: env vars first, then `gh auth token` if available.
pub fn get_github_token() -> Option<String> {
  for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
    if let Ok(t) = std::env::var(var) {
      if !t.trim().is_empty() {
        return Some(t.trim().to_string());
      }
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();

      if !t.is_empty() {
        return Some(t);
      }
    }
  }

  None
}

pub trait CodeHostSource: Send + Sync {
  /// The pull request a commit belongs to, if any.
  fn find_pull_request_for_commit(&self, repository: &str, sha: &str) -> Result<Option<PullRequestRef>>;
  /// Every commit of a pull request, in the order the host lists them.
  fn list_pull_request_commits(&self, repository: &str, number: i64) -> Result<Vec<PullRequestCommit>>;
}

pub struct GithubHttpSource {
  base_url: String,
  token: String,
  agent: ureq::Agent,
}

impl GithubHttpSource {
  pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      token: token.into(),
      agent: http::new_agent(),
    }
  }

  fn get(&self, url: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
    let auth = format!("Bearer {}", self.token);
    http::get_json(
      &self.agent,
      SOURCE_NAME,
      url,
      query,
      &[
        ("Accept", "application/vnd.github+json"),
        ("Authorization", auth.as_str()),
      ],
    )
  }
}

impl CodeHostSource for GithubHttpSource {
  fn find_pull_request_for_commit(&self, repository: &str, sha: &str) -> Result<Option<PullRequestRef>> {
    let url = format!("{}/repos/{}/commits/{}/pulls", self.base_url, repository, sha);
    let body = self.get(&url, &[])?;

    let arr = body
      .as_array()
      .ok_or_else(|| TimelineError::remote(SOURCE_NAME, &url, "expected a JSON array of pull requests"))?;

    // Only the first candidate is considered; branching histories are not disambiguated.
    Ok(arr.first().and_then(|pr| pull_request_ref(pr, repository)))
  }

  fn list_pull_request_commits(&self, repository: &str, number: i64) -> Result<Vec<PullRequestCommit>> {
    let url = format!("{}/repos/{}/pulls/{}/commits", self.base_url, repository, number);
    let mut out = Vec::new();
    let mut page = 1u32;

    loop {
      let body = self.get(
        &url,
        &[
          ("per_page", PR_COMMITS_PAGE_SIZE.to_string()),
          ("page", page.to_string()),
        ],
      )?;
      let arr = body
        .as_array()
        .ok_or_else(|| TimelineError::remote(SOURCE_NAME, &url, "expected a JSON array of commits"))?;

      for item in arr {
        if let Some(c) = pull_request_commit(item, &url)? {
          out.push(c);
        }
      }

      if arr.len() < PR_COMMITS_PAGE_SIZE as usize {
        break;
      }
      page += 1;
    }

    Ok(out)
  }
}

fn pull_request_ref(pr_json: &serde_json::Value, repository: &str) -> Option<PullRequestRef> {
  let number = pr_json.fetch("number").to::<i64>()?;
  let repository = pr_json
    .fetch("base.repo.full_name")
    .to::<String>()
    .unwrap_or_else(|| repository.to_string());

  Some(PullRequestRef { number, repository })
}

fn pull_request_commit(item: &serde_json::Value, url: &str) -> Result<Option<PullRequestCommit>> {
  let sha = item.fetch("sha").to_or_default::<String>();

  if sha.is_empty() {
    return Ok(None);
  }

  let authored_at = item
    .fetch("commit.author.date")
    .time()
    .ok_or_else(|| TimelineError::remote(SOURCE_NAME, url, format!("commit {sha} has no author date")))?;

  Ok(Some(PullRequestCommit { sha, authored_at }))
}

// --- Per-run cache ---
// Rebuilds of one commit and several builds of one PR would otherwise repeat requests.
pub struct GithubCachedSource {
  inner: Box<dyn CodeHostSource>,
  pulls_for_commit: Mutex<HashMap<String, Option<PullRequestRef>>>,
  pull_commits: Mutex<HashMap<String, Vec<PullRequestCommit>>>,
}

impl GithubCachedSource {
  pub fn new(inner: Box<dyn CodeHostSource>) -> Self {
    Self {
      inner,
      pulls_for_commit: Mutex::new(HashMap::new()),
      pull_commits: Mutex::new(HashMap::new()),
    }
  }

  #[inline]
  fn key(repository: &str, id: impl std::fmt::Display) -> String {
    format!("{}:{}", repository, id)
  }
}

impl CodeHostSource for GithubCachedSource {
  fn find_pull_request_for_commit(&self, repository: &str, sha: &str) -> Result<Option<PullRequestRef>> {
    let key = Self::key(repository, sha);

    if let Some(v) = self.pulls_for_commit.lock().ok().and_then(|m| m.get(&key).cloned()) {
      debug!(%key, "pull request lookup cache hit");
      return Ok(v);
    }
    let v = self.inner.find_pull_request_for_commit(repository, sha)?;

    if let Ok(mut m) = self.pulls_for_commit.lock() {
      m.insert(key, v.clone());
    }

    Ok(v)
  }

  fn list_pull_request_commits(&self, repository: &str, number: i64) -> Result<Vec<PullRequestCommit>> {
    let key = Self::key(repository, number);

    if let Some(v) = self.pull_commits.lock().ok().and_then(|m| m.get(&key).cloned()) {
      debug!(%key, "pull request commits cache hit");
      return Ok(v);
    }
    let v = self.inner.list_pull_request_commits(repository, number)?;

    if let Ok(mut m) = self.pull_commits.lock() {
      m.insert(key, v.clone());
    }

    Ok(v)
  }
}

pub fn make_github_source(base_url: &str, token: String) -> Box<dyn CodeHostSource> {
  let inner: Box<dyn CodeHostSource> = Box::new(GithubHttpSource::new(base_url, token));
  Box::new(GithubCachedSource::new(inner))
}
