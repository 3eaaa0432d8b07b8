// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Error taxonomy for the timeline pipeline (malformed input, remote failures, bad configuration)
// role: errors/types
// outputs: TimelineError and the crate-wide Result alias
// invariants: Every variant is fatal for the run; there is no partial-result mode
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

/// Fatal errors raised by the pipeline and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
  /// A fetched build entry cannot be trusted (e.g. metadata without a commit date).
  #[error("malformed build record {build_id}: {reason}")]
  MalformedRecord { build_id: String, reason: String },

  /// Transport, auth, rate-limit or payload failure from a remote source.
  #[error("{source_name} request failed ({url}): {message}")]
  RemoteSource {
    source_name: &'static str,
    url: String,
    message: String,
  },

  /// Missing or invalid run parameters.
  #[error("configuration error: {0}")]
  Configuration(String),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

impl TimelineError {
  pub fn malformed(build_id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::MalformedRecord {
      build_id: build_id.into(),
      reason: reason.into(),
    }
  }

  pub fn remote(source_name: &'static str, url: impl Into<String>, message: impl Into<String>) -> Self {
    Self::RemoteSource {
      source_name,
      url: url.into(),
      message: message.into(),
    }
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Configuration(msg.into())
  }
}
