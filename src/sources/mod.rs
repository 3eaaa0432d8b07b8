// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Namespace for the read-only remote sources the pipeline consumes (Buildkite builds, GitHub PRs)
// role: sources/namespace
// outputs: BuildStatusSource and CodeHostSource traits with HTTP implementations
// invariants: Sources never write to a remote system; failures are terminal for the run
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod buildkite;
pub mod github;
pub mod http;
