use predicates::prelude::*;
use test_support::{serve_routes, Route};

use crate::fixtures::{build, builds_page, no_pull_requests, timeline_cmd, BIN, BUILDS_PATH};

#[test]
fn missing_pipeline_is_a_configuration_error() {
  test_support::cmd_bin(BIN)
    .env("BUILDKITE_TOKEN", "bk")
    .env("GITHUB_TOKEN", "gh")
    .args(["--start-time", "2019-12-03", "--end-time", "2019-12-08"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("configuration error").and(predicate::str::contains("--pipeline")));
}

#[test]
fn missing_buildkite_token_fails_before_any_request() {
  let server = serve_routes(vec![]);
  let td = test_support::tempdir();

  // An empty working dir keeps a developer's .env out of the run
  timeline_cmd(&server)
    .env_remove("BUILDKITE_TOKEN")
    .current_dir(td.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("BUILDKITE_TOKEN"));

  assert!(server.hits().is_empty());
}

#[test]
fn inverted_window_is_rejected() {
  test_support::cmd_bin(BIN)
    .env("BUILDKITE_TOKEN", "bk")
    .env("GITHUB_TOKEN", "gh")
    .args(["--start-time", "2019-12-09", "--end-time", "2019-12-08", "--pipeline", "acme/web"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("must be earlier than"));
}

#[test]
fn metadata_without_commit_date_aborts_the_run() {
  let mut broken = build(5, "2019-12-05T08:00:00Z", "2019-12-05T09:00:00Z", Some("2019-12-05T10:00:00Z"), None);
  broken["meta_data"] = serde_json::json!({ "buildkite:git:commit": "commit c5\nAuthor: Dev\n" });
  let server = serve_routes(vec![builds_page(1, vec![broken])]);

  timeline_cmd(&server)
    .assert()
    .failure()
    .stderr(predicate::str::contains("malformed build record web/5").and(predicate::str::contains("CommitDate")));
}

#[test]
fn buildkite_auth_failure_is_reported() {
  let server = serve_routes(vec![Route::json(BUILDS_PATH, r#"{"message":"Authentication required"}"#).with_status(401)]);

  timeline_cmd(&server)
    .assert()
    .failure()
    .stderr(predicate::str::contains("buildkite request failed").and(predicate::str::contains("HTTP 401")));
}

#[test]
fn code_host_failure_aborts_without_partial_output() {
  let server = serve_routes(vec![
    builds_page(
      1,
      vec![
        build(6, "2019-12-06T08:00:00Z", "2019-12-06T09:00:00Z", Some("2019-12-06T10:00:00Z"), None),
        build(5, "2019-12-05T08:00:00Z", "2019-12-05T09:00:00Z", None, None),
      ],
    ),
    builds_page(2, vec![]),
    no_pull_requests("c6"),
    Route::json("/repos/acme/web/commits/c5/pulls", r#"{"message":"boom"}"#).with_status(502),
  ]);

  timeline_cmd(&server)
    .assert()
    .failure()
    .stdout("")
    .stderr(predicate::str::contains("github request failed"));
}

#[test]
fn nothing_deployed_prints_an_empty_report() {
  let server = serve_routes(vec![builds_page(
    1,
    vec![build(4, "2019-12-05T08:00:00Z", "2019-12-05T09:00:00Z", None, None)],
  )]);

  timeline_cmd(&server)
    .assert()
    .success()
    .stdout("")
    .stderr(predicate::str::contains("no deployed builds in window"));
}
