use serde_json::{json, Value};
use test_support::{serve_routes, FixtureServer, Route};

pub const BIN: &str = "deploy-timeline";
pub const BUILDS_PATH: &str = "/v2/organizations/acme/pipelines/web/builds";

/// One Buildkite build as the API returns it.
///
/// `prod_finished` adds a passed "Deploy to Prod" job; `commit_date` fills the
/// commit metadata entry with a `git show --pretty=fuller` style blob.
pub fn build(number: u32, created: &str, finished: &str, prod_finished: Option<&str>, commit_date: Option<&str>) -> Value {
  let mut jobs = vec![json!({ "name": ":rspec: Test", "state": "passed", "finished_at": finished })];
  if let Some(at) = prod_finished {
    jobs.push(json!({ "name": ":rocket: Deploy to Prod", "state": "passed", "finished_at": at }));
  }

  let meta_data = match commit_date {
    Some(d) => json!({
      "buildkite:git:commit": format!("commit c{number}\nAuthor:     Dev <dev@example.com>\nAuthorDate: {d}\nCommit:     Dev <dev@example.com>\nCommitDate: {d}\n\n    change {number}\n")
    }),
    None => json!({}),
  };

  json!({
    "id": format!("uuid-{number}"),
    "number": number,
    "commit": format!("c{number}"),
    "created_at": created,
    "finished_at": finished,
    "meta_data": meta_data,
    "jobs": jobs,
    "pipeline": {
      "slug": "web",
      "provider": { "settings": { "repository": "git@github.com:acme/web.git" } }
    }
  })
}

pub fn builds_page(page: u32, builds: Vec<Value>) -> Route {
  Route::json(BUILDS_PATH, Value::Array(builds).to_string()).with_query(&format!("&page={page}&"))
}

pub fn no_pull_requests(sha: &str) -> Route {
  Route::json(&format!("/repos/acme/web/commits/{sha}/pulls"), "[]")
}

pub fn pull_request(sha: &str, number: i64, commits: &[(&str, &str)]) -> Vec<Route> {
  let pr = json!([{ "number": number, "base": { "repo": { "full_name": "acme/web" } } }]);
  let listed: Vec<Value> = commits
    .iter()
    .map(|(sha, date)| json!({ "sha": sha, "commit": { "author": { "date": date } } }))
    .collect();

  vec![
    Route::json(&format!("/repos/acme/web/commits/{sha}/pulls"), pr.to_string()),
    Route::json(&format!("/repos/acme/web/pulls/{number}/commits"), Value::Array(listed).to_string()),
  ]
}

/// Window 2019-12-03..2019-12-08 over four builds, two per page:
///
/// - 12 deployed Dec 7, no PR
/// - 11 never deployed itself, merged via PR 77 (two commits), ships with 12
/// - 10 deployed Dec 5, commit date from metadata
/// - 9 deployed Dec 1, before the window; ends pagination
pub fn happy_server() -> FixtureServer {
  let mut routes = vec![
    builds_page(
      1,
      vec![
        build(12, "2019-12-07T09:00:00Z", "2019-12-07T10:00:00Z", Some("2019-12-07T11:00:00Z"), None),
        build(11, "2019-12-06T08:00:00Z", "2019-12-06T09:00:00Z", None, None),
      ],
    ),
    builds_page(
      2,
      vec![
        build(
          10,
          "2019-12-05T08:00:00Z",
          "2019-12-05T10:00:00Z",
          Some("2019-12-05T12:00:00Z"),
          Some("Wed Dec 4 10:11:12 2019 +1100"),
        ),
        build(9, "2019-11-30T08:00:00Z", "2019-11-30T09:00:00Z", Some("2019-12-01T10:00:00Z"), None),
      ],
    ),
    no_pull_requests("c12"),
    no_pull_requests("c10"),
  ];
  routes.extend(pull_request(
    "c11",
    77,
    &[("aaa111", "2019-12-04T08:00:00Z"), ("bbb222", "2019-12-05T09:30:00Z")],
  ));

  serve_routes(routes)
}

/// `deploy-timeline` pointed at `server` with tokens set and a two-build page size.
pub fn timeline_cmd(server: &FixtureServer) -> assert_cmd::Command {
  let mut cmd = test_support::cmd_bin(BIN);
  cmd
    .env("BUILDKITE_TOKEN", "bk-token")
    .env("GITHUB_TOKEN", "gh-token")
    .args([
      "--start-time",
      "2019-12-03",
      "--end-time",
      "2019-12-08",
      "--pipeline",
      "acme/web",
      "--page-size",
      "2",
      "--buildkite-api",
      server.base_url.as_str(),
      "--github-api",
      server.base_url.as_str(),
    ]);
  cmd
}
