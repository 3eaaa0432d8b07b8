use tracing::trace;

use crate::error::{Result, TimelineError};

pub const USER_AGENT: &str = "deploy-timeline";

/// Issue one authenticated GET and decode the JSON body.
///
/// Transport failures, non-2xx statuses and undecodable bodies all surface as
/// `RemoteSource`; nothing is retried here.
pub fn get_json(
  agent: &ureq::Agent,
  source_name: &'static str,
  url: &str,
  query: &[(&str, String)],
  headers: &[(&str, &str)],
) -> Result<serde_json::Value> {
  let mut req = agent.get(url).set("User-Agent", USER_AGENT);

  for (k, v) in headers {
    req = req.set(k, v);
  }
  for (k, v) in query {
    req = req.query(k, v);
  }

  trace!(source = source_name, %url, ?query, "GET");

  match req.call() {
    Ok(resp) => resp
      .into_json::<serde_json::Value>()
      .map_err(|e| TimelineError::remote(source_name, url, format!("invalid JSON body: {e}"))),
    Err(ureq::Error::Status(code, resp)) => {
      let body = resp.into_string().unwrap_or_default();
      Err(TimelineError::remote(
        source_name,
        url,
        format!("HTTP {code}: {}", body.chars().take(200).collect::<String>()),
      ))
    }
    Err(e) => Err(TimelineError::remote(source_name, url, e.to_string())),
  }
}

pub fn new_agent() -> ureq::Agent {
  ureq::AgentBuilder::new().build()
}
