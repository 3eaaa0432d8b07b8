// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for zone-aware timestamp formatting, report output, and man page rendering
// role: utilities/helpers
// inputs: Timestamps; zone labels ("utc", "local", IANA names); output targets; clap CommandFactory
// outputs: Formatted timestamps, written report files, man page text
// side_effects: write_output creates parent directories and writes files or stdout
// invariants:
// - Unknown zone labels never panic; they fall back to UTC (normalize rejects them up front)
// - human timestamps mirror the GMT string shape: "Mon, 02 Dec 2019 10:11:12"
// errors: IO errors bubble with path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use clap::CommandFactory;

use crate::model::Timestamp;

const HUMAN_FORMAT: &str = "%a, %d %b %Y %H:%M:%S";

/// `true` for "utc", "local" or a known IANA zone name.
pub fn is_known_tz(tz: &str) -> bool {
  tz.eq_ignore_ascii_case("utc") || tz.eq_ignore_ascii_case("local") || tz.parse::<Tz>().is_ok()
}

fn format_in_tz(ts: Timestamp, tz: &str, render: impl Fn(&dyn DisplayTime) -> String) -> String {
  if tz.eq_ignore_ascii_case("local") {
    return render(&ts.with_timezone(&Local));
  }

  match tz.parse::<Tz>() {
    Ok(zone) if !tz.eq_ignore_ascii_case("utc") => render(&zone.from_utc_datetime(&ts.naive_utc())),
    _ => render(&ts),
  }
}

/// Object-safe view over `DateTime<Tz>` for the handful of renderings we need.
trait DisplayTime {
  fn strftime(&self, fmt: &str) -> String;
  fn rfc3339(&self) -> String;
}

impl<Z: TimeZone> DisplayTime for DateTime<Z>
where
  Z::Offset: std::fmt::Display,
{
  fn strftime(&self, fmt: &str) -> String {
    self.format(fmt).to_string()
  }

  fn rfc3339(&self) -> String {
    self.to_rfc3339_opts(SecondsFormat::Secs, true)
  }
}

/// `Mon, 02 Dec 2019 10:11:12` in the requested zone.
pub fn human_in_tz(ts: Timestamp, tz: &str) -> String {
  format_in_tz(ts, tz, |d| d.strftime(HUMAN_FORMAT))
}

/// RFC3339 in the requested zone (`Z` suffix for UTC).
pub fn rfc3339_in_tz(ts: Timestamp, tz: &str) -> String {
  format_in_tz(ts, tz, |d| d.rfc3339())
}

/// Write the rendered report to `out` ("-" means stdout), creating parent directories.
pub fn write_output(out: &str, text: &str) -> Result<()> {
  if out == "-" {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    lock.write_all(text.as_bytes()).context("writing report to stdout")?;
    return lock.flush().context("flushing stdout");
  }

  let path = std::path::Path::new(out);

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(path, text).with_context(|| format!("writing report to {}", path.display()))
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
