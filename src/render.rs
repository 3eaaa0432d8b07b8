// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Serialize the final record sequence as tab-separated rows or a JSON array
// role: rendering/report
// inputs: &[ReportRecord] in final order; zone label; output format
// outputs: Report text (one TSV line per record, or pretty JSON)
// invariants: Pure formatting; no filtering, reordering or computation beyond time rendering
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::model::ReportRecord;
use crate::util::{human_in_tz, rfc3339_in_tz};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ReportFormat {
  Tsv,
  Json,
}

/// JSON shape of one report row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
  pub kind: String,
  pub build_id: String,
  pub repository: String,
  pub commit: String,
  pub committed_at: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub finished_at: Option<String>,
  pub deployed_at: Option<String>,
  pub deploy_build: String,
}

#[derive(Debug, Clone)]
pub struct ReportRenderer {
  tz: String,
  format: ReportFormat,
}

impl ReportRenderer {
  pub fn new(tz: impl Into<String>, format: ReportFormat) -> Self {
    Self { tz: tz.into(), format }
  }

  pub fn render(&self, records: &[ReportRecord]) -> serde_json::Result<String> {
    match self.format {
      ReportFormat::Tsv => Ok(self.render_tsv(records)),
      ReportFormat::Json => {
        let rows: Vec<ReportRow> = records.iter().map(|r| self.row(r)).collect();
        let mut text = serde_json::to_string_pretty(&rows)?;
        text.push('\n');
        Ok(text)
      }
    }
  }

  /// `repository  commit  committed  deployed  deploy-build`, one line per record.
  pub fn render_tsv(&self, records: &[ReportRecord]) -> String {
    let mut out = String::new();

    for r in records {
      let deployed = r.deployed_at().map(|t| human_in_tz(t, &self.tz)).unwrap_or_default();
      out.push_str(&format!(
        "{}\t{}\t{}\t{}\t{}\n",
        r.repository(),
        r.commit(),
        human_in_tz(r.committed_at(), &self.tz),
        deployed,
        r.deploy().build_id()
      ));
    }

    out
  }

  fn row(&self, r: &ReportRecord) -> ReportRow {
    ReportRow {
      kind: r.kind().to_string(),
      build_id: r.build_id().to_string(),
      repository: r.repository().to_string(),
      commit: r.commit().to_string(),
      committed_at: rfc3339_in_tz(r.committed_at(), &self.tz),
      finished_at: r.finished_at().map(|t| rfc3339_in_tz(t, &self.tz)),
      deployed_at: r.deployed_at().map(|t| rfc3339_in_tz(t, &self.tz)),
      deploy_build: r.deploy().build_id().to_string(),
    }
  }
}
