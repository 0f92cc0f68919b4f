use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use cli_table::{Cell, CellStruct, Color, Style, Table, format::Justify, print_stdout};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::server::Endpoint;

/// Terminal result of one job. Built once by the scheduler, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub source: PathBuf,
    /// Endpoint that accepted the job.
    pub endpoint: Option<Endpoint>,
    pub files_transferred: u64,
    /// Every endpoint tried, in order.
    pub attempted: Vec<Endpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(
        source: PathBuf,
        endpoint: Endpoint,
        files_transferred: u64,
        attempted: Vec<Endpoint>,
    ) -> Self {
        Self { success: true, source, endpoint: Some(endpoint), files_transferred, attempted, error: None }
    }

    pub fn failed(source: PathBuf, attempted: Vec<Endpoint>, error: Option<String>) -> Self {
        Self { success: false, source, endpoint: None, files_transferred: 0, attempted, error }
    }
}

/// Everything that happened in one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub succeeded: Vec<UploadOutcome>,
    pub failed: Vec<UploadOutcome>,
    pub files_transferred: u64,
}

/// Collects outcomes in submission order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    report: RunReport,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: UploadOutcome) {
        self.report.files_transferred += outcome.files_transferred;
        if outcome.success {
            self.report.succeeded.push(outcome);
        } else {
            self.report.failed.push(outcome);
        }
    }

    pub fn files_transferred(&self) -> u64 {
        self.report.files_transferred
    }

    pub fn finish(self) -> RunReport {
        self.report
    }
}

impl RunReport {
    pub fn total_jobs(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary_line(&self, audit_log: &Path) -> String {
        format!(
            "File transfer completed. {} uploads successful, {} uploads failed. {} files transferred. Please check '{}' for more details.",
            self.succeeded.len(),
            self.failed.len(),
            self.files_transferred,
            audit_log.display()
        )
    }

    pub fn to_json(&self, elapsed_secs: f64, audit_log: &Path) -> serde_json::Value {
        serde_json::json!({
            "succeeded": self.succeeded,
            "failed": self.failed,
            "jobs": self.total_jobs(),
            "files_transferred": self.files_transferred,
            "elapsed_secs": elapsed_secs,
            "audit_log": audit_log.to_string_lossy(),
        })
    }

    pub fn print_table(&self) -> anyhow::Result<()> {
        if self.total_jobs() == 0 {
            return Ok(());
        }
        let title = vec![
            "Source".cell().bold(true),
            "Status".cell().bold(true),
            "Endpoint".cell().bold(true),
            "Files".cell().bold(true),
            "Tried".cell().bold(true),
        ];
        let mut table: Vec<Vec<CellStruct>> = Vec::new();
        for o in &self.succeeded {
            table.push(vec![
                o.source.display().to_string().cell(),
                "ok".cell().foreground_color(Some(Color::Green)),
                o.endpoint.as_ref().map(|e| e.to_string()).unwrap_or_default().cell(),
                o.files_transferred.cell().justify(Justify::Right),
                join_endpoints(&o.attempted).cell(),
            ]);
        }
        for o in &self.failed {
            table.push(vec![
                o.source.display().to_string().cell(),
                "failed".cell().foreground_color(Some(Color::Red)),
                "-".cell(),
                o.files_transferred.cell().justify(Justify::Right),
                join_endpoints(&o.attempted).cell(),
            ]);
        }
        print_stdout(table.table().title(title))?;
        for o in &self.failed {
            if let Some(err) = &o.error {
                println!("{} {}: {}", "✗".red(), o.source.display(), err);
            }
        }
        Ok(())
    }

    /// Appends one JSON line per failed job to `path`; returns it when
    /// anything was written.
    pub fn write_failures_jsonl(&self, path: &Path) -> std::io::Result<Option<PathBuf>> {
        if self.failed.is_empty() {
            return Ok(None);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new().create(true).append(true).open(path)?;
        let ts = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        for o in &self.failed {
            let line = serde_json::json!({
                "ts": ts,
                "source": o.source,
                "attempted": o.attempted,
                "error": o.error,
            });
            writeln!(f, "{}", line)?;
        }
        Ok(Some(path.to_path_buf()))
    }
}

fn join_endpoints(eps: &[Endpoint]) -> String {
    if eps.is_empty() {
        return "-".to_string();
    }
    eps.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}
