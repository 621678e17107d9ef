use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use crate::metrics::MetricOutcome;

/// One metric's serialized result. `delay_ms` and `deviation_sq` are jointly
/// absent when the metric's trigger or effect never resolved; `error` carries
/// a scoring failure instead of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub delay_ms: Option<i64>,
    pub deviation_sq: Option<i64>,
    pub compared: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl From<&MetricOutcome> for MetricRecord {
    fn from(outcome: &MetricOutcome) -> Self {
        match &outcome.result {
            Ok(r) => MetricRecord {
                delay_ms: r.delay_ms,
                deviation_sq: r.deviation_sq,
                compared: r.compared,
                skipped: r.skipped,
                error: None,
            },
            Err(e) => MetricRecord {
                delay_ms: None,
                deviation_sq: None,
                compared: 0,
                skipped: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

/// The full analysis output for one session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: String,
    pub analyzed_at: DateTime<Local>,
    pub metrics: BTreeMap<String, MetricRecord>,
}

impl SessionReport {
    pub fn new(session: &str, outcomes: &[MetricOutcome]) -> Self {
        let metrics = outcomes
            .iter()
            .map(|o| (o.name.clone(), MetricRecord::from(o)))
            .collect();
        Self {
            session: session.to_string(),
            analyzed_at: Local::now(),
            metrics,
        }
    }

    /// Writes `<session>.report.json` into `dir` and returns the path.
    pub fn write_json(&self, dir: &Path, pretty: bool) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.report.json", self.session));
        let data = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, data)?;
        Ok(path)
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    session: &'a str,
    metric: &'a str,
    delay_ms: Option<i64>,
    deviation_sq: Option<i64>,
    compared: usize,
    skipped: usize,
    error: Option<&'a str>,
}

/// Appends one CSV row per metric to the running summary file, emitting the
/// header only when the file is created.
pub fn append_summary(path: &Path, report: &SessionReport) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let needs_header = !path.exists();

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);

    for (name, record) in &report.metrics {
        writer
            .serialize(SummaryRow {
                session: &report.session,
                metric: name,
                delay_ms: record.delay_ms,
                deviation_sq: record.deviation_sq,
                compared: record.compared,
                skipped: record.skipped,
                error: record.error.as_deref(),
            })
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    }

    writer.flush()?;
    Ok(())
}
