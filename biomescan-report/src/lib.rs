//! Validation report: one JSON row per resolved target.
//!
//! The on-disk field names (`biomeName`, `type`, `present`, `x`, `y`) are read by
//! existing tooling and must not change.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use biomescan_locate::{BlockPos, Target};
use serde::{Deserialize, Serialize};

/// How resolved positions end up in the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordMode {
    /// Every row is written as `present: false, x: 0, y: 0`, matching reports produced so far.
    #[default]
    Legacy,
    /// Rows carry the real outcome and the resolved x/y.
    Accurate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLine {
    #[serde(rename = "biomeName")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub present: bool,
    pub x: i32,
    pub y: i32,
    /// Set only when the resolver itself failed for this target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeLine {
    pub fn record(target: &Target, found: Option<BlockPos>, mode: RecordMode) -> Self {
        let (present, x, y) = match (mode, found) {
            (RecordMode::Accurate, Some(pos)) => (true, pos.x, pos.y),
            _ => (false, 0, 0),
        };
        Self {
            name: target.name.clone(),
            kind: target.kind.as_str().to_string(),
            present,
            x,
            y,
            error: None,
        }
    }

    pub fn failed(target: &Target, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::record(target, None, RecordMode::Legacy)
        }
    }
}

/// `completed / total` as a percentage with two decimals, e.g. `"50.00%"`.
/// Halves round up (`1/32` is `"3.13%"`).
pub fn progress_percent(completed: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    let (completed, total) = (completed as u128, total as u128);
    let hundredths = (completed * 20_000 + total) / (total * 2);
    format!("{}.{:02}%", hundredths / 100, hundredths % 100)
}

/// `report` + epoch second as 16 uppercase hex digits + `.json`.
pub fn report_filename(epoch_secs: u64) -> String {
    format!("report{:016X}.json", epoch_secs)
}

pub fn epoch_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Write `lines` as a pretty JSON array into `dir`. Returns the absolute path written.
/// An existing report with the same name is overwritten.
pub fn write_report(dir: &Path, started_at: u64, lines: &[OutcomeLine]) -> Result<PathBuf> {
    let path = dir.join(report_filename(started_at));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, lines)
        .with_context(|| format!("Failed to serialize report {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush report {}", path.display()))?;

    let path = std::path::absolute(&path).unwrap_or(path);
    log::debug!("Wrote {} report rows to {}", lines.len(), path.display());
    Ok(path)
}
