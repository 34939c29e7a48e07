use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::SystemTime;

use biomescan_locate::{BlockPos, Registry, Resolver};
use biomescan_report::{epoch_seconds, progress_percent, write_report, OutcomeLine, RecordMode};

use futures_util::FutureExt;

use crate::MessageSink;

pub const SAVE_FAILED_MESSAGE: &str = "Error occurred while saving. Check server console.";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub origin: BlockPos,
    pub radius: u32,
    pub report_dir: PathBuf,
    pub record_mode: RecordMode,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcomes: Vec<OutcomeLine>,
    /// None when the report could not be written.
    pub report_path: Option<PathBuf>,
    pub started_at: u64,
}

/// Resolve every registry entry in order (biomes, then structures), one at a time,
/// reporting progress to `sink`, then write the report.
///
/// A failing or panicking resolver call is recorded against its target and the run carries on.
pub async fn run_validation(
    registry: &Registry,
    resolver: &dyn Resolver,
    sink: &dyn MessageSink,
    config: &RunConfig,
) -> RunSummary {
    let started_at = epoch_seconds(SystemTime::now());

    sink.send(&format!("{} biomes found in registry.", registry.biomes.len()));
    sink.send(&format!("{} structures found in registry.", registry.structures.len()));

    let targets = registry.targets();
    let total = targets.len();
    let mut outcomes = Vec::with_capacity(total);

    for (completed, target) in targets.iter().enumerate() {
        let result = AssertUnwindSafe(resolver.resolve(target, config.origin, config.radius))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))));
        let status = progress_percent(completed, total);

        let line = match result {
            Ok(Some(pos)) => {
                sink.send(&format!("{} found at {} ({})", target.name, pos, status));
                OutcomeLine::record(target, Some(pos), config.record_mode)
            }
            Ok(None) => {
                sink.send(&format!("{} not found ({})", target.name, status));
                OutcomeLine::record(target, None, config.record_mode)
            }
            Err(e) => {
                log::error!("Resolving {} {} failed: {:?}", target.kind, target.name, e);
                sink.send(&format!("{} failed: {} ({})", target.name, e, status));
                OutcomeLine::failed(target, format!("{:#}", e))
            }
        };
        outcomes.push(line);
    }

    let report_path = match write_report(&config.report_dir, started_at, &outcomes) {
        Ok(path) => {
            sink.send(&format!("Saved to {}", path.display()));
            Some(path)
        }
        Err(e) => {
            log::error!("Failed to write validation report: {:?}", e);
            sink.send(SAVE_FAILED_MESSAGE);
            None
        }
    };

    RunSummary { outcomes, report_path, started_at }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}
