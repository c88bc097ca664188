//! Sequential multi-account batch orchestration.
//!
//! Drives the task engine once per discovered config file, classifies every
//! outcome into the aggregate buckets, and paces iterations with a random
//! delay so the remote service's abuse protection is not tripped. An engine
//! error for one account never aborts the batch.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{error, info, warn};

use crate::core::outcome::TaskStatus;
use crate::core::report::AggregateReport;
use crate::io::engine::TaskEngine;

/// Pacing for the batch loop.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Inclusive bounds of the random delay between consecutive accounts,
    /// in seconds.
    pub delay_secs: RangeInclusive<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay_secs: 3..=10 }
    }
}

/// Run the task engine over `files` sequentially and aggregate the outcomes.
///
/// Every file lands in exactly one report bucket. The delay applies between
/// consecutive files, not after the last one.
pub fn run_batch<E: TaskEngine>(
    files: &[PathBuf],
    engine: &E,
    config: &BatchConfig,
) -> AggregateReport {
    let mut report = AggregateReport::new(files.len());

    for (index, file) in files.iter().enumerate() {
        let name = display_name(file);
        info!(file = %name, "processing account");

        let start = Instant::now();
        match engine.run(file) {
            Ok(reply) => {
                let status = TaskStatus::from_code(reply.code);
                log_status(&name, status, &reply.message, start.elapsed());
                report.record_status(&name, status);
            }
            Err(err) => {
                error!(file = %name, "task engine error: {err}");
                report.record_error(&name, err.kind);
            }
        }

        if index + 1 < files.len() {
            pause(&config.delay_secs);
        }
    }

    report
}

/// Base file name used in buckets and the report; falls back to the full
/// path for nameless references.
fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

fn log_status(name: &str, status: TaskStatus, detail: &str, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    match status {
        TaskStatus::Success => info!(file = %name, detail, "finished in {secs:.1}s"),
        TaskStatus::Skipped => info!(file = %name, detail, "skipped after {secs:.1}s"),
        TaskStatus::Captcha => {
            warn!(file = %name, detail, "needs manual captcha ({secs:.1}s)");
        }
        TaskStatus::Failed(code) => {
            error!(file = %name, code, detail, "failed after {secs:.1}s");
        }
    }
}

fn pause(range: &RangeInclusive<u64>) {
    let delay = rand::thread_rng().gen_range(range.clone());
    if delay > 0 {
        info!(delay_secs = delay, "waiting before next account");
    }
    thread::sleep(Duration::from_secs(delay));
}
