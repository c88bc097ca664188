//! Push notification seam for the end-of-run report.
//!
//! The actual transport (Server酱, Telegram, ...) stays outside this crate;
//! a configured command receives the report as JSON on stdin and forwards it
//! however the deployment likes.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::info;

use crate::io::process::run_command_with_timeout;
use crate::io::settings::NotifyConfig;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);
const NOTIFY_OUTPUT_LIMIT: usize = 10_000;

/// End-of-run report sink. Failures are the caller's to log and ignore.
pub trait Notifier {
    fn push(&self, status: i32, message: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct NotifyPayload<'a> {
    status: i32,
    message: &'a str,
}

/// Notifier that pipes the report as JSON to a configured command.
pub struct CommandNotifier {
    command: Vec<String>,
}

impl CommandNotifier {
    /// Fails if the command is empty.
    pub fn new(cfg: &NotifyConfig) -> Result<Self> {
        if cfg.command.is_empty() || cfg.command[0].trim().is_empty() {
            return Err(anyhow!("notify command must be a non-empty array"));
        }
        Ok(Self {
            command: cfg.command.clone(),
        })
    }
}

impl Notifier for CommandNotifier {
    fn push(&self, status: i32, message: &str) -> Result<()> {
        let mut payload = serde_json::to_string(&NotifyPayload { status, message })
            .context("serialize notify payload")?;
        payload.push('\n');

        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        let output = run_command_with_timeout(
            cmd,
            Some(payload.as_bytes()),
            NOTIFY_TIMEOUT,
            NOTIFY_OUTPUT_LIMIT,
        )
        .context("run notify command")?;

        if output.timed_out {
            return Err(anyhow!("notify command timed out"));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "notify command failed with status {:?}",
                output.status.code()
            ));
        }
        Ok(())
    }
}

/// Fallback notifier that only logs the report.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn push(&self, status: i32, message: &str) -> Result<()> {
        info!(status, "run report:\n{message}");
        Ok(())
    }
}

/// Build the notifier selected by config: command when configured, log-only
/// otherwise.
pub fn notifier_from_config(cfg: &NotifyConfig) -> Box<dyn Notifier> {
    match CommandNotifier::new(cfg) {
        Ok(command) => Box::new(command),
        Err(_) => Box::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn command_notifier_writes_json_payload() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sink = temp.path().join("payload.json");
        let notifier = CommandNotifier::new(&NotifyConfig {
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("cat > {}", sink.display()),
            ],
        })
        .expect("notify config");

        notifier.push(2, "🔒 验证码列表: b.yml").expect("push");

        let written = fs::read_to_string(&sink).expect("read sink");
        let value: serde_json::Value = serde_json::from_str(&written).expect("json");
        assert_eq!(value["status"], 2);
        assert_eq!(value["message"], "🔒 验证码列表: b.yml");
    }

    #[test]
    fn command_notifier_reports_command_failure() {
        let notifier = CommandNotifier::new(&NotifyConfig {
            command: vec!["false".to_string()],
        })
        .expect("notify config");
        assert!(notifier.push(0, "report").is_err());
    }

    #[test]
    fn empty_command_is_rejected_at_construction() {
        assert!(CommandNotifier::new(&NotifyConfig::default()).is_err());
    }

    #[test]
    fn empty_command_selects_log_notifier() {
        let notifier = notifier_from_config(&NotifyConfig::default());
        assert!(notifier.push(0, "report").is_ok());
    }
}
