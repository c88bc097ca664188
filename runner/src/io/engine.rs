//! Task engine abstraction and the subprocess-backed production engine.
//!
//! The [`TaskEngine`] trait decouples the batch loop from the per-account
//! task implementation. Tests use scripted engines that return predetermined
//! replies without spawning processes.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, instrument};

use crate::core::outcome::{EngineError, EngineReply, ErrorKind};
use crate::io::process::run_command_with_timeout;
use crate::io::settings::EngineConfig;

/// Per-account task collaborator.
///
/// Takes the account's config file explicitly; an engine must not rely on
/// ambient state to find its target.
pub trait TaskEngine {
    fn run(&self, config: &Path) -> Result<EngineReply, EngineError>;
}

/// Engine that spawns the configured command with the config path appended
/// as the final argument.
///
/// The child's exit code is the status code and its trimmed stdout the
/// message. Credential failures are recognized by stderr marker lines.
pub struct ProcessEngine {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl ProcessEngine {
    /// Fails on an invalid config; the command in particular must be
    /// non-empty.
    pub fn new(cfg: &EngineConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            command: cfg.command.clone(),
            timeout: Duration::from_secs(cfg.task_timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        })
    }
}

static ERROR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(CookieError|StokenError)\b:?\s*(.*)$").unwrap());

impl TaskEngine for ProcessEngine {
    #[instrument(skip_all, fields(config = %config.display()))]
    fn run(&self, config: &Path) -> Result<EngineReply, EngineError> {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).arg(config);

        debug!(command = ?self.command, "invoking task engine");
        let output = run_command_with_timeout(cmd, None, self.timeout, self.output_limit_bytes)
            .map_err(|err| EngineError::unknown(format!("{err:#}")))?;

        if output.timed_out {
            return Err(EngineError::unknown(format!(
                "task engine timed out after {}s",
                self.timeout.as_secs()
            )));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(caps) = ERROR_MARKER.captures(&stderr) {
            let kind = if &caps[1] == "CookieError" {
                ErrorKind::Cookie
            } else {
                ErrorKind::Stoken
            };
            return Err(EngineError::new(kind, caps[2].trim().to_string()));
        }

        let Some(code) = output.status.code() else {
            return Err(EngineError::unknown("task engine killed by signal"));
        };
        let message = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(EngineReply { code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(script: &str) -> ProcessEngine {
        ProcessEngine::new(&EngineConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            ..EngineConfig::default()
        })
        .expect("engine config")
    }

    #[test]
    fn success_maps_exit_code_and_stdout() {
        let reply = engine("echo all done").run(Path::new("a.yml")).expect("run");
        assert_eq!(reply.code, 0);
        assert_eq!(reply.message, "all done");
    }

    #[test]
    fn captcha_exit_code_passes_through() {
        let reply = engine("exit 3").run(Path::new("a.yml")).expect("run");
        assert_eq!(reply.code, 3);
    }

    #[test]
    fn cookie_marker_maps_to_tagged_error() {
        let err = engine("echo 'CookieError: cookie expired' >&2; exit 2")
            .run(Path::new("a.yml"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cookie);
        assert_eq!(err.detail, "cookie expired");
    }

    #[test]
    fn stoken_marker_maps_to_tagged_error() {
        let err = engine("echo 'StokenError' >&2; exit 2")
            .run(Path::new("a.yml"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Stoken);
    }

    #[test]
    fn spawn_failure_is_unknown_error() {
        let broken = ProcessEngine::new(&EngineConfig {
            command: vec!["definitely-not-a-real-binary".to_string()],
            ..EngineConfig::default()
        })
        .expect("engine config");
        let err = broken.run(Path::new("a.yml")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[test]
    fn empty_command_is_rejected_at_construction() {
        let result = ProcessEngine::new(&EngineConfig {
            command: Vec::new(),
            ..EngineConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn config_path_is_appended_as_argument() {
        // `sh -c script` binds extra args starting at $0.
        let reply = engine("echo \"$0\"")
            .run(Path::new("config/a.yml"))
            .expect("run");
        assert_eq!(reply.message, "config/a.yml");
    }
}
