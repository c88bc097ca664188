//! Helpers for running child processes with timeouts and bounded output.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount
/// of stdout/stderr stored in memory per stream (bytes beyond this are discarded while still
/// draining the pipe). On timeout the child is killed and `timed_out` is set.
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn child process")?;

    if let Some(input) = stdin {
        let mut handle = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("child stdin not piped"))?;
        // The child may exit without reading stdin; a broken pipe is not an error here.
        if let Err(err) = handle.write_all(input) {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(err).context("write child stdin");
            }
        }
        // Dropping the handle closes the pipe so the child sees EOF.
    }

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("child stdout not piped"))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("child stderr not piped"))?;
    let stdout_thread = spawn_reader(stdout_pipe, output_limit_bytes);
    let stderr_thread = spawn_reader(stderr_pipe, output_limit_bytes);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for child")? {
        Some(status) => status,
        None => {
            timed_out = true;
            warn!(
                timeout_secs = timeout.as_secs(),
                "child process timed out, killing"
            );
            child.kill().context("kill timed-out child")?;
            child.wait().context("reap killed child")?
        }
    };

    let stdout = join_reader(stdout_thread, "stdout")?;
    let stderr = join_reader(stderr_thread, "stderr")?;
    debug!(
        exit_code = ?status.code(),
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        timed_out,
        "child process finished"
    );

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    mut pipe: R,
    limit: usize,
) -> thread::JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut captured = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = pipe.read(&mut buf)?;
            if n == 0 {
                break;
            }
            let room = limit.saturating_sub(captured.len());
            captured.extend_from_slice(&buf[..n.min(room)]);
        }
        Ok(captured)
    })
}

fn join_reader(
    handle: thread::JoinHandle<std::io::Result<Vec<u8>>>,
    label: &str,
) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("{label} reader thread panicked"))?
        .with_context(|| format!("read child {label}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let output = run_command_with_timeout(
            sh("echo out; echo err >&2"),
            None,
            Duration::from_secs(5),
            1000,
        )
        .expect("run");
        assert!(output.status.success());
        assert!(!output.timed_out);
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "err");
    }

    #[test]
    fn reports_non_zero_exit() {
        let output =
            run_command_with_timeout(sh("exit 3"), None, Duration::from_secs(5), 1000).expect("run");
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn kills_child_on_timeout() {
        let output =
            run_command_with_timeout(sh("sleep 30"), None, Duration::from_millis(100), 1000)
                .expect("run");
        assert!(output.timed_out);
    }

    #[test]
    fn bounds_captured_output() {
        let output = run_command_with_timeout(
            sh("printf 'abcdefghij'"),
            None,
            Duration::from_secs(5),
            4,
        )
        .expect("run");
        assert_eq!(output.stdout, b"abcd");
    }

    #[test]
    fn feeds_stdin_to_child() {
        let output = run_command_with_timeout(
            sh("cat"),
            Some(b"payload"),
            Duration::from_secs(5),
            1000,
        )
        .expect("run");
        assert_eq!(output.stdout, b"payload");
    }
}
