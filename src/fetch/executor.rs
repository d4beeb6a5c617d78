//! Low-level command execution for descriptor queries

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// Timeout for collecting output from child process pipes
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured output per stream (10MB)
const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub command: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    /// Whether the command was killed for exceeding its timeout
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn summary(&self) -> String {
        let status = if self.timed_out {
            "TIMEOUT"
        } else if self.success {
            "OK"
        } else {
            "FAILED"
        };
        format!(
            "{} - {} ({}ms, exit code: {:?})",
            status,
            self.command,
            self.duration.as_millis(),
            self.exit_code
        )
    }
}

/// Run a shell command, killing it once `timeout` elapses.
///
/// Returns `Err` only when the process cannot be spawned or waited on; a
/// non-zero exit or a timeout is reported through [`CommandOutput`].
pub fn run_command(
    command: &str,
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput> {
    let start = Instant::now();

    let mut child = spawn_shell_command(command, working_dir)?;

    // Drain the pipes while waiting, otherwise a chatty child blocks on a
    // full pipe buffer and never exits.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let (stdout_tx, stdout_rx) = mpsc::channel();
    let (stderr_tx, stderr_rx) = mpsc::channel();

    if let Some(stdout) = stdout_handle {
        thread::spawn(move || {
            let _ = stdout_tx.send(read_stream_to_string(stdout));
        });
    } else {
        let _ = stdout_tx.send(String::new());
    }

    if let Some(stderr) = stderr_handle {
        thread::spawn(move || {
            let _ = stderr_tx.send(read_stream_to_string(stderr));
        });
    } else {
        let _ = stderr_tx.send(String::new());
    }

    let wait_result = child
        .wait_timeout(timeout)
        .with_context(|| format!("Failed to wait for command: {command}"))?;

    if wait_result.is_none() {
        kill_child_process(&mut child);
    }

    let duration = start.elapsed();

    let stdout = stdout_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());
    let stderr = stderr_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());

    Ok(match wait_result {
        Some(status) => CommandOutput {
            command: command.to_string(),
            success: status.success(),
            stdout,
            stderr,
            exit_code: status.code(),
            duration,
            timed_out: false,
        },
        None => CommandOutput {
            command: command.to_string(),
            success: false,
            stdout,
            stderr: format!(
                "{}\n[Process killed after {}s timeout]",
                stderr,
                timeout.as_secs_f64()
            ),
            exit_code: None,
            duration,
            timed_out: true,
        },
    })
}

/// Spawn `command` through `sh -c` (or `cmd /C` on Windows), passing it as a
/// single argument.
fn spawn_shell_command(command: &str, working_dir: Option<&Path>) -> Result<Child> {
    let mut cmd = if cfg!(target_family = "unix") {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    } else {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    cmd.spawn()
        .with_context(|| format!("Failed to spawn command: {command}"))
}

/// Read a stream to string, capped at MAX_OUTPUT_SIZE.
///
/// Past the cap the rest of the stream is drained and discarded so the
/// child never sees a broken pipe.
fn read_stream_to_string<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let remaining = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                let to_copy = n.min(remaining);
                buf.extend_from_slice(&chunk[..to_copy]);
                if to_copy < n {
                    let mut discard = [0u8; 8192];
                    while stream.read(&mut discard).unwrap_or(0) > 0 {}
                    buf.extend_from_slice(b"\n[output truncated at 10MB]");
                    break;
                }
            }
            Err(_) => {
                if buf.is_empty() {
                    return "[error reading output]".to_string();
                }
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn kill_child_process(child: &mut Child) {
    // The process may already have exited
    let _ = child.kill();
    let _ = child.wait();
}
