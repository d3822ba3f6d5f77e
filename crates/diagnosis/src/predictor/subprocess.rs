//! Child-process plumbing shared by the script-backed predictors.
//!
//! [`run_command`] spawns a prepared [`Command`], optionally feeds it a JSON
//! payload on stdin and collects both output streams, all under one
//! deadline. The child is killed when the deadline passes or the caller
//! drops the future. [`parse_json_stdout`] decodes what the script printed.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};

use super::external::PredictorError;

/// Bytes kept per output stream (1 MiB). Anything past this is drained
/// and discarded so the child never blocks on a full pipe.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Everything a predictor process needs besides its command line.
#[derive(Debug, Clone)]
pub struct ProcessInput {
    /// JSON written to stdin before it is closed. `None` gives the child an
    /// empty stdin, for scripts driven by arguments.
    pub payload: Option<serde_json::Value>,
    pub working_directory: Option<PathBuf>,
    pub timeout: Duration,
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub elapsed_ms: u64,
}

/// Run `cmd` to completion under `input.timeout`.
///
/// A non-zero exit is not an error here; callers decide what it means.
pub async fn run_command(
    cmd: &mut Command,
    input: ProcessInput,
) -> Result<ProcessOutput, PredictorError> {
    let payload = input
        .payload
        .as_ref()
        .map(serde_json::to_vec)
        .transpose()
        .map_err(|e| PredictorError::InvalidRequest(e.to_string()))?;

    cmd.stdin(if payload.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);
    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(PredictorError::IoError)?;
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Feeding stdin runs alongside the readers so a chatty script cannot
    // stall on its own output before consuming the payload.
    let exchange = async {
        let ((), stdout, stderr) = tokio::join!(
            feed(stdin, payload.as_deref()),
            capture(stdout),
            capture(stderr)
        );
        let status: ExitStatus = child.wait().await?;
        Ok::<_, std::io::Error>((stdout, stderr, status))
    };

    match tokio::time::timeout(input.timeout, exchange).await {
        Ok(Ok((stdout, stderr, status))) => Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }),
        Ok(Err(e)) => Err(PredictorError::IoError(e)),
        // `child` is dropped on return, which kills it.
        Err(_) => Err(PredictorError::Timeout {
            elapsed_ms: started.elapsed().as_millis() as u64,
        }),
    }
}

async fn feed(stdin: Option<ChildStdin>, payload: Option<&[u8]>) {
    let (Some(mut pipe), Some(bytes)) = (stdin, payload) else {
        return;
    };
    // A script may exit without reading its input.
    if let Err(e) = pipe.write_all(bytes).await {
        tracing::debug!(error = %e, "Predictor closed stdin early");
    }
}

async fn capture<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut kept = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_OUTPUT_BYTES.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    String::from_utf8_lossy(&kept).into_owned()
}

/// Decode a script's stdout as `T`.
///
/// The whole output is tried first, then its last non-empty line, so
/// scripts may log progress before printing the result.
pub fn parse_json_stdout<T: DeserializeOwned>(stdout: &str) -> Result<T, PredictorError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(PredictorError::InvalidResponse("empty output".to_string()));
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let last = trimmed
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(trimmed);
    serde_json::from_str(last).map_err(|e| PredictorError::InvalidResponse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde::Deserialize;

    use super::*;
    use crate::predictor::test_helpers::{default_input, write_temp_script};

    fn bash(script: &tempfile::NamedTempFile) -> Command {
        let mut cmd = Command::new("bash");
        cmd.arg(script.path());
        cmd
    }

    #[derive(Debug, Deserialize)]
    struct Score {
        score: u8,
    }

    #[tokio::test]
    async fn test_payload_is_piped_to_stdin() {
        let script = write_temp_script("cat\n");
        let output = run_command(&mut bash(&script), default_input())
            .await
            .expect("run");
        assert_eq!(output.exit_code, 0);
        assert!(output.stdout.contains("heartRate"));
    }

    #[tokio::test]
    async fn test_no_payload_gives_empty_stdin() {
        let script = write_temp_script("input=$(cat)\necho \"[${input}]\"\n");
        let input = ProcessInput {
            payload: None,
            ..default_input()
        };
        let output = run_command(&mut bash(&script), input).await.expect("run");
        assert_eq!(output.stdout.trim(), "[]");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let script = write_temp_script("echo 'no model' >&2\nexit 3\n");
        let output = run_command(&mut bash(&script), default_input())
            .await
            .expect("run");
        assert_eq!(output.exit_code, 3);
        assert!(output.stderr.contains("no model"));
    }

    #[tokio::test]
    async fn test_oversized_output_is_truncated() {
        let script = write_temp_script("head -c 3000000 /dev/zero | tr '\\0' 'a'\necho done >&2\n");
        let output = run_command(&mut bash(&script), default_input())
            .await
            .expect("run");
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.len(), MAX_OUTPUT_BYTES);
        assert_eq!(output.stderr.trim(), "done");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let script = write_temp_script("sleep 10\n");
        let input = ProcessInput {
            timeout: Duration::from_millis(200),
            ..default_input()
        };
        let started = Instant::now();
        let result = run_command(&mut bash(&script), input).await;
        assert_matches!(result, Err(PredictorError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_working_directory_is_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_temp_script("pwd\n");
        let input = ProcessInput {
            working_directory: Some(dir.path().to_path_buf()),
            ..default_input()
        };
        let output = run_command(&mut bash(&script), input).await.expect("run");
        let expected = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(PathBuf::from(output.stdout.trim()).canonicalize().expect("pwd"), expected);
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let mut cmd = Command::new("/nonexistent/predictor-binary");
        let result = run_command(&mut cmd, default_input()).await;
        assert_matches!(result, Err(PredictorError::IoError(_)));
    }

    #[test]
    fn test_parse_whole_output() {
        let parsed: Score = parse_json_stdout("  {\"score\": 2}\n").expect("parse");
        assert_eq!(parsed.score, 2);
    }

    #[test]
    fn test_parse_last_line_after_logs() {
        let parsed: Score =
            parse_json_stdout("loading model\nscaling input\n{\"score\": 1}\n\n").expect("parse");
        assert_eq!(parsed.score, 1);
    }

    #[test]
    fn test_parse_garbage() {
        assert_matches!(parse_json_stdout::<Score>(""), Err(PredictorError::InvalidResponse(_)));
        assert_matches!(
            parse_json_stdout::<Score>("Traceback (most recent call last)"),
            Err(PredictorError::InvalidResponse(_))
        );
    }
}
