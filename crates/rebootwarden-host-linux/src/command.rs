//! External command execution

use rebootwarden_host_api::{HostError, HostResult};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run `argv` to completion and capture its output.
///
/// The child is killed if it outlives `timeout`. A non-zero exit status is not
/// an error here; callers decide what each status means.
pub async fn run_command(argv: &[String], timeout: Option<Duration>) -> HostResult<Output> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| HostError::Internal("Empty command line".into()))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program = %program, args = ?args, "Running command");

    let output = cmd.output();
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, output)
            .await
            .map_err(|_| HostError::Timeout(limit))?,
        None => output.await,
    };

    result.map_err(|e| HostError::command_failed(program.as_str(), e.to_string()))
}

/// Like `run_command`, but a non-zero exit status is an error
pub async fn run_checked(argv: &[String], timeout: Option<Duration>) -> HostResult<Output> {
    let output = run_command(argv, timeout).await?;
    if output.status.success() {
        Ok(output)
    } else {
        let program = argv.first().map(String::as_str).unwrap_or_default();
        Err(HostError::command_failed(program, describe_failure(&output)))
    }
}

fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {}", output.status, stderr)
    }
}

#[cfg(test)]
pub(crate) fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
