//! Runs the external mirroring tool as a subprocess.

use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::config::ToolConfig;
use crate::control::CancelToken;
use crate::job::{JobDescriptor, ToolCommand};

/// How long to keep reading output after a canceled tool exited. Grandchildren
/// can hold the pipes open indefinitely.
const CANCELED_OUTPUT_WAIT: Duration = Duration::from_secs(1);

use super::{InvocationError, InvocationOutput, JobRunner};

/// [`JobRunner`] that spawns `job.command` and classifies its exit code.
///
/// The child is killed when its task is dropped, so aborting the job task
/// after the cancel grace period force-terminates the tool.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    max_success_code: i32,
}

impl ProcessRunner {
    /// Exit codes `0..=max_success_code` count as success.
    pub fn new(max_success_code: i32) -> Self {
        Self {
            max_success_code: max_success_code.max(0),
        }
    }

    pub fn from_config(tool: &ToolConfig) -> Self {
        Self::new(tool.max_success_code)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(0)
    }
}

impl JobRunner for ProcessRunner {
    fn invoke(
        &self,
        job: Arc<JobDescriptor>,
        cancel: CancelToken,
    ) -> impl Future<Output = Result<InvocationOutput, InvocationError>> + Send + 'static {
        let max_success_code = self.max_success_code;
        async move {
            tracing::debug!(job_id = job.id, command = %job.command, "spawning tool");
            run_command(&job.command, max_success_code, cancel).await
        }
    }
}

async fn run_command(
    command: &ToolCommand,
    max_success_code: i32,
    cancel: CancelToken,
) -> Result<InvocationOutput, InvocationError> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| InvocationError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    let stdout = tokio::spawn(read_to_string(child.stdout.take()));
    let stderr = tokio::spawn(read_to_string(child.stderr.take()));

    let status = tokio::select! {
        status = child.wait() => status,
        _ = cancel.cancelled() => {
            request_terminate(&mut child);
            child.wait().await
        }
    }
    .map_err(InvocationError::Wait)?;

    if cancel.is_canceled() {
        for mut reader in [stdout, stderr] {
            if tokio::time::timeout(CANCELED_OUTPUT_WAIT, &mut reader).await.is_err() {
                tracing::debug!("tool output still open after cancel, dropping it");
                reader.abort();
            }
        }
        return Err(InvocationError::Canceled);
    }

    let output = InvocationOutput {
        exit_code: status.code(),
        stdout: stdout.await.unwrap_or_default(),
        stderr: stderr.await.unwrap_or_default(),
    };
    match status.code() {
        Some(code) if (0..=max_success_code).contains(&code) => Ok(output),
        Some(code) => Err(InvocationError::ExitStatus { code, output }),
        None => Err(InvocationError::Terminated { output }),
    }
}

async fn read_to_string<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(e) = stream.read_to_end(&mut buf).await {
            tracing::debug!("reading tool output: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Ask the tool to exit. Unix gets SIGTERM so it can clean up; elsewhere the
/// process is killed right away.
#[cfg(unix)]
fn request_terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: pid is our own child and has not been reaped (id() returned Some).
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        tracing::warn!(pid, "SIGTERM failed: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn request_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::warn!("kill tool process: {}", e);
    }
}
