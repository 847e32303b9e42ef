use thiserror::Error;

use super::InvocationOutput;

/// Why a job invocation did not succeed. Always contained at the job level.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The tool could not be started (not found, permission denied, ...).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited with a code outside the success range.
    #[error("exited with code {code}")]
    ExitStatus { code: i32, output: InvocationOutput },

    /// The tool was terminated without an exit code (e.g. by a signal).
    #[error("terminated without exit code")]
    Terminated { output: InvocationOutput },

    /// Waiting for the tool failed.
    #[error("wait for tool: {0}")]
    Wait(#[source] std::io::Error),

    /// The invocation stopped because its cancel token was set.
    #[error("canceled")]
    Canceled,

    /// The job task ended abnormally (panic or abort).
    #[error("job task failed: {0}")]
    Join(String),
}

impl InvocationError {
    /// Captured tool output, when the tool ran at all.
    pub fn output(&self) -> Option<&InvocationOutput> {
        match self {
            InvocationError::ExitStatus { output, .. } | InvocationError::Terminated { output } => {
                Some(output)
            }
            _ => None,
        }
    }
}
