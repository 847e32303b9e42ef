//! Job invocation seam between the scheduler and the external tool.

mod error;
mod process;

use std::future::Future;
use std::sync::Arc;

use crate::control::CancelToken;
use crate::job::JobDescriptor;

pub use error::InvocationError;
pub use process::ProcessRunner;

/// Captured output of one tool invocation. Logged verbatim, never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs one job to completion.
///
/// The returned future is spawned onto the runtime by the scheduler; it must
/// own everything it needs. It should return promptly with
/// [`InvocationError::Canceled`] once `cancel` is set.
pub trait JobRunner: Send + Sync + 'static {
    fn invoke(
        &self,
        job: Arc<JobDescriptor>,
        cancel: CancelToken,
    ) -> impl Future<Output = Result<InvocationOutput, InvocationError>> + Send + 'static;
}
