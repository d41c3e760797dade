//! Build verdict from task results

use tracing::{error, info};

use crate::error::{PublishError, Result};
use crate::executor::{TaskOutcome, TaskResult};

/// A successful build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStatus {
    pub tasks: usize,
}

/// Succeed iff every task exited 0.
///
/// The first failing result (in launch order) fails the build with that
/// task's status. Outputs already written by other tasks are left on disk.
pub fn aggregate(results: &[TaskResult]) -> Result<BuildStatus> {
    for result in results {
        match result.outcome {
            TaskOutcome::Exited(0) => {}
            TaskOutcome::Exited(code) => {
                error!(task = %result.description, code, "generation task failed");
                return Err(PublishError::TaskFailed {
                    description: result.description.clone(),
                    code,
                });
            }
            TaskOutcome::TimedOut(timeout) => {
                error!(task = %result.description, ?timeout, "generation task timed out");
                return Err(PublishError::TaskTimedOut {
                    description: result.description.clone(),
                    timeout,
                });
            }
        }
    }

    info!(tasks = results.len(), "all generation tasks succeeded");
    Ok(BuildStatus { tasks: results.len() })
}
