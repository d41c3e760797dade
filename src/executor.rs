//! Parallel task execution
//!
//! Every task runs in its own OS process. All tasks are launched before any
//! is awaited, then awaited in launch order. Concurrency is unbounded (one
//! process per generator).
//!
//! With a timeout set, each task leads its own process group so that the
//! compiler processes a worker starts die with it at the deadline.

use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{PublishError, Result};
use crate::tasks::TaskCommand;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Terminal state of one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The process exited with this status
    Exited(i32),
    /// The process was killed at its deadline
    TimedOut(Duration),
}

/// Result of one task, in launch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub description: String,
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.outcome == TaskOutcome::Exited(0)
    }
}

/// Map an exit status to a numeric code. Signal deaths become 128 + signal.
pub fn status_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or_else(|| {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            128 + status.signal().unwrap_or(0)
        }
        #[cfg(not(unix))]
        {
            -1
        }
    })
}

/// Fan-out / fan-in runner for generation tasks
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    timeout: Option<Duration>,
}

impl ParallelExecutor {
    /// Without a timeout, a hung task blocks the build indefinitely
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn run(&self, tasks: &[TaskCommand]) -> Result<Vec<TaskResult>> {
        let mut running: Vec<(&TaskCommand, Child, Instant)> = Vec::with_capacity(tasks.len());

        for task in tasks {
            let mut cmd = task.command();
            if self.timeout.is_some() {
                own_process_group(&mut cmd);
            }
            match cmd.spawn() {
                Ok(child) => {
                    debug!(task = %task.description, pid = child.id(), "task launched");
                    running.push((task, child, Instant::now()));
                }
                Err(source) => {
                    // Tasks already launched run to completion
                    warn!(task = %task.description, "launch failed, waiting for started tasks");
                    for (_, mut child, _) in running {
                        let _ = child.wait();
                    }
                    return Err(PublishError::Spawn {
                        description: task.description.clone(),
                        source,
                    });
                }
            }
        }
        info!(tasks = running.len(), "all tasks launched");

        let mut results = Vec::with_capacity(running.len());
        for (task, mut child, started) in running {
            let outcome = match self.timeout {
                None => TaskOutcome::Exited(status_code(child.wait()?)),
                Some(timeout) => wait_until(&mut child, started + timeout, timeout)?,
            };
            debug!(task = %task.description, ?outcome, "task finished");
            results.push(TaskResult {
                description: task.description.clone(),
                outcome,
            });
        }
        Ok(results)
    }
}

fn wait_until(child: &mut Child, deadline: Instant, timeout: Duration) -> Result<TaskOutcome> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(TaskOutcome::Exited(status_code(status)));
        }
        let now = Instant::now();
        if now >= deadline {
            warn!(pid = child.id(), "task deadline reached, killing");
            kill_group(child);
            // may already have exited between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            return Ok(TaskOutcome::TimedOut(timeout));
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// SIGKILL the task's process group, which the task leads
#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
        debug!(pid = child.id(), "killpg failed: {}", e);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(description: &str, script: &str) -> TaskCommand {
        TaskCommand::new(description, "sh", ["-c", script])
    }

    #[test]
    fn test_results_in_launch_order() {
        let tasks = vec![
            sh("slow", "sleep 0.3; exit 0"),
            sh("fast failure", "exit 3"),
            sh("fast", "exit 0"),
        ];
        let results = ParallelExecutor::default().run(&tasks).unwrap();

        let descriptions: Vec<_> = results.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["slow", "fast failure", "fast"]);
        assert_eq!(results[0].outcome, TaskOutcome::Exited(0));
        assert_eq!(results[1].outcome, TaskOutcome::Exited(3));
        assert!(results[2].is_success());
    }

    #[test]
    fn test_tasks_run_concurrently() {
        let tasks: Vec<_> = (0..3).map(|i| sh(&format!("t{i}"), "sleep 0.5")).collect();
        let start = Instant::now();
        let results = ParallelExecutor::default().run(&tasks).unwrap();
        assert!(results.iter().all(TaskResult::is_success));
        assert!(start.elapsed() < Duration::from_millis(1400));
    }

    #[test]
    fn test_crash_is_isolated() {
        let tasks = vec![sh("crash", "kill -9 $$"), sh("ok", "sleep 0.1; exit 0")];
        let results = ParallelExecutor::default().run(&tasks).unwrap();
        assert_eq!(results[0].outcome, TaskOutcome::Exited(128 + 9));
        assert!(results[1].is_success());
    }

    #[test]
    fn test_timeout_kills_hung_task() {
        let tasks = vec![sh("hung", "sleep 30"), sh("ok", "exit 0")];
        let executor = ParallelExecutor::new(Some(Duration::from_millis(200)));
        let start = Instant::now();
        let results = executor.run(&tasks).unwrap();

        assert_eq!(results[0].outcome, TaskOutcome::TimedOut(Duration::from_millis(200)));
        assert!(results[1].is_success());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    /// Alive and not a zombie
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => !stat.rsplit_once(") ").is_some_and(|(_, rest)| rest.starts_with('Z')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_task_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("child.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());
        let executor = ParallelExecutor::new(Some(Duration::from_millis(300)));
        let results = executor.run(&[sh("spawns child", &script)]).unwrap();
        assert_eq!(results[0].outcome, TaskOutcome::TimedOut(Duration::from_millis(300)));

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let deadline = Instant::now() + Duration::from_secs(5);
        while is_running(&pid) && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        assert!(!is_running(&pid), "descendant {pid} survived the timeout");
    }

    #[test]
    fn test_launch_failure() {
        let tasks = vec![
            sh("ok", "exit 0"),
            TaskCommand::new("missing", "/nonexistent/worker", Vec::<String>::new()),
        ];
        let result = ParallelExecutor::default().run(&tasks);
        assert!(matches!(result, Err(PublishError::Spawn { description, .. }) if description == "missing"));
    }

    #[test]
    fn test_empty_task_list() {
        assert!(ParallelExecutor::default().run(&[]).unwrap().is_empty());
    }
}
