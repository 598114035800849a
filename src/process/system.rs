//! Production supervisor backed by `tokio::process`.

use crate::error::{CamnodeError, Result};
use crate::process::supervisor::{ProcessExit, ProcessHandle, ProcessSpec, ProcessSupervisor};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

/// Launches real processes and escalates SIGTERM to SIGKILL after a grace period.
#[derive(Debug, Clone)]
pub struct SystemProcessSupervisor {
    stop_grace: Duration,
}

impl SystemProcessSupervisor {
    pub fn new(stop_grace: Duration) -> Self {
        Self { stop_grace }
    }
}

impl ProcessSupervisor for SystemProcessSupervisor {
    fn launch(&self, spec: &ProcessSpec) -> Result<ProcessHandle> {
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CamnodeError::Launch {
                program: spec.program.clone(),
                message: e.to_string(),
            })?;

        let pid = child.id();
        let (terminate_tx, terminate_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        tracing::debug!(program = %spec.program, ?pid, args = ?spec.args, "process launched");

        tokio::spawn(supervise(
            child,
            spec.program.clone(),
            self.stop_grace,
            terminate_rx,
            exit_tx,
        ));

        Ok(ProcessHandle::new(
            spec.program.clone(),
            pid,
            terminate_tx,
            exit_rx,
        ))
    }
}

/// Wait for the child, honoring at most one termination request.
///
/// A dropped handle counts as a termination request.
async fn supervise(
    mut child: Child,
    program: String,
    stop_grace: Duration,
    terminate_rx: oneshot::Receiver<()>,
    exit_tx: oneshot::Sender<ProcessExit>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = terminate_rx => {
            request_stop(&mut child, &program);
            match tokio::time::timeout(stop_grace, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    tracing::warn!(
                        program = %program,
                        grace_ms = stop_grace.as_millis() as u64,
                        "process ignored SIGTERM, killing"
                    );
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(program = %program, "failed to kill process: {}", e);
                    }
                    child.wait().await
                }
            }
        }
    };

    let exit = match status {
        Ok(status) => ProcessExit::from(status),
        Err(e) => {
            tracing::warn!(program = %program, "failed to wait for process: {}", e);
            ProcessExit::failure(None)
        }
    };

    tracing::debug!(program = %program, success = exit.success, code = ?exit.code, "process exited");

    if exit_tx.send(exit).is_err() {
        tracing::debug!(program = %program, "exit not observed, handle already dropped");
    }
}

/// Ask the child to stop so it can flush its output.
#[cfg(unix)]
fn request_stop(child: &mut Child, program: &str) {
    let Some(pid) = child.id() else {
        return;
    };
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: already gone, the pending wait() will report it.
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(program = %program, pid, "SIGTERM failed: {}", err);
        }
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child, program: &str) {
    if let Err(e) = child.start_kill() {
        tracing::warn!(program = %program, "failed to kill process: {}", e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn supervisor() -> SystemProcessSupervisor {
        SystemProcessSupervisor::new(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let result = supervisor().launch(&ProcessSpec::new(
            "camnode-definitely-not-a-binary",
            Vec::<String>::new(),
        ));

        match result {
            Err(CamnodeError::Launch { program, .. }) => {
                assert_eq!(program, "camnode-definitely-not-a-binary")
            }
            other => panic!("Expected Launch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_natural_exit_reports_code() {
        let mut handle = supervisor()
            .launch(&ProcessSpec::new("sh", ["-c", "exit 3"]))
            .unwrap();
        assert!(handle.pid().is_some());

        let exit = handle.take_exit().unwrap().wait().await;
        assert!(!exit.success);
        assert_eq!(exit.code, Some(3));
    }

    #[tokio::test]
    async fn test_successful_exit() {
        let mut handle = supervisor()
            .launch(&ProcessSpec::new("true", Vec::<String>::new()))
            .unwrap();

        let exit = handle.take_exit().unwrap().wait().await;
        assert_eq!(exit, ProcessExit::success());
    }

    #[tokio::test]
    async fn test_terminate_stops_long_running_process() {
        let mut handle = supervisor()
            .launch(&ProcessSpec::new("sleep", ["30"]))
            .unwrap();
        let watch = handle.take_exit().unwrap();

        handle.terminate();
        let exit = tokio::time::timeout(Duration::from_secs(5), watch.wait())
            .await
            .expect("process should exit after SIGTERM");

        assert!(!exit.success);
        assert_eq!(exit.code, None, "signal exit has no code");
    }

    #[tokio::test]
    async fn test_sigterm_ignored_escalates_to_kill() {
        let mut handle = supervisor()
            .launch(&ProcessSpec::new("sh", ["-c", "trap '' TERM; sleep 30"]))
            .unwrap();
        let watch = handle.take_exit().unwrap();

        // Give the shell time to install the trap.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.terminate();

        let exit = tokio::time::timeout(Duration::from_secs(5), watch.wait())
            .await
            .expect("process should be killed after the grace period");
        assert!(!exit.success);
    }
}
