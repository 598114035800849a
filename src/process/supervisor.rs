use crate::error::{CamnodeError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Program and argument list for an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failure(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
        }
    }
}

impl From<std::process::ExitStatus> for ProcessExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Trait for launching external processes.
///
/// This trait allows swapping implementations (real processes vs scripted).
/// `launch` must be called from within a tokio runtime.
pub trait ProcessSupervisor: Send + Sync {
    /// Start the process and return immediately.
    ///
    /// # Errors
    /// Returns `CamnodeError::Launch` if the program cannot be found or spawned.
    fn launch(&self, spec: &ProcessSpec) -> Result<ProcessHandle>;
}

/// Implement ProcessSupervisor for Arc<T> so one supervisor can be shared.
impl<T: ProcessSupervisor + ?Sized> ProcessSupervisor for Arc<T> {
    fn launch(&self, spec: &ProcessSpec) -> Result<ProcessHandle> {
        (**self).launch(spec)
    }
}

/// Handle to a running process.
///
/// Dropping the handle before the process exits asks the supervisor to stop it.
#[derive(Debug)]
pub struct ProcessHandle {
    program: String,
    pid: Option<u32>,
    terminate: Option<oneshot::Sender<()>>,
    exit: Option<oneshot::Receiver<ProcessExit>>,
}

impl ProcessHandle {
    /// Assemble a handle from the supervisor side of the two channels.
    pub fn new(
        program: impl Into<String>,
        pid: Option<u32>,
        terminate: oneshot::Sender<()>,
        exit: oneshot::Receiver<ProcessExit>,
    ) -> Self {
        Self {
            program: program.into(),
            pid,
            terminate: Some(terminate),
            exit: Some(exit),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Request termination. Fire-and-forget: the exit arrives through [`ExitWatch`].
    ///
    /// Only the first call has any effect.
    pub fn terminate(&mut self) {
        if let Some(tx) = self.terminate.take() {
            // The supervisor side is gone once the process has exited.
            tx.send(()).ok();
        }
    }

    /// Whether termination has already been requested.
    pub fn termination_requested(&self) -> bool {
        self.terminate.is_none()
    }

    /// Take the single-fire exit notification. Returns `None` after the first call.
    pub fn take_exit(&mut self) -> Option<ExitWatch> {
        self.exit.take().map(|rx| ExitWatch {
            program: self.program.clone(),
            rx,
        })
    }
}

/// Single-fire notification resolving when the process has exited.
#[derive(Debug)]
pub struct ExitWatch {
    program: String,
    rx: oneshot::Receiver<ProcessExit>,
}

impl ExitWatch {
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Wait for the exit. A supervisor that vanished counts as a failed exit.
    pub async fn wait(self) -> ProcessExit {
        match self.rx.await {
            Ok(exit) => exit,
            Err(_) => {
                tracing::warn!(program = %self.program, "supervisor dropped without reporting exit");
                ProcessExit::failure(None)
            }
        }
    }
}

/// Scripted behavior for one program under [`ScriptedSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedExit {
    /// Runs until terminated, then exits with the given outcome.
    OnTerminate { success: bool },
    /// Exits right after launch with the given outcome.
    Immediately { success: bool },
    /// `launch` fails as if the binary were missing.
    FailToLaunch,
}

/// Supervisor for tests: records launches and plays back scripted exits.
///
/// Programs without a script behave as `OnTerminate { success: true }`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSupervisor {
    scripts: Arc<Mutex<HashMap<String, ScriptedExit>>>,
    launches: Arc<Mutex<Vec<ProcessSpec>>>,
    terminations: Arc<AtomicUsize>,
}

impl ScriptedSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior of a program.
    pub fn with_script(self, program: &str, exit: ScriptedExit) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(program.to_string(), exit);
        }
        self
    }

    /// Every spec passed to `launch`, in order, including failed launches.
    pub fn launches(&self) -> Vec<ProcessSpec> {
        self.launches
            .lock()
            .map(|launches| launches.clone())
            .unwrap_or_default()
    }

    /// Number of explicit termination requests received.
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    fn script_for(&self, program: &str) -> ScriptedExit {
        self.scripts
            .lock()
            .ok()
            .and_then(|scripts| scripts.get(program).copied())
            .unwrap_or(ScriptedExit::OnTerminate { success: true })
    }
}

impl ProcessSupervisor for ScriptedSupervisor {
    fn launch(&self, spec: &ProcessSpec) -> Result<ProcessHandle> {
        if let Ok(mut launches) = self.launches.lock() {
            launches.push(spec.clone());
        }

        let script = self.script_for(&spec.program);
        if script == ScriptedExit::FailToLaunch {
            return Err(CamnodeError::Launch {
                program: spec.program.clone(),
                message: "No such file or directory (scripted)".to_string(),
            });
        }

        let (terminate_tx, terminate_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        let terminations = Arc::clone(&self.terminations);

        tokio::spawn(async move {
            let exit = match script {
                ScriptedExit::Immediately { success } => scripted_exit(success),
                ScriptedExit::OnTerminate { success } => {
                    if terminate_rx.await.is_ok() {
                        terminations.fetch_add(1, Ordering::SeqCst);
                    }
                    scripted_exit(success)
                }
                ScriptedExit::FailToLaunch => return,
            };
            exit_tx.send(exit).ok();
        });

        Ok(ProcessHandle::new(
            spec.program.clone(),
            None,
            terminate_tx,
            exit_rx,
        ))
    }
}

fn scripted_exit(success: bool) -> ProcessExit {
    if success {
        ProcessExit::success()
    } else {
        ProcessExit::failure(Some(1))
    }
}
