//! OS child processes as [`ProcessLike`]s.
//!
//! This is a thin pass-through: the child is owned by a supervising task
//! that forwards signals and records the exit status.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::slot::ExitSlot;
use super::{new_pseudo_pid, ProcSig, ProcessLike, EXIT_FAILURE};

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary was not found.
    #[error("Program not found: {0}")]
    NotFound(String),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Future run once after the child exits and before `wait` settles.
pub type CleanupFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Options for [`OsProcess`].
#[derive(Default)]
pub struct OsProcessBuilder {
    name: Option<String>,
    cleanup: Option<CleanupFuture>,
}

impl OsProcessBuilder {
    /// Set a human-readable name (default: `OS process <pid>`).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run `cleanup` after the child exits, for example to finish piping
    /// its output.
    #[must_use]
    pub fn cleanup(mut self, cleanup: impl Future<Output = ()> + Send + 'static) -> Self {
        self.cleanup = Some(Box::pin(cleanup));
        self
    }

    /// Spawn `command` and supervise the child.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self, command: &mut Command) -> Result<OsProcess, SpawnError> {
        let program = command.as_std().get_program().to_string_lossy().into_owned();
        let child = command
            .spawn()
            .map_err(|err| SpawnError::from_io(&program, err))?;
        Ok(self.attach(child))
    }

    /// Supervise an already spawned child.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn attach(self, child: Child) -> OsProcess {
        let id = child
            .id()
            .map_or_else(new_pseudo_pid, |pid| pid.to_string());
        let name = self
            .name
            .unwrap_or_else(|| format!("OS process {id}"));
        let exit = Arc::new(ExitSlot::new());
        let (kill_tx, kill_rx) = mpsc::unbounded_channel();

        tokio::spawn(supervise(
            child,
            kill_rx,
            self.cleanup,
            Arc::clone(&exit),
            id.clone(),
        ));

        OsProcess {
            id,
            name,
            kill_tx,
            exit,
        }
    }
}

/// A spawned OS process.
#[derive(Debug)]
pub struct OsProcess {
    id: String,
    name: String,
    kill_tx: mpsc::UnboundedSender<ProcSig>,
    exit: Arc<ExitSlot>,
}

impl OsProcess {
    /// Start configuring an OS process.
    #[must_use]
    pub fn builder() -> OsProcessBuilder {
        OsProcessBuilder::default()
    }

    /// Spawn `command` with default options.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn spawn(command: &mut Command) -> Result<Self, SpawnError> {
        Self::builder().spawn(command)
    }

    /// The exit code, if the process has exited and cleanup has run.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit.code()
    }
}

#[async_trait]
impl ProcessLike for OsProcess {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn kill(&self, sig: ProcSig) {
        if self.exit.is_settled() {
            return;
        }
        if self.kill_tx.send(sig).is_err() {
            tracing::debug!(pid = %self.id, signal = %sig, "Process already reaped, signal dropped");
        }
    }

    async fn wait(&self) -> i32 {
        self.exit.wait().await
    }
}

async fn supervise(
    mut child: Child,
    mut kill_rx: mpsc::UnboundedReceiver<ProcSig>,
    cleanup: Option<CleanupFuture>,
    exit: Arc<ExitSlot>,
    id: String,
) {
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(sig) = kill_rx.recv() => deliver(&mut child, sig),
        }
    };

    let code = match status {
        Ok(status) => exit_code(status),
        Err(err) => {
            tracing::error!(pid = %id, error = %err, "Failed to wait for process");
            EXIT_FAILURE
        }
    };
    tracing::debug!(pid = %id, code, "Process exited");

    if let Some(cleanup) = cleanup {
        cleanup.await;
    }
    exit.settle(code);
}

#[cfg(unix)]
fn deliver(child: &mut Child, sig: ProcSig) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let Ok(signal) = sig.as_str().parse::<Signal>() else {
        tracing::warn!(pid, signal = %sig, "Signal unsupported on this platform, killing instead");
        if let Err(err) = child.start_kill() {
            tracing::warn!(pid, error = %err, "Failed to kill process");
        }
        return;
    };
    let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
    tracing::debug!(pid, signal = %sig, "Signalling process");
    if let Err(err) = kill(nix_pid, signal) {
        tracing::warn!(pid, signal = %sig, error = %err, "Failed to signal process");
    }
}

#[cfg(not(unix))]
fn deliver(child: &mut Child, sig: ProcSig) {
    tracing::debug!(signal = %sig, "Killing process");
    if let Err(err) = child.start_kill() {
        tracing::warn!(error = %err, "Failed to kill process");
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(EXIT_FAILURE)
}
