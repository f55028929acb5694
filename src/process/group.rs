//! Composition of processes into supervision trees.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use super::{combine_exit_codes, describe, new_pseudo_pid, BoxError, ProcSig, ProcessLike};

/// Future returned by a dispose hook.
pub type DisposeFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

type DisposeHook = Box<dyn FnOnce() -> DisposeFuture + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A process made of child processes.
///
/// Killing the group kills every child in the order they were added.
/// Waiting on the group waits for every child, then reports either the
/// code forced by [`exit`](Self::exit) or the largest-magnitude child code.
///
/// Groups are usually shared behind an `Arc` so that children (a control
/// console, for instance) can kill or exit their own group. A group is
/// itself a valid child of another group.
pub struct ProcessGroup {
    id: String,
    name: Option<String>,
    children: Mutex<Vec<Arc<dyn ProcessLike>>>,
    forced_exit: Mutex<Option<i32>>,
    cancel: CancellationToken,
    dispose: Mutex<Option<DisposeHook>>,
    disposing: tokio::sync::Mutex<Option<DisposeFuture>>,
    dispose_error: Mutex<Option<String>>,
    settled: OnceCell<i32>,
}

impl std::fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessGroup")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("children", &self.len())
            .field("forced_exit", &self.forced_exit_code())
            .field("settled", &self.settled.get())
            .finish_non_exhaustive()
    }
}

impl Default for ProcessGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessGroup {
    /// Create an empty group with a fresh pseudo-PID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: new_pseudo_pid(),
            name: None,
            children: Mutex::new(Vec::new()),
            forced_exit: Mutex::new(None),
            cancel: CancellationToken::new(),
            dispose: Mutex::new(None),
            disposing: tokio::sync::Mutex::new(None),
            dispose_error: Mutex::new(None),
            settled: OnceCell::new(),
        }
    }

    /// Create a group that starts with the given children.
    #[must_use]
    pub fn with_children(children: Vec<Arc<dyn ProcessLike>>) -> Self {
        let group = Self::new();
        *lock(&group.children) = children;
        group
    }

    /// Use an explicit identity.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set a human-readable name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register a hook that releases group-held resources.
    ///
    /// The hook runs once, after every child has settled and before
    /// [`wait`](ProcessLike::wait) returns. A failing hook does not change
    /// the group's exit code; the failure is logged and kept for
    /// [`dispose_error`](Self::dispose_error).
    #[must_use]
    pub fn on_dispose<F, Fut>(self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        *lock(&self.dispose) = Some(Box::new(move || Box::pin(hook()) as DisposeFuture));
        self
    }

    /// Append a child.
    ///
    /// Children should be added before anything relies on the group's
    /// exit code. A child added while the group is waiting is still waited
    /// for; one added after the group has settled is not.
    pub fn add_child(&self, child: Arc<dyn ProcessLike>) {
        if self.settled.initialized() {
            tracing::warn!(group = %self.id, child = %describe(&*child), "Child added to settled group");
        }
        lock(&self.children).push(child);
    }

    /// Snapshot of the current children, in the order they were added.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<dyn ProcessLike>> {
        lock(&self.children).clone()
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.children).len()
    }

    /// Whether the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Force the group's exit code and terminate every child.
    ///
    /// The forced code overrides whatever the children report.
    pub fn exit(&self, code: i32) {
        tracing::info!(group = %self.id, code, "Forcing process group exit");
        *lock(&self.forced_exit) = Some(code);
        self.kill(ProcSig::SigTerm);
    }

    /// The code set by [`exit`](Self::exit), if any.
    #[must_use]
    pub fn forced_exit_code(&self) -> Option<i32> {
        *lock(&self.forced_exit)
    }

    /// Token cancelled when the group is killed or exited.
    ///
    /// Lets the owner of group-held resources react to teardown.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The settled exit code, if `wait` has completed.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.settled.get().copied()
    }

    /// Message of the dispose hook failure, if it failed.
    #[must_use]
    pub fn dispose_error(&self) -> Option<String> {
        lock(&self.dispose_error).clone()
    }

    async fn settle(&self) -> i32 {
        let mut codes = Vec::new();
        loop {
            let pending: Vec<Arc<dyn ProcessLike>> = {
                let children = lock(&self.children);
                children[codes.len()..].to_vec()
            };
            if pending.is_empty() {
                break;
            }
            codes.extend(join_all(pending.iter().map(|child| child.wait())).await);
        }

        let forced = self.forced_exit_code();
        let code = forced.unwrap_or_else(|| combine_exit_codes(codes.iter().copied()));
        tracing::debug!(group = %self.id, ?codes, ?forced, code, "Process group children settled");

        self.run_dispose().await;
        code
    }

    /// Drive the dispose hook to completion.
    ///
    /// The running hook stays parked in `disposing` while it is awaited, so
    /// a waiter dropped mid-dispose leaves it for the next waiter to finish.
    async fn run_dispose(&self) {
        let mut running = self.disposing.lock().await;
        if running.is_none() {
            let Some(hook) = lock(&self.dispose).take() else {
                return;
            };
            *running = Some(hook());
        }
        let Some(dispose) = running.as_mut() else {
            return;
        };
        let result = dispose.as_mut().await;
        *running = None;
        if let Err(err) = result {
            tracing::error!(group = %self.id, error = %err, "Process group dispose failed");
            *lock(&self.dispose_error) = Some(err.to_string());
        }
    }
}

#[async_trait]
impl ProcessLike for ProcessGroup {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn kill(&self, sig: ProcSig) {
        if self.settled.initialized() {
            return;
        }
        tracing::info!(group = %self.id, signal = %sig, "Killing process group");
        self.cancel.cancel();
        for child in self.children() {
            tracing::info!(group = %self.id, child = %describe(&*child), signal = %sig, "Killing child process");
            child.kill(sig);
        }
    }

    async fn wait(&self) -> i32 {
        *self.settled.get_or_init(|| self.settle()).await
    }
}
