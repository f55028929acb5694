//! Adapter turning a cancellable async operation into a [`ProcessLike`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use super::slot::ExitSlot;
use super::{new_pseudo_pid, BoxError, ProcSig, ProcessLike, EXIT_FAILURE};

/// Converts an operation failure into an exit code.
pub type ErrorHandler = Arc<dyn Fn(BoxError) -> i32 + Send + Sync>;

/// Error reported to the handler when an operation panics.
#[derive(thiserror::Error, Debug)]
#[error("Operation panicked: {0}")]
pub struct OperationPanicked(pub String);

impl OperationPanicked {
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self(message)
    }
}

/// Options for [`TaskProcess`].
#[derive(Default)]
pub struct TaskProcessBuilder {
    id: Option<String>,
    name: Option<String>,
    on_error: Option<ErrorHandler>,
}

impl TaskProcessBuilder {
    /// Use an explicit identity instead of a fresh pseudo-PID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a human-readable name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the default error handler (log, then exit code 1).
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(BoxError) -> i32 + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Start the operation immediately and return its handle.
    ///
    /// The operation receives a cancellation token that is triggered by
    /// [`ProcessLike::kill`]. It must observe the token itself; nothing is
    /// forcibly aborted.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F, Fut>(self, op: F) -> TaskProcess
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<i32, BoxError>> + Send + 'static,
    {
        let id = self.id.unwrap_or_else(new_pseudo_pid);
        let name = self.name;
        let on_error = self
            .on_error
            .unwrap_or_else(|| default_error_handler(&id, name.as_deref()));

        let cancel = CancellationToken::new();
        let exit = Arc::new(ExitSlot::new());
        let running = op(cancel.clone());

        let slot = Arc::clone(&exit);
        let task_id = id.clone();
        tokio::spawn(async move {
            let code = match AssertUnwindSafe(running).catch_unwind().await {
                Ok(Ok(code)) => code,
                Ok(Err(err)) => on_error(err),
                Err(payload) => on_error(Box::new(OperationPanicked::from_payload(&*payload))),
            };
            tracing::debug!(id = %task_id, code, "Task settled");
            slot.settle(code);
        });

        TaskProcess {
            id,
            name,
            cancel,
            exit,
        }
    }
}

fn default_error_handler(id: &str, name: Option<&str>) -> ErrorHandler {
    let label = match name {
        Some(name) => format!("{id} ({name})"),
        None => id.to_string(),
    };
    Arc::new(move |err| {
        tracing::error!(process = %label, error = %err, "Operation failed");
        EXIT_FAILURE
    })
}

/// An in-process async operation running under supervision.
#[derive(Debug)]
pub struct TaskProcess {
    id: String,
    name: Option<String>,
    cancel: CancellationToken,
    exit: Arc<ExitSlot>,
}

impl TaskProcess {
    /// Start configuring a task.
    #[must_use]
    pub fn builder() -> TaskProcessBuilder {
        TaskProcessBuilder::default()
    }

    /// Start an operation with default options.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F, Fut>(op: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<i32, BoxError>> + Send + 'static,
    {
        Self::builder().spawn(op)
    }

    /// The exit code, if the task has settled.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit.code()
    }

    /// Whether `kill` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[async_trait]
impl ProcessLike for TaskProcess {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn kill(&self, sig: ProcSig) {
        if self.exit.is_settled() || self.cancel.is_cancelled() {
            return;
        }
        tracing::debug!(id = %self.id, signal = %sig, "Cancelling task");
        self.cancel.cancel();
    }

    async fn wait(&self) -> i32 {
        self.exit.wait().await
    }
}
