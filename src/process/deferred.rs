//! A process that becomes available later.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::slot::ExitSlot;
use super::{describe, new_pseudo_pid, BoxError, ProcSig, ProcessLike, EXIT_FAILURE};

enum Inner {
    Pending(Vec<ProcSig>),
    Ready(Arc<dyn ProcessLike>),
    Failed,
}

/// Options for [`DeferredProcess`].
#[derive(Debug, Default)]
pub struct DeferredProcessBuilder {
    name: Option<String>,
}

impl DeferredProcessBuilder {
    /// Set a human-readable name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Start driving `setup`; the handle settles when the produced process
    /// does. A setup failure is logged and settles with exit code 1.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<Fut>(self, setup: Fut) -> DeferredProcess
    where
        Fut: Future<Output = Result<Arc<dyn ProcessLike>, BoxError>> + Send + 'static,
    {
        let id = new_pseudo_pid();
        let inner = Arc::new(Mutex::new(Inner::Pending(Vec::new())));
        let exit = Arc::new(ExitSlot::new());

        let state = Arc::clone(&inner);
        let slot = Arc::clone(&exit);
        let task_id = id.clone();
        tokio::spawn(async move {
            let process = match setup.await {
                Ok(process) => process,
                Err(err) => {
                    tracing::error!(id = %task_id, error = %err, "Deferred process failed to start");
                    *state.lock().unwrap_or_else(PoisonError::into_inner) = Inner::Failed;
                    slot.settle(EXIT_FAILURE);
                    return;
                }
            };

            let queued = {
                let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                match std::mem::replace(&mut *guard, Inner::Ready(Arc::clone(&process))) {
                    Inner::Pending(queued) => queued,
                    Inner::Ready(_) | Inner::Failed => Vec::new(),
                }
            };
            tracing::debug!(id = %task_id, inner = %describe(&*process), queued = queued.len(), "Deferred process ready");
            for sig in queued {
                process.kill(sig);
            }
            slot.settle(process.wait().await);
        });

        DeferredProcess {
            id,
            name: self.name,
            inner,
            exit,
        }
    }
}

/// Treats "a future that produces a process" as one process.
///
/// Useful when a process needs asynchronous setup (connecting to a bus,
/// acquiring a lock) before it exists. Signals sent before the inner
/// process is ready are queued and delivered once it is.
pub struct DeferredProcess {
    id: String,
    name: Option<String>,
    inner: Arc<Mutex<Inner>>,
    exit: Arc<ExitSlot>,
}

impl DeferredProcess {
    /// Start configuring a deferred process.
    #[must_use]
    pub fn builder() -> DeferredProcessBuilder {
        DeferredProcessBuilder::default()
    }

    /// Start driving `setup` with default options.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<Fut>(setup: Fut) -> Self
    where
        Fut: Future<Output = Result<Arc<dyn ProcessLike>, BoxError>> + Send + 'static,
    {
        Self::builder().spawn(setup)
    }

    /// Whether the inner process has been produced.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(
            *self.inner.lock().unwrap_or_else(PoisonError::into_inner),
            Inner::Ready(_)
        )
    }
}

#[async_trait]
impl ProcessLike for DeferredProcess {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn kill(&self, sig: ProcSig) {
        if self.exit.is_settled() {
            return;
        }
        let ready = {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *guard {
                Inner::Pending(queued) => {
                    queued.push(sig);
                    None
                }
                Inner::Ready(process) => Some(Arc::clone(process)),
                Inner::Failed => None,
            }
        };
        if let Some(process) = ready {
            process.kill(sig);
        }
    }

    async fn wait(&self) -> i32 {
        self.exit.wait().await
    }
}
