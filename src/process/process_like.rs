//! The uniform handle shared by every supervised unit of work.

use async_trait::async_trait;

use super::ProcSig;

/// Opaque process identity. OS processes use their pid, everything else a
/// pseudo-PID.
pub type ProcessId = String;

/// Boxed error returned by wrapped operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A cancellable unit of work that settles exactly once with an exit code.
///
/// Implementations must make `kill` idempotent and non-blocking; once the
/// process has settled it is a no-op. `wait` may be called any number of
/// times, from any number of tasks, and always yields the same code.
#[async_trait]
pub trait ProcessLike: Send + Sync {
    /// Identity of this process.
    fn id(&self) -> &str;

    /// Human-readable name, if any. Not unique.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Request termination.
    fn kill(&self, sig: ProcSig);

    /// Wait for the process to settle and return its exit code.
    async fn wait(&self) -> i32;
}

/// Format a process as `id` or `id (name)` for log messages.
pub fn describe(process: &dyn ProcessLike) -> String {
    match process.name() {
        Some(name) => format!("{} ({name})", process.id()),
        None => process.id().to_string(),
    }
}
