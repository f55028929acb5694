//! Synthetic identities for processes that are not OS processes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix of every pseudo-PID.
pub const PSEUDO_PID_PREFIX: &str = "pseudoproc:";

/// Monotonic source of pseudo-PIDs.
///
/// The process-wide instance behind [`new_pseudo_pid`] is initialised at
/// zero and never reset. Components that want their own numbering can hold
/// a private allocator instead.
#[derive(Debug, Default)]
pub struct PseudoPidAllocator {
    next: AtomicU64,
}

impl PseudoPidAllocator {
    /// Create an allocator whose first identity is `pseudoproc:0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Allocate the next identity.
    pub fn allocate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{PSEUDO_PID_PREFIX}{n}")
    }
}

static PSEUDO_PIDS: PseudoPidAllocator = PseudoPidAllocator::new();

/// Allocate a fresh identity from the process-wide counter.
pub fn new_pseudo_pid() -> String {
    PSEUDO_PIDS.allocate()
}
