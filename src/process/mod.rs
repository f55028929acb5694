//! Cancellable, waitable units of work and their composition into groups.
//!
//! Everything that runs under supervision implements [`ProcessLike`]:
//! in-process tasks ([`TaskProcess`]), OS child processes ([`OsProcess`]),
//! processes that do not exist yet ([`DeferredProcess`]) and groups of all
//! of these ([`ProcessGroup`]). Failures never escape as errors; every
//! process settles with an integer exit code.

mod cancel;
mod deferred;
mod exit;
mod group;
mod os;
mod pid;
mod process_like;
mod signal;
mod slot;
mod task;

pub use cancel::*;
pub use deferred::*;
pub use exit::*;
pub use group::*;
pub use os::*;
pub use pid::*;
pub use process_like::*;
pub use signal::*;
pub use task::*;
