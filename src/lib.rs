//! Balance bridge - supervised input event readers driven by a control console.
//!
//! The core is a small process-supervision layer ([`process`]) and a set of
//! chunk-boundary-safe stream stages ([`stream`], [`command`], [`event`]).
//! [`console`] ties them together: commands read from a byte stream act on
//! a [`process::ProcessGroup`].

pub mod command;
pub mod config;
pub mod console;
pub mod event;
pub mod process;
pub mod stream;
