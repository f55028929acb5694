//! Linux input event records.

mod input;

pub use input::*;
