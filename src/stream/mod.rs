//! Chunk-boundary-safe stream transformers.
//!
//! Each stage is a push-based state machine implementing [`Transform`];
//! [`transform`] drives one over an async source. Output never depends on
//! how the input happened to be split into chunks.

mod chunks;
mod error;
mod lines;
mod reframe;
mod transform;
mod utf8;

pub use chunks::*;
pub use error::*;
pub use lines::*;
pub use reframe::*;
pub use transform::*;
pub use utf8::*;
