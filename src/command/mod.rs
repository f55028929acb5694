//! Command-line syntax for control streams.
//!
//! Two grammars are supported: the token grammar ([`Tokenizer`] followed by
//! [`CommandAssembler`]), which is safe under any chunking of its input,
//! and the older line-oriented [`SimpleCommandParser`].

mod assembler;
mod simple;
mod token;
mod tokenizer;

pub use assembler::*;
pub use simple::*;
pub use token::*;
pub use tokenizer::*;
