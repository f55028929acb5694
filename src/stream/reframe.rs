//! Re-chunking arbitrary byte chunks into fixed-size records.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use futures_core::Stream;

use super::{transform, StreamError, Transform};

/// Accumulates bytes and emits them as records of exactly `size` bytes.
///
/// A partial record left over at end of input is discarded, never emitted.
#[derive(Debug)]
pub struct Reframer {
    size: NonZeroUsize,
    buffer: Vec<u8>,
}

impl Reframer {
    /// Create a reframer producing `size`-byte records.
    #[must_use]
    pub fn new(size: NonZeroUsize) -> Self {
        Self {
            size,
            buffer: Vec::with_capacity(size.get()),
        }
    }

    /// Record size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Bytes held towards the next record.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<B: AsRef<[u8]>> Transform<B> for Reframer {
    type Output = Vec<u8>;

    fn push(&mut self, chunk: B, out: &mut VecDeque<Vec<u8>>) -> Result<(), StreamError> {
        let size = self.size.get();
        let mut bytes = chunk.as_ref();
        while !bytes.is_empty() {
            let take = (size - self.buffer.len()).min(bytes.len());
            self.buffer.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.buffer.len() == size {
                out.push_back(std::mem::replace(&mut self.buffer, Vec::with_capacity(size)));
            }
        }
        Ok(())
    }

    fn finish(&mut self, _out: &mut VecDeque<Vec<u8>>) -> Result<(), StreamError> {
        if !self.buffer.is_empty() {
            tracing::debug!(
                discarded = self.buffer.len(),
                record_size = self.size.get(),
                "Dropping partial trailing record"
            );
            self.buffer.clear();
        }
        Ok(())
    }
}

/// Re-chunk `chunks` into `size`-byte records.
pub fn records<S, B>(size: NonZeroUsize, chunks: S) -> impl Stream<Item = Result<Vec<u8>, StreamError>>
where
    S: Stream<Item = Result<B, StreamError>>,
    B: AsRef<[u8]>,
{
    transform(chunks, Reframer::new(size))
}
