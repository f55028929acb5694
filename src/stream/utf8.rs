//! Incremental, strict UTF-8 decoding.

use std::collections::VecDeque;
use std::str::Utf8Error;

use futures_core::Stream;

use super::{transform, StreamError, Transform};

/// Decodes byte chunks into text, carrying incomplete code points over to
/// the next chunk.
///
/// Concatenating the emitted fragments gives exactly the decoding of the
/// concatenated input. Invalid sequences fail as soon as they are seen; an
/// incomplete sequence fails at end of input.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    tail: Vec<u8>,
    decoded: u64,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of an incomplete code point held for the next chunk.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.tail
    }

    fn invalid(&self, err: Utf8Error) -> StreamError {
        StreamError::Decode {
            offset: self.decoded + err.valid_up_to() as u64,
            reason: err.to_string(),
        }
    }
}

impl<B: AsRef<[u8]>> Transform<B> for Utf8Decoder {
    type Output = String;

    fn push(&mut self, chunk: B, out: &mut VecDeque<String>) -> Result<(), StreamError> {
        let mut bytes = std::mem::take(&mut self.tail);
        bytes.extend_from_slice(chunk.as_ref());

        // An error without `error_len` is a code point cut off by the end
        // of the buffer; everything before it is complete.
        let complete = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => return Err(self.invalid(err)),
        };

        self.tail = bytes.split_off(complete);
        if bytes.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8(bytes).map_err(|err| self.invalid(err.utf8_error()))?;
        self.decoded += text.len() as u64;
        out.push_back(text);
        Ok(())
    }

    fn finish(&mut self, _out: &mut VecDeque<String>) -> Result<(), StreamError> {
        if self.tail.is_empty() {
            return Ok(());
        }
        Err(StreamError::Decode {
            offset: self.decoded,
            reason: format!(
                "incomplete {}-byte sequence at end of stream",
                self.tail.len()
            ),
        })
    }
}

/// Decode a stream of byte chunks as UTF-8 text fragments.
pub fn decode_utf8<S, B>(chunks: S) -> impl Stream<Item = Result<String, StreamError>>
where
    S: Stream<Item = Result<B, StreamError>>,
    B: AsRef<[u8]>,
{
    transform(chunks, Utf8Decoder::new())
}
