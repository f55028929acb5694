//! Splitting text fragments into newline-delimited lines.

use std::collections::VecDeque;

use futures_core::Stream;

use super::{transform, StreamError, Transform};

/// Buffers text until a `\n` arrives and emits each complete line.
///
/// The terminator is not included and `\r` is left in place. A non-empty
/// unterminated remainder is emitted at end of input.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: AsRef<str>> Transform<T> for LineSplitter {
    type Output = String;

    fn push(&mut self, text: T, out: &mut VecDeque<String>) -> Result<(), StreamError> {
        self.buffer.push_str(text.as_ref());
        if let Some(last) = self.buffer.rfind('\n') {
            let rest = self.buffer.split_off(last + 1);
            let complete = std::mem::replace(&mut self.buffer, rest);
            out.extend(complete[..last].split('\n').map(str::to_owned));
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut VecDeque<String>) -> Result<(), StreamError> {
        if !self.buffer.is_empty() {
            out.push_back(std::mem::take(&mut self.buffer));
        }
        Ok(())
    }
}

/// Split a stream of text fragments into lines.
pub fn lines<S, T>(text: S) -> impl Stream<Item = Result<String, StreamError>>
where
    S: Stream<Item = Result<T, StreamError>>,
    T: AsRef<str>,
{
    transform(text, LineSplitter::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_and_keeps_unterminated_tail() {
        let out = LineSplitter::new().run_all(["abc\ndef\nghi"]).unwrap();
        assert_eq!(out, vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn test_lines_spanning_fragments() {
        let out = LineSplitter::new()
            .run_all(["ab", "c\nd", "ef\n", "", "g"])
            .unwrap();
        assert_eq!(out, vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let out = LineSplitter::new().run_all(["a\n\nb\n"]).unwrap();
        assert_eq!(out, vec!["a", "", "b"]);
    }

    #[test]
    fn test_carriage_return_is_not_stripped() {
        let out = LineSplitter::new().run_all(["one\r\ntwo\r\n"]).unwrap();
        assert_eq!(out, vec!["one\r", "two\r"]);
    }

    #[test]
    fn test_no_trailing_empty_line() {
        let out = LineSplitter::new().run_all(["x\n"]).unwrap();
        assert_eq!(out, vec!["x"]);
    }
}
