//! Line-oriented command syntax.
//!
//! Each line is one command. Arguments are barewords (`[A-Za-z0-9+]+`) or
//! double-quoted strings, separated by whitespace. A line that is blank or
//! starts with `#` followed by whitespace or `!` is skipped, and a comment
//! of the same form ends a line early.

use std::collections::VecDeque;

use futures_core::Stream;
use regex::Regex;

use crate::stream::{transform, StreamError, Transform};

const COMMENT_PATTERN: &str = r"^(#(?:[!\s]+.*)?)?\s*$";
const WHITESPACE_PATTERN: &str = r"^\s+";
const BAREWORD_PATTERN: &str = r"^[A-Za-z0-9+]+";
const QUOTED_PATTERN: &str = r#"^"((?:[^"\\]|\\[\\"tfrn])*)""#;

/// Parser for the line-oriented command syntax.
#[derive(Debug, Clone)]
pub struct SimpleCommandParser {
    comment: Regex,
    whitespace: Regex,
    bareword: Regex,
    quoted: Regex,
}

impl SimpleCommandParser {
    /// Compile the parser's patterns.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Pattern` if a pattern fails to compile.
    pub fn new() -> Result<Self, StreamError> {
        Ok(Self {
            comment: Regex::new(COMMENT_PATTERN)?,
            whitespace: Regex::new(WHITESPACE_PATTERN)?,
            bareword: Regex::new(BAREWORD_PATTERN)?,
            quoted: Regex::new(QUOTED_PATTERN)?,
        })
    }

    /// Parse one line into its arguments.
    ///
    /// Returns `Ok(None)` for blank and comment-only lines.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Syntax` for unrecognized arguments or for two
    /// arguments with no whitespace between them.
    pub fn parse_line(&self, line: &str) -> Result<Option<Vec<String>>, StreamError> {
        let mut rest = line;
        let mut args = Vec::new();
        let mut require_whitespace = false;

        while !self.comment.is_match(rest) {
            if let Some(m) = self.whitespace.find(rest) {
                rest = &rest[m.end()..];
                if self.comment.is_match(rest) {
                    break;
                }
            } else if require_whitespace {
                return Err(StreamError::syntax(rest, "whitespace required between arguments"));
            }

            if let Some(m) = self.bareword.find(rest) {
                args.push(m.as_str().to_string());
                rest = &rest[m.end()..];
            } else if let Some(caps) = self.quoted.captures(rest) {
                let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                    return Err(StreamError::syntax(rest, "unterminated quoted string"));
                };
                args.push(unescape(body.as_str())?);
                rest = &rest[whole.end()..];
            } else {
                return Err(StreamError::syntax(rest, "unrecognized argument syntax"));
            }
            require_whitespace = true;
        }

        Ok((!args.is_empty()).then_some(args))
    }
}

fn unescape(body: &str) -> Result<String, StreamError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('f') => out.push('\u{c}'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            _ => return Err(StreamError::syntax(body, "unrecognized escape sequence")),
        }
    }
    Ok(out)
}

impl<T: AsRef<str>> Transform<T> for SimpleCommandParser {
    type Output = Vec<String>;

    fn push(&mut self, line: T, out: &mut VecDeque<Vec<String>>) -> Result<(), StreamError> {
        if let Some(args) = self.parse_line(line.as_ref())? {
            out.push_back(args);
        }
        Ok(())
    }

    fn finish(&mut self, _out: &mut VecDeque<Vec<String>>) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Parse a stream of lines as simple commands.
pub fn simple_commands<S, T>(
    parser: SimpleCommandParser,
    lines: S,
) -> impl Stream<Item = Result<Vec<String>, StreamError>>
where
    S: Stream<Item = Result<T, StreamError>>,
    T: AsRef<str>,
{
    transform(lines, parser)
}
