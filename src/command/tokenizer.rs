//! Chunk-boundary-safe command tokenizer.
//!
//! Grammar, tried at each position (the alternatives are distinguished by
//! their first character):
//!
//! - newline: `\n`
//! - whitespace: one or more of space, tab, carriage return
//! - bareword: one or more ASCII letters, digits or `_`
//! - quoted string: `"` ... `"` with escapes `\" \\ \/ \b \f \n \r \t \uXXXX`
//! - comment: `#`, one whitespace character, then the rest of the line
//!
//! Quoted strings and newlines end at a delimiter of their own and are
//! emitted as soon as they match. Whitespace, barewords and comments end
//! only where something else begins, so a match that runs to the end of the
//! buffered text is held until more text (or end of input) arrives.

use std::collections::VecDeque;

use futures_core::Stream;

use super::Token;
use crate::stream::{transform, StreamError, Transform};

enum Scan {
    Token {
        token: Token,
        len: usize,
        self_delimiting: bool,
    },
    /// Could still match once more input arrives.
    Incomplete,
    /// Can never match, whatever follows.
    Invalid(&'static str),
}

enum Hex {
    Unit(u32),
    Incomplete,
    Invalid,
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

fn run_len(input: &str, pred: fn(char) -> bool) -> usize {
    input.find(|c: char| !pred(c)).unwrap_or(input.len())
}

fn scan(input: &str) -> Scan {
    let Some(first) = input.chars().next() else {
        return Scan::Incomplete;
    };
    match first {
        '\n' => Scan::Token {
            token: Token::Newline,
            len: 1,
            self_delimiting: true,
        },
        c if is_space(c) => Scan::Token {
            token: Token::Whitespace,
            len: run_len(input, is_space),
            self_delimiting: false,
        },
        c if is_word(c) => {
            let len = run_len(input, is_word);
            Scan::Token {
                token: Token::Bareword(input[..len].to_string()),
                len,
                self_delimiting: false,
            }
        }
        '"' => scan_quoted(input),
        '#' => scan_comment(input),
        _ => Scan::Invalid("unexpected character"),
    }
}

fn scan_comment(input: &str) -> Scan {
    match input[1..].chars().next() {
        None => Scan::Incomplete,
        Some(c) if is_space(c) => {
            let body = 1 + c.len_utf8();
            let end = input[body..]
                .find('\n')
                .map_or(input.len(), |offset| body + offset);
            Scan::Token {
                token: Token::Comment(input[body..end].to_string()),
                len: end,
                self_delimiting: false,
            }
        }
        Some(_) => Scan::Invalid("'#' must be followed by whitespace to start a comment"),
    }
}

fn scan_quoted(input: &str) -> Scan {
    let mut value = String::new();
    let mut high = None;
    let mut chars = input.char_indices().skip(1);
    loop {
        let Some((at, c)) = chars.next() else {
            return Scan::Incomplete;
        };
        match c {
            '"' => {
                flush_surrogate(&mut value, &mut high);
                return Scan::Token {
                    token: Token::QuotedString(value),
                    len: at + 1,
                    self_delimiting: true,
                };
            }
            '\\' => {
                let Some((_, escape)) = chars.next() else {
                    return Scan::Incomplete;
                };
                let decoded = match escape {
                    '"' => '"',
                    '\\' => '\\',
                    '/' => '/',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'u' => {
                        match hex4(&mut chars) {
                            Hex::Unit(unit) => push_unit(&mut value, &mut high, unit),
                            Hex::Incomplete => return Scan::Incomplete,
                            Hex::Invalid => return Scan::Invalid("malformed \\u escape"),
                        }
                        continue;
                    }
                    _ => return Scan::Invalid("unknown escape sequence"),
                };
                flush_surrogate(&mut value, &mut high);
                value.push(decoded);
            }
            c => {
                flush_surrogate(&mut value, &mut high);
                value.push(c);
            }
        }
    }
}

fn hex4(chars: &mut impl Iterator<Item = (usize, char)>) -> Hex {
    let mut unit = 0;
    for _ in 0..4 {
        let Some((_, c)) = chars.next() else {
            return Hex::Incomplete;
        };
        let Some(digit) = c.to_digit(16) else {
            return Hex::Invalid;
        };
        unit = unit * 16 + digit;
    }
    Hex::Unit(unit)
}

/// Append a UTF-16 code unit, pairing surrogates written as two escapes.
fn push_unit(value: &mut String, high: &mut Option<u32>, unit: u32) {
    match unit {
        0xD800..=0xDBFF => {
            flush_surrogate(value, high);
            *high = Some(unit);
        }
        0xDC00..=0xDFFF => {
            let paired = high
                .take()
                .and_then(|h| char::from_u32(0x10000 + ((h - 0xD800) << 10) + (unit - 0xDC00)));
            value.push(paired.unwrap_or(char::REPLACEMENT_CHARACTER));
        }
        _ => {
            flush_surrogate(value, high);
            value.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }
}

fn flush_surrogate(value: &mut String, high: &mut Option<u32>) {
    if high.take().is_some() {
        value.push(char::REPLACEMENT_CHARACTER);
    }
}

/// The match held at the end of the buffer, tracked so that further text
/// extending it is not rescanned from its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    Whitespace,
    Bareword,
    Comment,
    Quoted(Escape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Backslash,
    /// Hex digits still expected by a `\u` escape.
    Hex(u8),
}

impl Hold {
    /// State after `text` is appended, or `None` once the match ends or
    /// becomes invalid and the buffer has to be scanned again.
    fn advance(self, text: &str) -> Option<Self> {
        match self {
            Self::Whitespace => text.chars().all(is_space).then_some(self),
            Self::Bareword => text.chars().all(is_word).then_some(self),
            Self::Comment => (!text.contains('\n')).then_some(self),
            Self::Quoted(mut escape) => {
                for c in text.chars() {
                    escape = match (escape, c) {
                        (Escape::None, '"') => return None,
                        (Escape::None, '\\') => Escape::Backslash,
                        (Escape::None, _) => Escape::None,
                        (Escape::Backslash, 'u') => Escape::Hex(4),
                        (Escape::Backslash, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                            Escape::None
                        }
                        (Escape::Backslash, _) => return None,
                        (Escape::Hex(1), c) if c.is_ascii_hexdigit() => Escape::None,
                        (Escape::Hex(n), c) if c.is_ascii_hexdigit() => Escape::Hex(n - 1),
                        (Escape::Hex(_), _) => return None,
                    };
                }
                Some(Self::Quoted(escape))
            }
        }
    }
}

/// Hold state for text left in the buffer after a drain.
fn hold_for(rest: &str) -> Option<Hold> {
    match rest.chars().next()? {
        c if is_space(c) => Some(Hold::Whitespace),
        c if is_word(c) => Some(Hold::Bareword),
        '#' if rest.len() > 1 => Some(Hold::Comment),
        '"' => Hold::Quoted(Escape::None).advance(&rest[1..]),
        _ => None,
    }
}

/// Incremental tokenizer over text fragments.
#[derive(Debug, Default)]
pub struct Tokenizer {
    buffer: String,
    hold: Option<Hold>,
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text received but not yet tokenized.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn drain(&mut self, at_end: bool, out: &mut VecDeque<Token>) -> Result<(), StreamError> {
        let mut consumed = 0;
        let result = loop {
            let rest = &self.buffer[consumed..];
            if rest.is_empty() {
                break Ok(());
            }
            match scan(rest) {
                Scan::Token {
                    token,
                    len,
                    self_delimiting,
                } => {
                    if !self_delimiting && !at_end && len == rest.len() {
                        break Ok(());
                    }
                    out.push_back(token);
                    consumed += len;
                }
                Scan::Incomplete if !at_end => break Ok(()),
                Scan::Incomplete => break Err(StreamError::syntax(rest, "unexpected end of input")),
                Scan::Invalid(reason) => break Err(StreamError::syntax(rest, reason)),
            }
        };
        self.buffer.drain(..consumed);
        self.hold = if result.is_ok() && !at_end {
            hold_for(&self.buffer)
        } else {
            None
        };
        result
    }
}

impl<T: AsRef<str>> Transform<T> for Tokenizer {
    type Output = Token;

    fn push(&mut self, text: T, out: &mut VecDeque<Token>) -> Result<(), StreamError> {
        let text = text.as_ref();
        self.buffer.push_str(text);
        if let Some(hold) = self.hold.take().and_then(|hold| hold.advance(text)) {
            self.hold = Some(hold);
            return Ok(());
        }
        self.drain(false, out)
    }

    fn finish(&mut self, out: &mut VecDeque<Token>) -> Result<(), StreamError> {
        self.drain(true, out)
    }
}

/// Tokenize a stream of text fragments.
pub fn tokens<S, T>(text: S) -> impl Stream<Item = Result<Token, StreamError>>
where
    S: Stream<Item = Result<T, StreamError>>,
    T: AsRef<str>,
{
    transform(text, Tokenizer::new())
}

/// Tokenize a complete string.
///
/// # Errors
///
/// Returns `StreamError::Syntax` for input matching no token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, StreamError> {
    Tokenizer::new().run_all([input])
}
