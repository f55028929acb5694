//! Grouping tokens into newline-terminated commands.

use std::collections::VecDeque;

use futures_core::Stream;

use super::Token;
use crate::stream::{transform, StreamError, Transform};

/// A non-empty, comment-free token sequence with no trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<Token>,
}

impl Command {
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Positional arguments: the payload of every non-whitespace token.
    #[must_use]
    pub fn args(&self) -> Vec<&str> {
        self.tokens.iter().filter_map(Token::text).collect()
    }

    /// First argument, if any.
    #[must_use]
    pub fn verb(&self) -> Option<&str> {
        self.tokens.iter().find_map(Token::text)
    }

    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

/// Accumulates tokens and yields a [`Command`] at every newline.
///
/// Comments are dropped without ending the command; blank lines yield
/// nothing.
#[derive(Debug, Default)]
pub struct CommandAssembler {
    pending: Vec<Token>,
}

impl CommandAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn flush(&mut self, out: &mut VecDeque<Command>) {
        while self.pending.last().is_some_and(Token::is_whitespace) {
            self.pending.pop();
        }
        if !self.pending.is_empty() {
            out.push_back(Command {
                tokens: std::mem::take(&mut self.pending),
            });
        }
    }
}

impl Transform<Token> for CommandAssembler {
    type Output = Command;

    fn push(&mut self, token: Token, out: &mut VecDeque<Command>) -> Result<(), StreamError> {
        match token {
            Token::Newline => self.flush(out),
            Token::Comment(_) => {}
            token => self.pending.push(token),
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut VecDeque<Command>) -> Result<(), StreamError> {
        self.flush(out);
        Ok(())
    }
}

/// Assemble a token stream into commands.
pub fn commands<S>(tokens: S) -> impl Stream<Item = Result<Command, StreamError>>
where
    S: Stream<Item = Result<Token, StreamError>>,
{
    transform(tokens, CommandAssembler::new())
}
