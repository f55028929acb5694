//! Stream error types.

/// Errors that end a transformed stream.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// The underlying source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or truncated UTF-8.
    #[error("Invalid UTF-8 at byte {offset}: {reason}")]
    Decode { offset: u64, reason: String },

    /// Input matching no grammar rule.
    #[error("Syntax error: {reason} at {input:?}")]
    Syntax { input: String, reason: String },

    /// A record of unexpected length reached a fixed-size decoder.
    #[error("Expected {expected}-byte record, got {actual} bytes")]
    RecordSize { expected: usize, actual: usize },

    /// A parser pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Longest input excerpt kept in a syntax error.
const EXCERPT_CHARS: usize = 40;

impl StreamError {
    /// Build a syntax error, keeping a bounded excerpt of the input.
    pub fn syntax(input: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            input: input.chars().take(EXCERPT_CHARS).collect(),
            reason: reason.into(),
        }
    }
}
