//! Lexical tokens of the command grammar.

use serde::{Deserialize, Serialize};

/// A classified lexical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Token {
    /// Run of ASCII letters, digits and underscores.
    Bareword(String),
    /// Double-quoted string, escapes already decoded.
    QuotedString(String),
    /// Run of spaces, tabs and carriage returns.
    Whitespace,
    /// A single `\n`.
    Newline,
    /// `# ` comment; the payload excludes the marker and the following
    /// whitespace character.
    Comment(String),
}

impl Token {
    /// Textual payload of barewords, quoted strings and comments.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Bareword(text) | Self::QuotedString(text) | Self::Comment(text) => Some(text),
            Self::Whitespace | Self::Newline => None,
        }
    }

    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payloads() {
        assert_eq!(Token::Bareword("kill".into()).text(), Some("kill"));
        assert_eq!(Token::QuotedString("a b".into()).text(), Some("a b"));
        assert_eq!(Token::Whitespace.text(), None);
        assert_eq!(Token::Newline.text(), None);
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_string(&Token::QuotedString("hi".into())).unwrap();
        assert_eq!(json, r#"{"type":"quoted-string","value":"hi"}"#);
        let json = serde_json::to_string(&Token::Whitespace).unwrap();
        assert_eq!(json, r#"{"type":"whitespace"}"#);
    }
}
