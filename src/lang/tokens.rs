//! Token model shared by the lexers, the normalizers, and every detector.

use serde::{Deserialize, Serialize};

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    Keyword,
    Identifier,
    TypeName,
    IntegerLiteral,
    FloatingLiteral,
    StringLiteral,
    Operator,
    Punctuation,
}

/// 1-based position of a token in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// One lexed token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }
}

/// A fully tokenized file: the raw stream and its normalized counterpart.
///
/// `normalized_tokens` is positionally aligned with `tokens`: same length,
/// same locations, only the text differs where a placeholder applies.
#[derive(Debug, Clone)]
pub struct FileTokens {
    pub file: String,
    pub source: String,
    pub tokens: Vec<Token>,
    pub normalized_tokens: Vec<Token>,
}

impl FileTokens {
    pub fn new(
        file: impl Into<String>,
        source: impl Into<String>,
        tokens: Vec<Token>,
        normalized_tokens: Vec<Token>,
    ) -> Self {
        Self {
            file: file.into(),
            source: source.into(),
            tokens,
            normalized_tokens,
        }
    }
}
