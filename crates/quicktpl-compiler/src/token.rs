// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Token model and the pull interface the parser consumes.
//!
//! The parser never looks at raw template bytes. It only advances a
//! [`TokenStream`] and inspects the current [`Token`], which keeps the tag
//! delimiter syntax an implementation detail of the stream (see
//! [`crate::scanner::Scanner`] for the bundled one).
use std::fmt;
use std::io;

use thiserror::Error;

/// Byte offsets into the original template source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// 1-based line and column of a token start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[default]
    Text,
    TagName,
    TagContents,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Text => "Text",
            TokenKind::TagName => "TagName",
            TokenKind::TagContents => "TagContents",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.value)
    }
}

/// Terminal failure reported by a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScanError {
    pub message: String,
    pub span: Span,
}

impl ScanError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Pull interface over a template's tokens.
///
/// `advance` must be called before the first `token`. Once it returns
/// `false`, `last_error` tells a clean end of input (`None`) apart from a
/// tokenizer failure.
pub trait TokenStream {
    fn advance(&mut self) -> bool;

    fn token(&self) -> &Token;

    fn last_error(&self) -> Option<&ScanError>;

    /// Human-readable description of the current source position.
    fn context(&self) -> String;

    /// Writes a comment mapping generated code back to the current token.
    fn write_line_comment(&self, out: &mut dyn io::Write) -> io::Result<()>;
}
