// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::io;

use crate::token::{Position, ScanError, Span, Token, TokenKind, TokenStream};

pub const TAG_OPEN: &str = "{%";
pub const TAG_CLOSE: &str = "%}";

/// Tokenizer for `{% name contents %}` templates.
///
/// Literal text runs up to the next `{%`. A tag body is trimmed, its name is a
/// leading run of ASCII letters optionally followed by `=` (or a lone `=`),
/// and whatever follows is the contents. Every tag yields a `TagName` token
/// followed by a `TagContents` token, even when the contents are empty.
pub struct Scanner<'a> {
    source: &'a str,
    file_path: String,
    cursor: usize,
    line: usize,
    column: usize,
    token: Token,
    pending: Option<Token>,
    error: Option<ScanError>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, file_path: impl Into<String>) -> Self {
        Self {
            source,
            file_path: file_path.into(),
            cursor: 0,
            line: 1,
            column: 1,
            token: Token::default(),
            pending: None,
            error: None,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    fn scan_text(&mut self, start: usize, position: Position) {
        let source = self.source;
        let end = source[start..]
            .find(TAG_OPEN)
            .map_or(source.len(), |n| start + n);
        self.consume(end);
        self.token = Token::new(
            TokenKind::Text,
            &source[start..end],
            Span::new(start, end),
            position,
        );
    }

    fn scan_tag(&mut self, start: usize, position: Position) -> Result<(), ScanError> {
        let source = self.source;
        let body_start = start + TAG_OPEN.len();
        let Some(close) = source[body_start..]
            .find(TAG_CLOSE)
            .map(|n| body_start + n)
        else {
            return Err(ScanError::new(
                format!(
                    "cannot find closing {TAG_CLOSE} for tag at {}",
                    self.describe(position)
                ),
                Span::new(start, source.len()),
            ));
        };

        let end = close + TAG_CLOSE.len();
        let span = Span::new(start, end);
        let (name, contents) = split_tag(source[body_start..close].trim());
        if name.is_empty() {
            return Err(ScanError::new(
                format!("missing tag name at {}", self.describe(position)),
                span,
            ));
        }

        self.consume(end);
        self.token = Token::new(TokenKind::TagName, name, span, position);
        self.pending = Some(Token::new(TokenKind::TagContents, contents, span, position));
        Ok(())
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn consume(&mut self, end: usize) {
        let consumed = &self.source[self.cursor..end];
        match consumed.rfind('\n') {
            Some(last) => {
                self.line += consumed.bytes().filter(|b| *b == b'\n').count();
                self.column = consumed[last + 1..].chars().count() + 1;
            }
            None => self.column += consumed.chars().count(),
        }
        self.cursor = end;
    }

    fn describe(&self, position: Position) -> String {
        format!(
            "file {:?}, line {}, pos {}",
            self.file_path, position.line, position.column
        )
    }
}

impl TokenStream for Scanner<'_> {
    fn advance(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        if let Some(next) = self.pending.take() {
            self.token = next;
            return true;
        }
        if self.cursor >= self.source.len() {
            return false;
        }

        let start = self.cursor;
        let position = self.position();
        if self.source[start..].starts_with(TAG_OPEN) {
            if let Err(err) = self.scan_tag(start, position) {
                self.error = Some(err);
                return false;
            }
        } else {
            self.scan_text(start, position);
        }
        true
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn last_error(&self) -> Option<&ScanError> {
        self.error.as_ref()
    }

    fn context(&self) -> String {
        format!("{}, token {}", self.describe(self.token.position), self.token)
    }

    fn write_line_comment(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "//line {}:{}", self.file_path, self.token.position.line)
    }
}

fn split_tag(body: &str) -> (&str, &str) {
    let letters = body.bytes().take_while(u8::is_ascii_alphabetic).count();
    let name_len = if body[letters..].starts_with('=') {
        letters + 1
    } else {
        letters
    };
    let (name, rest) = body.split_at(name_len);
    (name, rest.trim())
}
