// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Line and text emission for generated Go code.
use std::fmt;
use std::io::{self, Write};

use crate::token::TokenStream;

/// One indentation level in generated code.
pub const INDENT: &str = "\t";

/// Piece of literal template text as it must be printed from a Go raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPiece<'a> {
    /// Text free of backticks, safe inside `` `...` ``.
    Literal(&'a str),
    /// A single backtick, which raw strings cannot hold.
    Backtick,
    /// A single `\r`, which Go strips from raw strings.
    CarriageReturn,
}

impl TextPiece<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            TextPiece::Literal(text) => text,
            TextPiece::Backtick => "`",
            TextPiece::CarriageReturn => "\r",
        }
    }
}

/// Splits `text` on backticks and carriage returns. Concatenating the pieces
/// yields `text` again; empty literals are dropped.
pub fn split_text(text: &str) -> Vec<TextPiece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(n) = rest.find(['`', '\r']) {
        if n > 0 {
            pieces.push(TextPiece::Literal(&rest[..n]));
        }
        pieces.push(if rest.as_bytes()[n] == b'`' {
            TextPiece::Backtick
        } else {
            TextPiece::CarriageReturn
        });
        rest = &rest[n + 1..];
    }
    if !rest.is_empty() {
        pieces.push(TextPiece::Literal(rest));
    }
    pieces
}

/// Writes generated lines into a sink, tracking the indentation prefix.
pub struct Emitter<W> {
    out: W,
    prefix: String,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prefix: String::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn indent(&mut self) {
        self.prefix.push_str(INDENT);
    }

    pub fn dedent(&mut self) {
        let len = self.prefix.len().saturating_sub(INDENT.len());
        self.prefix.truncate(len);
    }

    pub fn write_indent(&mut self) -> io::Result<()> {
        self.out.write_all(self.prefix.as_bytes())
    }

    /// Emits one generated statement: indentation, the position comment for
    /// the stream's current token, indentation again, then `line`.
    pub fn emit_line(
        &mut self,
        position: &dyn TokenStream,
        line: fmt::Arguments<'_>,
    ) -> io::Result<()> {
        self.write_indent()?;
        position.write_line_comment(&mut self.out)?;
        self.write_indent()?;
        self.out.write_fmt(line)?;
        self.out.write_all(b"\n")
    }

    pub fn emit_text(&mut self, position: &dyn TokenStream, text: &str) -> io::Result<()> {
        for piece in split_text(text) {
            match piece {
                TextPiece::Literal(literal) => {
                    self.emit_line(position, format_args!("qw.s(`{literal}`)"))?;
                }
                TextPiece::Backtick => self.emit_line(position, format_args!("qw.s(\"`\")"))?,
                TextPiece::CarriageReturn => {
                    self.emit_line(position, format_args!("qw.s(\"\\r\")"))?;
                }
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
