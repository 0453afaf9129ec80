// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::signature::SignatureError;
use crate::token::{ScanError, Span};
use thiserror::Error;

/// Unified error type for the template compiler.
///
/// Every variant is fatal to the compilation that produced it. Structural and
/// signature errors carry the tokenizer's human-readable position context and,
/// when available, the `Span` of the offending token so callers can render
/// their own diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{message} at {context}")]
    Structure {
        message: String,
        context: String,
        span: Option<Span>,
    },
    #[error("{source} at {context}")]
    Signature {
        #[source]
        source: SignatureError,
        context: String,
        span: Option<Span>,
    },
    #[error("cannot parse {block}: {source}")]
    Scan {
        block: &'static str,
        #[source]
        source: ScanError,
    },
    #[error("cannot derive package name from filePath {path:?}")]
    Config { path: String },
    #[error("cannot write generated code: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn structure(message: impl Into<String>, context: impl Into<String>) -> Self {
        Error::Structure {
            message: message.into(),
            context: context.into(),
            span: None,
        }
    }

    pub fn structure_with_span(
        message: impl Into<String>,
        context: impl Into<String>,
        span: Span,
    ) -> Self {
        Error::Structure {
            message: message.into(),
            context: context.into(),
            span: Some(span),
        }
    }

    pub fn signature(source: SignatureError, context: impl Into<String>, span: Option<Span>) -> Self {
        Error::Signature {
            source,
            context: context.into(),
            span,
        }
    }

    pub fn scan(block: &'static str, source: ScanError) -> Self {
        Error::Scan { block, source }
    }

    pub fn config(path: impl Into<String>) -> Self {
        Error::Config { path: path.into() }
    }

    /// Byte span of the template region the error points at, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Structure { span, .. } | Error::Signature { span, .. } => *span,
            Error::Scan { source, .. } => Some(source.span),
            Error::Config { .. } | Error::Io(_) => None,
        }
    }
}
