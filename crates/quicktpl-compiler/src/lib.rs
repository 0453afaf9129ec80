#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Compiles quicktemplate-style templates into Go source code.
//!
//! A template is literal text interleaved with `{% tag contents %}`
//! directives. Each `{% func Name(args) %}...{% endfunc %}` block becomes a
//! streaming Go function (`NameStream(w io.Writer, args)`) plus a
//! string-returning convenience wrapper (`Name(args) string`). Loops,
//! conditionals, print tags and raw `code` tags inside a function body are
//! translated into the corresponding Go statements, each preceded by a
//! `//line` comment pointing back at the template.
//!
//! ```
//! let go = quicktpl_compiler::compile_str("{% func Hello(name string) %}Hi {% s name %}{% endfunc %}", "hello.qtpl")?;
//! assert!(go.starts_with("//line hello.qtpl:1\npackage hello\n"));
//! assert!(go.contains("func HelloStream(w io.Writer, name string) {"));
//! assert!(go.contains("func Hello(name string) string {"));
//! # Ok::<(), quicktpl_compiler::Error>(())
//! ```

pub mod emit;
mod error;
pub mod grammar;
mod options;
mod parser;
pub mod scanner;
pub mod signature;
pub mod telemetry;
mod token;

pub use error::Error;
pub use grammar::{Context, PrintKind, PrintTag, Tag};
pub use options::{CompileOptions, DEFAULT_MAX_DEPTH, DEFAULT_RUNTIME_PACKAGE};
pub use parser::Compiler;
pub use scanner::Scanner;
pub use signature::{Call, Signature, SignatureError};
pub use token::{Position, ScanError, Span, Token, TokenKind, TokenStream};

use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Derives the Go package name from a template path: the base name with
/// everything from its last `.` removed.
pub fn package_name(file_path: &str) -> Result<String, Error> {
    let base = Path::new(file_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");
    let stem = base.rfind('.').map_or(base, |n| &base[..n]);
    if stem.is_empty() {
        return Err(Error::config(file_path));
    }
    Ok(stem.to_string())
}

/// Compiles `source` with default options, writing Go code into `out`.
pub fn compile<W: Write>(out: W, source: &str, file_path: &str) -> Result<W, Error> {
    compile_with_options(out, source, file_path, &CompileOptions::default())
}

/// Compiles `source`, writing Go code into `out`.
///
/// `file_path` names the package and appears in the generated `//line`
/// comments and in error contexts.
pub fn compile_with_options<W: Write>(
    out: W,
    source: &str,
    file_path: &str,
    options: &CompileOptions,
) -> Result<W, Error> {
    let start = Instant::now();
    let result = package_name(file_path).and_then(|package| {
        let scanner = Scanner::new(source, file_path);
        Compiler::new(scanner, out, package, options)?.compile()
    });
    let elapsed = start.elapsed();
    telemetry::record_compile(file_path, source.len(), elapsed, result.is_ok());
    match &result {
        Ok(_) => tracing::debug!(file_path, ?elapsed, "compiled template"),
        Err(err) => tracing::debug!(file_path, error = %err, "template compilation failed"),
    }
    result
}

/// Compiles `source` with default options into a `String`.
pub fn compile_str(source: &str, file_path: &str) -> Result<String, Error> {
    let out = compile(Vec::new(), source, file_path)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
