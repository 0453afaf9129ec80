// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Lexical splitting of `Name(arg Type, ...)` tag contents.
//!
//! The split is substring based on purpose: the name ends at the first `(`,
//! the argument list at the last `)`. Argument types containing commas
//! (`m map[string]func(a, b int)`) are not understood and will yield bogus
//! names-only lists.
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing '(' for function arguments")]
    MissingOpenParen,
    #[error("empty function name")]
    EmptyName,
    #[error("missing ')' for function arguments")]
    MissingCloseParen,
}

/// Callable name and argument list as written in a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call<'a> {
    pub name: &'a str,
    pub args: &'a str,
}

impl<'a> Call<'a> {
    pub fn parse(contents: &'a str) -> Result<Self, SignatureError> {
        let open = contents
            .find('(')
            .ok_or(SignatureError::MissingOpenParen)?;
        let name = contents[..open].trim();
        if name.is_empty() {
            return Err(SignatureError::EmptyName);
        }

        let rest = &contents[open + 1..];
        let close = rest
            .rfind(')')
            .ok_or(SignatureError::MissingCloseParen)?;
        Ok(Self {
            name,
            args: &rest[..close],
        })
    }
}

/// A function declaration: name, typed arguments and the bare argument names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub args: String,
    pub arg_names: SmallVec<[String; 4]>,
}

impl Signature {
    pub fn parse(contents: &str) -> Result<Self, SignatureError> {
        let call = Call::parse(contents)?;
        let arg_names = call
            .args
            .split(',')
            .map(|arg| {
                let arg = arg.trim_start();
                let end = arg.find(char::is_whitespace).unwrap_or(arg.len());
                arg[..end].to_string()
            })
            .collect();
        Ok(Self {
            name: call.name.to_string(),
            args: call.args.to_string(),
            arg_names,
        })
    }

    /// Argument names joined for a forwarding call, e.g. `a, b`.
    pub fn untyped_args(&self) -> String {
        self.arg_names.join(", ")
    }
}
