// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The fixed tag grammar.
//!
//! Every recognised tag name maps to exactly one [`Tag`]; which block may
//! contain it is answered by [`Tag::is_legal_in`]. Keeping both in one table
//! means the grammar can be read (and tested) without walking the parser.

/// Value family printed by a print tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintKind {
    /// `s`: string.
    String,
    /// `d`: integer.
    Int,
    /// `f`: floating point.
    Float,
    /// `v`: any value.
    Value,
}

impl PrintKind {
    /// Name of the runtime printer for this family.
    pub fn printer(self) -> &'static str {
        match self {
            PrintKind::String => "s",
            PrintKind::Int => "d",
            PrintKind::Float => "f",
            PrintKind::Value => "v",
        }
    }
}

/// A print tag: escaped when written bare (`s`), raw when carrying the `=`
/// marker (`s=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintTag {
    pub kind: PrintKind,
    pub escaped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Code,
    Func,
    EndFunc,
    For,
    EndFor,
    If,
    ElseIf,
    Else,
    EndIf,
    Return,
    Break,
    /// `=`: stream another template function into the current writer.
    Call,
    Print(PrintTag),
}

/// Where a tag shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Outside any function.
    TopLevel,
    /// Inside a `func`, `for` or `if` body.
    BlockBody,
    /// Closing a `func`.
    FuncEnd,
    /// Closing a `for`.
    LoopEnd,
    /// Branching or closing an `if`.
    Conditional,
}

const fn print(kind: PrintKind, escaped: bool) -> Tag {
    Tag::Print(PrintTag { kind, escaped })
}

const TAGS: &[(&str, Tag)] = &[
    ("code", Tag::Code),
    ("func", Tag::Func),
    ("endfunc", Tag::EndFunc),
    ("for", Tag::For),
    ("endfor", Tag::EndFor),
    ("if", Tag::If),
    ("elseif", Tag::ElseIf),
    ("else", Tag::Else),
    ("endif", Tag::EndIf),
    ("return", Tag::Return),
    ("break", Tag::Break),
    ("=", Tag::Call),
    ("s", print(PrintKind::String, true)),
    ("d", print(PrintKind::Int, true)),
    ("f", print(PrintKind::Float, true)),
    ("v", print(PrintKind::Value, true)),
    ("s=", print(PrintKind::String, false)),
    ("d=", print(PrintKind::Int, false)),
    ("f=", print(PrintKind::Float, false)),
    ("v=", print(PrintKind::Value, false)),
];

impl Tag {
    pub fn lookup(name: &str) -> Option<Tag> {
        TAGS.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, tag)| *tag)
    }

    /// Resolves `name` only when the tag may appear in `context`.
    pub fn resolve(name: &str, context: Context) -> Option<Tag> {
        Self::lookup(name).filter(|tag| tag.is_legal_in(context))
    }

    pub fn name(self) -> &'static str {
        TAGS.iter()
            .find(|(_, tag)| *tag == self)
            .map_or("", |(name, _)| name)
    }

    pub fn is_legal_in(self, context: Context) -> bool {
        match context {
            Context::TopLevel => matches!(self, Tag::Code | Tag::Func),
            Context::BlockBody => matches!(
                self,
                Tag::Print(_)
                    | Tag::Call
                    | Tag::Return
                    | Tag::Break
                    | Tag::Code
                    | Tag::For
                    | Tag::If
            ),
            Context::FuncEnd => self == Tag::EndFunc,
            Context::LoopEnd => self == Tag::EndFor,
            Context::Conditional => matches!(self, Tag::ElseIf | Tag::Else | Tag::EndIf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_round_trips() {
        for (name, tag) in TAGS {
            assert_eq!(Tag::lookup(name), Some(*tag));
            assert_eq!(tag.name(), *name);
        }
        assert_eq!(Tag::lookup("endwhile"), None);
    }

    #[test]
    fn print_tags_split_by_marker() {
        assert_eq!(
            Tag::lookup("s"),
            Some(Tag::Print(PrintTag {
                kind: PrintKind::String,
                escaped: true
            }))
        );
        assert_eq!(
            Tag::lookup("f="),
            Some(Tag::Print(PrintTag {
                kind: PrintKind::Float,
                escaped: false
            }))
        );
    }

    #[test]
    fn top_level_accepts_only_code_and_func() {
        let legal: Vec<_> = TAGS
            .iter()
            .filter(|(_, tag)| tag.is_legal_in(Context::TopLevel))
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(legal, vec!["code", "func"]);
    }

    #[test]
    fn block_body_excludes_func_and_terminators() {
        for name in ["func", "endfunc", "endfor", "else", "elseif", "endif"] {
            assert_eq!(Tag::resolve(name, Context::BlockBody), None, "{name}");
        }
        for name in ["s", "v=", "=", "return", "break", "code", "for", "if"] {
            assert!(Tag::resolve(name, Context::BlockBody).is_some(), "{name}");
        }
    }

    #[test]
    fn terminators_close_only_their_block() {
        assert_eq!(Tag::resolve("endfunc", Context::FuncEnd), Some(Tag::EndFunc));
        assert_eq!(Tag::resolve("endfor", Context::FuncEnd), None);
        assert_eq!(Tag::resolve("endfor", Context::LoopEnd), Some(Tag::EndFor));
        assert_eq!(Tag::resolve("endif", Context::LoopEnd), None);
        assert_eq!(Tag::resolve("else", Context::Conditional), Some(Tag::Else));
        assert_eq!(Tag::resolve("endfunc", Context::Conditional), None);
    }
}
