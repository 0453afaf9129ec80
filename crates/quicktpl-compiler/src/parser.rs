// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt;
use std::io::Write;

use crate::emit::Emitter;
use crate::error::Error;
use crate::grammar::{Context, PrintTag, Tag};
use crate::options::CompileOptions;
use crate::signature::{Call, Signature, SignatureError};
use crate::telemetry;
use crate::token::{TokenKind, TokenStream};

/// Single-pass template compiler.
///
/// The four block parsers (`parse_template`, `parse_func`, `parse_for`,
/// `parse_if`) recurse into each other through `dispatch_block_tag`, which
/// owns the tags shared by every block body. They all mutate the same state:
///
/// - the emitter's indentation prefix, one level per open block, restored on
///   every block exit;
/// - `loop_depth`, so `break` is accepted anywhere below a `for`, including
///   inside nested `if` branches;
/// - `depth`, the number of open blocks, capped by `max_depth`.
///
/// A compiler handles exactly one document. Create a fresh one per template.
pub struct Compiler<'o, S, W> {
    stream: S,
    emitter: Emitter<W>,
    options: &'o CompileOptions,
    package: String,
    loop_depth: usize,
    depth: usize,
}

impl<'o, S: TokenStream, W: Write> Compiler<'o, S, W> {
    /// `package` must be non-empty; see [`crate::package_name`].
    pub fn new(
        stream: S,
        out: W,
        package: impl Into<String>,
        options: &'o CompileOptions,
    ) -> Result<Self, Error> {
        let package = package.into();
        if package.is_empty() {
            return Err(Error::config(package));
        }
        Ok(Self {
            stream,
            emitter: Emitter::new(out),
            options,
            package,
            loop_depth: 0,
            depth: 0,
        })
    }

    /// Consumes the whole token stream and returns the sink.
    pub fn compile(mut self) -> Result<W, Error> {
        self.parse_template()?;
        Ok(self.emitter.into_inner())
    }

    fn parse_template(&mut self) -> Result<(), Error> {
        let package = self.package.clone();
        self.emit(format_args!("package {package}\n"))?;
        while self.stream.advance() {
            let kind = self.stream.token().kind;
            match kind {
                // top-level text is commentary
                TokenKind::Text => {}
                TokenKind::TagName => match self.current_tag(Context::TopLevel) {
                    Some(Tag::Code) => self.parse_code()?,
                    Some(Tag::Func) => self.parse_func()?,
                    _ => return Err(self.unexpected_tag("outside func")),
                },
                TokenKind::TagContents => return Err(self.unexpected_token("outside func")),
            }
        }
        match self.stream.last_error() {
            Some(err) => Err(Error::scan("template", err.clone())),
            None => Ok(()),
        }
    }

    fn parse_func(&mut self) -> Result<(), Error> {
        let contents = self.expect_tag_contents()?;
        let signature = Signature::parse(&contents).map_err(|err| self.signature_error(err))?;
        self.enter_block("func")?;
        tracing::debug!(name = %signature.name, args = %signature.args, "emitting template function");
        telemetry::record_function(&signature.name);

        self.emit_func_start(&signature)?;
        while self.stream.advance() {
            let kind = self.stream.token().kind;
            match kind {
                TokenKind::Text => self.emit_text()?,
                TokenKind::TagName => {
                    if self.dispatch_block_tag()? {
                        continue;
                    }
                    match self.current_tag(Context::FuncEnd) {
                        Some(Tag::EndFunc) => {
                            self.skip_tag_contents()?;
                            self.emit_func_end(&signature)?;
                            self.leave_block();
                            return Ok(());
                        }
                        _ => return Err(self.unexpected_tag("inside func")),
                    }
                }
                TokenKind::TagContents => return Err(self.unexpected_token("when parsing func")),
            }
        }
        Err(self.missing_terminator("func", Tag::EndFunc))
    }

    fn parse_for(&mut self) -> Result<(), Error> {
        let clause = self.expect_tag_contents()?;
        self.enter_block("for")?;
        self.emit(format_args!("for {clause} {{"))?;
        self.emitter.indent();
        self.loop_depth += 1;

        while self.stream.advance() {
            let kind = self.stream.token().kind;
            match kind {
                TokenKind::Text => self.emit_text()?,
                TokenKind::TagName => {
                    if self.dispatch_block_tag()? {
                        continue;
                    }
                    match self.current_tag(Context::LoopEnd) {
                        Some(Tag::EndFor) => {
                            self.skip_tag_contents()?;
                            self.loop_depth -= 1;
                            self.emitter.dedent();
                            self.emit(format_args!("}}"))?;
                            self.leave_block();
                            return Ok(());
                        }
                        _ => return Err(self.unexpected_tag("inside for loop")),
                    }
                }
                TokenKind::TagContents => {
                    return Err(self.unexpected_token("when parsing for loop"))
                }
            }
        }
        Err(self.missing_terminator("for loop", Tag::EndFor))
    }

    fn parse_if(&mut self) -> Result<(), Error> {
        let condition = self.expect_tag_contents()?;
        if condition.is_empty() {
            return Err(self.structure_error("empty if condition"));
        }
        self.enter_block("if")?;
        self.emit(format_args!("if {condition} {{"))?;
        self.emitter.indent();

        let mut else_used = false;
        while self.stream.advance() {
            let kind = self.stream.token().kind;
            match kind {
                TokenKind::Text => self.emit_text()?,
                TokenKind::TagName => {
                    if self.dispatch_block_tag()? {
                        continue;
                    }
                    match self.current_tag(Context::Conditional) {
                        Some(Tag::EndIf) => {
                            self.skip_tag_contents()?;
                            self.emitter.dedent();
                            self.emit(format_args!("}}"))?;
                            self.leave_block();
                            return Ok(());
                        }
                        Some(Tag::Else) => {
                            if else_used {
                                return Err(self.structure_error("duplicate else branch found"));
                            }
                            self.skip_tag_contents()?;
                            self.emitter.dedent();
                            self.emit(format_args!("}} else {{"))?;
                            self.emitter.indent();
                            else_used = true;
                        }
                        Some(Tag::ElseIf) => {
                            if else_used {
                                return Err(self.structure_error(
                                    "unexpected elseif branch found after else branch",
                                ));
                            }
                            let condition = self.expect_tag_contents()?;
                            if condition.is_empty() {
                                return Err(self.structure_error("empty elseif condition"));
                            }
                            self.emitter.dedent();
                            self.emit(format_args!("}} else if {condition} {{"))?;
                            self.emitter.indent();
                        }
                        _ => return Err(self.unexpected_tag("inside if condition")),
                    }
                }
                TokenKind::TagContents => {
                    return Err(self.unexpected_token("when parsing if branch"))
                }
            }
        }
        Err(self.missing_terminator("if branch", Tag::EndIf))
    }

    /// Handles the tags every block body accepts. Returns `false` when the
    /// current tag is not one of them so the caller can try its terminators.
    fn dispatch_block_tag(&mut self) -> Result<bool, Error> {
        let Some(tag) = self.current_tag(Context::BlockBody) else {
            return Ok(false);
        };
        let options = self.options;
        let runtime = options.runtime_package.as_str();
        match tag {
            Tag::Print(print) => self.parse_print(print)?,
            Tag::Call => {
                let contents = self.expect_tag_contents()?;
                let call = Call::parse(&contents).map_err(|err| self.signature_error(err))?;
                self.emit(format_args!(
                    "{}Stream({})",
                    call.name,
                    join_args("qw.w", call.args)
                ))?;
            }
            Tag::Return => {
                self.skip_tag_contents()?;
                self.emit(format_args!("{runtime}.ReleaseWriter(qw)"))?;
                self.emit(format_args!("return"))?;
            }
            Tag::Break => {
                if self.loop_depth == 0 {
                    return Err(self.structure_error("found break tag outside for loop"));
                }
                self.skip_tag_contents()?;
                self.emit(format_args!("break"))?;
            }
            Tag::Code => self.parse_code()?,
            Tag::For => self.parse_for()?,
            Tag::If => self.parse_if()?,
            Tag::Func | Tag::EndFunc | Tag::EndFor | Tag::ElseIf | Tag::Else | Tag::EndIf => {
                return Ok(false)
            }
        }
        Ok(true)
    }

    fn parse_print(&mut self, print: PrintTag) -> Result<(), Error> {
        let value = self.expect_tag_contents()?;
        let filter = if print.escaped { "e." } else { "" };
        self.emit(format_args!("qw.{filter}{}({value})", print.kind.printer()))
    }

    fn parse_code(&mut self) -> Result<(), Error> {
        let code = self.expect_tag_contents()?;
        self.emit(format_args!("{code}\n"))
    }

    fn emit_func_start(&mut self, signature: &Signature) -> Result<(), Error> {
        let options = self.options;
        let runtime = options.runtime_package.as_str();
        self.emit(format_args!(
            "func {}Stream({}) {{",
            signature.name,
            join_args("w io.Writer", &signature.args)
        ))?;
        self.emitter.indent();
        self.emit(format_args!("qw := {runtime}.AcquireWriter(w)"))
    }

    fn emit_func_end(&mut self, signature: &Signature) -> Result<(), Error> {
        let options = self.options;
        let runtime = options.runtime_package.as_str();
        let name = signature.name.as_str();
        self.emit(format_args!("{runtime}.ReleaseWriter(qw)"))?;
        self.emitter.dedent();
        self.emit(format_args!("}}\n"))?;

        self.emit(format_args!("func {name}({}) string {{", signature.args))?;
        self.emitter.indent();
        self.emit(format_args!("bb := {runtime}.AcquireByteBuffer()"))?;
        self.emit(format_args!(
            "{name}Stream({})",
            join_args("bb", &signature.untyped_args())
        ))?;
        self.emit(format_args!("s := string(bb.Bytes())"))?;
        self.emit(format_args!("{runtime}.ReleaseByteBuffer(bb)"))?;
        self.emit(format_args!("return s"))?;
        self.emitter.dedent();
        self.emit(format_args!("}}\n"))
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) -> Result<(), Error> {
        self.emitter.emit_line(&self.stream, line)?;
        Ok(())
    }

    fn emit_text(&mut self) -> Result<(), Error> {
        self.emitter
            .emit_text(&self.stream, &self.stream.token().value)?;
        Ok(())
    }

    fn enter_block(&mut self, block: &'static str) -> Result<(), Error> {
        if self.depth >= self.options.max_depth {
            return Err(self.structure_error(format!(
                "block nesting exceeds maximum depth of {}",
                self.options.max_depth
            )));
        }
        self.depth += 1;
        tracing::trace!(block, depth = self.depth, "entering block");
        Ok(())
    }

    fn leave_block(&mut self) {
        self.depth -= 1;
    }

    fn current_tag(&self, context: Context) -> Option<Tag> {
        Tag::resolve(&self.stream.token().value, context)
    }

    fn expect_tag_contents(&mut self) -> Result<String, Error> {
        if !self.stream.advance() {
            if let Some(err) = self.stream.last_error() {
                return Err(Error::scan("tag contents", err.clone()));
            }
            return Err(self.structure_error(format!(
                "cannot find token {}: unexpected end of input",
                TokenKind::TagContents
            )));
        }
        let token = self.stream.token();
        if token.kind != TokenKind::TagContents {
            return Err(self.structure_error(format!(
                "unexpected token found {token}. Expecting {}",
                TokenKind::TagContents
            )));
        }
        Ok(token.value.clone())
    }

    fn skip_tag_contents(&mut self) -> Result<(), Error> {
        self.expect_tag_contents().map(drop)
    }

    fn structure_error(&self, message: impl Into<String>) -> Error {
        Error::structure_with_span(
            message,
            self.stream.context(),
            self.stream.token().span,
        )
    }

    fn signature_error(&self, err: SignatureError) -> Error {
        Error::signature(err, self.stream.context(), Some(self.stream.token().span))
    }

    fn unexpected_tag(&self, place: &str) -> Error {
        self.structure_error(format!(
            "unexpected tag found {place}: {}",
            self.stream.token().value
        ))
    }

    fn unexpected_token(&self, place: &str) -> Error {
        self.structure_error(format!(
            "unexpected token found {} {place}",
            self.stream.token()
        ))
    }

    fn missing_terminator(&self, block: &'static str, terminator: Tag) -> Error {
        match self.stream.last_error() {
            Some(err) => Error::scan(block, err.clone()),
            None => self.structure_error(format!("cannot find {} tag", terminator.name())),
        }
    }
}

/// Joins a leading argument with a possibly blank argument list.
fn join_args(head: &str, tail: &str) -> String {
    if tail.trim().is_empty() {
        head.to_string()
    } else {
        format!("{head}, {tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn compile(source: &str) -> Result<String, Error> {
        compile_with(source, &CompileOptions::default())
    }

    fn compile_with(source: &str, options: &CompileOptions) -> Result<String, Error> {
        let scanner = Scanner::new(source, "t.qtpl");
        let out = Compiler::new(scanner, Vec::new(), "t", options)?.compile()?;
        Ok(String::from_utf8(out).unwrap())
    }

    /// Generated code with the position comments stripped.
    fn code(source: &str) -> Vec<String> {
        compile(source)
            .unwrap()
            .lines()
            .filter(|line| !line.trim_start().starts_with("//line"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn function_emits_stream_and_value_forms() {
        let out = compile("{% func F(a int) %}hi{% endfunc %}").unwrap();
        let expected = concat!(
            "//line t.qtpl:1\n",
            "package t\n\n",
            "//line t.qtpl:1\n",
            "func FStream(w io.Writer, a int) {\n",
            "\t//line t.qtpl:1\n",
            "\tqw := quicktemplate.AcquireWriter(w)\n",
            "\t//line t.qtpl:1\n",
            "\tqw.s(`hi`)\n",
            "\t//line t.qtpl:1\n",
            "\tquicktemplate.ReleaseWriter(qw)\n",
            "//line t.qtpl:1\n",
            "}\n\n",
            "//line t.qtpl:1\n",
            "func F(a int) string {\n",
            "\t//line t.qtpl:1\n",
            "\tbb := quicktemplate.AcquireByteBuffer()\n",
            "\t//line t.qtpl:1\n",
            "\tFStream(bb, a)\n",
            "\t//line t.qtpl:1\n",
            "\ts := string(bb.Bytes())\n",
            "\t//line t.qtpl:1\n",
            "\tquicktemplate.ReleaseByteBuffer(bb)\n",
            "\t//line t.qtpl:1\n",
            "\treturn s\n",
            "//line t.qtpl:1\n",
            "}\n\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn argumentless_function_has_no_dangling_commas() {
        let lines = code("{% func Page() %}{% endfunc %}");
        assert!(lines.contains(&"func PageStream(w io.Writer) {".to_string()));
        assert!(lines.contains(&"\tPageStream(bb)".to_string()));
        assert!(lines.contains(&"func Page() string {".to_string()));
    }

    #[test]
    fn position_comments_follow_source_lines() {
        let out = compile("{% func F() %}\n{% s a %}\n{% endfunc %}").unwrap();
        assert!(out.contains("\t//line t.qtpl:2\n\tqw.e.s(a)\n"));
        assert!(out.contains("\t//line t.qtpl:3\n\tquicktemplate.ReleaseWriter(qw)\n"));
    }

    #[test]
    fn print_tags_choose_filter() {
        let lines = code("{% func F() %}{% s a %}{% d= n %}{% f x %}{% v= y %}{% endfunc %}");
        for expected in ["\tqw.e.s(a)", "\tqw.d(n)", "\tqw.e.f(x)", "\tqw.v(y)"] {
            assert!(lines.contains(&expected.to_string()), "{expected}");
        }
    }

    #[test]
    fn inline_call_streams_into_current_writer() {
        let lines = code("{% func F(r Row) %}{%= Cell(r.A, 1) %}{%= Footer() %}{% endfunc %}");
        assert!(lines.contains(&"\tCellStream(qw.w, r.A, 1)".to_string()));
        assert!(lines.contains(&"\tFooterStream(qw.w)".to_string()));
    }

    #[test]
    fn nested_blocks_indent_and_restore() {
        let lines = code(
            "{% func F(xs []int) %}{% for _, x := range xs %}{% if x > 1 %}{% break %}{% elseif x < 0 %}{% return %}{% else %}{% d x %}{% endif %}{% endfor %}{% code y := 1 %}{% endfunc %}",
        );
        let body: Vec<_> = lines
            .iter()
            .skip_while(|line| !line.starts_with("\tqw :="))
            .take_while(|line| !line.starts_with('}'))
            .cloned()
            .collect();
        assert_eq!(
            body,
            vec![
                "\tqw := quicktemplate.AcquireWriter(w)",
                "\tfor _, x := range xs {",
                "\t\tif x > 1 {",
                "\t\t\tbreak",
                "\t\t} else if x < 0 {",
                "\t\t\tquicktemplate.ReleaseWriter(qw)",
                "\t\t\treturn",
                "\t\t} else {",
                "\t\t\tqw.e.d(x)",
                "\t\t}",
                "\t}",
                "\ty := 1",
                "",
                "\tquicktemplate.ReleaseWriter(qw)",
            ]
        );
    }

    #[test]
    fn top_level_code_and_text() {
        let lines = code("leading notes\n{% code import \"io\" %}\n{% func F() %}{% endfunc %}");
        assert_eq!(lines[0], "package t");
        assert_eq!(lines[2], "import \"io\"");
        assert!(!lines.iter().any(|line| line.contains("leading notes")));
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let err = compile("{% func F() %}{% if x %}{% break %}{% endif %}{% endfunc %}").unwrap_err();
        assert!(err.to_string().starts_with("found break tag outside for loop at"));
        assert!(matches!(err, Error::Structure { span: Some(_), .. }));
    }

    #[test]
    fn break_inside_conditional_inside_loop_is_accepted() {
        compile("{% func F() %}{% for %}{% if x %}{% break %}{% endif %}{% endfor %}{% endfunc %}")
            .unwrap();
    }

    #[test]
    fn break_inside_loop_inside_conditional_is_accepted() {
        let out = compile(
            "{% func F(xs []int) %}{% if c %}{% for _, x := range xs %}{% break %}{% endfor %}{% endif %}{% endfunc %}",
        )
        .unwrap();
        assert!(out.contains("\t\tfor _, x := range xs {\n"));
        assert!(out.contains("\t\t\tbreak\n"));
    }

    #[test]
    fn conditional_does_not_keep_inner_loop_open() {
        let err = compile(
            "{% func F() %}{% if c %}{% for %}{% endfor %}{% break %}{% endif %}{% endfunc %}",
        )
        .unwrap_err();
        assert!(err.to_string().contains("break tag outside for loop"));
    }

    #[test]
    fn loop_counter_resets_after_endfor() {
        let err = compile("{% func F() %}{% for %}{% endfor %}{% break %}{% endfunc %}").unwrap_err();
        assert!(err.to_string().contains("break tag outside for loop"));
    }

    #[test]
    fn conditional_branch_errors() {
        let err = compile("{% func F() %}{% if a %}{% else %}{% elseif b %}{% endif %}{% endfunc %}")
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("unexpected elseif branch found after else branch"));

        let err = compile("{% func F() %}{% if a %}{% else %}{% else %}{% endif %}{% endfunc %}")
            .unwrap_err();
        assert!(err.to_string().contains("duplicate else branch found"));

        let err = compile("{% func F() %}{% if %}{% endif %}{% endfunc %}").unwrap_err();
        assert!(err.to_string().contains("empty if condition"));

        let err = compile("{% func F() %}{% if a %}{% elseif %}{% endif %}{% endfunc %}")
            .unwrap_err();
        assert!(err.to_string().contains("empty elseif condition"));
    }

    #[test]
    fn missing_terminators_are_named() {
        let err = compile("{% func F() %}body").unwrap_err();
        assert!(err.to_string().starts_with("cannot find endfunc tag at"));

        let err = compile("{% func F() %}{% for %}").unwrap_err();
        assert!(err.to_string().starts_with("cannot find endfor tag at"));

        let err = compile("{% func F() %}{% if a %}").unwrap_err();
        assert!(err.to_string().starts_with("cannot find endif tag at"));
    }

    #[test]
    fn mismatched_terminators_are_rejected() {
        let err = compile("{% func F() %}{% endfor %}").unwrap_err();
        assert!(err.to_string().contains("unexpected tag found inside func: endfor"));

        let err = compile("{% func F() %}{% for %}{% endif %}{% endfor %}{% endfunc %}").unwrap_err();
        assert!(err.to_string().contains("unexpected tag found inside for loop: endif"));

        let err = compile("{% func F() %}{% if a %}{% endfunc %}").unwrap_err();
        assert!(err.to_string().contains("unexpected tag found inside if condition: endfunc"));

        let err = compile("{% func F() %}{% func G() %}{% endfunc %}{% endfunc %}").unwrap_err();
        assert!(err.to_string().contains("unexpected tag found inside func: func"));
    }

    #[test]
    fn top_level_rejects_body_tags() {
        let err = compile("{% s name %}").unwrap_err();
        assert!(err.to_string().starts_with("unexpected tag found outside func: s at"));
    }

    #[test]
    fn signature_errors_carry_context() {
        let err = compile("{% func F %}{% endfunc %}").unwrap_err();
        assert!(matches!(
            err,
            Error::Signature {
                source: SignatureError::MissingOpenParen,
                ..
            }
        ));
        assert!(err.to_string().contains("line 1, pos 1"));

        let err = compile("{% func F() %}{%= Cell(x %}{% endfunc %}").unwrap_err();
        assert!(matches!(
            err,
            Error::Signature {
                source: SignatureError::MissingCloseParen,
                ..
            }
        ));
    }

    #[test]
    fn scanner_failures_are_wrapped() {
        let err = compile("{% func F() %}{% s x").unwrap_err();
        assert!(err.to_string().starts_with("cannot parse func: cannot find closing %}"));

        let err = compile("text {% code x").unwrap_err();
        assert!(err.to_string().starts_with("cannot parse template:"));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let options = CompileOptions::default().with_max_depth(3);
        compile_with(
            "{% func F() %}{% for %}{% if a %}{% endif %}{% endfor %}{% endfunc %}",
            &options,
        )
        .unwrap();

        let err = compile_with(
            "{% func F() %}{% for %}{% if a %}{% for %}{% endfor %}{% endif %}{% endfor %}{% endfunc %}",
            &options,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("block nesting exceeds maximum depth of 3"));
    }

    #[test]
    fn runtime_package_is_configurable() {
        let options = CompileOptions::default().with_runtime_package("qt");
        let out = compile_with("{% func F() %}{% return %}{% endfunc %}", &options).unwrap();
        assert!(out.contains("qw := qt.AcquireWriter(w)"));
        assert!(out.contains("bb := qt.AcquireByteBuffer()"));
        assert!(!out.contains("quicktemplate."));
    }

    #[test]
    fn empty_package_is_a_config_error() {
        let options = CompileOptions::default();
        let result = Compiler::new(Scanner::new("", "x"), Vec::new(), "", &options);
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
