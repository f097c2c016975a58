//! Go code writer.
//!
//! `TemplateWriter` is a cheap handle over the shared `WriterState`: the sink,
//! the output cursor, the temporary variable counter, the optional source map
//! and the open string literal. Handles differ only in indent depth and in
//! whether dynamic output is escaped.
//!
//! Literal HTML is written through `write_string_literal`, which keeps one
//! `__buf.WriteString("...")` call open and appends to it until any other
//! write closes it.

use std::io::{self, Write};

use goht_lexer::Token;

use crate::source_map::{Position, Range, SourceMap};

/// A piece of a generated Go statement.
#[derive(Debug, Clone, Copy)]
pub enum Chunk<'t> {
    /// Written as is.
    Code(&'t str),
    /// Written as the token's literal and recorded in the source map.
    Token(&'t Token),
}

pub struct WriterState<'w> {
    sink: &'w mut dyn Write,
    line: usize,
    col: usize,
    var_counter: usize,
    source_map: Option<SourceMap>,
    in_literal: bool,
    literal_depth: usize,
}

impl<'w> WriterState<'w> {
    pub fn new(sink: &'w mut dyn Write, with_source_map: bool) -> Self {
        Self {
            sink,
            line: 1,
            col: 1,
            var_counter: 0,
            source_map: with_source_map.then(SourceMap::new),
            in_literal: false,
            literal_depth: 0,
        }
    }

    pub fn writer(&mut self) -> TemplateWriter<'_, 'w> {
        TemplateWriter {
            state: self,
            depth: 0,
            unescaped: false,
        }
    }

    pub fn into_source_map(self) -> Option<SourceMap> {
        self.source_map
    }

    fn raw(&mut self, s: &str) -> io::Result<()> {
        self.sink.write_all(s.as_bytes())?;
        for ch in s.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        Ok(())
    }

    fn close_literal(&mut self) -> io::Result<()> {
        if !self.in_literal {
            return Ok(());
        }
        self.in_literal = false;
        let depth = self.literal_depth;
        self.raw("\"); __err != nil {\n")?;
        self.raw(&tabs(depth + 1))?;
        self.raw("return\n")?;
        self.raw(&tabs(depth))?;
        self.raw("}\n")
    }

    fn cursor(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }
}

pub struct TemplateWriter<'a, 'w> {
    state: &'a mut WriterState<'w>,
    depth: usize,
    unescaped: bool,
}

impl<'a, 'w> TemplateWriter<'a, 'w> {
    /// A handle writing `n` levels deeper.
    pub fn indent(&mut self, n: usize) -> TemplateWriter<'_, 'w> {
        TemplateWriter {
            state: &mut *self.state,
            depth: self.depth + n,
            unescaped: self.unescaped,
        }
    }

    /// A handle whose dynamic output is not HTML escaped.
    pub fn unescaped(&mut self) -> TemplateWriter<'_, 'w> {
        TemplateWriter {
            state: &mut *self.state,
            depth: self.depth,
            unescaped: true,
        }
    }

    pub fn is_unescaped(&self) -> bool {
        self.unescaped
    }

    pub fn write(&mut self, s: &str) -> io::Result<()> {
        self.state.close_literal()?;
        self.state.raw(s)
    }

    pub fn write_indent(&mut self, s: &str) -> io::Result<()> {
        self.state.close_literal()?;
        self.state.raw(&tabs(self.depth))?;
        self.state.raw(s)
    }

    /// Write the token's literal at the cursor and map it.
    pub fn write_token(&mut self, token: &Token) -> io::Result<()> {
        self.state.close_literal()?;
        let from = self.state.cursor();
        self.state.raw(&token.lit)?;
        let to = self.state.cursor();
        self.add(token, Range { from, to });
        Ok(())
    }

    /// Append HTML to the open `WriteString` call, opening one if needed.
    pub fn write_string_literal(&mut self, s: &str) -> io::Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        if !self.state.in_literal {
            self.state.raw(&tabs(self.depth))?;
            self.state.raw("if _, __err = __buf.WriteString(\"")?;
            self.state.in_literal = true;
            self.state.literal_depth = self.depth;
        }
        self.state.raw(&go_escape(s))
    }

    /// `if <chunks>; __err != nil { return }` on its own lines.
    pub fn write_checked(&mut self, chunks: &[Chunk<'_>]) -> io::Result<()> {
        self.write_indent("if ")?;
        for chunk in chunks {
            match chunk {
                Chunk::Code(code) => self.state.raw(code)?,
                Chunk::Token(token) => self.write_token(token)?,
            }
        }
        self.state.raw("; __err != nil {\n")?;
        self.state.raw(&tabs(self.depth + 1))?;
        self.state.raw("return\n")?;
        self.state.raw(&tabs(self.depth))?;
        self.state.raw("}\n")
    }

    /// Write a Go string expression to the buffer.
    pub fn write_string_indent(&mut self, expr: &str) -> io::Result<()> {
        self.write_checked(&[
            Chunk::Code("_, __err = __buf.WriteString("),
            Chunk::Code(expr),
            Chunk::Code(")"),
        ])
    }

    /// Write `prefix + token + suffix` as a string expression to the buffer,
    /// mapping the token.
    pub fn write_string_indent_mapped(
        &mut self,
        prefix: &str,
        token: &Token,
        suffix: &str,
    ) -> io::Result<()> {
        self.write_checked(&[
            Chunk::Code("_, __err = __buf.WriteString("),
            Chunk::Code(prefix),
            Chunk::Token(token),
            Chunk::Code(suffix),
            Chunk::Code(")"),
        ])
    }

    /// Close the open literal (which checks `__err`) or write a bare check.
    pub fn write_error_handler(&mut self) -> io::Result<()> {
        if self.state.in_literal {
            return self.state.close_literal();
        }
        self.write_indent("if __err != nil {\n")?;
        self.state.raw(&tabs(self.depth + 1))?;
        self.state.raw("return\n")?;
        self.state.raw(&tabs(self.depth))?;
        self.state.raw("}\n")
    }

    /// Flush a dangling literal.
    pub fn close(&mut self) -> io::Result<()> {
        self.state.close_literal()
    }

    pub fn var_name(&mut self) -> String {
        self.state.var_counter += 1;
        format!("__var{}", self.state.var_counter)
    }

    pub fn reset_var_name(&mut self) {
        self.state.var_counter = 0;
    }

    pub fn add(&mut self, token: &Token, range: Range) {
        if let Some(map) = self.state.source_map.as_mut() {
            map.add(token, range);
        }
    }
}

fn tabs(depth: usize) -> String {
    "\t".repeat(depth)
}

/// Escape text for use inside a Go interpreted string literal.
pub fn go_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
