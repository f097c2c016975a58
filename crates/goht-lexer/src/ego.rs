//! Embedded-tag dialect (`@ego` templates).
//!
//! Lines are raw text with `<% %>` tags. Only the template's own leading tab
//! is removed from each line; no `Indent` tokens are produced, so structure
//! comes from the Go code inside the tags.

use crate::common::{lex_template_end, SPACES_MESSAGE};
use crate::lexer::{Lexer, StateFn, EOF};
use crate::token::TokenKind;

pub(crate) fn lex_line_start(l: &mut Lexer) -> Option<StateFn> {
    match l.peek() {
        EOF => None,
        '}' => lex_template_end(l),
        '\t' => {
            l.skip();
            Some(StateFn(lex_content))
        }
        '\r' | '\n' => Some(StateFn(lex_content)),
        ' ' => l.errorf(SPACES_MESSAGE),
        _ => l.errorf("template content must be indented with at least one tab"),
    }
}

fn emit_text(l: &mut Lexer) {
    if !l.capture().is_empty() {
        l.emit(TokenKind::PlainText);
    }
}

fn lex_content(l: &mut Lexer) -> Option<StateFn> {
    loop {
        match l.peek() {
            EOF => {
                emit_text(l);
                return None;
            }
            '\r' if l.peek_at(1) == '\n' => l.skip(),
            '\n' => {
                emit_text(l);
                l.accept_one();
                l.emit(TokenKind::NewLine);
                return Some(StateFn(lex_line_start));
            }
            '<' if l.peek_str("<%%") => {
                l.accept_ahead(2);
                l.skip();
            }
            '<' if l.peek_str("<%") => {
                emit_text(l);
                return Some(StateFn(lex_tag));
            }
            _ => l.accept_one(),
        }
    }
}

fn lex_tag(l: &mut Lexer) -> Option<StateFn> {
    l.skip_ahead(2);
    let kind = match l.peek() {
        '=' => {
            l.skip();
            TokenKind::Script
        }
        '!' => {
            l.accept_one();
            l.emit(TokenKind::Unescaped);
            TokenKind::Script
        }
        '#' => {
            l.skip();
            TokenKind::RubyComment
        }
        '@' => return lex_command(l),
        _ => TokenKind::SilentScript,
    };

    l.skip_run(" \t\r\n");
    if let Err(message) = lex_tag_body(l) {
        return l.errorf(message);
    }
    if kind != TokenKind::RubyComment && l.capture().is_empty() {
        return l.errorf("embedded tag is empty");
    }
    l.emit(kind);
    Some(StateFn(lex_content))
}

/// `<%@render expr %>`, `<%@children %>` or `<%@slot name %>`.
fn lex_command(l: &mut Lexer) -> Option<StateFn> {
    l.skip();
    l.accept_while(|c| c.is_ascii_alphabetic());
    let name = l.capture().to_string();
    let kind = match name.as_str() {
        "render" => TokenKind::RenderCommand,
        "children" => TokenKind::ChildrenCommand,
        "slot" => TokenKind::SlotCommand,
        _ => return l.errorf(format!("unknown command: {name}")),
    };
    if kind != TokenKind::ChildrenCommand {
        l.ignore();
        l.skip_run(" \t\r\n");
    }
    if let Err(message) = lex_tag_body(l) {
        return l.errorf(message);
    }
    if l.capture().is_empty() {
        return l.errorf(format!("{name} command is missing its argument"));
    }
    l.emit(kind);
    Some(StateFn(lex_content))
}

/// Capture up to `%>`, which is consumed. Tags may span lines.
fn lex_tag_body(l: &mut Lexer) -> Result<(), String> {
    loop {
        match l.next() {
            EOF => return Err("embedded tag was not closed: eof".into()),
            '%' if l.peek() == '>' => {
                l.skip();
                l.trim_capture_end();
                return Ok(());
            }
            _ => {
                l.backup();
                l.accept_one();
            }
        }
    }
}
