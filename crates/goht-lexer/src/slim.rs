//! Slim dialect (`@slim` templates).

use crate::common::{
    lex_attributes, lex_body_line, lex_code, lex_command, lex_filter, lex_line_end,
    lex_swallowed_comment, lex_text,
};
use crate::lexer::{Lexer, StateFn, EOF};
use crate::token::TokenKind;

/// Characters that end a tag, id or class name.
const NAME_END: &str = " \t\r\n#.{=/";

pub(crate) fn lex_line_start(l: &mut Lexer) -> Option<StateFn> {
    lex_body_line(l, StateFn(lex_line_start), StateFn(lex_line_content))
}

fn line_end(l: &mut Lexer) -> Option<StateFn> {
    lex_line_end(l, StateFn(lex_line_start))
}

fn lex_line_content(l: &mut Lexer) -> Option<StateFn> {
    match l.peek() {
        '|' => lex_piped_text(l, false),
        '\'' => lex_piped_text(l, true),
        '/' if l.peek_at(1) == '!' => {
            l.skip_ahead(2);
            l.skip_run(" \t");
            l.accept_until("\r\n");
            l.trim_capture_end();
            l.emit(TokenKind::Comment);
            Some(StateFn(line_end))
        }
        '/' => {
            l.skip();
            lex_swallowed_comment(l, StateFn(lex_line_start))
        }
        '-' => {
            l.skip();
            lex_script(l, TokenKind::SilentScript)
        }
        '=' if l.peek_at(1) == '@' => {
            l.skip_ahead(2);
            if let Err(message) = lex_command(l) {
                return l.errorf(message);
            }
            Some(StateFn(line_end))
        }
        '=' => lex_output(l),
        ':' => lex_filter(l, StateFn(lex_line_start)),
        '#' if l.peek_at(1) != '{' => lex_id(l),
        '.' => lex_class(l),
        _ if l.peek_ahead(7) == "doctype"
            && matches!(l.peek_at(7), ' ' | '\t' | '\r' | '\n' | EOF) =>
        {
            l.skip_ahead("doctype".len());
            l.skip_run(" \t");
            l.accept_until("\r\n");
            l.trim_capture_end();
            l.emit(TokenKind::Doctype);
            Some(StateFn(line_end))
        }
        c if c.is_ascii_alphabetic() => {
            l.accept_until(NAME_END);
            l.emit(TokenKind::Tag);
            Some(StateFn(lex_element))
        }
        _ => lex_plain_text(l),
    }
}

/// `| text` or `' text`; the latter adds a trailing space.
fn lex_piped_text(l: &mut Lexer, trailing_space: bool) -> Option<StateFn> {
    l.skip();
    if l.peek() == ' ' {
        l.skip();
    }
    if let Err(message) = lex_text(l, TokenKind::PlainText, false) {
        return l.errorf(message);
    }
    if trailing_space {
        l.push_capture(' ');
        l.emit(TokenKind::PlainText);
    }
    Some(StateFn(line_end))
}

fn lex_plain_text(l: &mut Lexer) -> Option<StateFn> {
    if let Err(message) = lex_text(l, TokenKind::PlainText, false) {
        return l.errorf(message);
    }
    Some(StateFn(line_end))
}

fn lex_script(l: &mut Lexer, kind: TokenKind) -> Option<StateFn> {
    if let Err(message) = lex_code(l, kind) {
        return l.errorf(message);
    }
    Some(StateFn(line_end))
}

/// `= code` or `== code`.
fn lex_output(l: &mut Lexer) -> Option<StateFn> {
    l.skip();
    if l.peek() == '=' {
        l.accept_one();
        l.emit(TokenKind::Unescaped);
    }
    lex_script(l, TokenKind::Script)
}

fn lex_id(l: &mut Lexer) -> Option<StateFn> {
    l.skip();
    l.accept_until(NAME_END);
    if l.capture().is_empty() {
        return l.errorf("id name is missing");
    }
    l.emit(TokenKind::Id);
    Some(StateFn(lex_element))
}

fn lex_class(l: &mut Lexer) -> Option<StateFn> {
    l.skip();
    l.accept_until(NAME_END);
    if l.capture().is_empty() {
        return l.errorf("class name is missing");
    }
    l.emit(TokenKind::Class);
    Some(StateFn(lex_element))
}

fn lex_element(l: &mut Lexer) -> Option<StateFn> {
    match l.peek() {
        '#' if l.peek_at(1) == '{' => lex_plain_text(l),
        '#' => lex_id(l),
        '.' => lex_class(l),
        '{' => {
            l.skip();
            if let Err(message) = lex_attributes(l) {
                return l.errorf(message);
            }
            Some(StateFn(lex_element))
        }
        '/' => {
            l.accept_one();
            l.emit(TokenKind::VoidTag);
            l.skip_run(" \t\r");
            if !matches!(l.peek(), '\n' | EOF) {
                return l.errorf("self-closing tags cannot have content");
            }
            Some(StateFn(line_end))
        }
        '=' => lex_output(l),
        ' ' | '\t' => {
            l.skip_run(" \t");
            match l.peek() {
                '\r' | '\n' | EOF => Some(StateFn(line_end)),
                '=' => lex_output(l),
                _ => lex_plain_text(l),
            }
        }
        _ => Some(StateFn(line_end)),
    }
}
