//! Haml dialect (`@goht` and `@haml` templates).

use crate::common::{
    continue_to_matching_brace, lex_attributes, lex_body_line, lex_code, lex_command,
    lex_filter, lex_line_end, lex_swallowed_comment, lex_text,
};
use crate::lexer::{Lexer, StateFn, EOF};
use crate::token::TokenKind;

/// Characters that end a tag, id or class name.
const NAME_END: &str = " \t\r\n#.{[=!/<>";

pub(crate) fn lex_line_start(l: &mut Lexer) -> Option<StateFn> {
    lex_body_line(l, StateFn(lex_line_start), StateFn(lex_line_content))
}

fn line_end(l: &mut Lexer) -> Option<StateFn> {
    lex_line_end(l, StateFn(lex_line_start))
}

fn lex_line_content(l: &mut Lexer) -> Option<StateFn> {
    match l.peek() {
        '%' => {
            l.skip();
            lex_tag(l)
        }
        '#' if l.peek_at(1) != '{' => lex_id(l),
        '.' => lex_class(l),
        '!' if l.peek_str("!!!") => lex_doctype(l),
        '!' if l.peek_str("!=") || l.peek_str("! ") => lex_unescaped(l),
        '/' => lex_comment(l),
        '-' if l.peek_at(1) == '#' => {
            l.skip_ahead(2);
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
        '=' => {
            l.skip();
            lex_script(l, TokenKind::Script)
        }
        ':' => lex_filter(l, StateFn(lex_line_start)),
        '\\' => {
            l.skip();
            l.accept_one();
            lex_plain_text(l)
        }
        _ => lex_plain_text(l),
    }
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

/// `!= code` or `! text`.
fn lex_unescaped(l: &mut Lexer) -> Option<StateFn> {
    l.accept_one();
    l.emit(TokenKind::Unescaped);
    if l.peek() == '=' {
        l.skip();
        return lex_script(l, TokenKind::Script);
    }
    l.skip_run(" \t");
    lex_plain_text(l)
}

fn lex_doctype(l: &mut Lexer) -> Option<StateFn> {
    l.skip_ahead(3);
    l.skip_run(" \t");
    l.accept_until("\r\n");
    l.trim_capture_end();
    l.emit(TokenKind::Doctype);
    Some(StateFn(line_end))
}

fn lex_comment(l: &mut Lexer) -> Option<StateFn> {
    l.skip();
    l.skip_run(" \t");
    l.accept_until("\r\n");
    l.trim_capture_end();
    l.emit(TokenKind::Comment);
    Some(StateFn(line_end))
}

fn lex_tag(l: &mut Lexer) -> Option<StateFn> {
    l.accept_until(NAME_END);
    if l.capture().is_empty() {
        return l.errorf("tag name is missing");
    }
    l.emit(TokenKind::Tag);
    Some(StateFn(lex_element))
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

/// Everything that may follow a tag, id or class on the same line.
fn lex_element(l: &mut Lexer) -> Option<StateFn> {
    match l.peek() {
        '#' if l.peek_at(1) == '{' => lex_plain_text(l),
        '#' => lex_id(l),
        '.' => lex_class(l),
        '[' => {
            l.skip();
            l.skip_run(" \t");
            if let Err(message) =
                continue_to_matching_brace(l, '[', ']', false, false, "object reference")
            {
                return l.errorf(message);
            }
            l.trim_capture_end();
            l.emit(TokenKind::ObjectRef);
            Some(StateFn(lex_element))
        }
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
        '<' => {
            l.accept_one();
            l.emit(TokenKind::NukeInnerWhitespace);
            Some(StateFn(lex_element))
        }
        '>' => {
            l.accept_one();
            l.emit(TokenKind::NukeOuterWhitespace);
            Some(StateFn(lex_element))
        }
        '=' => {
            l.skip();
            lex_script(l, TokenKind::Script)
        }
        '!' if l.peek_str("!=") || l.peek_str("! ") => lex_unescaped(l),
        ' ' | '\t' => {
            l.skip_run(" \t");
            match l.peek() {
                '\r' | '\n' | EOF => Some(StateFn(line_end)),
                '=' => {
                    l.skip();
                    lex_script(l, TokenKind::Script)
                }
                '!' if l.peek_str("!=") || l.peek_str("! ") => lex_unescaped(l),
                '\\' => {
                    l.skip();
                    l.accept_one();
                    lex_plain_text(l)
                }
                _ => lex_plain_text(l),
            }
        }
        _ => Some(StateFn(line_end)),
    }
}

#[cfg(test)]
mod tests {
    use crate::token::TokenKind;
    use crate::Lexer;
    use pretty_assertions::assert_eq;

    fn lex_body(lines: &str) -> Vec<(TokenKind, String)> {
        Lexer::tokenize(&format!("@goht T() {{\n{lines}}}\n"))
            .unwrap()
            .into_iter()
            .skip(1)
            .take_while(|t| t.kind != TokenKind::TemplateEnd)
            .filter(|t| !matches!(t.kind, TokenKind::Indent | TokenKind::NewLine))
            .map(|t| (t.kind, t.lit))
            .collect()
    }

    fn kinds(lines: &str) -> Vec<TokenKind> {
        lex_body(lines).into_iter().map(|(k, _)| k).collect()
    }

    fn lex_error(lines: &str) -> String {
        Lexer::tokenize(&format!("@goht T() {{\n{lines}}}\n"))
            .unwrap_err()
            .message
    }

    fn tok(kind: TokenKind, lit: &str) -> (TokenKind, String) {
        (kind, lit.to_string())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_tag_with_text() {
        assert_eq!(
            lex_body("\t%p foo\n"),
            vec![tok(TokenKind::Tag, "p"), tok(TokenKind::PlainText, "foo")]
        );
    }

    #[test]
    fn test_tag_id_classes() {
        assert_eq!(
            lex_body("\t%div#main.a.b\n\t.c\n\t#d\n"),
            vec![
                tok(TokenKind::Tag, "div"),
                tok(TokenKind::Id, "main"),
                tok(TokenKind::Class, "a"),
                tok(TokenKind::Class, "b"),
                tok(TokenKind::Class, "c"),
                tok(TokenKind::Id, "d"),
            ]
        );
    }

    #[test]
    fn test_attributes_after_tag() {
        assert_eq!(
            lex_body("\t%p{id:\"bar\"}\n"),
            vec![
                tok(TokenKind::Tag, "p"),
                tok(TokenKind::AttrName, "id"),
                tok(TokenKind::AttrOperator, ":"),
                tok(TokenKind::AttrEscapedValue, "bar"),
            ]
        );
    }

    #[test]
    fn test_object_reference() {
        assert_eq!(
            lex_body("\t%div[user] hi\n"),
            vec![
                tok(TokenKind::Tag, "div"),
                tok(TokenKind::ObjectRef, "user"),
                tok(TokenKind::PlainText, "hi"),
            ]
        );
    }

    #[test]
    fn test_void_and_nuke_markers() {
        assert_eq!(
            kinds("\t%br/\n\t%p<> x\n"),
            vec![
                TokenKind::Tag,
                TokenKind::VoidTag,
                TokenKind::Tag,
                TokenKind::NukeInnerWhitespace,
                TokenKind::NukeOuterWhitespace,
                TokenKind::PlainText,
            ]
        );
    }

    #[test]
    fn test_self_closing_with_content() {
        assert_eq!(
            lex_error("\t%br/ text\n"),
            "self-closing tags cannot have content"
        );
    }

    #[test]
    fn test_inline_script_and_unescaped() {
        assert_eq!(
            lex_body("\t%p= name\n\t%p!= raw\n\t%p! <b>#{x}</b>\n"),
            vec![
                tok(TokenKind::Tag, "p"),
                tok(TokenKind::Script, "name"),
                tok(TokenKind::Tag, "p"),
                tok(TokenKind::Unescaped, "!"),
                tok(TokenKind::Script, "raw"),
                tok(TokenKind::Tag, "p"),
                tok(TokenKind::Unescaped, "!"),
                tok(TokenKind::PlainText, "<b>"),
                tok(TokenKind::DynamicText, "x"),
                tok(TokenKind::PlainText, "</b>"),
            ]
        );
    }

    #[test]
    fn test_tag_followed_by_interpolation() {
        assert_eq!(
            lex_body("\t%p#{x}\n"),
            vec![tok(TokenKind::Tag, "p"), tok(TokenKind::DynamicText, "x")]
        );
    }

    // =========================================================================
    // Line starts
    // =========================================================================

    #[test]
    fn test_doctype() {
        assert_eq!(lex_body("\t!!! 5\n"), vec![tok(TokenKind::Doctype, "5")]);
        assert_eq!(lex_body("\t!!!\n"), vec![tok(TokenKind::Doctype, "")]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex_body("\t/ shown\n\t-# hidden\n"),
            vec![
                tok(TokenKind::Comment, "shown"),
                tok(TokenKind::RubyComment, "hidden"),
            ]
        );
    }

    #[test]
    fn test_scripts() {
        assert_eq!(
            lex_body("\t- if x {\n\t\t= y\n"),
            vec![
                tok(TokenKind::SilentScript, "if x {"),
                tok(TokenKind::Script, "y"),
            ]
        );
    }

    #[test]
    fn test_escaped_first_character() {
        assert_eq!(
            lex_body("\t\\%p not a tag\n\t\\= not code\n"),
            vec![
                tok(TokenKind::PlainText, "%p not a tag"),
                tok(TokenKind::PlainText, "= not code"),
            ]
        );
    }

    #[test]
    fn test_text_line_starting_with_interpolation() {
        assert_eq!(
            lex_body("\t#{a} b\n"),
            vec![
                tok(TokenKind::DynamicText, "a"),
                tok(TokenKind::PlainText, " b"),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let toks = Lexer::tokenize("@goht T() {\n\t%p.x= y\n}\n").unwrap();
        let script = toks.iter().find(|t| t.kind == TokenKind::Script).unwrap();
        assert_eq!((script.line, script.column), (2, 8));
        let class = toks.iter().find(|t| t.kind == TokenKind::Class).unwrap();
        assert_eq!((class.line, class.column), (2, 5));
    }
}
