//! Lexing shared by the template dialects: body indentation, text with
//! interpolation, Go code, attribute blocks, filters and comments.

use crate::lexer::{lex_go_line_end, Lexer, StateFn, EOF};
use crate::token::TokenKind;

pub(crate) const SPACES_MESSAGE: &str =
    "the line was indented using spaces, templates must be indented using tabs";

/// Start of a Haml or Slim body line.
///
/// Blank lines are skipped and `}` in the first column closes the template.
/// Otherwise the indent is validated and emitted, and lexing continues with
/// `content`.
pub(crate) fn lex_body_line(l: &mut Lexer, restart: StateFn, content: StateFn) -> Option<StateFn> {
    if l.at_eof() {
        return None;
    }
    if l.peek() == '}' {
        return lex_template_end(l);
    }

    l.accept_run(" \t");
    match l.peek() {
        EOF => {
            l.ignore();
            return None;
        }
        '\r' | '\n' => {
            l.ignore();
            l.skip_run("\r");
            if l.peek() == '\n' {
                l.skip();
            }
            return Some(restart);
        }
        _ => {}
    }

    let indent = l.capture().to_string();
    if let Err(message) = l.validate_indent(&indent) {
        return l.errorf(message);
    }
    if indent.is_empty() {
        return l.errorf("template content must be indented with at least one tab");
    }
    l.emit(TokenKind::Indent);
    Some(content)
}

/// Emit `TemplateEnd` for the `}` under the cursor and return to Go source.
pub(crate) fn lex_template_end(l: &mut Lexer) -> Option<StateFn> {
    l.accept_one();
    l.emit(TokenKind::TemplateEnd);
    l.skip_run(" \t");
    Some(StateFn(lex_go_line_end))
}

/// End of a body line: trailing whitespace, then `NewLine` or end of input.
pub(crate) fn lex_line_end(l: &mut Lexer, restart: StateFn) -> Option<StateFn> {
    l.skip_run(" \t\r");
    match l.peek() {
        '\n' => {
            l.accept_one();
            l.emit(TokenKind::NewLine);
            Some(restart)
        }
        EOF => None,
        ch => l.errorf(format!("unexpected character: {ch:?}")),
    }
}

/// Capture up to the delimiter that closes an already consumed `open`.
///
/// Nested pairs are counted, and delimiters inside Go string, rune and raw
/// string literals are ignored. With `include_delimiter` the closing
/// delimiter is kept in the capture, otherwise it is consumed and dropped.
pub(crate) fn continue_to_matching_brace(
    l: &mut Lexer,
    open: char,
    close: char,
    include_delimiter: bool,
    allow_newlines: bool,
    what: &str,
) -> Result<(), String> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    loop {
        let ch = l.peek();
        match ch {
            EOF => return Err(format!("{what} was not closed: eof")),
            '\n' if !allow_newlines => return Err(format!("{what} was not closed: newline")),
            _ => {}
        }

        match quote {
            Some(q) if ch == '\\' && q != '`' => {
                l.accept_one();
                l.accept_one();
                continue;
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' || ch == '`' => quote = Some(ch),
            None if ch == open => depth += 1,
            None if ch == close => {
                depth -= 1;
                if depth == 0 {
                    if include_delimiter {
                        l.accept_one();
                    } else {
                        l.skip();
                    }
                    return Ok(());
                }
            }
            None => {}
        }
        l.accept_one();
    }
}

/// Lex `#{expr}` with the cursor on `#` and emit the trimmed expression.
pub(crate) fn lex_interpolation(
    l: &mut Lexer,
    kind: TokenKind,
    allow_newlines: bool,
    what: &str,
) -> Result<(), String> {
    l.skip_ahead(2);
    l.skip_run(if allow_newlines { " \t\r\n" } else { " \t" });
    continue_to_matching_brace(l, '{', '}', false, allow_newlines, what)?;
    l.trim_capture_end();
    if l.capture().is_empty() {
        return Err(format!("{what} is empty"));
    }
    l.emit(kind);
    Ok(())
}

/// Lex text to the end of the line, splitting out `#{}` interpolations as
/// `DynamicText`. `\#` keeps a literal `#`. With `keep_newline` the line's
/// newline ends up in the last text token.
pub(crate) fn lex_text(l: &mut Lexer, plain: TokenKind, keep_newline: bool) -> Result<(), String> {
    loop {
        match l.peek() {
            EOF => break,
            '\r' if l.peek_at(1) == '\n' => l.skip(),
            '\n' => {
                if keep_newline {
                    l.accept_one();
                }
                break;
            }
            '\\' if l.peek_at(1) == '#' => {
                l.skip();
                l.accept_one();
            }
            '#' if l.peek_at(1) == '{' => {
                if !l.capture().is_empty() {
                    l.emit(plain);
                }
                lex_interpolation(l, TokenKind::DynamicText, false, "dynamic text value")?;
            }
            _ => l.accept_one(),
        }
    }
    if !l.capture().is_empty() {
        l.emit(plain);
    }
    Ok(())
}

/// Lex Go code to the end of the line and emit it as `kind`.
///
/// A line ending in `\` or `,` continues on the next line, which must be
/// indented exactly one tab deeper than the current line. The `\` is dropped
/// and the newline is kept.
pub(crate) fn lex_code(l: &mut Lexer, kind: TokenKind) -> Result<(), String> {
    l.skip_run(" \t");
    loop {
        l.accept_until("\r\n");
        l.trim_capture_end();
        let continued = match l.capture().chars().last() {
            Some('\\') => {
                l.pop_capture();
                l.trim_capture_end();
                true
            }
            Some(',') => true,
            _ => false,
        };
        if !continued {
            break;
        }

        l.skip_run("\r");
        if l.peek() != '\n' {
            break;
        }
        let depth = l.indent + 1;
        let mut tabs = 0;
        while l.peek_at(1 + tabs) == '\t' {
            tabs += 1;
        }
        if tabs != depth || l.peek_at(1 + tabs) == ' ' {
            return Err(
                "continued code lines must be indented one level deeper than the first line"
                    .into(),
            );
        }
        l.push_capture('\n');
        l.skip();
        l.skip_wrap_indent(tabs);
    }

    if l.capture().is_empty() {
        return Err(format!("{} is missing its code", kind_name(kind)));
    }
    l.emit(kind);
    Ok(())
}

fn kind_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::RenderCommand => "render command",
        TokenKind::SilentScript => "silent script",
        _ => "script",
    }
}

/// Lex a command name and its argument with the cursor just past `=@`.
pub(crate) fn lex_command(l: &mut Lexer) -> Result<(), String> {
    l.accept_while(|c| c.is_ascii_alphabetic());
    let name = l.capture().to_string();
    match name.as_str() {
        "render" => {
            l.ignore();
            lex_code(l, TokenKind::RenderCommand)
        }
        "children" => {
            l.emit(TokenKind::ChildrenCommand);
            Ok(())
        }
        "slot" => {
            l.ignore();
            l.skip_run(" \t");
            l.accept_until("\r\n");
            l.trim_capture_end();
            if l.capture().is_empty() {
                return Err("slot command is missing its name".into());
            }
            l.emit(TokenKind::SlotCommand);
            Ok(())
        }
        _ => Err(format!("unknown command: {name}")),
    }
}

/// Lex an attribute block with the cursor just past `{`.
pub(crate) fn lex_attributes(l: &mut Lexer) -> Result<(), String> {
    loop {
        l.skip_run(" \t\r\n");
        match l.peek() {
            EOF => return Err("attributes were not closed: eof".into()),
            '}' => {
                l.skip();
                return Ok(());
            }
            '@' => {
                lex_attributes_command(l)?;
                end_attribute(l)?;
                continue;
            }
            q @ ('"' | '\'' | '`') => {
                l.skip();
                l.accept_until(&q.to_string());
                if l.peek() != q {
                    return Err("attribute name was not closed: eof".into());
                }
                l.skip();
            }
            _ => l.accept_until(" \t\r\n:?,}="),
        }
        if l.capture().is_empty() {
            return Err("attribute name is missing".into());
        }
        l.emit(TokenKind::AttrName);

        l.skip_run(" \t");
        let operator = l.peek();
        if operator == ':' || operator == '?' {
            l.accept_one();
            l.emit(TokenKind::AttrOperator);
            l.skip_run(" \t\r\n");
            match l.peek() {
                '#' if l.peek_at(1) == '{' => {
                    lex_interpolation(l, TokenKind::AttrDynamicValue, true, "attribute value")?;
                }
                q @ ('"' | '`') if operator == ':' => lex_quoted_value(l, q)?,
                EOF => return Err("attribute value was not closed: eof".into()),
                _ if operator == '?' => {
                    return Err("boolean attributes must use a #{} condition".into());
                }
                _ => {
                    return Err("attribute values must be quoted strings or #{} expressions".into());
                }
            }
        }
        end_attribute(l)?;
    }
}

fn end_attribute(l: &mut Lexer) -> Result<(), String> {
    l.skip_run(" \t\r\n");
    match l.peek() {
        ',' => {
            l.skip();
            Ok(())
        }
        '}' => Ok(()),
        EOF => Err("attributes were not closed: eof".into()),
        ch => Err(format!("expected ',' or '}}' between attributes, found {ch:?}")),
    }
}

fn lex_attributes_command(l: &mut Lexer) -> Result<(), String> {
    if !l.peek_str("@attributes") {
        l.skip();
        l.accept_while(|c| c.is_ascii_alphanumeric());
        return Err(format!("unknown attribute command: @{}", l.capture()));
    }
    l.skip_ahead("@attributes".len());
    l.skip_run(" \t");
    if l.peek() != ':' {
        return Err("@attributes must be followed by ':'".into());
    }
    l.skip();
    l.skip_run(" \t\r\n");
    if !l.peek_str("#{") {
        return Err("@attributes value must be a #{} expression".into());
    }
    lex_interpolation(l, TokenKind::AttributesCommand, true, "attribute value")
}

/// Lex a quoted attribute value, decoding backslash escapes. Raw (backtick)
/// strings keep their content verbatim.
fn lex_quoted_value(l: &mut Lexer, quote: char) -> Result<(), String> {
    l.skip();
    loop {
        match l.peek() {
            EOF => return Err("attribute value was not closed: eof".into()),
            c if c == quote => {
                l.skip();
                break;
            }
            '\\' if quote != '`' => {
                l.skip();
                let decoded = match l.next() {
                    EOF => return Err("attribute value was not closed: eof".into()),
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    c => c,
                };
                l.push_capture(decoded);
            }
            _ => l.accept_one(),
        }
    }
    l.emit(TokenKind::AttrEscapedValue);
    Ok(())
}

/// Lex `:name` and the filter's content lines.
///
/// Content is every following line indented deeper than the filter line.
/// The content's base indent is removed, deeper tabs are kept, and blank
/// lines inside the content are kept as newlines.
pub(crate) fn lex_filter(l: &mut Lexer, restart: StateFn) -> Option<StateFn> {
    l.skip();
    l.accept_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let name = l.capture().to_string();
    let text = match name.as_str() {
        "javascript" | "css" | "plain" => TokenKind::PlainText,
        "escaped" => TokenKind::EscapedText,
        "preserve" => TokenKind::PreserveText,
        _ => return l.errorf(format!("unknown filter: {name}")),
    };
    l.emit(TokenKind::FilterStart);

    l.skip_run(" \t\r");
    match l.peek() {
        '\n' => l.skip(),
        EOF => {}
        _ => return l.errorf("filters cannot have content on the same line"),
    }

    let base = l.indent;
    let mut blank_lines = 0;
    while !l.at_eof() {
        let mut width = 0;
        let mut tabs = 0;
        let mut spaced = false;
        loop {
            match l.peek_at(width) {
                '\t' if !spaced => tabs += 1,
                '\t' => {}
                ' ' => spaced = true,
                _ => break,
            }
            width += 1;
        }
        if matches!(l.peek_at(width), '\r' | '\n' | EOF) {
            l.skip_until("\n");
            l.skip();
            blank_lines += 1;
            continue;
        }
        if tabs <= base {
            if spaced && tabs == base {
                return l.errorf(SPACES_MESSAGE);
            }
            break;
        }

        l.skip_ahead(base + 1);
        for _ in 0..blank_lines {
            l.push_capture('\n');
        }
        blank_lines = 0;
        if let Err(message) = lex_text(l, text, true) {
            return l.errorf(message);
        }
    }

    l.emit(TokenKind::FilterEnd);
    Some(restart)
}

/// Emit the rest of the line as a `RubyComment` and swallow every following
/// line indented deeper than the comment.
pub(crate) fn lex_swallowed_comment(l: &mut Lexer, restart: StateFn) -> Option<StateFn> {
    l.skip_run(" \t");
    l.accept_until("\r\n");
    l.trim_capture_end();
    l.emit(TokenKind::RubyComment);
    skip_line(l);

    while !l.at_eof() {
        let mut tabs = 0;
        while l.peek_at(tabs) == '\t' {
            tabs += 1;
        }
        let blank = matches!(l.peek_at(tabs), '\r' | '\n');
        if blank || tabs > l.indent {
            skip_line(l);
        } else {
            break;
        }
    }
    Some(restart)
}

fn skip_line(l: &mut Lexer) {
    l.skip_until("\n");
    l.skip();
}

#[cfg(test)]
mod tests {
    use crate::token::{Token, TokenKind};
    use crate::Lexer;
    use pretty_assertions::assert_eq;

    fn body(lines: &str) -> String {
        format!("@goht T() {{\n{lines}}}\n")
    }

    /// Tokens between `TemplateStart` and `TemplateEnd`.
    fn lex_body(lines: &str) -> Vec<(TokenKind, String)> {
        Lexer::tokenize(&body(lines))
            .unwrap()
            .into_iter()
            .skip(1)
            .take_while(|t| t.kind != TokenKind::TemplateEnd)
            .map(|t| (t.kind, t.lit))
            .collect()
    }

    fn lex_error(lines: &str) -> String {
        Lexer::tokenize(&body(lines)).unwrap_err().message
    }

    fn tok(kind: TokenKind, lit: &str) -> (TokenKind, String) {
        (kind, lit.to_string())
    }

    // =========================================================================
    // Indentation
    // =========================================================================

    #[test]
    fn test_blank_lines_skipped() {
        assert_eq!(
            lex_body("\tfoo\n\n\t\n\tbar\n"),
            vec![
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::PlainText, "foo"),
                tok(TokenKind::NewLine, "\n"),
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::PlainText, "bar"),
                tok(TokenKind::NewLine, "\n"),
            ]
        );
    }

    #[test]
    fn test_spaces_rejected() {
        assert_eq!(
            lex_error("  %p\n"),
            "the line was indented using spaces, templates must be indented using tabs"
        );
    }

    #[test]
    fn test_indent_too_deep() {
        assert_eq!(
            lex_error("\t%p\n\t\t\t%span\n"),
            "the line was indented 2 levels deeper than the previous line"
        );
    }

    #[test]
    fn test_unindented_content() {
        assert!(lex_error("%p\n").contains("indented"));
    }

    // =========================================================================
    // Text and interpolation
    // =========================================================================

    #[test]
    fn test_interpolation_splits_text() {
        assert_eq!(
            lex_body("\tHello #{name}!\n"),
            vec![
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::PlainText, "Hello "),
                tok(TokenKind::DynamicText, "name"),
                tok(TokenKind::PlainText, "!"),
                tok(TokenKind::NewLine, "\n"),
            ]
        );
    }

    #[test]
    fn test_interpolation_with_braces_and_strings() {
        let toks = lex_body("\t#{ fmt.Sprint(map[string]int{\"}\": 1}) }\n");
        assert_eq!(
            toks[1],
            tok(TokenKind::DynamicText, "fmt.Sprint(map[string]int{\"}\": 1})")
        );
    }

    #[test]
    fn test_escaped_interpolation() {
        assert_eq!(
            lex_body("\t\\#{x} \\#{y}\n")[1],
            tok(TokenKind::PlainText, "#{x} #{y}")
        );
    }

    #[test]
    fn test_unclosed_interpolation_eof() {
        let toks: Vec<Token> = {
            let mut l = Lexer::new("@goht T() {\n\tfoo #{bar baz");
            let mut out = Vec::new();
            loop {
                let t = l.next_token();
                let done = matches!(t.kind, TokenKind::Eof | TokenKind::Error);
                out.push(t);
                if done {
                    break;
                }
            }
            out
        };
        let n = toks.len();
        assert_eq!(toks[n - 2].kind, TokenKind::PlainText);
        assert_eq!(toks[n - 2].lit, "foo ");
        assert_eq!(toks[n - 1].kind, TokenKind::Error);
        assert_eq!(toks[n - 1].lit, "dynamic text value was not closed: eof");
    }

    #[test]
    fn test_unclosed_interpolation_newline() {
        assert_eq!(
            lex_error("\t#{bar\n"),
            "dynamic text value was not closed: newline"
        );
    }

    // =========================================================================
    // Code
    // =========================================================================

    #[test]
    fn test_code_continuation_backslash() {
        let toks = lex_body("\t- if a && \\\n\t\tb {\n");
        assert_eq!(toks[1], tok(TokenKind::SilentScript, "if a &&\nb {"));
    }

    #[test]
    fn test_code_continuation_comma() {
        let toks = lex_body("\t= fmt.Sprint(a,\n\t\tb)\n");
        assert_eq!(toks[1], tok(TokenKind::Script, "fmt.Sprint(a,\nb)"));
    }

    #[test]
    fn test_code_continuation_records_stripped_tabs() {
        let tokens = Lexer::tokenize(&body("\t= fmt.Sprint(a,\n\t\tb)\n\t= x\n")).unwrap();
        let scripts: Vec<&Token> = tokens.iter().filter(|t| t.kind == TokenKind::Script).collect();
        assert_eq!(scripts[0].wrap_indent, 2);
        assert_eq!(scripts[1].wrap_indent, 0);
    }

    #[test]
    fn test_code_continuation_wrong_indent() {
        assert!(lex_error("\t= fmt.Sprint(a,\n\t\t\tb)\n").contains("one level deeper"));
    }

    #[test]
    fn test_commands() {
        let toks = lex_body("\t=@render Card(x)\n\t=@children\n\t=@slot footer\n");
        let got: Vec<_> = toks
            .into_iter()
            .filter(|(k, _)| !matches!(k, TokenKind::Indent | TokenKind::NewLine))
            .collect();
        assert_eq!(
            got,
            vec![
                tok(TokenKind::RenderCommand, "Card(x)"),
                tok(TokenKind::ChildrenCommand, "children"),
                tok(TokenKind::SlotCommand, "footer"),
            ]
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(lex_error("\t=@yield\n"), "unknown command: yield");
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attribute_forms() {
        let toks = lex_body(
            "\t%a{href: \"/x\", disabled?#{off},\n\t\tdata: #{d}, checked, \"aria-label\": `L`, @attributes: #{attrs}}\n",
        );
        let got: Vec<_> = toks[2..toks.len() - 1].to_vec();
        assert_eq!(
            got,
            vec![
                tok(TokenKind::AttrName, "href"),
                tok(TokenKind::AttrOperator, ":"),
                tok(TokenKind::AttrEscapedValue, "/x"),
                tok(TokenKind::AttrName, "disabled"),
                tok(TokenKind::AttrOperator, "?"),
                tok(TokenKind::AttrDynamicValue, "off"),
                tok(TokenKind::AttrName, "data"),
                tok(TokenKind::AttrOperator, ":"),
                tok(TokenKind::AttrDynamicValue, "d"),
                tok(TokenKind::AttrName, "checked"),
                tok(TokenKind::AttrName, "aria-label"),
                tok(TokenKind::AttrOperator, ":"),
                tok(TokenKind::AttrEscapedValue, "L"),
                tok(TokenKind::AttributesCommand, "attrs"),
            ]
        );
    }

    #[test]
    fn test_attribute_value_escapes() {
        let toks = lex_body("\t%p{title: \"say \\\"hi\\\"\"}\n");
        assert_eq!(toks[4], tok(TokenKind::AttrEscapedValue, "say \"hi\""));
    }

    #[test]
    fn test_attributes_not_closed() {
        let err = Lexer::tokenize("@goht T() {\n\t%p{id: \"x\"").unwrap_err();
        assert_eq!(err.message, "attributes were not closed: eof");
    }

    #[test]
    fn test_attribute_value_not_closed() {
        let err = Lexer::tokenize("@goht T() {\n\t%p{id: \"x").unwrap_err();
        assert_eq!(err.message, "attribute value was not closed: eof");
    }

    #[test]
    fn test_boolean_attribute_requires_condition() {
        assert!(lex_error("\t%p{x?\"y\"}\n").contains("boolean"));
    }

    // =========================================================================
    // Filters and comments
    // =========================================================================

    #[test]
    fn test_filter_content() {
        assert_eq!(
            lex_body("\t:javascript\n\t\tif (a) {\n\t\t\tgo(#{x});\n\t\t}\n\t%p\n"),
            vec![
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::FilterStart, "javascript"),
                tok(TokenKind::PlainText, "if (a) {\n"),
                tok(TokenKind::PlainText, "\tgo("),
                tok(TokenKind::DynamicText, "x"),
                tok(TokenKind::PlainText, ");\n"),
                tok(TokenKind::PlainText, "}\n"),
                tok(TokenKind::FilterEnd, ""),
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::Tag, "p"),
                tok(TokenKind::NewLine, "\n"),
            ]
        );
    }

    #[test]
    fn test_filter_text_kinds() {
        let escaped = lex_body("\t:escaped\n\t\t<b>\n");
        assert_eq!(escaped[2], tok(TokenKind::EscapedText, "<b>\n"));
        let preserve = lex_body("\t:preserve\n\t\ta\n\n\t\tb\n");
        assert_eq!(preserve[2], tok(TokenKind::PreserveText, "a\n"));
        assert_eq!(preserve[3], tok(TokenKind::PreserveText, "\nb\n"));
    }

    #[test]
    fn test_unknown_filter() {
        assert_eq!(lex_error("\t:markdown\n"), "unknown filter: markdown");
    }

    #[test]
    fn test_ruby_comment_swallows_nested_lines() {
        assert_eq!(
            lex_body("\t-# note\n\t\t%p hidden\n\n\t\t\tdeeper\n\t%p\n"),
            vec![
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::RubyComment, "note"),
                tok(TokenKind::Indent, "\t"),
                tok(TokenKind::Tag, "p"),
                tok(TokenKind::NewLine, "\n"),
            ]
        );
    }
}
