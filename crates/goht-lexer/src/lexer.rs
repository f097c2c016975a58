use std::collections::VecDeque;

use crate::token::{Token, TokenKind};
use crate::{ego, haml, slim, LexerError};

/// Sentinel returned by `peek` and `next` at end of input.
pub(crate) const EOF: char = '\0';

/// A lexer state: consumes some input, emits zero or more tokens and names
/// the state to continue with. `None` ends the token stream.
#[derive(Clone, Copy)]
pub struct StateFn(pub(crate) fn(&mut Lexer) -> Option<StateFn>);

/// GoHT source lexer.
///
/// Pull-based: `next_token` runs state functions until at least one token is
/// queued. Go-level lines are lexed here; template bodies are handed to the
/// dialect state functions in `haml`, `slim` and `ego`, which hand control
/// back through `lex_go_line_end` once the template closes.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Column of the newline that ended each line, indexed by `line - 1`.
    ledger: Vec<usize>,
    capture: String,
    capture_start: Option<(usize, usize)>,
    /// Tabs dropped from continuation lines of the current capture.
    wrap_indent: usize,
    /// Indent level of the most recent template body line.
    pub(crate) indent: usize,
    tokens: VecDeque<Token>,
    state: Option<StateFn>,
}

impl Lexer {
    /// Create a new lexer for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            ledger: Vec::new(),
            capture: String::new(),
            capture_start: None,
            wrap_indent: 0,
            indent: 0,
            tokens: VecDeque::new(),
            state: Some(StateFn(lex_go_line_start)),
        }
    }

    /// Tokenize the entire source into a vector of tokens ending with `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Error => {
                    return Err(LexerError {
                        message: token.lit,
                        line: token.line,
                        column: token.column,
                    })
                }
                TokenKind::Eof => {
                    tokens.push(token);
                    return Ok(tokens);
                }
                _ => tokens.push(token),
            }
        }
    }

    /// Produce the next token. Once the stream has ended (normally or after
    /// an `Error` token) every call returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        while self.tokens.is_empty() {
            match self.state.take() {
                Some(StateFn(state)) => self.state = state(self),
                None => {
                    return Token::new(TokenKind::Eof, "", self.line, self.column);
                }
            }
        }
        match self.tokens.pop_front() {
            Some(token) => token,
            None => Token::new(TokenKind::Eof, "", self.line, self.column),
        }
    }

    // --- Cursor ---

    pub(crate) fn next(&mut self) -> char {
        let Some(&ch) = self.chars.get(self.pos) else {
            return EOF;
        };
        self.pos += 1;
        if ch == '\n' {
            if self.ledger.len() < self.line {
                self.ledger.resize(self.line, 0);
            }
            self.ledger[self.line - 1] = self.column;
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    /// Step back over the character returned by the last `next`, restoring
    /// the previous line's column when crossing a newline.
    pub(crate) fn backup(&mut self) {
        if self.pos == 0 {
            return;
        }
        self.pos -= 1;
        if self.chars[self.pos] == '\n' {
            self.line -= 1;
            self.column = self.ledger.get(self.line - 1).copied().unwrap_or(1);
        } else {
            self.column -= 1;
        }
    }

    pub(crate) fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or(EOF)
    }

    /// Look at the next `n` characters without consuming them.
    pub(crate) fn peek_ahead(&self, n: usize) -> String {
        self.chars[self.pos..].iter().take(n).collect()
    }

    pub(crate) fn peek_str(&self, s: &str) -> bool {
        let mut i = self.pos;
        for ch in s.chars() {
            if self.chars.get(i) != Some(&ch) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Character `n` positions past the cursor.
    pub(crate) fn peek_at(&self, n: usize) -> char {
        self.chars.get(self.pos + n).copied().unwrap_or(EOF)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    // --- Capture ---

    fn capture_char(&mut self, ch: char) {
        if self.capture_start.is_none() {
            self.capture_start = Some((self.line, self.column));
        }
        self.capture.push(ch);
    }

    pub(crate) fn accept(&mut self, valid: &str) -> bool {
        let ch = self.peek();
        if ch != EOF && valid.contains(ch) {
            self.accept_one();
            return true;
        }
        false
    }

    pub(crate) fn accept_one(&mut self) {
        let (line, column) = (self.line, self.column);
        let ch = self.next();
        if ch != EOF {
            if self.capture_start.is_none() {
                self.capture_start = Some((line, column));
            }
            self.capture.push(ch);
        }
    }

    pub(crate) fn accept_run(&mut self, valid: &str) {
        while self.accept(valid) {}
    }

    /// Accept characters until one from `invalid` (or end of input) is next.
    pub(crate) fn accept_until(&mut self, invalid: &str) {
        loop {
            let ch = self.peek();
            if ch == EOF || invalid.contains(ch) {
                return;
            }
            self.accept_one();
        }
    }

    pub(crate) fn accept_while(&mut self, pred: impl Fn(char) -> bool) {
        loop {
            let ch = self.peek();
            if ch == EOF || !pred(ch) {
                return;
            }
            self.accept_one();
        }
    }

    pub(crate) fn accept_ahead(&mut self, n: usize) {
        for _ in 0..n {
            if self.at_eof() {
                return;
            }
            self.accept_one();
        }
    }

    pub(crate) fn skip(&mut self) {
        self.next();
    }

    pub(crate) fn skip_run(&mut self, valid: &str) {
        loop {
            let ch = self.peek();
            if ch == EOF || !valid.contains(ch) {
                return;
            }
            self.next();
        }
    }

    pub(crate) fn skip_until(&mut self, invalid: &str) {
        loop {
            let ch = self.peek();
            if ch == EOF || invalid.contains(ch) {
                return;
            }
            self.next();
        }
    }

    /// Skip `n` tabs at the start of a continuation line, remembering them
    /// for the token being captured.
    pub(crate) fn skip_wrap_indent(&mut self, n: usize) {
        self.skip_ahead(n);
        self.wrap_indent = n;
    }

    pub(crate) fn skip_ahead(&mut self, n: usize) {
        for _ in 0..n {
            self.next();
        }
    }

    pub(crate) fn capture(&self) -> &str {
        &self.capture
    }

    pub(crate) fn push_capture(&mut self, ch: char) {
        self.capture_char(ch);
    }

    pub(crate) fn pop_capture(&mut self) -> Option<char> {
        let ch = self.capture.pop();
        if self.capture.is_empty() {
            self.capture_start = None;
        }
        ch
    }

    pub(crate) fn trim_capture_end(&mut self) {
        let len = self.capture.trim_end().len();
        self.capture.truncate(len);
        if self.capture.is_empty() {
            self.capture_start = None;
        }
    }

    /// Line and column of the pending capture, or of the cursor when
    /// nothing has been captured yet.
    pub(crate) fn position(&self) -> (usize, usize) {
        self.capture_start.unwrap_or((self.line, self.column))
    }

    pub(crate) fn emit(&mut self, kind: TokenKind) {
        let (line, column) = self.position();
        let lit = std::mem::take(&mut self.capture);
        self.capture_start = None;
        let mut token = Token::new(kind, lit, line, column);
        token.wrap_indent = std::mem::take(&mut self.wrap_indent);
        self.tokens.push_back(token);
    }

    pub(crate) fn ignore(&mut self) {
        self.capture.clear();
        self.capture_start = None;
        self.wrap_indent = 0;
    }

    /// Emit an `Error` token at the cursor and end the stream.
    pub(crate) fn errorf(&mut self, message: impl Into<String>) -> Option<StateFn> {
        self.ignore();
        self.tokens
            .push_back(Token::new(TokenKind::Error, message, self.line, self.column));
        None
    }

    /// Check a template body indent against the current level.
    ///
    /// Indents may only use tabs and may only go one level deeper than the
    /// previous line. Shallower or equal indents are dedents for the parser.
    pub(crate) fn validate_indent(&mut self, indent: &str) -> Result<(), String> {
        if indent.contains(' ') {
            return Err(
                "the line was indented using spaces, templates must be indented using tabs".into(),
            );
        }
        let level = indent.chars().count();
        if level > self.indent + 1 {
            return Err(format!(
                "the line was indented {} levels deeper than the previous line",
                level - self.indent
            ));
        }
        self.indent = level;
        Ok(())
    }
}

// --- Go source states ---

pub(crate) fn lex_go_line_start(l: &mut Lexer) -> Option<StateFn> {
    match l.peek() {
        EOF => None,
        '\r' | '\n' => lex_go_line_end(l),
        _ if l.peek_str("package ") => {
            l.skip_ahead("package".len());
            l.skip_run(" \t");
            l.accept_until("\r\n");
            l.trim_capture_end();
            l.emit(TokenKind::Package);
            Some(StateFn(lex_go_line_end))
        }
        _ if l.peek_str("import ") || l.peek_str("import(") => lex_import(l),
        _ if l.peek_str("@goht ") => lex_template(l, "@goht", StateFn(haml::lex_line_start)),
        _ if l.peek_str("@haml ") => lex_template(l, "@haml", StateFn(haml::lex_line_start)),
        _ if l.peek_str("@slim ") => lex_template(l, "@slim", StateFn(slim::lex_line_start)),
        _ if l.peek_str("@ego ") => lex_template(l, "@ego", StateFn(ego::lex_line_start)),
        _ => {
            l.accept_until("\r\n");
            l.emit(TokenKind::GoCode);
            Some(StateFn(lex_go_line_end))
        }
    }
}

pub(crate) fn lex_go_line_end(l: &mut Lexer) -> Option<StateFn> {
    if l.peek() == '\r' {
        l.skip();
    }
    match l.peek() {
        '\n' => {
            l.accept_one();
            l.emit(TokenKind::NewLine);
            Some(StateFn(lex_go_line_start))
        }
        EOF => None,
        _ => Some(StateFn(lex_go_line_start)),
    }
}

fn lex_import(l: &mut Lexer) -> Option<StateFn> {
    l.skip_ahead("import".len());
    l.skip_run(" \t");
    if l.peek() != '(' {
        l.accept_until("\r\n");
        l.trim_capture_end();
        l.emit(TokenKind::Import);
        return Some(StateFn(lex_go_line_end));
    }

    l.skip();
    loop {
        l.skip_run(" \t\r\n");
        match l.peek() {
            EOF => return l.errorf("import block was not closed: eof"),
            ')' => {
                l.skip();
                return Some(StateFn(lex_go_line_end));
            }
            _ => {
                l.accept_until("\r\n)");
                l.trim_capture_end();
                if l.capture().starts_with("//") {
                    l.ignore();
                } else {
                    l.emit(TokenKind::Import);
                }
            }
        }
    }
}

/// Lex `@goht Name(params) {` and hand the body to the dialect.
fn lex_template(l: &mut Lexer, keyword: &str, body: StateFn) -> Option<StateFn> {
    l.skip_ahead(keyword.len());
    l.skip_run(" \t");
    l.accept_until("(\r\n{");
    if l.peek() != '(' {
        return l.errorf("template declaration is missing its parameter list");
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    loop {
        let ch = l.peek();
        match (ch, quote) {
            (EOF, _) | ('\n', _) => {
                return l.errorf("template declaration was not closed: missing ')'");
            }
            ('\\', Some(q)) if q != '`' => {
                l.accept_ahead(2);
                continue;
            }
            (c, Some(q)) if c == q => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'' | '`', None) => quote = Some(ch),
            ('(', None) => depth += 1,
            (')', None) => depth -= 1,
            _ => {}
        }
        l.accept_one();
        if depth == 0 && quote.is_none() {
            break;
        }
    }

    l.skip_run(" \t");
    if l.peek() != '{' {
        return l.errorf("template declaration must end with '{'");
    }
    l.skip();
    l.skip_run(" \t\r");
    match l.peek() {
        '\n' => l.skip(),
        EOF => {}
        _ => return l.errorf("template declaration must be followed by a new line"),
    }

    l.emit(TokenKind::TemplateStart);
    l.indent = 0;
    Some(body)
}
