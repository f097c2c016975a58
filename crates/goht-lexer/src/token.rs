use std::fmt;

/// Token classification for GoHT source.
///
/// Unlike a plain markup lexer, every token keeps the literal text it was
/// built from; the parser and the code generator read values from `lit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structure
    Eof,
    Error,
    NewLine,
    Indent,

    // Go source
    Package,
    Import,
    GoCode,

    // Template boundaries
    TemplateStart,
    TemplateEnd,

    // Markup
    Doctype,
    Tag,
    Id,
    Class,
    ObjectRef,
    AttrName,
    AttrOperator,
    AttrEscapedValue,
    AttrDynamicValue,
    Comment,
    RubyComment,
    VoidTag,
    NukeInnerWhitespace,
    NukeOuterWhitespace,

    // Text
    PlainText,
    PreserveText,
    EscapedText,
    DynamicText,
    Unescaped,

    // Code and commands
    Script,
    SilentScript,
    RenderCommand,
    ChildrenCommand,
    SlotCommand,
    AttributesCommand,

    // Filters
    FilterStart,
    FilterEnd,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "EOF",
            TokenKind::Error => "Error",
            TokenKind::NewLine => "NewLine",
            TokenKind::Indent => "Indent",
            TokenKind::Package => "Package",
            TokenKind::Import => "Import",
            TokenKind::GoCode => "GoCode",
            TokenKind::TemplateStart => "TemplateStart",
            TokenKind::TemplateEnd => "TemplateEnd",
            TokenKind::Doctype => "Doctype",
            TokenKind::Tag => "Tag",
            TokenKind::Id => "Id",
            TokenKind::Class => "Class",
            TokenKind::ObjectRef => "ObjectRef",
            TokenKind::AttrName => "AttrName",
            TokenKind::AttrOperator => "AttrOperator",
            TokenKind::AttrEscapedValue => "AttrEscapedValue",
            TokenKind::AttrDynamicValue => "AttrDynamicValue",
            TokenKind::Comment => "Comment",
            TokenKind::RubyComment => "RubyComment",
            TokenKind::VoidTag => "VoidTag",
            TokenKind::NukeInnerWhitespace => "NukeInnerWhitespace",
            TokenKind::NukeOuterWhitespace => "NukeOuterWhitespace",
            TokenKind::PlainText => "PlainText",
            TokenKind::PreserveText => "PreserveText",
            TokenKind::EscapedText => "EscapedText",
            TokenKind::DynamicText => "DynamicText",
            TokenKind::Unescaped => "Unescaped",
            TokenKind::Script => "Script",
            TokenKind::SilentScript => "SilentScript",
            TokenKind::RenderCommand => "RenderCommand",
            TokenKind::ChildrenCommand => "ChildrenCommand",
            TokenKind::SlotCommand => "SlotCommand",
            TokenKind::AttributesCommand => "AttributesCommand",
            TokenKind::FilterStart => "FilterStart",
            TokenKind::FilterEnd => "FilterEnd",
        };
        f.write_str(name)
    }
}

/// A token produced by the GoHT lexer.
///
/// `line` and `column` are 1-based and point at the first character of
/// `lit` in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lit: String,
    pub line: usize,
    pub column: usize,
    /// Tabs removed from the start of every line of `lit` after the first.
    pub wrap_indent: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lit: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            lit: lit.into(),
            line,
            column,
            wrap_indent: 0,
        }
    }

    /// Indent level carried by an `Indent` token (number of tabs).
    pub fn indent_level(&self) -> usize {
        self.lit.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::NewLine => write!(f, "NewLine"),
            TokenKind::Error => write!(f, "Error({})", self.lit),
            kind => write!(f, "{kind}({:?})", self.lit),
        }
    }
}

/// HTML5 void elements (self-closing, no children).
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Check if a tag name is an HTML5 void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}
