//! Indentation-aware parser for GoHT files.
//!
//! Pulls tokens from `goht_lexer::Lexer` one at a time and builds a `Tree`.
//! Open nodes are kept on a stack; the node on top decides how the next
//! token is consumed. Indent tokens close nodes whose indent is at or below
//! the new line's indent.

use goht_lexer::{is_void_element, Lexer, Token, TokenKind};

use crate::node::{
    Attribute, AttributeKind, Element, Filter, FilterKind, NodeId, NodeKind, RawCode, Text,
    TextKind, Tree,
};
use crate::ParseError;

/// GoHT parser.
pub struct Parser {
    lexer: Lexer,
    peeked: Option<Token>,
    tree: Tree,
    stack: Vec<NodeId>,
    /// Indent level of the body line being parsed.
    line_indent: usize,
}

impl Parser {
    /// Create a new parser for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
            tree: Tree::new(),
            stack: vec![NodeId::ROOT],
            line_indent: 0,
        }
    }

    /// Parse source code into a node tree.
    pub fn parse(source: &str) -> Result<Tree, ParseError> {
        let mut parser = Parser::new(source);
        parser.run()?;
        tracing::debug!(
            package = %parser.tree.root().package,
            templates = parser.tree.templates().len(),
            nodes = parser.tree.len(),
            "parsed goht source"
        );
        Ok(parser.tree)
    }

    fn run(&mut self) -> Result<(), ParseError> {
        loop {
            let current = self.current();
            let done = match self.tree[current].kind {
                NodeKind::Root(_) => self.parse_root()?,
                NodeKind::Template => {
                    self.parse_template(current)?;
                    false
                }
                NodeKind::Element(_) => {
                    self.parse_element(current)?;
                    false
                }
                NodeKind::Unescape => {
                    self.parse_unescape(current)?;
                    false
                }
                NodeKind::Filter(_) => {
                    self.parse_filter()?;
                    false
                }
                _ => {
                    self.handle_node(current)?;
                    false
                }
            };
            if done {
                return Ok(());
            }
        }
    }

    // =========================================================================
    // Root and templates
    // =========================================================================

    /// Returns `true` once the end of input is reached.
    fn parse_root(&mut self) -> Result<bool, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Eof => return Ok(true),
            TokenKind::Package => self.tree.root_mut().package = token.lit,
            TokenKind::Import => {
                self.tree.root_mut().imports.insert(token.lit);
            }
            TokenKind::GoCode => self.append_raw_code(token, true),
            TokenKind::NewLine => self.append_raw_code(token, false),
            TokenKind::TemplateStart => {
                let id = self.tree.add(NodeId::ROOT, NodeKind::Template, 0, token);
                self.line_indent = 0;
                self.push(id);
            }
            _ => return Err(unexpected(&token)),
        }
        Ok(false)
    }

    /// Go code joins the trailing raw code block or starts a new one.
    /// Newlines only start a block right after a template.
    fn append_raw_code(&mut self, token: Token, starts_block: bool) {
        let last = self.tree.last_child(NodeId::ROOT);
        if let Some(last) = last {
            if let NodeKind::RawCode(raw) = &mut self.tree[last].kind {
                raw.tokens.push(token);
                return;
            }
        }
        let after_template =
            last.is_some_and(|id| matches!(self.tree[id].kind, NodeKind::Template));
        if starts_block || after_template {
            let raw = RawCode {
                tokens: vec![token.clone()],
            };
            self.tree.add(NodeId::ROOT, NodeKind::RawCode(raw), 0, token);
        }
    }

    fn parse_template(&mut self, id: NodeId) -> Result<(), ParseError> {
        if self.peek()?.kind == TokenKind::TemplateEnd {
            self.next()?;
            self.pop()?;
            return Ok(());
        }
        self.handle_node(id)
    }

    // =========================================================================
    // Shared dispatch
    // =========================================================================

    /// Consume the next token as content of block node `id`.
    fn handle_node(&mut self, id: NodeId) -> Result<(), ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::RubyComment => {
                self.next()?;
            }
            TokenKind::NewLine => {
                self.next()?;
                self.add_leaf(id, NodeKind::NewLine, token);
            }
            TokenKind::Indent => {
                let level = token.indent_level();
                let indent = self.tree[id].indent;
                if level <= indent {
                    return self.back_to_indent(level - 1);
                }
                if level > indent + 1 {
                    return Err(error_at(
                        &token,
                        format!(
                            "illegal nesting: the line is indented {} levels deeper than its parent",
                            level - indent
                        ),
                    ));
                }
                if let NodeKind::Element(el) = &self.tree[id].kind {
                    if el.disallow_children {
                        let reason = if el.is_self_closing {
                            "self-closing tags cannot have nested content"
                        } else {
                            "tags with inline content cannot have nested content"
                        };
                        return Err(error_at(&token, format!("illegal nesting: {reason}")));
                    }
                }
                self.next()?;
                self.line_indent = level;
            }
            TokenKind::Tag => {
                self.next()?;
                let element = Element::new(token.lit.clone());
                let child = self.add_leaf(id, NodeKind::Element(element), token);
                self.push(child);
            }
            TokenKind::Id | TokenKind::Class => {
                let child = self.add_leaf(id, NodeKind::Element(Element::new("div")), token);
                self.push(child);
            }
            TokenKind::Doctype => {
                self.next()?;
                self.add_leaf(id, NodeKind::Doctype, token);
            }
            TokenKind::Comment => {
                self.next()?;
                let block = token.lit.is_empty();
                let child = self.add_leaf(id, NodeKind::Comment, token);
                if block {
                    self.push(child);
                }
            }
            TokenKind::Unescaped => {
                self.next()?;
                let child = self.add_leaf(id, NodeKind::Unescape, token);
                self.push(child);
            }
            TokenKind::PlainText
            | TokenKind::DynamicText
            | TokenKind::PreserveText
            | TokenKind::EscapedText => {
                self.next()?;
                self.add_text(id, token);
            }
            TokenKind::Script => {
                self.next()?;
                self.add_leaf(id, NodeKind::OutputScript, token);
            }
            TokenKind::SilentScript => {
                self.next()?;
                self.add_code_block(id, NodeKind::SilentScript, token)?;
            }
            TokenKind::RenderCommand => {
                self.next()?;
                self.add_code_block(id, NodeKind::RenderCommand, token)?;
            }
            TokenKind::ChildrenCommand => {
                self.next()?;
                self.add_leaf(id, NodeKind::ChildrenCommand, token);
            }
            TokenKind::SlotCommand => {
                self.next()?;
                self.add_leaf(id, NodeKind::SlotCommand, token);
            }
            TokenKind::FilterStart => {
                self.next()?;
                let Some(kind) = FilterKind::from_name(&token.lit) else {
                    return Err(error_at(&token, format!("unknown filter: {}", token.lit)));
                };
                let child = self.add_leaf(id, NodeKind::Filter(Filter { kind }), token);
                self.push(child);
            }
            TokenKind::TemplateEnd => self.back_to_type("Template")?,
            TokenKind::Eof => return Err(error_at(&token, "template is incomplete")),
            _ => return Err(unexpected(&token)),
        }
        Ok(())
    }

    fn add_leaf(&mut self, parent: NodeId, kind: NodeKind, token: Token) -> NodeId {
        self.tree.add(parent, kind, self.line_indent, token)
    }

    fn add_text(&mut self, parent: NodeId, token: Token) -> NodeId {
        let kind = match token.kind {
            TokenKind::DynamicText => TextKind::Dynamic,
            TokenKind::PreserveText => TextKind::Preserve,
            TokenKind::EscapedText => TextKind::Escaped,
            _ => TextKind::Plain,
        };
        self.add_leaf(parent, NodeKind::Text(Text { kind }), token)
    }

    /// Silent scripts and render commands take children only when the line
    /// after them is indented deeper. The newline ending their own line is
    /// consumed, in Ego as well as Haml and Slim.
    fn add_code_block(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        token: Token,
    ) -> Result<(), ParseError> {
        let id = self.add_leaf(parent, kind, token);
        if self.peek()?.kind == TokenKind::NewLine {
            self.next()?;
        }
        let line_indent = self.line_indent;
        let next = self.peek()?;
        if next.kind == TokenKind::Indent && next.indent_level() > line_indent {
            self.push(id);
        }
        Ok(())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn parse_element(&mut self, id: NodeId) -> Result<(), ParseError> {
        let complete = matches!(&self.tree[id].kind, NodeKind::Element(el) if el.is_complete);
        if complete {
            return self.handle_node(id);
        }

        let token = self.next()?;
        match token.kind {
            TokenKind::Id => self.element(id).id = Some(token),
            TokenKind::Class => self.element(id).classes.push(token),
            TokenKind::ObjectRef => self.element(id).object_ref = Some(token),
            TokenKind::AttrName => self.parse_attribute(id, token)?,
            TokenKind::AttributesCommand => self.element(id).attributes_command = Some(token),
            TokenKind::VoidTag => self.element(id).is_self_closing = true,
            TokenKind::NukeInnerWhitespace => self.element(id).nuke_inner_whitespace = true,
            TokenKind::NukeOuterWhitespace => self.element(id).nuke_outer_whitespace = true,
            TokenKind::PlainText | TokenKind::DynamicText => {
                self.element(id).has_inline_content = true;
                self.add_text(id, token);
            }
            TokenKind::Script => {
                self.element(id).has_inline_content = true;
                self.add_leaf(id, NodeKind::OutputScript, token);
            }
            TokenKind::Unescaped => {
                self.element(id).has_inline_content = true;
                let child = self.add_leaf(id, NodeKind::Unescape, token);
                self.push(child);
            }
            TokenKind::NewLine => self.complete_element(id, token)?,
            TokenKind::Eof => return Err(error_at(&token, "template is incomplete")),
            _ => return Err(unexpected(&token)),
        }
        Ok(())
    }

    /// The element's line is done. A block element gets the newline as its
    /// first child; otherwise the newline follows the element in its parent.
    fn complete_element(&mut self, id: NodeId, newline: Token) -> Result<(), ParseError> {
        let el = self.element(id);
        el.is_complete = true;
        if is_void_element(&el.tag) {
            el.is_self_closing = true;
        }
        let inline = el.has_inline_content || el.is_self_closing;
        el.disallow_children = inline;
        if el.is_self_closing && el.has_inline_content {
            return Err(error_at(&self.tree[id].token, "void tags cannot have content"));
        }

        let target = if inline {
            self.tree[id].parent.unwrap_or(NodeId::ROOT)
        } else {
            id
        };
        self.add_leaf(target, NodeKind::NewLine, newline);
        Ok(())
    }

    fn parse_attribute(&mut self, id: NodeId, name: Token) -> Result<(), ParseError> {
        let mut attribute = Attribute {
            name,
            kind: AttributeKind::Presence,
            value: None,
        };
        if self.peek()?.kind == TokenKind::AttrOperator {
            let operator = self.next()?;
            let value = self.next()?;
            if !matches!(
                value.kind,
                TokenKind::AttrEscapedValue | TokenKind::AttrDynamicValue
            ) {
                return Err(unexpected(&value));
            }
            attribute.kind = if operator.lit == "?" {
                AttributeKind::Boolean
            } else {
                AttributeKind::Value
            };
            attribute.value = Some(value);
        }
        let key = attribute.name.lit.clone();
        self.element(id).attributes.insert(key, attribute);
        Ok(())
    }

    fn element(&mut self, id: NodeId) -> &mut Element {
        match &mut self.tree[id].kind {
            NodeKind::Element(el) => el,
            _ => unreachable!("element state on a non-element node"),
        }
    }

    // =========================================================================
    // Unescape and filters
    // =========================================================================

    /// Collects text until a script, a newline or anything else ends it.
    fn parse_unescape(&mut self, id: NodeId) -> Result<(), ParseError> {
        let kind = self.peek()?.kind;
        match kind {
            TokenKind::PlainText | TokenKind::DynamicText => {
                let token = self.next()?;
                self.add_text(id, token);
                Ok(())
            }
            TokenKind::Script => {
                let token = self.next()?;
                self.add_leaf(id, NodeKind::OutputScript, token);
                self.back_to_parent()
            }
            _ => self.back_to_parent(),
        }
    }

    fn parse_filter(&mut self) -> Result<(), ParseError> {
        let token = self.next()?;
        let current = self.current();
        match token.kind {
            TokenKind::PlainText
            | TokenKind::DynamicText
            | TokenKind::PreserveText
            | TokenKind::EscapedText => {
                self.add_text(current, token);
                Ok(())
            }
            TokenKind::FilterEnd => self.back_to_parent(),
            TokenKind::Eof => Err(error_at(&token, "template is incomplete")),
            _ => Err(unexpected(&token)),
        }
    }

    // =========================================================================
    // Stack
    // =========================================================================

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId::ROOT)
    }

    fn push(&mut self, id: NodeId) {
        tracing::trace!(node = self.tree[id].kind.name(), indent = self.tree[id].indent, "open");
        self.stack.push(id);
    }

    fn pop(&mut self) -> Result<(), ParseError> {
        if self.stack.len() <= 1 {
            let token = self.tree[self.current()].token.clone();
            return Err(error_at(&token, "no parent node to return to"));
        }
        if let Some(id) = self.stack.pop() {
            tracing::trace!(node = self.tree[id].kind.name(), "close");
            self.close(id);
        }
        Ok(())
    }

    fn back_to_parent(&mut self) -> Result<(), ParseError> {
        self.pop()
    }

    /// Pop until the current node is a `name` node.
    fn back_to_type(&mut self, name: &str) -> Result<(), ParseError> {
        while self.tree[self.current()].kind.name() != name {
            if self.stack.len() <= 1 {
                let token = self.peek()?.clone();
                return Err(error_at(&token, format!("no parent node of type {name}")));
            }
            self.pop()?;
        }
        Ok(())
    }

    /// Pop until the current node's indent is at most `indent`.
    fn back_to_indent(&mut self, indent: usize) -> Result<(), ParseError> {
        while self.tree[self.current()].indent > indent {
            if self.stack.len() <= 1 {
                let token = self.peek()?.clone();
                return Err(error_at(&token, format!("no parent node at indent {indent}")));
            }
            self.pop()?;
        }
        Ok(())
    }

    /// Line breaks around closed elements and block comments: a lone
    /// completing newline moves to the parent; block content gets a line
    /// break after the closing tag.
    fn close(&mut self, id: NodeId) {
        let is_block = match &self.tree[id].kind {
            NodeKind::Element(el) => !el.disallow_children,
            NodeKind::Comment => true,
            _ => false,
        };
        if !is_block {
            return;
        }
        let Some(parent) = self.tree[id].parent else {
            return;
        };
        let children = self.tree.children(id);
        if children.len() == 1 && matches!(self.tree[children[0]].kind, NodeKind::NewLine) {
            let newline = children[0];
            self.tree.reparent(newline, parent);
        } else if children.len() > 1 {
            let mut token = self.tree[id].token.clone();
            token.kind = TokenKind::NewLine;
            token.lit = "\n".into();
            let indent = self.tree[id].indent;
            self.tree.add(parent, NodeKind::NewLine, indent, token);
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    fn fill(&mut self) -> Result<(), ParseError> {
        if self.peeked.is_none() {
            let token = self.lexer.next_token();
            if token.kind == TokenKind::Error {
                return Err(ParseError {
                    message: token.lit,
                    line: token.line,
                    column: token.column,
                });
            }
            self.peeked = Some(token);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        self.fill()?;
        match &self.peeked {
            Some(token) => Ok(token),
            None => unreachable!("filled above"),
        }
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        self.fill()?;
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => unreachable!("filled above"),
        }
    }
}

fn error_at(token: &Token, message: impl Into<String>) -> ParseError {
    ParseError {
        message: message.into(),
        line: token.line,
        column: token.column,
    }
}

fn unexpected(token: &Token) -> ParseError {
    error_at(token, format!("unexpected token: {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Tree {
        Parser::parse(source).unwrap()
    }

    fn parse_error(source: &str) -> ParseError {
        Parser::parse(source).unwrap_err()
    }

    fn haml(body: &str) -> Tree {
        parse(&format!("package main\n\n@goht T() {{\n{body}}}\n"))
    }

    /// Children of the first template as `(kind, literal)` pairs, one level deep.
    fn template_children(tree: &Tree) -> Vec<(&'static str, String)> {
        let template = tree.templates()[0];
        tree.children(template)
            .iter()
            .map(|id| (tree[*id].kind.name(), tree[*id].token.lit.clone()))
            .collect()
    }

    fn first_element(tree: &Tree) -> (NodeId, &Element) {
        let template = tree.templates()[0];
        for id in tree.children(template) {
            if let NodeKind::Element(el) = &tree[*id].kind {
                return (*id, el);
            }
        }
        panic!("no element in template");
    }

    fn outline(tree: &Tree) -> Vec<(usize, &'static str)> {
        let mut out = Vec::new();
        tree.walk(|_, node: &Node, depth| out.push((depth, node.kind.name())));
        out
    }

    // =========================================================================
    // Go source
    // =========================================================================

    #[test]
    fn test_package_and_imports() {
        let tree = parse("package foo\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\nimport \"fmt\"\n");
        assert_eq!(tree.root().package, "foo");
        let imports: Vec<&str> = tree.root().imports.iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["\"fmt\"", "\"strings\""]);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_raw_code_blocks() {
        let tree = parse("package foo\n\nvar a = 1\n\n@goht T() {\n}\n\nvar b = 2\n");
        let root_children = tree.children(NodeId::ROOT);
        assert_eq!(root_children.len(), 3);
        match &tree[root_children[0]].kind {
            NodeKind::RawCode(raw) => assert_eq!(raw.text(), "var a = 1\n\n"),
            other => panic!("expected raw code, got {other:?}"),
        }
        match &tree[root_children[2]].kind {
            NodeKind::RawCode(raw) => assert_eq!(raw.text(), "\n\nvar b = 2\n"),
            other => panic!("expected raw code, got {other:?}"),
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_element_with_text() {
        let tree = haml("\t%p foo\n");
        let (id, el) = first_element(&tree);
        assert_eq!(el.tag, "p");
        assert!(el.has_inline_content);
        assert!(el.disallow_children);
        let children = tree.children(id);
        assert_eq!(children.len(), 1);
        assert_eq!(tree[children[0]].kind, NodeKind::Text(Text { kind: TextKind::Plain }));
        assert_eq!(tree[children[0]].token.lit, "foo");
        assert_eq!(
            template_children(&tree),
            vec![("Element", "p".to_string()), ("NewLine", "\n".to_string())]
        );
    }

    #[test]
    fn test_element_static_attribute() {
        let tree = haml("\t%p{id:\"bar\"}\n");
        let (_, el) = first_element(&tree);
        let id = &el.attributes["id"];
        assert_eq!(id.kind, AttributeKind::Value);
        assert!(!id.is_dynamic());
        assert_eq!(id.value.as_ref().map(|v| v.lit.as_str()), Some("bar"));
    }

    #[test]
    fn test_element_attribute_kinds_keep_order() {
        let tree = haml("\t%input{type: \"text\", disabled?#{off}, required, value: #{v}}\n");
        let (_, el) = first_element(&tree);
        let got: Vec<(&str, AttributeKind)> = el
            .attributes
            .values()
            .map(|a| (a.name.lit.as_str(), a.kind))
            .collect();
        assert_eq!(
            got,
            vec![
                ("type", AttributeKind::Value),
                ("disabled", AttributeKind::Boolean),
                ("required", AttributeKind::Presence),
                ("value", AttributeKind::Value),
            ]
        );
        assert!(el.is_self_closing);
    }

    #[test]
    fn test_implicit_div() {
        let tree = haml("\t#main.a.b[user]\n");
        let (_, el) = first_element(&tree);
        assert_eq!(el.tag, "div");
        assert_eq!(el.id.as_ref().map(|t| t.lit.as_str()), Some("main"));
        let classes: Vec<&str> = el.classes.iter().map(|t| t.lit.as_str()).collect();
        assert_eq!(classes, vec!["a", "b"]);
        assert_eq!(el.object_ref.as_ref().map(|t| t.lit.as_str()), Some("user"));
    }

    #[test]
    fn test_nested_elements() {
        let tree = haml("\t%div\n\t\t%p a\n\t\t%p b\n\t%span\n");
        assert_eq!(
            outline(&tree),
            vec![
                (0, "Root"),
                (1, "Template"),
                (2, "Element"),
                (3, "NewLine"),
                (3, "Element"),
                (4, "Text"),
                (3, "NewLine"),
                (3, "Element"),
                (4, "Text"),
                (3, "NewLine"),
                (2, "NewLine"),
                (2, "Element"),
                (2, "NewLine"),
            ]
        );
    }

    #[test]
    fn test_empty_element_hands_newline_to_parent() {
        let tree = haml("\t%div\n\t%p\n");
        assert_eq!(
            template_children(&tree),
            vec![
                ("Element", "div".to_string()),
                ("NewLine", "\n".to_string()),
                ("Element", "p".to_string()),
                ("NewLine", "\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_unescape() {
        let tree = haml("\t%p!= raw\n");
        let (id, _) = first_element(&tree);
        let unescape = tree.children(id)[0];
        assert_eq!(tree[unescape].kind, NodeKind::Unescape);
        assert_eq!(tree[tree.children(unescape)[0]].kind, NodeKind::OutputScript);
    }

    // =========================================================================
    // Nesting errors
    // =========================================================================

    #[test]
    fn test_illegal_nesting_inline_content() {
        let err = parse_error("@goht T() {\n\t%p foo\n\t\t%span\n}\n");
        assert!(err.message.starts_with("illegal nesting"));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_illegal_nesting_self_closing() {
        let err = parse_error("@goht T() {\n\t%br\n\t\t%span\n}\n");
        assert!(err.message.contains("self-closing"));
    }

    #[test]
    fn test_void_tag_with_inline_content() {
        let err = parse_error("@goht T() {\n\t%br hello\n}\n");
        assert_eq!(err.to_string(), "[2:3]: void tags cannot have content");

        let err = parse_error("@goht T() {\n\t%p ok\n\t%img= src\n}\n");
        assert_eq!((err.line, err.message.as_str()), (3, "void tags cannot have content"));

        let err = parse_error("@slim T() {\n\tbr text\n}\n");
        assert_eq!(err.message, "void tags cannot have content");
    }

    #[test]
    fn test_nesting_under_text() {
        let err = parse_error("@goht T() {\n\tfoo\n\t\tbar\n}\n");
        assert!(err.message.starts_with("illegal nesting"));
    }

    #[test]
    fn test_template_incomplete() {
        let err = parse_error("@goht T() {\n\t%p foo\n");
        assert_eq!(err.message, "template is incomplete");
    }

    #[test]
    fn test_lexer_error_is_parse_error() {
        let err = parse_error("@goht T() {\n  %p\n}\n");
        assert_eq!(
            err.message,
            "the line was indented using spaces, templates must be indented using tabs"
        );
        assert_eq!(err.to_string(), format!("[2:3]: {}", err.message));
    }

    // =========================================================================
    // Code blocks
    // =========================================================================

    #[test]
    fn test_silent_script_block() {
        let tree = haml("\t- if x {\n\t\t%p a\n\t- } else {\n\t\t%p b\n\t- }\n");
        let children = template_children(&tree);
        let kinds: Vec<&str> = children.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec!["SilentScript", "SilentScript", "SilentScript"]);
        let template = tree.templates()[0];
        let first = tree.children(template)[0];
        assert_eq!(tree.children(first).len(), 2);
    }

    #[test]
    fn test_silent_script_leaf() {
        let tree = haml("\t- x := 1\n\t%p= x\n");
        let template = tree.templates()[0];
        let first = tree.children(template)[0];
        assert_eq!(tree[first].kind, NodeKind::SilentScript);
        assert!(tree.children(first).is_empty());
    }

    #[test]
    fn test_render_with_children() {
        let tree = haml("\t=@render Layout()\n\t\t%p inner\n\t=@children\n\t=@slot side\n");
        let kinds: Vec<&str> = template_children(&tree).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec!["RenderCommand", "ChildrenCommand", "NewLine", "SlotCommand", "NewLine"]
        );
    }

    #[test]
    fn test_ego_structure() {
        let tree = parse("@ego T() {\n\t<% if x { %>\n\t<p><%= y %></p>\n\t<% } %>\n}\n");
        let kinds: Vec<&str> = template_children(&tree).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                "SilentScript",
                "Text",
                "OutputScript",
                "Text",
                "NewLine",
                "SilentScript",
            ]
        );
    }

    // =========================================================================
    // Filters, comments, doctype
    // =========================================================================

    #[test]
    fn test_filter() {
        let tree = haml("\t:css\n\t\tp { color: red; }\n\t%p\n");
        let template = tree.templates()[0];
        let filter = tree.children(template)[0];
        assert_eq!(
            tree[filter].kind,
            NodeKind::Filter(Filter { kind: FilterKind::Css })
        );
        assert_eq!(tree[tree.children(filter)[0]].token.lit, "p { color: red; }\n");
    }

    #[test]
    fn test_comments() {
        let tree = haml("\t/ note\n\t-# dropped\n\t/\n\t\t%p x\n");
        let kinds: Vec<&str> = template_children(&tree).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec!["Comment", "NewLine", "Comment", "NewLine"]);
    }

    #[test]
    fn test_doctype_and_slim() {
        let tree = parse("@slim T() {\n\tdoctype html\n\tp= name\n}\n");
        let kinds: Vec<&str> = template_children(&tree).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec!["Doctype", "NewLine", "Element", "NewLine"]);
    }
}
