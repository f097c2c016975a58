//! Node tree for GoHT files.
//!
//! Nodes live in an arena (`Tree`) and refer to each other by `NodeId`.
//! The root is always `NodeId::ROOT`; its children are raw Go code blocks and
//! templates, and template children are the markup body.

use std::ops::{Index, IndexMut};

use goht_lexer::{Token, TokenKind};
use indexmap::{IndexMap, IndexSet};

/// Index of a node in a `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Template body indent level of the line the node starts on.
    pub indent: usize,
    /// The token the node was created from.
    pub token: Token,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root(Root),
    /// Go source between templates.
    RawCode(RawCode),
    /// A template; the declaration is the token literal.
    Template,
    Element(Element),
    Text(Text),
    NewLine,
    Doctype,
    /// HTML comment. Inline when the literal is non-empty, a block otherwise.
    Comment,
    /// Renders its children without escaping.
    Unescape,
    SilentScript,
    OutputScript,
    RenderCommand,
    ChildrenCommand,
    SlotCommand,
    Filter(Filter),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root(_) => "Root",
            NodeKind::RawCode(_) => "RawCode",
            NodeKind::Template => "Template",
            NodeKind::Element(_) => "Element",
            NodeKind::Text(_) => "Text",
            NodeKind::NewLine => "NewLine",
            NodeKind::Doctype => "Doctype",
            NodeKind::Comment => "Comment",
            NodeKind::Unescape => "Unescape",
            NodeKind::SilentScript => "SilentScript",
            NodeKind::OutputScript => "OutputScript",
            NodeKind::RenderCommand => "RenderCommand",
            NodeKind::ChildrenCommand => "ChildrenCommand",
            NodeKind::SlotCommand => "SlotCommand",
            NodeKind::Filter(_) => "Filter",
        }
    }
}

/// Package clause and imports of the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub package: String,
    /// User imports, in order of first appearance.
    pub imports: IndexSet<String>,
}

/// Consecutive Go code and newline tokens outside any template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCode {
    pub tokens: Vec<Token>,
}

impl RawCode {
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.lit.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub id: Option<Token>,
    pub classes: Vec<Token>,
    pub object_ref: Option<Token>,
    /// Attributes in declaration order, keyed by name.
    pub attributes: IndexMap<String, Attribute>,
    pub attributes_command: Option<Token>,
    pub disallow_children: bool,
    pub is_self_closing: bool,
    pub nuke_inner_whitespace: bool,
    pub nuke_outer_whitespace: bool,
    pub is_complete: bool,
    pub has_inline_content: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            object_ref: None,
            attributes: IndexMap::new(),
            attributes_command: None,
            disallow_children: false,
            is_self_closing: false,
            nuke_inner_whitespace: false,
            nuke_outer_whitespace: false,
            is_complete: false,
            has_inline_content: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// `name`
    Presence,
    /// `name?#{cond}`
    Boolean,
    /// `name: "v"` or `name: #{expr}`
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Token,
    pub kind: AttributeKind,
    /// `AttrEscapedValue` or `AttrDynamicValue` token.
    pub value: Option<Token>,
}

impl Attribute {
    pub fn is_dynamic(&self) -> bool {
        self.value
            .as_ref()
            .is_some_and(|v| v.kind == TokenKind::AttrDynamicValue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Plain,
    Dynamic,
    Preserve,
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Text {
    pub kind: TextKind,
}

impl Text {
    pub fn is_dynamic(&self) -> bool {
        self.kind == TextKind::Dynamic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    JavaScript,
    Css,
    Plain,
    Escaped,
    Preserve,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "javascript" => Some(FilterKind::JavaScript),
            "css" => Some(FilterKind::Css),
            "plain" => Some(FilterKind::Plain),
            "escaped" => Some(FilterKind::Escaped),
            "preserve" => Some(FilterKind::Preserve),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    pub kind: FilterKind,
}

/// Arena of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree holding only an empty root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root(Root::default()),
                indent: 0,
                token: Token::new(TokenKind::Eof, "", 1, 1),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> &Root {
        match &self.nodes[0].kind {
            NodeKind::Root(root) => root,
            _ => unreachable!("node 0 is always the root"),
        }
    }

    pub fn root_mut(&mut self) -> &mut Root {
        match &mut self.nodes[0].kind {
            NodeKind::Root(root) => root,
            _ => unreachable!("node 0 is always the root"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Append a new node as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, kind: NodeKind, indent: usize, token: Token) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            indent,
            token,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Move an existing node to the end of `parent`'s children.
    pub fn reparent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(old) = self.nodes[id.0].parent {
            self.nodes[old.0].children.retain(|c| *c != id);
        }
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.last().copied()
    }

    /// Visit every node depth-first, parents before children, with depth.
    pub fn walk(&self, mut visit: impl FnMut(NodeId, &Node, usize)) {
        let mut pending = vec![(NodeId::ROOT, 0)];
        while let Some((id, depth)) = pending.pop() {
            let node = &self.nodes[id.0];
            visit(id, node, depth);
            for child in node.children.iter().rev() {
                pending.push((*child, depth + 1));
            }
        }
    }

    /// Ids of all templates, in source order.
    pub fn templates(&self) -> Vec<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .filter(|id| matches!(self[*id].kind, NodeKind::Template))
            .collect()
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: TokenKind, lit: &str) -> Token {
        Token::new(kind, lit, 1, 1)
    }

    #[test]
    fn test_add_and_walk() {
        let mut tree = Tree::new();
        let template = tree.add(
            NodeId::ROOT,
            NodeKind::Template,
            0,
            token(TokenKind::TemplateStart, "T()"),
        );
        let p = tree.add(
            template,
            NodeKind::Element(Element::new("p")),
            1,
            token(TokenKind::Tag, "p"),
        );
        tree.add(
            p,
            NodeKind::Text(Text { kind: TextKind::Plain }),
            1,
            token(TokenKind::PlainText, "foo"),
        );
        tree.add(template, NodeKind::NewLine, 1, token(TokenKind::NewLine, "\n"));

        let mut seen = Vec::new();
        tree.walk(|_, node, depth| seen.push((node.kind.name(), depth)));
        assert_eq!(
            seen,
            vec![
                ("Root", 0),
                ("Template", 1),
                ("Element", 2),
                ("Text", 3),
                ("NewLine", 2),
            ]
        );
        assert_eq!(tree.templates(), vec![template]);
        assert_eq!(tree[p].parent, Some(template));
    }

    #[test]
    fn test_reparent() {
        let mut tree = Tree::new();
        let a = tree.add(NodeId::ROOT, NodeKind::Template, 0, token(TokenKind::TemplateStart, "A()"));
        let nl = tree.add(a, NodeKind::NewLine, 1, token(TokenKind::NewLine, "\n"));
        tree.reparent(nl, NodeId::ROOT);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.last_child(NodeId::ROOT), Some(nl));
    }

    #[test]
    fn test_raw_code_text() {
        let raw = RawCode {
            tokens: vec![
                token(TokenKind::GoCode, "var x = 1"),
                token(TokenKind::NewLine, "\n"),
            ],
        };
        assert_eq!(raw.text(), "var x = 1\n");
    }

    #[test]
    fn test_filter_kind_from_name() {
        assert_eq!(FilterKind::from_name("css"), Some(FilterKind::Css));
        assert_eq!(FilterKind::from_name("sass"), None);
    }
}
