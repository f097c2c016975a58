//! GoHT Parser
//!
//! Parses the token stream from `goht-lexer` into an arena `Tree` of nodes:
//! raw Go code and templates at the top level, markup nodes inside each
//! template. All three template dialects share one node model.

pub mod node;
pub mod parser;

pub use node::{
    Attribute, AttributeKind, Element, Filter, FilterKind, Node, NodeId, NodeKind, RawCode, Root,
    Text, TextKind, Tree,
};
pub use parser::Parser;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{line}:{column}]: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
