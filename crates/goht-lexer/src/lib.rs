//! GoHT Lexer
//!
//! Tokenizes `.goht` files: Go source with embedded templates written in one
//! of three dialects (`@goht`/`@haml`, `@slim`, `@ego`). Go-level lines are
//! handled by the core lexer; each template body is lexed by its dialect's
//! state functions.
//!
//! # Example
//!
//! ```
//! use goht_lexer::{Lexer, TokenKind};
//!
//! let tokens = Lexer::tokenize("package main\n").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Package);
//! assert_eq!(tokens[0].lit, "main");
//! ```

mod common;
mod ego;
mod haml;
pub mod lexer;
mod slim;
pub mod token;

pub use lexer::{Lexer, StateFn};
pub use token::{is_void_element, Token, TokenKind, VOID_ELEMENTS};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{line}:{column}]: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
