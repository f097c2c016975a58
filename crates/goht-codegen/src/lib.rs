//! GoHT Code Generator
//!
//! Turns a parsed GoHT file into Go source. Every template becomes a Go
//! function returning `goht.Template`; raw Go code between templates is
//! copied through. While writing, positions of user code can be recorded in a
//! `SourceMap` so editors can translate between the template and the
//! generated file.
//!
//! ```text
//! source → parse_string() → Template → generate()/compose() → Go code (+ SourceMap)
//! ```
//!
//! ```
//! let template = goht_codegen::parse_string("package main\n\n@goht Hi() {\n\t%p hi\n}\n")?;
//! let mut out = Vec::new();
//! template.generate(&mut out)?;
//! assert!(String::from_utf8_lossy(&out).contains("func Hi() goht.Template {"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod emit;
pub mod source_map;
pub mod template;
pub mod writer;

use std::io;
use std::path::PathBuf;

pub use goht_parser::ParseError;
pub use source_map::{Position, Range, SourceMap};
pub use template::{parse_file, parse_string, Template};

/// Code generation error.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("failed to write generated code: {0}")]
    Io(#[from] io::Error),
    #[error("[{line}:{column}]: unknown doctype: {name}")]
    UnknownDoctype {
        name: String,
        line: usize,
        column: usize,
    },
}

/// Error reading or parsing a template file.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}
