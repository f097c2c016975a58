//! Entry points: parse a GoHT file into a `Template`, then write Go code
//! from it, optionally recording a source map.

use std::fs;
use std::io;
use std::path::Path;

use goht_parser::{ParseError, Parser, Tree};

use crate::emit;
use crate::source_map::SourceMap;
use crate::writer::WriterState;
use crate::{CodegenError, CompileError};

/// A parsed GoHT file.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    tree: Tree,
}

/// Parse GoHT source held in memory.
pub fn parse_string(source: &str) -> Result<Template, ParseError> {
    Ok(Template {
        tree: Parser::parse(source)?,
    })
}

/// Read and parse a GoHT file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Template, CompileError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_string(&source)?)
}

impl Template {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Write the generated Go code.
    pub fn generate(&self, w: &mut impl io::Write) -> Result<(), CodegenError> {
        self.emit(w, false)?;
        Ok(())
    }

    /// Write the generated Go code and return the map between template and
    /// generated positions.
    pub fn compose(&self, w: &mut impl io::Write) -> Result<SourceMap, CodegenError> {
        Ok(self.emit(w, true)?.unwrap_or_default())
    }

    fn emit(&self, sink: &mut dyn io::Write, with_map: bool) -> Result<Option<SourceMap>, CodegenError> {
        let mut state = WriterState::new(sink, with_map);
        emit::emit_file(&mut state.writer(), &self.tree)?;
        Ok(state.into_source_map())
    }
}
