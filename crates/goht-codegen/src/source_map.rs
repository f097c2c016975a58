//! Bidirectional map between template source positions and positions in the
//! generated Go code.
//!
//! Lines are zero-based in both directions. Columns follow the 1-based
//! convention used by tokens and by the writer's cursor, so a lookup in one
//! direction feeds straight into a lookup in the other.

use std::collections::HashMap;

use goht_lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

/// Where a token was written, in writer cursor coordinates (1-based line
/// and column). `from` is the position of the first written character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: Position,
    pub to: Position,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    source_to_target: HashMap<usize, HashMap<usize, Position>>,
    target_to_source: HashMap<usize, HashMap<usize, Position>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `token` was written verbatim at `range`.
    ///
    /// Every column of every line of the literal is entered in both
    /// directions, plus the column just past the end of each line. Lines
    /// after the first start at column 1 in the generated code and just past
    /// the token's stripped continuation tabs in the source. A range whose
    /// line span disagrees with the literal is not recorded.
    pub fn add(&mut self, token: &Token, range: Range) {
        let lines: Vec<&str> = token.lit.split('\n').collect();
        if range.to.line < range.from.line || range.to.line - range.from.line + 1 != lines.len() {
            return;
        }

        let source_line = token.line.saturating_sub(1);
        let target_line = range.from.line.saturating_sub(1);

        for (i, text) in lines.into_iter().enumerate() {
            let (source_col, target_col) = if i == 0 {
                (token.column, range.from.col)
            } else {
                (1 + token.wrap_indent, 1)
            };
            let width = text.chars().count();
            for offset in 0..=width {
                let source = Position {
                    line: source_line + i,
                    col: source_col + offset,
                };
                let target = Position {
                    line: target_line + i,
                    col: target_col + offset,
                };
                self.source_to_target
                    .entry(source.line)
                    .or_default()
                    .insert(source.col, target);
                self.target_to_source
                    .entry(target.line)
                    .or_default()
                    .insert(target.col, source);
            }
        }
    }

    /// Template position for a generated-code position.
    pub fn source_position_from_target(&self, line: usize, col: usize) -> Option<Position> {
        self.target_to_source.get(&line)?.get(&col).copied()
    }

    /// Generated-code position for a template position.
    pub fn target_position_from_source(&self, line: usize, col: usize) -> Option<Position> {
        self.source_to_target.get(&line)?.get(&col).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.source_to_target.is_empty()
    }
}
