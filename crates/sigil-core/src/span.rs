//! Source locations for diagnostics.

use crate::{Interner, Symbol};

/// A source location: file path plus 1-based line and column.
///
/// Line/column 0 means "unknown". The path is an interned symbol so spans
/// stay `Copy` and cheap to thread through every token and AST node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Span {
    pub path: Option<Symbol>,
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub const UNKNOWN: Span = Span {
        path: None,
        line: 0,
        col: 0,
    };

    pub fn new(path: Symbol, line: u32, col: u32) -> Self {
        Self {
            path: Some(path),
            line,
            col,
        }
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }

    /// Render as `path:line:col` for plain diagnostic lines.
    pub fn display(&self, interner: &Interner) -> String {
        let path = self
            .path
            .and_then(|p| interner.try_resolve(p))
            .unwrap_or("<anonymous>");
        format!("{}:{}:{}", path, self.line, self.col)
    }
}
