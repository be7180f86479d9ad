//! sigil compiler front-end: programmable lexer, parsers, and type inference.
//!
//! This crate provides the compilation pipeline for sigil source files:
//! - `syntax` - loadable lexical rules
//! - `lexer` - rule-driven tokenizer
//! - `parser` - builtin prefix fallback, grammar loader, Pratt parser,
//!   scoped orchestrator, operator registry
//! - `ast` - operator tree
//! - `typing` - type model, scoped type context, inference
//! - `frontend` - high-level facade consumed by drivers and backends
//!
//! Everything a source file can do is ultimately lowered to the fixed set of
//! `$`-prefixed builtin operators; custom grammars installed via `$syntax`
//! only change how the token stream maps onto that set.

pub mod ast;
pub mod frontend;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod typing;

pub use sigil_core::{Code, Diagnostics, DiagnosticsPrinter, Interner, Severity, Span, Symbol};

pub use ast::{AstKind, AstNode};
pub use frontend::{Frontend, Output};
pub use lexer::{Token, TokenKinds};

/// Result type for passes that produce both output and diagnostics.
///
/// Each pass returns its typed output alongside any diagnostics it collected.
/// Fatal conditions (I/O failure, a file that could not be parsed at all)
/// use the outer `Result`.
pub type PassResult<T> = std::result::Result<(T, Diagnostics), Error>;

/// Errors that abort a compilation unit outright.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing failed with {} errors", .0.error_count())]
    ParseFailed(Diagnostics),
}

/// Result type for front-end operations.
pub type Result<T> = std::result::Result<T, Error>;
