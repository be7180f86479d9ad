//! Parsing: builtin prefix fallback, grammar-driven Pratt parsing, and the
//! scoped orchestrator that switches between them per lexical scope.

pub mod builtin;
pub mod grammar;
pub mod operators;
pub mod pratt;
pub mod scoped;

#[cfg(test)]
mod builtin_tests;
#[cfg(test)]
mod grammar_tests;
#[cfg(test)]
mod pratt_tests;
#[cfg(test)]
mod scoped_tests;

pub use operators::{Hook, OperatorInfo, OperatorRegistry, ResultPolicy, TypeRule};
pub use scoped::ScopedParser;
