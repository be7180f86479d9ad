//! Type model, scoped type context, and inference.

pub mod context;
pub mod infer;
pub mod types;


pub use context::{ForwardDecl, Scope, TypeContext};
pub use infer::TypeChecker;
pub use types::Type;
