//! Builtin operator registry.
//!
//! A static table lists every builtin operator the language lowers to. The
//! registry interns all names once at startup and resolves lookups through an
//! ordered map, so the hot paths never re-intern operator names and dispatch
//! happens on table data.

use indexmap::IndexMap;
use sigil_core::{Interner, Symbol};

use crate::ast::AstKind;

/// Marker for variadic operators.
pub const VARIADIC: usize = usize::MAX;

/// What happens to an operator node after its preprocessor hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPolicy {
    /// The node stays in the tree.
    Keep,
    /// The node is removed from the tree once the hook has run.
    Drop,
}

/// Side effects the scoped parser performs for preprocessor operators.
///
/// The orchestrator interprets these during the parse phase; the operators
/// themselves stay ordinary prefix applications in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `$syntax "path"`: replace the current scope's grammar.
    ReplaceSyntax,
    /// `$import "path"`: record a module dependency.
    MarkImport,
    /// `$prop key value`: attach a property to the declaration context.
    AttachProp,
    /// `$decl name value`: binding is completed by type inference.
    BindName,
}

/// Type-inference dispatch for an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule {
    /// `(int, int) -> int`
    IntBinary,
    /// `(float, float) -> float`
    FloatBinary,
    /// `(int, int) -> int`
    BitBinary,
    /// `(int) -> int`
    BitUnary,
    /// `(bool, bool) -> bool`
    LogicBinary,
    /// `(bool) -> bool`
    LogicUnary,
    /// `(T, T) -> bool`
    Comparison,
    /// Children inferred, result void.
    Void,
    /// Children inferred in a fresh scope, result void.
    Block,
    Call,
    Func,
    If,
    Set,
    Decl,
    Forward,
    Ret,
    RefMut,
    RefConst,
    RefInline,
    This,
    File,
    Global,
    Member,
    IdentToString,
    StringToIdent,
    Cast,
    Trait,
    Impl,
    /// Hook-validated operators; void at type time.
    Preprocessor,
}

/// Metadata for one builtin operator.
#[derive(Debug, Clone)]
pub struct OperatorInfo {
    pub name: &'static str,
    pub op: Symbol,
    pub ast_kind: AstKind,
    pub min_args: usize,
    pub max_args: usize,
    pub hook: Option<Hook>,
    pub policy: ResultPolicy,
    pub rule: TypeRule,
}

impl OperatorInfo {
    pub fn is_variadic(&self) -> bool {
        self.max_args == VARIADIC
    }

    pub fn is_preprocessor(&self) -> bool {
        self.hook.is_some()
    }
}

type Row = (
    &'static str,
    AstKind,
    usize,
    usize,
    Option<Hook>,
    ResultPolicy,
    TypeRule,
);

#[rustfmt::skip]
const ROWS: &[Row] = &[
    // Structural
    ("$group",   AstKind::Group,   0, VARIADIC, None, ResultPolicy::Keep, TypeRule::Void),
    ("$tuple",   AstKind::Group,   0, VARIADIC, None, ResultPolicy::Keep, TypeRule::Void),
    ("$block",   AstKind::Block,   0, VARIADIC, None, ResultPolicy::Keep, TypeRule::Block),
    ("$spread",  AstKind::Block,   0, VARIADIC, None, ResultPolicy::Keep, TypeRule::Block),
    ("$$spread", AstKind::Block,   0, VARIADIC, None, ResultPolicy::Keep, TypeRule::Block),

    // Core constructs
    ("$call",    AstKind::Call,    1, VARIADIC, None, ResultPolicy::Keep, TypeRule::Call),
    ("$func",    AstKind::Func,    2, 3,        None, ResultPolicy::Keep, TypeRule::Func),
    ("$if",      AstKind::If,      3, 3,        None, ResultPolicy::Keep, TypeRule::If),
    ("$set",     AstKind::Set,     2, 2,        None, ResultPolicy::Keep, TypeRule::Set),
    ("$decl",    AstKind::Decl,    2, 2,        Some(Hook::BindName), ResultPolicy::Keep, TypeRule::Decl),
    ("$alias",   AstKind::Decl,    2, 2,        None, ResultPolicy::Keep, TypeRule::Decl),
    ("$forward", AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Forward),
    ("$ret",     AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::Ret),

    // Integer arithmetic
    ("$add",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::IntBinary),
    ("$sub",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::IntBinary),
    ("$mul",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::IntBinary),
    ("$div",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::IntBinary),

    // Float arithmetic
    ("$fadd",    AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::FloatBinary),
    ("$fsub",    AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::FloatBinary),
    ("$fmul",    AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::FloatBinary),
    ("$fdiv",    AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::FloatBinary),

    // Bitwise
    ("$band",    AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::BitBinary),
    ("$bor",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::BitBinary),
    ("$bxor",    AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::BitBinary),
    ("$lshift",  AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::BitBinary),
    ("$rshift",  AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::BitBinary),
    ("$bnot",    AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::BitUnary),

    // Logic
    ("$and",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::LogicBinary),
    ("$or",      AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::LogicBinary),
    ("$not",     AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::LogicUnary),

    // Comparison
    ("$eq",      AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Comparison),
    ("$neq",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Comparison),
    ("$lt",      AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Comparison),
    ("$gt",      AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Comparison),
    ("$lte",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Comparison),
    ("$gte",     AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Comparison),

    // Storage
    ("$mut",     AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::RefMut),
    ("$const",   AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::RefConst),
    ("$inline",  AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::RefInline),

    // Namespace
    ("$this",    AstKind::Builtin, 0, 0,        None, ResultPolicy::Keep, TypeRule::This),
    ("$file",    AstKind::Builtin, 0, 0,        None, ResultPolicy::Keep, TypeRule::File),
    ("$global",  AstKind::Builtin, 0, 0,        None, ResultPolicy::Keep, TypeRule::Global),
    ("$member",  AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Member),

    // Meta
    ("$idtstr",  AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::IdentToString),
    ("$strtid",  AstKind::Builtin, 1, 1,        None, ResultPolicy::Keep, TypeRule::StringToIdent),

    // Subtyping
    ("$trait",   AstKind::Builtin, 0, VARIADIC, None, ResultPolicy::Keep, TypeRule::Trait),
    ("$impl",    AstKind::Builtin, 2, VARIADIC, None, ResultPolicy::Keep, TypeRule::Impl),
    ("$as",      AstKind::Builtin, 2, 2,        None, ResultPolicy::Keep, TypeRule::Cast),

    // Preprocessor
    ("$syntax",  AstKind::Builtin, 1, 1,        Some(Hook::ReplaceSyntax), ResultPolicy::Drop, TypeRule::Preprocessor),
    ("$import",  AstKind::Builtin, 1, 1,        Some(Hook::MarkImport),    ResultPolicy::Keep, TypeRule::Preprocessor),
    ("$prop",    AstKind::Builtin, 2, 2,        Some(Hook::AttachProp),    ResultPolicy::Keep, TypeRule::Preprocessor),
];

/// Immutable registry of builtin operators, built once at startup.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    ops: IndexMap<Symbol, OperatorInfo>,
}

impl OperatorRegistry {
    /// Intern every builtin name and build the lookup table.
    pub fn new(interner: &mut Interner) -> Self {
        let mut ops = IndexMap::with_capacity(ROWS.len());
        for &(name, ast_kind, min_args, max_args, hook, policy, rule) in ROWS {
            let op = interner.intern(name);
            ops.insert(
                op,
                OperatorInfo {
                    name,
                    op,
                    ast_kind,
                    min_args,
                    max_args,
                    hook,
                    policy,
                    rule,
                },
            );
        }
        Self { ops }
    }

    pub fn lookup(&self, op: Symbol) -> Option<&OperatorInfo> {
        self.ops.get(&op)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorInfo> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_interns_every_name_once() {
        let mut interner = Interner::new();
        let registry = OperatorRegistry::new(&mut interner);

        for info in registry.iter() {
            assert_eq!(interner.get(info.name), Some(info.op));
            assert_eq!(registry.lookup(info.op).unwrap().name, info.name);
        }
    }

    #[test]
    fn syntax_is_the_only_dropped_operator() {
        let mut interner = Interner::new();
        let registry = OperatorRegistry::new(&mut interner);

        let dropped: Vec<_> = registry
            .iter()
            .filter(|info| info.policy == ResultPolicy::Drop)
            .map(|info| info.name)
            .collect();
        assert_eq!(dropped, vec!["$syntax"]);
    }

    #[test]
    fn preprocessor_flags() {
        let mut interner = Interner::new();
        let registry = OperatorRegistry::new(&mut interner);

        let preprocessors: Vec<_> = registry
            .iter()
            .filter(|info| info.is_preprocessor())
            .map(|info| info.name)
            .collect();
        assert_eq!(preprocessors, vec!["$decl", "$syntax", "$import", "$prop"]);
    }

    #[test]
    fn fixed_and_variadic_arities() {
        let mut interner = Interner::new();
        let registry = OperatorRegistry::new(&mut interner);

        let add = registry.lookup(interner.get("$add").unwrap()).unwrap();
        assert_eq!((add.min_args, add.max_args), (2, 2));
        assert!(!add.is_variadic());

        let block = registry.lookup(interner.get("$block").unwrap()).unwrap();
        assert!(block.is_variadic());
    }

    #[test]
    fn unknown_symbol_is_not_an_operator() {
        let mut interner = Interner::new();
        let registry = OperatorRegistry::new(&mut interner);
        let stranger = interner.intern("$frobnicate");
        assert!(registry.lookup(stranger).is_none());
    }
}
