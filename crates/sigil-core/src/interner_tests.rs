use crate::{Interner, Symbol};

#[test]
fn same_spelling_yields_the_same_symbol() {
    let mut interner = Interner::new();

    let add = interner.intern("$add");
    assert_eq!(interner.intern("$add"), add);
    assert_ne!(interner.intern("$sub"), add);
    assert_eq!(interner.len(), 2);
}

#[test]
fn resolve_returns_the_canonical_spelling() {
    let mut interner = Interner::new();

    let kind = interner.intern("IDENT");
    assert_eq!(interner.resolve(kind), "IDENT");
}

#[test]
fn get_never_inserts() {
    let mut interner = Interner::new();

    assert_eq!(interner.get("x"), None);
    assert!(interner.is_empty());

    let sym = interner.intern("x");
    assert_eq!(interner.get("x"), Some(sym));
    assert_eq!(interner.len(), 1);
}

#[test]
fn symbols_order_by_first_use() {
    let mut interner = Interner::new();

    let z = interner.intern("z");
    let a = interner.intern("a");

    // `z` was interned first, so it sorts before `a`.
    assert!(z < a);
}

#[test]
fn foreign_symbols_fail_try_resolve() {
    let interner = Interner::new();
    assert_eq!(interner.try_resolve(Symbol::from_raw(7)), None);
}

#[test]
fn iteration_follows_first_use_order() {
    let mut interner = Interner::new();
    let decl = interner.intern("$decl");
    let x = interner.intern("x");

    let items: Vec<_> = interner.iter().collect();
    assert_eq!(items, vec![(decl, "$decl"), (x, "x")]);
}

#[test]
fn raw_index_roundtrip() {
    let sym = Symbol::from_raw(42);
    assert_eq!(sym.as_u32(), 42);
}
