use indoc::indoc;
use sigil_core::Interner;

use crate::parser::grammar::{Grammar, GrammarAtom, GrammarError};

fn load(text: &str) -> (Grammar, Interner) {
    let mut interner = Interner::new();
    let grammar = Grammar::parse(text, &mut interner).expect("grammar should load");
    (grammar, interner)
}

#[test]
fn loads_rules_and_productions() {
    let (grammar, interner) = load(indoc! {r#"
        # arithmetic over numbers
        rule expr:
          %NUMBER n => n
          $expr[1] lhs "+" $expr[2] rhs => $add lhs rhs
        end
    "#});

    assert_eq!(grammar.rules.len(), 1);
    let expr = interner.get("expr").unwrap();
    assert_eq!(grammar.start_rule, Some(expr));

    let rule = grammar.rule(expr).unwrap();
    assert_eq!(rule.productions.len(), 2);
    assert!(!rule.productions[0].starts_with_expr);
    assert!(rule.productions[1].starts_with_expr);
    assert_eq!(rule.productions[1].lead_bp(), Some(1));
}

#[test]
fn pattern_atoms() {
    let (grammar, interner) = load("rule expr:\n  %IDENT name \"=\" $expr[0] value => $decl name value\nend\n");

    let rule = grammar.rule(interner.get("expr").unwrap()).unwrap();
    let atoms = &rule.productions[0].atoms;
    assert_eq!(atoms.len(), 3);

    let ident = interner.get("IDENT").unwrap();
    let name_cap = interner.get("name").unwrap();
    assert_eq!(
        atoms[0],
        GrammarAtom::TokenKind {
            kind: ident,
            capture: Some(name_cap),
        }
    );
    assert_eq!(
        atoms[1],
        GrammarAtom::Literal {
            text: "=".to_string(),
            capture: None,
        }
    );
    assert!(matches!(
        atoms[2],
        GrammarAtom::Expr {
            min_bp: 0,
            capture: Some(_),
            ..
        }
    ));
}

#[test]
fn binding_power_defaults_to_zero() {
    let (grammar, interner) = load("rule expr:\n  \"-\" $expr rhs => $sub 0 rhs\nend\n");
    let rule = grammar.rule(interner.get("expr").unwrap()).unwrap();
    assert!(matches!(
        rule.productions[0].atoms[1],
        GrammarAtom::Expr { min_bp: 0, .. }
    ));
}

#[test]
fn repeat_groups() {
    let (grammar, interner) = load(indoc! {r#"
        rule expr:
          "[" $( $expr[0] item )* "]" => $group item
        end
    "#});

    let rule = grammar.rule(interner.get("expr").unwrap()).unwrap();
    let atoms = &rule.productions[0].atoms;
    assert_eq!(atoms.len(), 3);

    let GrammarAtom::Repeat { subatoms, min, max } = &atoms[1] else {
        panic!("expected a repeat atom, got {:?}", atoms[1]);
    };
    assert_eq!((*min, *max), (0, u32::MAX));
    assert_eq!(subatoms.len(), 1);
}

#[test]
fn repeat_cardinalities() {
    let (grammar, interner) = load(indoc! {r#"
        rule expr:
          $( "a" x )+ $( "b" y )? => $group x y
        end
    "#});

    let rule = grammar.rule(interner.get("expr").unwrap()).unwrap();
    let atoms = &rule.productions[0].atoms;
    assert!(matches!(
        atoms[0],
        GrammarAtom::Repeat {
            min: 1,
            max: u32::MAX,
            ..
        }
    ));
    assert!(matches!(atoms[1], GrammarAtom::Repeat { min: 0, max: 1, .. }));
}

#[test]
fn quoted_literals_unescape() {
    let (grammar, interner) = load("rule expr:\n  \"\\n\" nl => nl\nend\n");
    let rule = grammar.rule(interner.get("expr").unwrap()).unwrap();
    assert_eq!(
        rule.productions[0].atoms[0],
        GrammarAtom::Literal {
            text: "\n".to_string(),
            capture: Some(interner.get("nl").unwrap()),
        }
    );
}

#[test]
fn redefining_a_rule_resets_it() {
    let (grammar, interner) = load(indoc! {r#"
        rule expr:
          %NUMBER n => n
        end
        rule expr:
          %IDENT i => i
        end
    "#});

    let rule = grammar.rule(interner.get("expr").unwrap()).unwrap();
    assert_eq!(rule.productions.len(), 1);
    assert!(matches!(
        rule.productions[0].atoms[0],
        GrammarAtom::TokenKind { .. }
    ));
    assert_eq!(grammar.rules.len(), 1);
}

#[test]
fn start_rule_is_the_first_seen() {
    let (grammar, interner) = load(indoc! {r#"
        rule stmt:
          $expr[0] e ";" => e
        end
        rule expr:
          %NUMBER n => n
        end
    "#});
    assert_eq!(grammar.start_rule, interner.get("stmt"));
    assert_eq!(grammar.rules.len(), 2);
}

fn load_err(text: &str) -> GrammarError {
    let mut interner = Interner::new();
    Grammar::parse(text, &mut interner).expect_err("grammar should fail to load")
}

#[test]
fn missing_arrow_is_an_error() {
    let err = load_err("rule expr:\n  %NUMBER n\nend\n");
    assert!(err.to_string().contains("missing '=>'"), "{err}");
}

#[test]
fn production_outside_rule_is_an_error() {
    let err = load_err("%NUMBER n => n\n");
    assert!(err.to_string().contains("outside of a rule block"), "{err}");
}

#[test]
fn unknown_template_capture_is_an_error() {
    let err = load_err("rule expr:\n  %NUMBER n => $add n m\nend\n");
    assert!(err.to_string().contains("unknown capture 'm'"), "{err}");
}

#[test]
fn capture_without_atom_is_an_error() {
    let err = load_err("rule expr:\n  orphan %NUMBER => orphan\nend\n");
    assert!(err.to_string().contains("no atom to capture"), "{err}");
}

#[test]
fn unbalanced_group_is_an_error() {
    let err = load_err("rule expr:\n  $( \"a\" => $group\nend\n");
    assert!(err.to_string().contains("unbalanced"), "{err}");
}

#[test]
fn empty_grammar_is_an_error() {
    let err = load_err("# nothing here\n");
    assert!(matches!(err, GrammarError::Empty));
}

#[test]
fn rule_header_requires_colon() {
    let err = load_err("rule expr\n  %NUMBER n => n\nend\n");
    assert!(err.to_string().contains("must end with ':'"), "{err}");
}
