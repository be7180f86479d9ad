use indoc::indoc;
use sigil_core::{Diagnostics, Interner};

use crate::ast::AstNode;
use crate::lexer::{TokenKinds, tokenize};
use crate::parser::grammar::Grammar;
use crate::parser::operators::OperatorRegistry;
use crate::parser::pratt::GrammarParser;
use crate::syntax::SyntaxSet;

const ARITH: &str = indoc! {r#"
    rule expr:
      %NUMBER n => n
      "(" $expr[0] inner ")" => inner
      $expr[1] lhs "+" $expr[2] rhs => $add lhs rhs
      $expr[1] lhs "-" $expr[2] rhs => $sub lhs rhs
      $expr[3] lhs "*" $expr[4] rhs => $mul lhs rhs
      $expr[3] lhs "/" $expr[4] rhs => $div lhs rhs
    end
"#};

fn try_parse(grammar_text: &str, source: &str) -> (Option<AstNode>, Interner, Diagnostics) {
    let mut interner = Interner::new();
    let kinds = TokenKinds::install(&mut interner);
    let registry = OperatorRegistry::new(&mut interner);
    let mut diag = Diagnostics::new();

    let grammar = Grammar::parse(grammar_text, &mut interner).expect("grammar should load");
    let path = interner.intern("test.sg");
    let tokens = tokenize(&SyntaxSet::empty(), path, source, &kinds, &mut diag);

    let mut parser = GrammarParser::new(&grammar, &tokens, &mut interner, &registry, kinds);
    let ast = parser.parse_ast(None, &mut diag);
    (ast, interner, diag)
}

fn dump(grammar_text: &str, source: &str) -> String {
    let (ast, interner, diag) = try_parse(grammar_text, source);
    let ast = ast.unwrap_or_else(|| panic!("parse failed: {diag:?}"));
    ast.dump(&interner)
}

fn recognizes(grammar_text: &str, source: &str) -> bool {
    try_parse(grammar_text, source).0.is_some()
}

#[test]
fn single_number() {
    insta::assert_snapshot!(dump(ARITH, "42"), @"literal 42");
}

#[test]
fn precedence_binds_multiplication_tighter() {
    insta::assert_snapshot!(dump(ARITH, "1 + 2 * 3"), @r"
    builtin ($add)
      literal 1
      builtin ($mul)
        literal 2
        literal 3
    ");
}

#[test]
fn precedence_other_direction() {
    insta::assert_snapshot!(dump(ARITH, "1 * 2 + 3"), @r"
    builtin ($add)
      builtin ($mul)
        literal 1
        literal 2
      literal 3
    ");
}

#[test]
fn addition_is_left_associative() {
    insta::assert_snapshot!(dump(ARITH, "1 - 2 - 3"), @r"
    builtin ($sub)
      builtin ($sub)
        literal 1
        literal 2
      literal 3
    ");
}

#[test]
fn parentheses_override_precedence() {
    insta::assert_snapshot!(dump(ARITH, "( 1 + 2 ) * 3"), @r"
    builtin ($mul)
      builtin ($add)
        literal 1
        literal 2
      literal 3
    ");
}

#[test]
fn whole_stream_must_be_consumed() {
    let (ast, _, diag) = try_parse(ARITH, "1 + 2 3");
    assert!(ast.is_none());
    assert!(
        diag.iter()
            .any(|d| d.message.contains("did not consume the entire input")),
        "{diag:?}"
    );
}

#[test]
fn no_matching_production_is_an_error() {
    let (ast, _, diag) = try_parse(ARITH, "+ 1");
    assert!(ast.is_none());
    assert!(
        diag.iter()
            .any(|d| d.message.contains("no grammar production matches")),
        "{diag:?}"
    );
}

#[test]
fn recognize_is_a_pass_fail_verdict() {
    assert!(recognizes(ARITH, "1 + 2 * 3"));
    assert!(!recognizes(ARITH, "1 +"));
    assert!(!recognizes(ARITH, "* 1"));
}

#[test]
fn token_kind_atoms_produce_ident_leaves() {
    let grammar = indoc! {r#"
        rule expr:
          %IDENT name "=" $expr[0] value => $decl name value
          %NUMBER n => n
        end
    "#};
    insta::assert_snapshot!(dump(grammar, "x = 7"), @r"
    decl ($decl)
      ident x
      literal 7
    ");
}

#[test]
fn repeat_atoms_splice_their_captures() {
    let grammar = indoc! {r#"
        rule expr:
          %NUMBER n => n
          "[" $( $expr[0] item )* "]" => $group item
        end
    "#};
    insta::assert_snapshot!(dump(grammar, "[ 1 2 3 ]"), @r"
    group ($group)
      literal 1
      literal 2
      literal 3
    ");
}

#[test]
fn empty_repeat_matches_zero_times() {
    let grammar = indoc! {r#"
        rule expr:
          %NUMBER n => n
          "[" $( $expr[0] item )* "]" => $group item
        end
    "#};
    insta::assert_snapshot!(dump(grammar, "[ ]"), @"group ($group)");
}

#[test]
fn plus_repeat_requires_one_iteration() {
    let grammar = indoc! {r#"
        rule expr:
          %NUMBER n => n
          "[" $( $expr[0] item )+ "]" => $group item
        end
    "#};
    assert!(recognizes(grammar, "[ 1 ]"));
    assert!(!recognizes(grammar, "[ ]"));
}

#[test]
fn multiple_rules_reference_each_other() {
    let grammar = indoc! {r#"
        rule stmt:
          $expr[0] e ";" => e
        end
        rule expr:
          %NUMBER n => n
        end
    "#};
    insta::assert_snapshot!(dump(grammar, "5 ;"), @"literal 5");
}

#[test]
fn template_literals_become_leaves() {
    let grammar = indoc! {r#"
        rule expr:
          "-" $expr[9] rhs => $sub 0 rhs
          %NUMBER n => n
        end
    "#};
    insta::assert_snapshot!(dump(grammar, "- 5"), @r"
    builtin ($sub)
      literal 0
      literal 5
    ");
}

#[test]
fn declaration_order_breaks_ties() {
    // Both productions match a number; the first declared wins.
    let grammar = indoc! {r#"
        rule expr:
          %NUMBER first => $group first
          %NUMBER second => $block second
        end
    "#};
    insta::assert_snapshot!(dump(grammar, "9"), @r"
    group ($group)
      literal 9
    ");
}
