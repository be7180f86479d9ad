use std::io::Write;
use std::path::Path;

use indoc::indoc;
use sigil_core::{Diagnostics, Interner, Severity};

use crate::ast::{AstKind, AstNode};
use crate::lexer::{TokenKinds, tokenize};
use crate::parser::operators::OperatorRegistry;
use crate::parser::scoped::ScopedParser;
use crate::syntax::SyntaxSet;

const ARITH_GRAMMAR: &str = indoc! {r#"
    rule expr:
      %NUMBER n => n
      $expr[1] lhs "+" $expr[2] rhs => $add lhs rhs
      $expr[3] lhs "*" $expr[4] rhs => $mul lhs rhs
    end
"#};

fn write_grammar(dir: &Path, name: &str, text: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

fn parse_in_dir(dir: &Path, source: &str) -> (Option<AstNode>, Interner, Diagnostics) {
    let mut interner = Interner::new();
    let kinds = TokenKinds::install(&mut interner);
    let registry = OperatorRegistry::new(&mut interner);
    let mut diag = Diagnostics::new();

    let path = dir.join("main.sg");
    let path_sym = interner.intern(&path.display().to_string());
    let tokens = tokenize(&SyntaxSet::empty(), path_sym, source, &kinds, &mut diag);

    let mut parser = ScopedParser::new(&mut interner, &registry, kinds, Some(&path));
    let ast = parser.parse(&tokens, &mut diag);
    (ast, interner, diag)
}

fn parse(source: &str) -> (Option<AstNode>, Interner, Diagnostics) {
    let dir = tempfile::tempdir().unwrap();
    parse_in_dir(dir.path(), source)
}

#[test]
fn builtin_fallback_is_the_default() {
    let (ast, interner, diag) = parse("$decl x $add 2 3");
    assert!(!diag.has_errors(), "{diag:?}");
    insta::assert_snapshot!(ast.unwrap().dump(&interner), @r"
    decl ($decl)
      ident x
      builtin ($add)
        literal 2
        literal 3
    ");
}

#[test]
fn syntax_directive_swaps_the_grammar() {
    let dir = tempfile::tempdir().unwrap();
    write_grammar(dir.path(), "arith.grammar", ARITH_GRAMMAR);

    let source = "$syntax \"arith.grammar\"\n1 + 2 * 3";
    let (ast, interner, diag) = parse_in_dir(dir.path(), source);

    assert!(!diag.has_errors(), "{diag:?}");
    // The $syntax node is dropped; the grammar-built tree is the whole file.
    insta::assert_snapshot!(ast.unwrap().dump(&interner), @r"
    builtin ($add)
      literal 1
      builtin ($mul)
        literal 2
        literal 3
    ");
}

#[test]
fn tokens_before_the_directive_use_the_old_grammar() {
    let dir = tempfile::tempdir().unwrap();
    write_grammar(dir.path(), "arith.grammar", ARITH_GRAMMAR);

    let source = "$decl a 1 ; $syntax \"arith.grammar\" ; 2 + 3";
    let (ast, interner, diag) = parse_in_dir(dir.path(), source);

    assert!(!diag.has_errors(), "{diag:?}");
    insta::assert_snapshot!(ast.unwrap().dump(&interner), @r"
    block ($block)
      decl ($decl)
        ident a
        literal 1
      builtin ($add)
        literal 2
        literal 3
    ");
}

#[test]
fn grammar_load_failure_keeps_the_fallback() {
    let (ast, interner, diag) = parse("$syntax \"does_not_exist.grammar\" ; $decl x 1");

    // A failed load is a warning, not an error; the directive is still
    // dropped and the rest of the file parses under the builtins.
    assert!(!diag.has_errors(), "{diag:?}");
    assert!(
        diag.iter().any(|d| d.severity == Severity::Warning
            && d.message.contains("keeping current grammar")),
        "{diag:?}"
    );
    insta::assert_snapshot!(ast.unwrap().dump(&interner), @r"
    decl ($decl)
      ident x
      literal 1
    ");
}

#[test]
fn successful_load_emits_a_note() {
    let dir = tempfile::tempdir().unwrap();
    write_grammar(dir.path(), "arith.grammar", ARITH_GRAMMAR);

    let (_, _, diag) = parse_in_dir(dir.path(), "$syntax \"arith.grammar\"\n7");
    assert!(
        diag.iter()
            .any(|d| d.severity == Severity::Note && d.message.contains("loaded grammar")),
        "{diag:?}"
    );
}

#[test]
fn spread_roots_splice_into_the_block() {
    let dir = tempfile::tempdir().unwrap();
    write_grammar(
        dir.path(),
        "stmts.grammar",
        indoc! {r#"
            rule prog:
              $( $stmt[0] s )+ => $spread s
            end
            rule stmt:
              %NUMBER n ";" => n
            end
        "#},
    );

    let source = "$syntax \"stmts.grammar\" ; 1 ; 2 ; 3 ;";
    let (ast, interner, diag) = parse_in_dir(dir.path(), source);

    assert!(!diag.has_errors(), "{diag:?}");
    insta::assert_snapshot!(ast.unwrap().dump(&interner), @r"
    block ($block)
      literal 1
      literal 2
      literal 3
    ");
}

#[test]
fn import_directive_records_and_keeps_the_node() {
    let mut interner = Interner::new();
    let kinds = TokenKinds::install(&mut interner);
    let registry = OperatorRegistry::new(&mut interner);
    let mut diag = Diagnostics::new();

    let path_sym = interner.intern("main.sg");
    let tokens = tokenize(
        &SyntaxSet::empty(),
        path_sym,
        "$import \"core/io\" ; $decl x 1",
        &kinds,
        &mut diag,
    );

    let mut parser = ScopedParser::new(&mut interner, &registry, kinds, None);
    let ast = parser.parse(&tokens, &mut diag).unwrap();

    assert_eq!(parser.imports(), ["core/io"]);
    assert_eq!(ast.children.len(), 2);
}

#[test]
fn malformed_prop_warns_but_parses() {
    let (ast, _, diag) = parse("$prop only_key");
    assert!(ast.is_some());
    assert!(!diag.has_errors());
    assert!(
        diag.iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("$prop")),
        "{diag:?}"
    );
}

#[test]
fn top_level_error_recovers_at_statement_boundary() {
    let (ast, interner, diag) = parse(") ; $decl x 1");
    assert!(diag.has_errors());

    // The bad statement is skipped; the declaration after `;` survives.
    let ast = ast.unwrap();
    insta::assert_snapshot!(ast.dump(&interner), @r"
    decl ($decl)
      ident x
      literal 1
    ");
}

#[test]
fn grammar_stack_push_pop() {
    let mut interner = Interner::new();
    let kinds = TokenKinds::install(&mut interner);
    let registry = OperatorRegistry::new(&mut interner);

    let grammar = crate::parser::grammar::Grammar::parse(ARITH_GRAMMAR, &mut interner).unwrap();

    let mut parser = ScopedParser::new(&mut interner, &registry, kinds, None);
    assert!(parser.use_builtins());

    parser.push_grammar(None);
    assert!(parser.use_builtins());

    parser.push_grammar(Some(grammar));
    assert!(!parser.use_builtins());
    assert!(parser.current_grammar().is_some());

    assert!(parser.pop_grammar());
    assert!(parser.use_builtins());
    assert!(parser.pop_grammar());
    assert!(!parser.pop_grammar());
}

#[test]
fn no_matching_production_is_fatal_for_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write_grammar(dir.path(), "arith.grammar", ARITH_GRAMMAR);

    let source = "$syntax \"arith.grammar\"\n+ +";
    let (ast, _, diag) = parse_in_dir(dir.path(), source);
    assert!(ast.is_none());
    assert!(diag.has_errors());
}

#[test]
fn kind_of_spliced_statement_nodes_is_preserved() {
    let (ast, _, diag) = parse("$decl a 1 ; $decl b 2");
    assert!(!diag.has_errors());
    let ast = ast.unwrap();
    assert_eq!(ast.kind, AstKind::Block);
    assert!(ast.children.iter().all(|c| c.kind == AstKind::Decl));
}
