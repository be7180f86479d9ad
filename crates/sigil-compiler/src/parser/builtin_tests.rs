use sigil_core::{Diagnostics, Interner};

use crate::ast::{AstKind, AstNode};
use crate::lexer::{TokenKinds, tokenize};
use crate::parser::builtin::PrefixParser;
use crate::parser::operators::OperatorRegistry;
use crate::syntax::SyntaxSet;

fn parse(source: &str) -> (Option<AstNode>, Interner, Diagnostics) {
    let mut interner = Interner::new();
    let kinds = TokenKinds::install(&mut interner);
    let registry = OperatorRegistry::new(&mut interner);
    let mut diag = Diagnostics::new();
    let path = interner.intern("test.sg");
    let tokens = tokenize(&SyntaxSet::empty(), path, source, &kinds, &mut diag);

    let mut parser = PrefixParser::new(&tokens, &mut interner, &registry, kinds);
    let ast = parser.parse_program(&mut diag);
    (ast, interner, diag)
}

fn dump(source: &str) -> String {
    let (ast, interner, diag) = parse(source);
    let ast = ast.unwrap_or_else(|| panic!("parse failed: {diag:?}"));
    ast.dump(&interner)
}

#[test]
fn prefix_application() {
    insta::assert_snapshot!(dump("$decl x $add 2 3"), @r"
    decl ($decl)
      ident x
      builtin ($add)
        literal 2
        literal 3
    ");
}

#[test]
fn atoms() {
    insta::assert_snapshot!(dump("$group 42 3.5 \"hi\" name"), @r#"
    group ($group)
      literal 42
      literal 3.5
      literal "hi"
      ident name
    "#);
}

#[test]
fn multiple_statements_wrap_in_block() {
    insta::assert_snapshot!(dump("$decl a 1; $decl b 2"), @r"
    block ($block)
      decl ($decl)
        ident a
        literal 1
      decl ($decl)
        ident b
        literal 2
    ");
}

#[test]
fn fixed_arity_operators_stop_consuming() {
    // `$add` takes two arguments; the third token starts a new statement.
    insta::assert_snapshot!(dump("$add 1 2 3"), @r"
    block ($block)
      builtin ($add)
        literal 1
        literal 2
      literal 3
    ");
}

#[test]
fn variadic_operators_consume_greedily() {
    let (ast, _, _) = parse("$block 1 2 3 4");
    assert_eq!(ast.unwrap().children.len(), 4);
}

#[test]
fn parenthesized_group() {
    insta::assert_snapshot!(dump("$decl x ( $add 1 2 )"), @r"
    decl ($decl)
      ident x
      group ($group)
        builtin ($add)
          literal 1
          literal 2
    ");
}

#[test]
fn braced_block_with_separators() {
    insta::assert_snapshot!(dump("{ $decl a 1 ; $decl b 2 }"), @r"
    block ($block)
      decl ($decl)
        ident a
        literal 1
      decl ($decl)
        ident b
        literal 2
    ");
}

#[test]
fn unknown_operator_still_parses() {
    // Unknown operators are a type-phase concern, not a parse error.
    insta::assert_snapshot!(dump("$frobnicate 1 2"), @r"
    builtin ($frobnicate)
      literal 1
      literal 2
    ");
}

#[test]
fn unexpected_token_is_an_error() {
    let (ast, _, diag) = parse(")");
    assert!(ast.is_none());
    assert_eq!(diag.error_count(), 1);
    assert!(diag.iter().next().unwrap().message.contains("unexpected token"));
}

#[test]
fn unclosed_paren_is_an_error() {
    let (ast, _, diag) = parse("( 1 2");
    assert!(ast.is_none());
    assert!(diag.iter().any(|d| d.message.contains("unclosed '('")));
}

#[test]
fn recursion_depth_is_bounded() {
    let mut source = "$not ".repeat(300);
    source.push('1');
    let (ast, _, diag) = parse(&source);
    assert!(ast.is_none());
    assert!(
        diag.iter()
            .any(|d| d.message.contains("parsing depth exceeded")),
        "{diag:?}"
    );
}

#[test]
fn parse_expr_tracks_the_cursor() {
    let mut interner = Interner::new();
    let kinds = TokenKinds::install(&mut interner);
    let registry = OperatorRegistry::new(&mut interner);
    let mut diag = Diagnostics::new();
    let path = interner.intern("test.sg");
    let tokens = tokenize(&SyntaxSet::empty(), path, "$add 1 2 $sub 3 4", &kinds, &mut diag);

    let mut parser = PrefixParser::new(&tokens, &mut interner, &registry, kinds);
    let first = parser.parse_expr(&mut diag).unwrap();
    assert_eq!(first.kind, AstKind::Builtin);
    assert_eq!(parser.cursor(), 3);

    let second = parser.parse_expr(&mut diag).unwrap();
    assert_eq!(second.children.len(), 2);
    assert!(parser.at_eof());
}

#[test]
fn leaves_reconstruct_the_token_stream() {
    let source = "$decl x $add 2 3";
    let (ast, interner, _) = parse(source);

    fn collect<'n>(node: &'n AstNode, out: &mut Vec<&'n str>, interner: &'n Interner) {
        if node.is_leaf() {
            if let Some(name) = node.op.and_then(|op| interner.try_resolve(op)) {
                if node.kind == AstKind::Ident {
                    out.push(name);
                    return;
                }
            }
            out.push(&node.value);
            return;
        }
        if let Some(name) = node.op.and_then(|op| interner.try_resolve(op)) {
            out.push(name);
        }
        for child in &node.children {
            collect(child, out, interner);
        }
    }

    let ast = ast.unwrap();
    let mut leaves = Vec::new();
    collect(&ast, &mut leaves, &interner);
    assert_eq!(leaves, vec!["$decl", "x", "$add", "2", "3"]);
}
