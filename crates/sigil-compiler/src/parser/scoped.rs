//! Scoped parser orchestrator.
//!
//! Maintains a stack of active grammars per lexical scope and drives the
//! statement-by-statement top-level parse. `None` on the stack means the
//! builtin prefix fallback is active. `$syntax` directives replace the
//! current scope's grammar mid-file: tokens before the directive parse under
//! the old grammar, tokens after it under the new one.
//!
//! Preprocessor hooks attached to operators run here, during the parse
//! phase; an operator whose result policy is `Drop` does not survive into
//! the tree.

use std::path::{Path, PathBuf};

use sigil_core::{Code, Diagnostics, Interner, Span, Symbol};

use crate::ast::{AstKind, AstNode};
use crate::lexer::{Token, TokenKinds};
use crate::parser::builtin::PrefixParser;
use crate::parser::grammar::Grammar;
use crate::parser::operators::{Hook, OperatorRegistry, ResultPolicy};
use crate::parser::pratt::GrammarParser;

/// Parse orchestrator with a grammar stack for scoped `$syntax`.
pub struct ScopedParser<'a> {
    interner: &'a mut Interner,
    registry: &'a OperatorRegistry,
    kinds: TokenKinds,
    stack: Vec<Option<Grammar>>,
    use_builtins: bool,
    /// Directory of the source file; relative grammar paths resolve here.
    source_dir: Option<PathBuf>,
    /// Module dependencies recorded by `$import`.
    imports: Vec<String>,
    block_op: Symbol,
    spread_op: Symbol,
    spread2_op: Symbol,
}

impl<'a> ScopedParser<'a> {
    pub fn new(
        interner: &'a mut Interner,
        registry: &'a OperatorRegistry,
        kinds: TokenKinds,
        source_path: Option<&Path>,
    ) -> Self {
        let block_op = interner.intern("$block");
        let spread_op = interner.intern("$spread");
        let spread2_op = interner.intern("$$spread");
        Self {
            interner,
            registry,
            kinds,
            stack: Vec::new(),
            use_builtins: true,
            source_dir: source_path.and_then(|p| p.parent().map(Path::to_path_buf)),
            imports: Vec::new(),
            block_op,
            spread_op,
            spread2_op,
        }
    }

    /// Enter a new scope. `None` selects the builtin fallback.
    pub fn push_grammar(&mut self, grammar: Option<Grammar>) {
        self.use_builtins = grammar.is_none();
        self.stack.push(grammar);
    }

    /// Exit a scope, freeing its grammar.
    pub fn pop_grammar(&mut self) -> bool {
        if self.stack.pop().is_none() {
            return false;
        }
        self.use_builtins = match self.stack.last() {
            Some(top) => top.is_none(),
            None => true,
        };
        true
    }

    pub fn current_grammar(&self) -> Option<&Grammar> {
        self.stack.last().and_then(|g| g.as_ref())
    }

    pub fn use_builtins(&self) -> bool {
        self.use_builtins
    }

    /// Paths recorded by `$import` directives, in source order.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Replace the current scope's grammar (the `$syntax` directive).
    ///
    /// On load failure the previous grammar stays active and a warning is
    /// emitted; parsing continues.
    pub fn replace_grammar(&mut self, path: &str, span: Span, diag: &mut Diagnostics) -> bool {
        let resolved = self.resolve_path(path);
        match Grammar::from_file(&resolved, self.interner) {
            Ok(grammar) => {
                match self.stack.last_mut() {
                    Some(top) => *top = Some(grammar),
                    None => self.stack.push(Some(grammar)),
                }
                self.use_builtins = false;
                diag.note(
                    Code::Parse,
                    span,
                    format!("loaded grammar from '{}'", resolved.display()),
                )
                .emit();
                true
            }
            Err(err) => {
                diag.warning(
                    Code::Parse,
                    span,
                    format!(
                        "failed to load grammar from '{}', keeping current grammar: {err}",
                        resolved.display()
                    ),
                )
                .emit();
                false
            }
        }
    }

    /// Parse a token stream into a file-level tree.
    ///
    /// Returns `None` only when the file could not be parsed at all; the
    /// diagnostics carry the details either way.
    pub fn parse(&mut self, tokens: &[Token], diag: &mut Diagnostics) -> Option<AstNode> {
        let first_span = tokens.first().map(|t| t.span).unwrap_or(Span::UNKNOWN);

        // File-level default scope: builtins.
        self.push_grammar(None);
        let statements = self.parse_statements(tokens, diag);
        self.pop_grammar();

        let mut statements = statements?;
        if statements.len() == 1 {
            return statements.pop();
        }
        let mut root = AstNode::new(AstKind::Block, self.block_op, first_span);
        root.children = statements;
        Some(root)
    }

    fn parse_statements(
        &mut self,
        tokens: &[Token],
        diag: &mut Diagnostics,
    ) -> Option<Vec<AstNode>> {
        let mut statements = Vec::new();
        let mut cursor = 0;

        while cursor < tokens.len() && tokens[cursor].kind != self.kinds.eof {
            if !self.use_builtins {
                // The active grammar consumes the rest of the scope in one
                // call.
                let rest = &tokens[cursor..];
                let grammar = self
                    .stack
                    .last()
                    .and_then(|g| g.as_ref())
                    .expect("use_builtins is false only with a grammar on the stack");
                let mut parser = GrammarParser::new(
                    grammar,
                    rest,
                    self.interner,
                    self.registry,
                    self.kinds,
                );
                let root = parser.parse_ast(None, diag)?;
                cursor = tokens.len();

                for stmt in self.splice_spread(root) {
                    if self.apply_hook(&stmt, diag) {
                        statements.push(stmt);
                    }
                }
                break;
            }

            let mut parser = PrefixParser::with_cursor(
                tokens,
                cursor,
                self.interner,
                self.registry,
                self.kinds,
            );
            let stmt = parser.parse_expr(diag);
            let after = parser.cursor();

            let Some(stmt) = stmt else {
                // Error already reported; skip to the next statement boundary.
                cursor = self.recover(tokens, after.max(cursor + 1));
                continue;
            };
            cursor = after;

            if self.apply_hook(&stmt, diag) {
                statements.push(stmt);
            }

            // Optional separator between statements.
            if cursor < tokens.len() && is_semi(&tokens[cursor], self.kinds) {
                cursor += 1;
            }
        }

        Some(statements)
    }

    /// A `$spread`/`$$spread` root splices its children into the enclosing
    /// block; anything else is a single statement.
    fn splice_spread(&self, root: AstNode) -> Vec<AstNode> {
        let is_spread = root.kind == AstKind::Block
            && root
                .op
                .is_some_and(|op| op == self.spread_op || op == self.spread2_op);
        if is_spread { root.children } else { vec![root] }
    }

    /// Interpret the preprocessor hook for a freshly parsed statement.
    /// Returns `true` when the node should stay in the tree.
    fn apply_hook(&mut self, stmt: &AstNode, diag: &mut Diagnostics) -> bool {
        let Some(info) = stmt.op.and_then(|op| self.registry.lookup(op)) else {
            return true;
        };
        let Some(hook) = info.hook else {
            return true;
        };
        let policy = info.policy;

        match hook {
            Hook::ReplaceSyntax => match single_string_arg(stmt) {
                Some(path) => {
                    self.replace_grammar(&path, stmt.span, diag);
                }
                None => {
                    diag.warning(
                        Code::Parse,
                        stmt.span,
                        "$syntax expects a single quoted path",
                    )
                    .emit();
                }
            },
            Hook::MarkImport => match single_string_arg(stmt) {
                Some(path) => self.imports.push(path),
                None => {
                    diag.warning(
                        Code::Parse,
                        stmt.span,
                        "$import expects a single quoted path",
                    )
                    .emit();
                }
            },
            Hook::AttachProp => {
                if stmt.children.len() != 2 {
                    diag.warning(Code::Parse, stmt.span, "$prop expects a key and a value")
                        .emit();
                }
            }
            // Binding is completed by the type inference pass.
            Hook::BindName => {}
        }

        policy != ResultPolicy::Drop
    }

    /// Skip tokens until just past the next `;`, or to `EOF`.
    fn recover(&self, tokens: &[Token], mut cursor: usize) -> usize {
        while cursor < tokens.len() && tokens[cursor].kind != self.kinds.eof {
            if is_semi(&tokens[cursor], self.kinds) {
                return cursor + 1;
            }
            cursor += 1;
        }
        cursor
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_relative()
            && let Some(dir) = &self.source_dir
        {
            return dir.join(p);
        }
        p.to_path_buf()
    }
}

fn is_semi(tok: &Token, kinds: TokenKinds) -> bool {
    (tok.kind == kinds.symbol || tok.kind == kinds.unknown) && tok.text == ";"
}

/// The unquoted body of a directive's single string-literal argument.
fn single_string_arg(stmt: &AstNode) -> Option<String> {
    if stmt.children.len() != 1 {
        return None;
    }
    stmt.children[0].string_value().map(str::to_owned)
}
