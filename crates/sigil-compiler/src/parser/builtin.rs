//! Builtin prefix fallback parser.
//!
//! Grammar-free parsing used whenever no custom grammar is active. All
//! builtins use prefix notation with natural nesting: `$op arg ...`. Argument
//! consumption is greedy, stopping at `EOF`, at closing delimiters, and — for
//! fixed-arity operators — at the operator's maximum argument count. Arity is
//! *not* validated here; the type checker reports arity errors later.

use sigil_core::{Code, Diagnostics, Interner, Span, Symbol};

use crate::ast::{AstKind, AstNode};
use crate::lexer::{Token, TokenKinds};
use crate::parser::operators::OperatorRegistry;

/// Maximum nesting depth for safety.
pub const MAX_DEPTH: usize = 256;

/// Cursor-tracking prefix parser over a token slice.
pub struct PrefixParser<'a, 't> {
    tokens: &'t [Token],
    cursor: usize,
    interner: &'a mut Interner,
    registry: &'a OperatorRegistry,
    kinds: TokenKinds,
    group_op: Symbol,
    block_op: Symbol,
}

impl<'a, 't> PrefixParser<'a, 't> {
    pub fn new(
        tokens: &'t [Token],
        interner: &'a mut Interner,
        registry: &'a OperatorRegistry,
        kinds: TokenKinds,
    ) -> Self {
        Self::with_cursor(tokens, 0, interner, registry, kinds)
    }

    pub fn with_cursor(
        tokens: &'t [Token],
        cursor: usize,
        interner: &'a mut Interner,
        registry: &'a OperatorRegistry,
        kinds: TokenKinds,
    ) -> Self {
        let group_op = interner.intern("$group");
        let block_op = interner.intern("$block");
        Self {
            tokens,
            cursor,
            interner,
            registry,
            kinds,
            group_op,
            block_op,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn at_eof(&self) -> bool {
        self.peek().is_none_or(|t| t.kind == self.kinds.eof)
    }

    /// Parse one expression at the current cursor.
    pub fn parse_expr(&mut self, diag: &mut Diagnostics) -> Option<AstNode> {
        self.parse_expr_at(0, diag)
    }

    /// Parse a whole token stream: a sequence of expressions separated by
    /// optional `;`, wrapped in an implicit `$block` when more than one is
    /// present.
    pub fn parse_program(&mut self, diag: &mut Diagnostics) -> Option<AstNode> {
        let first_span = self.peek().map(|t| t.span).unwrap_or(Span::UNKNOWN);
        let mut statements = Vec::new();

        while !self.at_eof() {
            let stmt = self.parse_expr_at(0, diag)?;
            statements.push(stmt);
            self.skip_separator();
        }

        if statements.len() == 1 {
            return statements.pop();
        }

        let mut root = AstNode::new(AstKind::Block, self.block_op, first_span);
        root.children = statements;
        Some(root)
    }

    pub fn skip_separator(&mut self) {
        if self.peek().is_some_and(|t| self.is_delimiter_char(t, b';')) {
            self.cursor += 1;
        }
    }

    fn parse_expr_at(&mut self, depth: usize, diag: &mut Diagnostics) -> Option<AstNode> {
        if depth > MAX_DEPTH {
            let span = self.peek().map(|t| t.span).unwrap_or(Span::UNKNOWN);
            diag.fatal(
                Code::Parse,
                span,
                format!("parsing depth exceeded (recursion limit: {MAX_DEPTH})"),
            )
            .emit();
            return None;
        }

        let Some(tok) = self.peek() else {
            diag.error(Code::Parse, Span::UNKNOWN, "unexpected end of input")
                .emit();
            return None;
        };
        let tok = tok.clone();

        if tok.kind == self.kinds.eof {
            diag.error(Code::Parse, tok.span, "unexpected end of input")
                .emit();
            return None;
        }

        // Builtin application: `$op arg ...`
        if self.is_operator_head(&tok) {
            return self.parse_application(&tok, depth, diag);
        }

        // Parenthesized group and braced block shapes.
        if self.is_delimiter_char(&tok, b'(') {
            return self.parse_delimited(
                AstKind::Group,
                self.group_op,
                b')',
                "unclosed '('",
                depth,
                diag,
            );
        }
        if self.is_delimiter_char(&tok, b'{') {
            return self.parse_delimited(
                AstKind::Block,
                self.block_op,
                b'}',
                "unclosed '{'",
                depth,
                diag,
            );
        }

        // Atoms.
        if tok.kind == self.kinds.number || tok.kind == self.kinds.float
            || tok.kind == self.kinds.string
        {
            self.cursor += 1;
            return Some(AstNode::leaf(AstKind::Literal, tok.kind, tok.text, tok.span));
        }
        if tok.kind == self.kinds.ident {
            self.cursor += 1;
            let name = self.interner.intern(&tok.text);
            return Some(AstNode::leaf(AstKind::Ident, name, tok.text, tok.span));
        }

        diag.error(
            Code::Parse,
            tok.span,
            format!("unexpected token '{}'", tok.text),
        )
        .emit();
        None
    }

    fn parse_application(
        &mut self,
        head: &Token,
        depth: usize,
        diag: &mut Diagnostics,
    ) -> Option<AstNode> {
        let op = self.interner.intern(&head.text);
        self.cursor += 1;

        let info = self.registry.lookup(op);
        let ast_kind = info.map(|i| i.ast_kind).unwrap_or(AstKind::Builtin);
        let max_args = info.map(|i| i.max_args).unwrap_or(usize::MAX);

        let mut node = AstNode::new(ast_kind, op, head.span);
        while node.children.len() < max_args {
            let Some(next) = self.peek() else { break };
            if next.kind == self.kinds.eof || self.is_stop_delimiter(next) {
                break;
            }
            let child = self.parse_expr_at(depth + 1, diag)?;
            node.push(child);
        }
        Some(node)
    }

    fn parse_delimited(
        &mut self,
        kind: AstKind,
        op: Symbol,
        close: u8,
        unclosed: &str,
        depth: usize,
        diag: &mut Diagnostics,
    ) -> Option<AstNode> {
        let open_span = self.peek().map(|t| t.span).unwrap_or(Span::UNKNOWN);
        self.cursor += 1;

        let mut node = AstNode::new(kind, op, open_span);
        loop {
            while self.peek().is_some_and(|t| {
                self.is_delimiter_char(t, b';') || self.is_delimiter_char(t, b',')
            }) {
                self.cursor += 1;
            }

            let Some(next) = self.peek() else {
                diag.error(Code::Parse, open_span, unclosed).emit();
                return None;
            };
            if next.kind == self.kinds.eof {
                diag.error(Code::Parse, open_span, unclosed).emit();
                return None;
            }
            if self.is_delimiter_char(next, close) {
                self.cursor += 1;
                return Some(node);
            }

            let child = self.parse_expr_at(depth + 1, diag)?;
            node.push(child);
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// An `IDENT` beginning with `$` is an operator head.
    fn is_operator_head(&self, tok: &Token) -> bool {
        tok.kind == self.kinds.ident && tok.text.len() > 1 && tok.text.starts_with('$')
    }

    /// Punctuation tokens only stop or open constructs when the active
    /// syntax mapped them to `SYMBOL`, or when they fell through the rules
    /// as single-byte `UNKNOWN` tokens.
    fn is_delimiter_char(&self, tok: &Token, c: u8) -> bool {
        (tok.kind == self.kinds.symbol || tok.kind == self.kinds.unknown)
            && tok.text.as_bytes() == [c]
    }

    fn is_stop_delimiter(&self, tok: &Token) -> bool {
        (tok.kind == self.kinds.symbol || tok.kind == self.kinds.unknown)
            && matches!(tok.text.as_bytes(), [b')' | b'}' | b']' | b';' | b','])
    }
}
