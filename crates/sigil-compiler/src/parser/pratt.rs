//! Binding-power-driven grammar parser.
//!
//! Pratt parsing with explicit binding powers: prefix productions are tried
//! in declaration order, then extension productions (those whose first atom
//! is an expression atom) attach repeatedly while their leading binding
//! power is at least the current minimum. Associativity falls out of the
//! difference between leading and trailing binding powers; ties break on
//! declaration order.
//!
//! A successful match expands the production's template into an AST: the
//! template is a builtin-operator expression whose identifier words splice in
//! the captured subtrees.

use sigil_core::{Code, Diagnostics, Interner, Span, Symbol};

use crate::ast::{AstKind, AstNode};
use crate::lexer::{Token, TokenKinds};
use crate::parser::grammar::{Grammar, GrammarAtom, Production};
use crate::parser::operators::OperatorRegistry;

/// Maximum recursion depth for grammar-driven parsing.
pub const MAX_DEPTH: usize = 128;

/// Captured subtrees for one production match, in pattern order.
type Captures = Vec<(Symbol, AstNode)>;

/// Parser for one token slice under one grammar.
pub struct GrammarParser<'a, 't> {
    grammar: &'a Grammar,
    tokens: &'t [Token],
    /// Tokens to consume: the slice length minus a trailing `EOF`.
    limit: usize,
    interner: &'a mut Interner,
    registry: &'a OperatorRegistry,
    kinds: TokenKinds,
    depth_exceeded: bool,
}

impl<'a, 't> GrammarParser<'a, 't> {
    pub fn new(
        grammar: &'a Grammar,
        tokens: &'t [Token],
        interner: &'a mut Interner,
        registry: &'a OperatorRegistry,
        kinds: TokenKinds,
    ) -> Self {
        let mut limit = tokens.len();
        if tokens.last().is_some_and(|t| t.kind == kinds.eof) {
            limit -= 1;
        }
        Self {
            grammar,
            tokens,
            limit,
            interner,
            registry,
            kinds,
            depth_exceeded: false,
        }
    }

    /// Pass/fail verdict: does the start rule accept the whole stream?
    pub fn recognize(&mut self, start: Option<Symbol>) -> bool {
        let mut scratch = Diagnostics::new();
        self.parse_ast(start, &mut scratch).is_some()
    }

    /// Parse the whole token slice (excluding the trailing `EOF`) with the
    /// start rule and expand templates into an AST.
    pub fn parse_ast(&mut self, start: Option<Symbol>, diag: &mut Diagnostics) -> Option<AstNode> {
        if self.limit == 0 {
            diag.error(Code::Parse, self.span_at(0), "empty input for grammar parse")
                .emit();
            return None;
        }

        let Some(start) = start.or(self.grammar.start_rule) else {
            diag.error(Code::Parse, self.span_at(0), "grammar has no start rule")
                .emit();
            return None;
        };

        let mut cursor = 0;
        let result = self.parse_expr(start, 0, &mut cursor, 0, diag);

        if self.depth_exceeded {
            diag.fatal(
                Code::Parse,
                self.span_at(cursor),
                format!("parsing depth exceeded (recursion limit: {MAX_DEPTH})"),
            )
            .emit();
            return None;
        }

        let Some(node) = result else {
            diag.error(
                Code::Parse,
                self.span_at(cursor),
                "no grammar production matches the input",
            )
            .emit();
            return None;
        };

        if cursor != self.limit {
            diag.error(
                Code::Parse,
                self.span_at(cursor),
                "grammar did not consume the entire input",
            )
            .emit();
            return None;
        }

        Some(node)
    }

    fn parse_expr(
        &mut self,
        rule_name: Symbol,
        min_bp: u32,
        cursor: &mut usize,
        depth: usize,
        diag: &mut Diagnostics,
    ) -> Option<AstNode> {
        if depth > MAX_DEPTH {
            self.depth_exceeded = true;
            return None;
        }

        let grammar = self.grammar;
        let rule = grammar.rule(rule_name)?;

        // Prefix productions: first full match from the cursor wins.
        let mut current: Option<AstNode> = None;
        for prod in rule.productions.iter().filter(|p| !p.starts_with_expr) {
            let span = self.span_at(*cursor);
            let mut caps = Captures::new();
            let mut local = *cursor;
            if self.match_production(prod, false, &mut local, depth, &mut caps, diag) {
                let node = self.expand(prod, &caps, span, diag)?;
                *cursor = local;
                current = Some(node);
                break;
            }
        }
        let mut current = current?;

        // Extension productions attach while their lead binding power allows.
        loop {
            let mut extended = false;
            for prod in rule.productions.iter().filter(|p| p.starts_with_expr) {
                let Some(lead_bp) = prod.lead_bp() else { continue };
                if lead_bp < min_bp {
                    continue;
                }

                let span = current.span;
                let mut caps = Captures::new();
                if let Some(GrammarAtom::Expr {
                    capture: Some(name),
                    ..
                }) = prod.atoms.first()
                {
                    caps.push((*name, current.clone()));
                }

                let mut local = *cursor;
                if self.match_production(prod, true, &mut local, depth, &mut caps, diag) {
                    current = self.expand(prod, &caps, span, diag)?;
                    *cursor = local;
                    extended = true;
                    break;
                }
            }
            if !extended {
                break;
            }
        }

        Some(current)
    }

    /// Match every atom of a production from the cursor. Empty matches are
    /// rejected, as are extension productions with no continuation atoms.
    fn match_production(
        &mut self,
        prod: &Production,
        skip_leading_expr: bool,
        cursor: &mut usize,
        depth: usize,
        caps: &mut Captures,
        diag: &mut Diagnostics,
    ) -> bool {
        if skip_leading_expr && prod.atoms.len() <= 1 {
            return false;
        }

        let start = *cursor;
        let mut local = start;
        for (i, atom) in prod.atoms.iter().enumerate() {
            if i == 0 && skip_leading_expr {
                continue;
            }
            if !self.match_atom(atom, &mut local, depth, caps, diag) {
                return false;
            }
        }

        if local == start {
            return false;
        }
        *cursor = local;
        true
    }

    fn match_atom(
        &mut self,
        atom: &GrammarAtom,
        cursor: &mut usize,
        depth: usize,
        caps: &mut Captures,
        diag: &mut Diagnostics,
    ) -> bool {
        match atom {
            GrammarAtom::Literal { text, capture } => {
                let Some(tok) = self.token_at(*cursor) else {
                    return false;
                };
                if tok.text != *text {
                    return false;
                }
                if let Some(name) = capture {
                    caps.push((
                        *name,
                        AstNode::leaf(AstKind::Literal, tok.kind, tok.text.clone(), tok.span),
                    ));
                }
                *cursor += 1;
                true
            }
            GrammarAtom::TokenKind { kind, capture } => {
                let Some(tok) = self.token_at(*cursor) else {
                    return false;
                };
                if tok.kind != *kind {
                    return false;
                }
                if let Some(name) = capture {
                    let leaf = if tok.kind == self.kinds.ident {
                        let sym = self.interner.intern(&tok.text);
                        AstNode::leaf(AstKind::Ident, sym, tok.text.clone(), tok.span)
                    } else {
                        AstNode::leaf(AstKind::Literal, tok.kind, tok.text.clone(), tok.span)
                    };
                    caps.push((*name, leaf));
                }
                *cursor += 1;
                true
            }
            GrammarAtom::Expr {
                rule,
                min_bp,
                capture,
            } => {
                let Some(node) = self.parse_expr(*rule, *min_bp, cursor, depth + 1, diag) else {
                    return false;
                };
                if let Some(name) = capture {
                    caps.push((*name, node));
                }
                true
            }
            GrammarAtom::Repeat { subatoms, min, max } => {
                // Greedy bounded repetition: no backtracking between
                // iterations, success iff at least `min` matched.
                let mut count = 0u32;
                while count < *max {
                    let save = *cursor;
                    let save_caps = caps.len();
                    let mut ok = true;
                    for sub in subatoms {
                        if !self.match_atom(sub, cursor, depth, caps, diag) {
                            ok = false;
                            break;
                        }
                    }
                    if !ok {
                        *cursor = save;
                        caps.truncate(save_caps);
                        break;
                    }
                    if *cursor == save {
                        break;
                    }
                    count += 1;
                }
                count >= *min
            }
        }
    }

    /// Expand a production template into an AST over the captured subtrees.
    fn expand(
        &mut self,
        prod: &Production,
        caps: &Captures,
        span: Span,
        diag: &mut Diagnostics,
    ) -> Option<AstNode> {
        let words: Vec<&str> = prod.template.split_whitespace().collect();
        if words.is_empty() {
            diag.error(Code::Parse, span, "production has an empty template")
                .emit();
            return None;
        }

        let declared = prod.captures();
        let mut cursor = 0;
        let node = self.expand_word(&words, &mut cursor, caps, &declared, span, diag)?;
        if cursor < words.len() {
            diag.error(
                Code::Parse,
                span,
                format!("template has trailing tokens: '{}'", prod.template),
            )
            .emit();
            return None;
        }
        Some(node)
    }

    fn expand_word(
        &mut self,
        words: &[&str],
        cursor: &mut usize,
        caps: &Captures,
        declared: &[Symbol],
        span: Span,
        diag: &mut Diagnostics,
    ) -> Option<AstNode> {
        let word = words[*cursor];
        *cursor += 1;

        // Operator application: consume arguments up to the registry arity.
        if word.starts_with('$') && word.len() > 1 {
            let op = self.interner.intern(word);
            let registry = self.registry;
            let info = registry.lookup(op);
            let kind = info.map(|i| i.ast_kind).unwrap_or(AstKind::Builtin);
            let max_args = info.map(|i| i.max_args).unwrap_or(usize::MAX);

            let mut node = AstNode::new(kind, op, span);
            while *cursor < words.len() && node.children.len() < max_args {
                let next = words[*cursor];
                if let Some(bound) = self.capture_bindings(next, caps, declared) {
                    // A capture splices all of its bindings; a repeat that
                    // matched zero times splices nothing.
                    *cursor += 1;
                    for child in bound {
                        node.push(child);
                    }
                } else {
                    node.push(self.expand_word(words, cursor, caps, declared, span, diag)?);
                }
            }
            return Some(node);
        }

        if word.starts_with('"') {
            return Some(AstNode::leaf(
                AstKind::Literal,
                self.kinds.string,
                word.to_string(),
                span,
            ));
        }

        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let kind = if word.contains('.') {
                self.kinds.float
            } else {
                self.kinds.number
            };
            return Some(AstNode::leaf(AstKind::Literal, kind, word.to_string(), span));
        }

        // Capture reference.
        match self.capture_bindings(word, caps, declared) {
            Some(mut bound) if bound.len() == 1 => bound.pop(),
            Some(bound) if bound.is_empty() => {
                diag.error(Code::Parse, span, format!("capture '{word}' matched nothing"))
                    .emit();
                None
            }
            Some(_) => {
                diag.error(
                    Code::Parse,
                    span,
                    format!("capture '{word}' is bound more than once and must be spliced into an operator"),
                )
                .emit();
                None
            }
            None => {
                diag.error(Code::Parse, span, format!("unknown template word '{word}'"))
                    .emit();
                None
            }
        }
    }

    /// Bindings for a capture word of this production, in match order.
    /// `None` when the word does not name a declared capture at all.
    fn capture_bindings(
        &self,
        word: &str,
        caps: &Captures,
        declared: &[Symbol],
    ) -> Option<Vec<AstNode>> {
        let sym = self.interner.get(word)?;
        if !declared.contains(&sym) {
            return None;
        }
        Some(
            caps.iter()
                .filter(|(name, _)| *name == sym)
                .map(|(_, node)| node.clone())
                .collect(),
        )
    }

    fn token_at(&self, index: usize) -> Option<&'t Token> {
        if index < self.limit {
            self.tokens.get(index)
        } else {
            None
        }
    }

    fn span_at(&self, index: usize) -> Span {
        self.tokens
            .get(index.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.span)
            .unwrap_or(Span::UNKNOWN)
    }
}
