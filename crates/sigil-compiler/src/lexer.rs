//! Rule-driven tokenizer.
//!
//! The active [`SyntaxSet`](crate::syntax::SyntaxSet) is runtime data, so this
//! lexer is table-driven rather than generated: at every position it scans the
//! loaded rules for the longest literal match (first declared wins on ties)
//! and only falls back to the fixed token classes when no rule applies.
//!
//! Fallback classes: identifiers (`$`-sigiled operator names included),
//! integer and float numbers, double-quoted strings, and a one-byte `UNKNOWN`
//! token for anything else. Lexing never fails; the parser sees a best-effort
//! stream terminated by exactly one `EOF` token.

use sigil_core::{Code, Diagnostics, Interner, Span, Symbol};

use crate::syntax::SyntaxSet;

/// A single token: interned kind, owned lexeme, source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: Symbol,
    pub text: String,
    pub span: Span,
}

/// The token kinds the lexer can emit without any syntax rules loaded.
///
/// Interned once at startup so downstream code compares symbols instead of
/// re-interning kind names per call.
#[derive(Debug, Clone, Copy)]
pub struct TokenKinds {
    pub ident: Symbol,
    pub number: Symbol,
    pub float: Symbol,
    pub string: Symbol,
    pub symbol: Symbol,
    pub unknown: Symbol,
    pub eof: Symbol,
}

impl TokenKinds {
    pub fn install(interner: &mut Interner) -> Self {
        Self {
            ident: interner.intern("IDENT"),
            number: interner.intern("NUMBER"),
            float: interner.intern("FLOAT"),
            string: interner.intern("STRING"),
            symbol: interner.intern("SYMBOL"),
            unknown: interner.intern("UNKNOWN"),
            eof: interner.intern("EOF"),
        }
    }
}

/// Tokenize `source` under the given syntax rules.
///
/// Row/col are 1-based and reported at the lexeme start; `\r` counts as
/// whitespace, `\n` advances the row.
pub fn tokenize(
    syntax: &SyntaxSet,
    path: Symbol,
    source: &str,
    kinds: &TokenKinds,
    diag: &mut Diagnostics,
) -> Vec<Token> {
    Lexer {
        syntax,
        path,
        bytes: source.as_bytes(),
        kinds,
        offset: 0,
        row: 1,
        col: 1,
    }
    .run(diag)
}

struct Lexer<'a> {
    syntax: &'a SyntaxSet,
    path: Symbol,
    bytes: &'a [u8],
    kinds: &'a TokenKinds,
    offset: usize,
    row: u32,
    col: u32,
}

impl Lexer<'_> {
    fn run(mut self, diag: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.offset < self.bytes.len() {
            let c = self.bytes[self.offset];

            if c == b'\n' {
                self.row += 1;
                self.col = 1;
                self.offset += 1;
                continue;
            }
            if c == b' ' || c == b'\t' || c == b'\r' {
                self.col += 1;
                self.offset += 1;
                continue;
            }

            if let Some((kind, len)) = self.longest_rule_match() {
                tokens.push(self.emit(kind, len));
                continue;
            }

            if c.is_ascii_alphabetic() || c == b'_' {
                let len = self.scan_ident(0);
                tokens.push(self.emit(self.kinds.ident, len));
                continue;
            }

            if c == b'$' {
                // Operator names: `$decl`, and the two-sigil `$$spread` form.
                let sigils = if self.bytes.get(self.offset + 1) == Some(&b'$') {
                    2
                } else {
                    1
                };
                let head = self.bytes.get(self.offset + sigils).copied();
                if head.is_some_and(|b| b.is_ascii_alphabetic() || b == b'_') {
                    let len = self.scan_ident(sigils);
                    tokens.push(self.emit(self.kinds.ident, len));
                } else {
                    tokens.push(self.emit(self.kinds.unknown, 1));
                }
                continue;
            }

            if c.is_ascii_digit() {
                let (kind, len) = self.scan_number();
                tokens.push(self.emit(kind, len));
                continue;
            }

            if c == b'"' {
                match self.scan_string() {
                    Some(len) => tokens.push(self.emit(self.kinds.string, len)),
                    None => {
                        diag.error(
                            Code::Lex,
                            Span::new(self.path, self.row, self.col),
                            "unterminated string literal",
                        )
                        .emit();
                        let len = self.bytes.len() - self.offset;
                        tokens.push(self.emit(self.kinds.unknown, len));
                    }
                }
                continue;
            }

            // Unknown byte: emit and keep going so the parser sees a
            // best-effort stream.
            tokens.push(self.emit(self.kinds.unknown, 1));
        }

        tokens.push(Token {
            kind: self.kinds.eof,
            text: String::new(),
            span: Span::new(self.path, self.row, self.col),
        });

        tokens
    }

    /// Longest literal match over all rules; first declared wins on ties.
    fn longest_rule_match(&self) -> Option<(Symbol, usize)> {
        let rest = &self.bytes[self.offset..];
        let mut best: Option<(Symbol, usize)> = None;
        for rule in &self.syntax.rules {
            let lit = rule.literal.as_bytes();
            if !lit.is_empty()
                && rest.starts_with(lit)
                && best.is_none_or(|(_, len)| lit.len() > len)
            {
                best = Some((rule.kind, lit.len()));
            }
        }
        best
    }

    fn scan_ident(&self, prefix: usize) -> usize {
        let mut len = prefix;
        while self
            .bytes
            .get(self.offset + len)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            len += 1;
        }
        len
    }

    fn scan_number(&self) -> (Symbol, usize) {
        let mut len = 0;
        while self
            .bytes
            .get(self.offset + len)
            .is_some_and(|b| b.is_ascii_digit())
        {
            len += 1;
        }

        // A dot followed by digits upgrades the token to a float.
        if self.bytes.get(self.offset + len) == Some(&b'.')
            && self
                .bytes
                .get(self.offset + len + 1)
                .is_some_and(|b| b.is_ascii_digit())
        {
            len += 1;
            while self
                .bytes
                .get(self.offset + len)
                .is_some_and(|b| b.is_ascii_digit())
            {
                len += 1;
            }
            return (self.kinds.float, len);
        }

        (self.kinds.number, len)
    }

    /// Scan a quoted string including both quotes. `None` if unterminated.
    fn scan_string(&self) -> Option<usize> {
        let mut len = 1;
        loop {
            match self.bytes.get(self.offset + len)? {
                b'"' => return Some(len + 1),
                b'\\' => {
                    self.bytes.get(self.offset + len + 1)?;
                    len += 2;
                }
                b'\n' => return None,
                _ => len += 1,
            }
        }
    }

    /// Emit a token of `len` bytes at the current position and advance.
    fn emit(&mut self, kind: Symbol, len: usize) -> Token {
        let text = std::str::from_utf8(&self.bytes[self.offset..self.offset + len])
            .unwrap_or_default()
            .to_string();
        let span = Span::new(self.path, self.row, self.col);

        for b in &self.bytes[self.offset..self.offset + len] {
            if *b == b'\n' {
                self.row += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.offset += len;

        Token { kind, text, span }
    }
}
