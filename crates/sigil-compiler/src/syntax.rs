//! Loadable lexical rules.
//!
//! A syntax-rule file is line-oriented: `#` starts a comment, blank lines
//! are ignored, and every other line reads `TOKEN_KIND literal`. The
//! literal is a bare word or a double-quoted string honoring `\n`, `\t`,
//! `\\`, and `\"` escapes; literals containing whitespace or `#` must be
//! quoted. Kind names are interned; the lexer matches rule literals by
//! longest prefix (first declared wins on ties).

use std::path::Path;

use logos::Logos;
use sigil_core::{Code, Diagnostics, Interner, Span, Symbol};

use crate::{Error, Result};

/// A single lexical rule: token kind plus the literal that produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxRule {
    pub kind: Symbol,
    pub literal: String,
}

/// An ordered set of lexical rules, as loaded from a syntax-rule file.
#[derive(Debug, Clone, Default)]
pub struct SyntaxSet {
    pub rules: Vec<SyntaxRule>,
}

/// Token shapes inside a rule file.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
enum RuleTok<'src> {
    #[token("\n")]
    Newline,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    Quoted(&'src str),

    #[regex(r##"[^ \t\r\n"#]+"##)]
    Bare(&'src str),
}

impl SyntaxSet {
    /// An empty rule set: the bare-builtin fallback syntax.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse rule text. Malformed lines are dropped with a diagnostic;
    /// the remaining rules still load.
    pub fn parse(text: &str, interner: &mut Interner, diag: &mut Diagnostics) -> Self {
        let mut rules = Vec::new();
        let mut line = RuleLine::default();
        let mut line_no = 1usize;

        for tok in RuleTok::lexer(text) {
            match tok {
                Ok(RuleTok::Newline) => {
                    std::mem::take(&mut line).finish(line_no, interner, &mut rules, diag);
                    line_no += 1;
                }
                Ok(RuleTok::Comment) => {}
                Ok(RuleTok::Bare(word)) => line.bare(word),
                Ok(RuleTok::Quoted(text)) => line.quoted(&text[1..text.len() - 1]),
                Err(()) => line.malformed = true,
            }
        }
        line.finish(line_no, interner, &mut rules, diag);

        Self { rules }
    }

    /// Load rules from a file.
    pub fn from_file(
        path: impl AsRef<Path>,
        interner: &mut Interner,
        diag: &mut Diagnostics,
    ) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text, interner, diag))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Accumulator for one `TOKEN_KIND literal` line.
#[derive(Default)]
struct RuleLine<'src> {
    name: Option<&'src str>,
    literal: Option<String>,
    malformed: bool,
}

impl<'src> RuleLine<'src> {
    fn bare(&mut self, word: &'src str) {
        if self.name.is_none() {
            self.name = Some(word);
        } else if self.literal.is_none() {
            self.literal = Some(word.to_string());
        }
        // Anything after the literal is ignored.
    }

    fn quoted(&mut self, body: &str) {
        if self.name.is_none() {
            // Kind names are always bare words.
            self.malformed = true;
        } else if self.literal.is_none() {
            self.literal = Some(unescape(body));
        }
    }

    fn finish(
        self,
        line_no: usize,
        interner: &mut Interner,
        rules: &mut Vec<SyntaxRule>,
        diag: &mut Diagnostics,
    ) {
        if self.malformed {
            diag.error(
                Code::Lex,
                Span::UNKNOWN,
                format!("malformed syntax rule on line {line_no}"),
            )
            .emit();
            return;
        }
        let (Some(name), Some(literal)) = (self.name, self.literal) else {
            // A lone kind name (or an empty line) is skipped.
            return;
        };
        if literal.is_empty() {
            return;
        }
        rules.push(SyntaxRule {
            kind: interner.intern(name),
            literal,
        });
    }
}

/// Expand `\n \t \\ \"` escapes in the body of a quoted literal.
pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
