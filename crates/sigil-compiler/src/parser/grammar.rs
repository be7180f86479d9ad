//! Grammar data model and file loader.
//!
//! Grammar files have a block form:
//!
//! ```text
//! rule <name>:
//!   <pattern> => <template>
//!   <pattern> => <template>
//! end
//! ```
//!
//! Patterns are whitespace-separated atoms: bare punctuation or `"quoted"`
//! text matches a token lexeme literally, `%KIND` matches a token kind,
//! `$<rule>[<n>]` recurses into `<rule>` at minimum binding power `n`, and
//! `$( ... )` groups subatoms with a `*`/`+`/`?` repetition suffix. An
//! identifier-like word names a capture for the atom before it. The template
//! after `=>` is a builtin-operator expression over the capture names; it is
//! expanded to an AST once the pattern matches.

use std::path::Path;

use logos::Logos;
use sigil_core::{Interner, Symbol};

use crate::syntax::unescape;

/// A single production atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarAtom {
    /// A literal token lexeme to match.
    Literal {
        text: String,
        capture: Option<Symbol>,
    },
    /// A token-kind match (e.g. `%IDENT`).
    TokenKind {
        kind: Symbol,
        capture: Option<Symbol>,
    },
    /// A recursive rule reference with a minimum binding power.
    Expr {
        rule: Symbol,
        min_bp: u32,
        capture: Option<Symbol>,
    },
    /// A grouped subpattern with bounded repetition (e.g. `$( "," $expr )+`).
    Repeat {
        subatoms: Vec<GrammarAtom>,
        min: u32,
        max: u32,
    },
}

impl GrammarAtom {
    fn set_capture(&mut self, name: Symbol) -> bool {
        match self {
            GrammarAtom::Literal { capture, .. }
            | GrammarAtom::TokenKind { capture, .. }
            | GrammarAtom::Expr { capture, .. } => {
                *capture = Some(name);
                true
            }
            GrammarAtom::Repeat { .. } => false,
        }
    }

    fn collect_captures(&self, out: &mut Vec<Symbol>) {
        match self {
            GrammarAtom::Literal { capture, .. }
            | GrammarAtom::TokenKind { capture, .. }
            | GrammarAtom::Expr { capture, .. } => {
                if let Some(name) = capture {
                    out.push(*name);
                }
            }
            GrammarAtom::Repeat { subatoms, .. } => {
                for sub in subatoms {
                    sub.collect_captures(out);
                }
            }
        }
    }
}

/// One production: an ordered atom sequence plus its expansion template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub atoms: Vec<GrammarAtom>,
    pub template: String,
    /// True when the first atom recurses into this production's own rule,
    /// making this an infix/postfix extension consumed by the Pratt loop.
    pub starts_with_expr: bool,
}

impl Production {
    /// Binding power of the leading expression atom, for extension gating.
    pub fn lead_bp(&self) -> Option<u32> {
        match self.atoms.first() {
            Some(GrammarAtom::Expr { min_bp, .. }) => Some(*min_bp),
            _ => None,
        }
    }

    pub fn captures(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        for atom in &self.atoms {
            atom.collect_captures(&mut out);
        }
        out
    }
}

/// A named grammar rule with one or more productions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    pub name: Symbol,
    pub productions: Vec<Production>,
}

/// A dynamic grammar loaded from a text description.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub rules: Vec<GrammarRule>,
    /// Start symbol: the first rule seen.
    pub start_rule: Option<Symbol>,
}

/// Errors from loading a grammar file. A failed load is reported as a
/// warning by the scoped parser, which keeps the previous grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("grammar defines no rules")]
    Empty,
}

/// Token shapes inside a production pattern.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum PatTok<'src> {
    #[token("$(")]
    GroupOpen,

    #[token(")*")]
    GroupCloseStar,

    #[token(")+")]
    GroupClosePlus,

    #[token(")?")]
    GroupCloseOpt,

    #[token(")")]
    GroupClose,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*(\[[0-9]+\])?")]
    RuleRef(&'src str),

    #[regex(r"%[A-Za-z_][A-Za-z0-9_]*")]
    KindRef(&'src str),

    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    Quoted(&'src str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word(&'src str),

    #[regex(r#"[^ \t$%"A-Za-z_)][^ \t)]*"#)]
    Punct(&'src str),
}

impl Grammar {
    /// Parse a grammar description.
    pub fn parse(text: &str, interner: &mut Interner) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::default();
        let mut current: Option<usize> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line == "end" {
                current = None;
                continue;
            }

            if let Some(rest) = line.strip_prefix("rule") {
                let header = rest.trim();
                let Some(name) = header.strip_suffix(':') else {
                    return Err(GrammarError::Parse {
                        line: line_no,
                        message: format!("rule header must end with ':': '{line}'"),
                    });
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(GrammarError::Parse {
                        line: line_no,
                        message: "rule header is missing a name".to_string(),
                    });
                }
                let sym = interner.intern(name);
                current = Some(grammar.find_or_add_rule(sym));
                continue;
            }

            let Some(rule_idx) = current else {
                return Err(GrammarError::Parse {
                    line: line_no,
                    message: format!("production outside of a rule block: '{line}'"),
                });
            };

            let Some((pattern, template)) = line.split_once("=>") else {
                return Err(GrammarError::Parse {
                    line: line_no,
                    message: format!("production is missing '=>': '{line}'"),
                });
            };

            let rule_name = grammar.rules[rule_idx].name;
            let production =
                parse_pattern(pattern.trim(), template.trim(), interner, line_no, rule_name)?;
            grammar.rules[rule_idx].productions.push(production);
        }

        if grammar.rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        Ok(grammar)
    }

    /// Load a grammar from a text file.
    pub fn from_file(path: impl AsRef<Path>, interner: &mut Interner) -> Result<Self, GrammarError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, interner)
    }

    pub fn rule(&self, name: Symbol) -> Option<&GrammarRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Index of the named rule, adding an empty one if missing. Redefining a
    /// rule resets its productions.
    fn find_or_add_rule(&mut self, name: Symbol) -> usize {
        if let Some(idx) = self.rules.iter().position(|r| r.name == name) {
            self.rules[idx].productions.clear();
            return idx;
        }
        if self.start_rule.is_none() {
            self.start_rule = Some(name);
        }
        self.rules.push(GrammarRule {
            name,
            productions: Vec::new(),
        });
        self.rules.len() - 1
    }
}

fn parse_pattern(
    pattern: &str,
    template: &str,
    interner: &mut Interner,
    line_no: usize,
    rule_name: Symbol,
) -> Result<Production, GrammarError> {
    let err = |message: String| GrammarError::Parse {
        line: line_no,
        message,
    };

    // Stack of atom lists: the bottom is the production, pushed entries are
    // open `$( ... )` groups.
    let mut stack: Vec<Vec<GrammarAtom>> = vec![Vec::new()];

    for tok in PatTok::lexer(pattern) {
        let tok = tok.map_err(|()| err(format!("unrecognized pattern token in '{pattern}'")))?;
        match tok {
            PatTok::GroupOpen => stack.push(Vec::new()),
            PatTok::GroupCloseStar | PatTok::GroupClosePlus | PatTok::GroupCloseOpt
            | PatTok::GroupClose => {
                if stack.len() < 2 {
                    return Err(err("unbalanced ')' in pattern".to_string()));
                }
                let subatoms = stack.pop().expect("stack checked above");
                let (min, max) = match tok {
                    PatTok::GroupCloseStar => (0, u32::MAX),
                    PatTok::GroupClosePlus => (1, u32::MAX),
                    PatTok::GroupCloseOpt => (0, 1),
                    _ => (1, 1),
                };
                stack
                    .last_mut()
                    .expect("bottom list always present")
                    .push(GrammarAtom::Repeat { subatoms, min, max });
            }
            PatTok::RuleRef(text) => {
                let body = &text[1..];
                let (name, min_bp) = match body.split_once('[') {
                    Some((name, bp)) => {
                        let digits = bp.strip_suffix(']').expect("regex guarantees ']'");
                        let bp = digits.parse::<u32>().map_err(|_| {
                            err(format!("invalid binding power in '{text}'"))
                        })?;
                        (name, bp)
                    }
                    None => (body, 0),
                };
                stack.last_mut().expect("bottom list").push(GrammarAtom::Expr {
                    rule: interner.intern(name),
                    min_bp,
                    capture: None,
                });
            }
            PatTok::KindRef(text) => {
                stack
                    .last_mut()
                    .expect("bottom list")
                    .push(GrammarAtom::TokenKind {
                        kind: interner.intern(&text[1..]),
                        capture: None,
                    });
            }
            PatTok::Quoted(text) => {
                stack
                    .last_mut()
                    .expect("bottom list")
                    .push(GrammarAtom::Literal {
                        text: unescape(&text[1..text.len() - 1]),
                        capture: None,
                    });
            }
            PatTok::Word(name) => {
                let sym = interner.intern(name);
                let attached = stack
                    .last_mut()
                    .expect("bottom list")
                    .last_mut()
                    .is_some_and(|atom| atom.set_capture(sym));
                if !attached {
                    return Err(err(format!(
                        "capture name '{name}' has no atom to capture"
                    )));
                }
            }
            PatTok::Punct(text) => {
                stack
                    .last_mut()
                    .expect("bottom list")
                    .push(GrammarAtom::Literal {
                        text: text.to_string(),
                        capture: None,
                    });
            }
        }
    }

    if stack.len() != 1 {
        return Err(err("unbalanced '$(' in pattern".to_string()));
    }
    let atoms = stack.pop().expect("bottom list");
    if atoms.is_empty() {
        return Err(err("empty pattern".to_string()));
    }

    // An extension production recurses into its own rule up front; a leading
    // reference to a *different* rule is an ordinary prefix production.
    let production = Production {
        starts_with_expr: matches!(
            atoms.first(),
            Some(GrammarAtom::Expr { rule, .. }) if *rule == rule_name
        ),
        atoms,
        template: template.to_string(),
    };

    // Every identifier-like template word must name a capture.
    let captures = production.captures();
    for word in production.template.split_whitespace() {
        let ident_like = word
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if ident_like
            && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && interner.get(word).is_none_or(|sym| !captures.contains(&sym))
        {
            return Err(err(format!(
                "template references unknown capture '{word}'"
            )));
        }
    }

    Ok(production)
}
