//! Operator tree.
//!
//! Every parse produces a tree of [`AstNode`]s. Structural operators carry a
//! dedicated kind (`Decl`, `If`, ...); everything else parses as `Builtin`.
//! Leaves are literals and identifiers. A node owns its children exclusively.

use serde::Serialize;
use sigil_core::{Interner, Span, Symbol};

/// Kinds of AST nodes supported by the core language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AstKind {
    Literal,
    Ident,
    Call,
    Func,
    If,
    Block,
    Group,
    Decl,
    Set,
    Builtin,
    Overload,
    Unknown,
}

impl AstKind {
    pub fn name(self) -> &'static str {
        match self {
            AstKind::Literal => "literal",
            AstKind::Ident => "ident",
            AstKind::Call => "call",
            AstKind::Func => "func",
            AstKind::If => "if",
            AstKind::Block => "block",
            AstKind::Group => "group",
            AstKind::Decl => "decl",
            AstKind::Set => "set",
            AstKind::Builtin => "builtin",
            AstKind::Overload => "overload",
            AstKind::Unknown => "unknown",
        }
    }
}

/// An AST node.
///
/// For operator-like nodes, `op` holds the operator symbol. Literal leaves
/// keep their token-kind symbol in `op` and the source text in `value`;
/// identifier leaves keep their interned name in `op`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: AstKind,
    pub op: Option<Symbol>,
    pub value: String,
    pub children: Vec<AstNode>,
    pub span: Span,
}

impl AstNode {
    pub fn new(kind: AstKind, op: Symbol, span: Span) -> Self {
        Self {
            kind,
            op: Some(op),
            value: String::new(),
            children: Vec::new(),
            span,
        }
    }

    pub fn leaf(kind: AstKind, op: Symbol, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            op: Some(op),
            value: value.into(),
            children: Vec::new(),
            span,
        }
    }

    pub fn push(&mut self, child: AstNode) {
        self.children.push(child);
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The unquoted body of a string literal, if this is one.
    pub fn string_value(&self) -> Option<&str> {
        if self.kind != AstKind::Literal {
            return None;
        }
        self.value
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
    }

    /// Depth-first tree dump with two-space indentation.
    pub fn dump(&self, interner: &Interner) -> String {
        let mut out = String::new();
        self.dump_into(interner, 0, &mut out);
        out
    }

    fn dump_into(&self, interner: &Interner, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(self.kind.name());

        match self.kind {
            AstKind::Literal | AstKind::Ident => {
                out.push(' ');
                out.push_str(&self.value);
            }
            _ => {
                if let Some(name) = self.op.and_then(|op| interner.try_resolve(op)) {
                    out.push_str(" (");
                    out.push_str(name);
                    out.push(')');
                }
            }
        }
        out.push('\n');

        for child in &self.children {
            child.dump_into(interner, depth + 1, out);
        }
    }

    /// Serializable shape of the tree, used by `sigil ast --json`.
    pub fn to_dump(&self, interner: &Interner) -> AstDump {
        AstDump {
            kind: self.kind,
            op: self
                .op
                .and_then(|op| interner.try_resolve(op))
                .map(str::to_owned),
            value: if self.value.is_empty() {
                None
            } else {
                Some(self.value.clone())
            },
            line: self.span.line,
            col: self.span.col,
            children: self
                .children
                .iter()
                .map(|c| c.to_dump(interner))
                .collect(),
        }
    }
}

/// JSON-friendly rendering of an [`AstNode`].
#[derive(Debug, Clone, Serialize)]
pub struct AstDump {
    pub kind: AstKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub line: u32,
    pub col: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstDump>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_format() {
        let mut interner = Interner::new();
        let decl = interner.intern("$decl");
        let add = interner.intern("$add");
        let number = interner.intern("NUMBER");
        let x = interner.intern("x");

        let mut add_node = AstNode::new(AstKind::Builtin, add, Span::UNKNOWN);
        add_node.push(AstNode::leaf(AstKind::Literal, number, "2", Span::UNKNOWN));
        add_node.push(AstNode::leaf(AstKind::Literal, number, "3", Span::UNKNOWN));

        let mut root = AstNode::new(AstKind::Decl, decl, Span::UNKNOWN);
        root.push(AstNode::leaf(AstKind::Ident, x, "x", Span::UNKNOWN));
        root.push(add_node);

        insta::assert_snapshot!(root.dump(&interner), @r"
        decl ($decl)
          ident x
          builtin ($add)
            literal 2
            literal 3
        ");
    }

    #[test]
    fn string_value_strips_quotes() {
        let mut interner = Interner::new();
        let string = interner.intern("STRING");
        let leaf = AstNode::leaf(AstKind::Literal, string, "\"a/b.grammar\"", Span::UNKNOWN);
        assert_eq!(leaf.string_value(), Some("a/b.grammar"));

        let bare = AstNode::leaf(AstKind::Literal, string, "42", Span::UNKNOWN);
        assert_eq!(bare.string_value(), None);
    }
}
