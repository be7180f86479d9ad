//! The type model.
//!
//! Types are owned tagged sums; equality is structural and derived. Function
//! types match iff their parameter lists and return types match element-wise,
//! groups match element-wise, blocks match field-by-field on both name and
//! type, references match on target and both flags.

use sigil_core::{Interner, Symbol};

/// A sigil type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Unknown,
    Void,
    Int,
    Float,
    Str,
    Ident,
    Bool,
    Trait,
    Func {
        params: Vec<Type>,
        ret: Box<Type>,
    },
    Ref {
        target: Box<Type>,
        mutable: bool,
        inline: bool,
    },
    /// Tuple-like ordered elements.
    Group(Vec<Type>),
    /// Struct-like named fields, in declaration order.
    Block {
        fields: Vec<(Symbol, Type)>,
    },
}

impl Type {
    pub fn func(params: Vec<Type>, ret: Type) -> Self {
        Type::Func {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn reference(target: Type, mutable: bool, inline: bool) -> Self {
        Type::Ref {
            target: Box::new(target),
            mutable,
            inline,
        }
    }

    /// Informational size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Type::Unknown | Type::Void | Type::Trait => 0,
            Type::Bool => 1,
            Type::Int | Type::Float | Type::Ident | Type::Func { .. } | Type::Ref { .. } => 8,
            Type::Str => 16,
            Type::Group(elems) => elems.iter().map(Type::size).sum(),
            Type::Block { fields } => fields.iter().map(|(_, t)| t.size()).sum(),
        }
    }

    /// Informational alignment requirement.
    pub fn align(&self) -> usize {
        match self {
            Type::Unknown | Type::Void | Type::Bool | Type::Trait => 1,
            Type::Int
            | Type::Float
            | Type::Str
            | Type::Ident
            | Type::Func { .. }
            | Type::Ref { .. } => 8,
            Type::Group(elems) => elems.iter().map(Type::align).max().unwrap_or(1),
            Type::Block { fields } => fields.iter().map(|(_, t)| t.align()).max().unwrap_or(1),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Float | Type::Bool | Type::Str | Type::Void
        )
    }

    /// Subtype check; structural equality until real subtyping lands.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        self == other
    }

    /// Interner-aware display (block field names are symbols).
    pub fn display<'a>(&'a self, interner: &'a Interner) -> TypeDisplay<'a> {
        TypeDisplay {
            ty: self,
            interner,
        }
    }
}

/// `Display` adapter returned by [`Type::display`].
pub struct TypeDisplay<'a> {
    ty: &'a Type,
    interner: &'a Interner,
}

impl std::fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_type(self.ty, self.interner, f)
    }
}

fn write_type(
    ty: &Type,
    interner: &Interner,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    match ty {
        Type::Unknown => write!(f, "unknown"),
        Type::Void => write!(f, "void"),
        Type::Int => write!(f, "int"),
        Type::Float => write!(f, "float"),
        Type::Str => write!(f, "string"),
        Type::Ident => write!(f, "ident"),
        Type::Bool => write!(f, "bool"),
        Type::Trait => write!(f, "trait"),
        Type::Func { params, ret } => {
            write!(f, "func: (")?;
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_type(param, interner, f)?;
            }
            write!(f, ") => ")?;
            write_type(ret, interner, f)
        }
        Type::Ref {
            target,
            mutable,
            inline,
        } => {
            write!(
                f,
                "ref[{}{}] ",
                if *mutable { "mut" } else { "const" },
                if *inline { " inline" } else { "" }
            )?;
            write_type(target, interner, f)
        }
        Type::Group(elems) => {
            write!(f, "group: (")?;
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_type(elem, interner, f)?;
            }
            write!(f, ")")
        }
        Type::Block { fields } => {
            write!(f, "block: {{")?;
            for (i, (name, field)) in fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}:", interner.try_resolve(*name).unwrap_or("?"))?;
                write_type(field, interner, f)?;
            }
            write!(f, "}}")
        }
    }
}
