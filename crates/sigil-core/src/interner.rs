//! Symbol interning.
//!
//! Every recurring string in the front-end — operator names like `$decl`,
//! token-kind names, identifiers, file paths — is folded into a [`Symbol`]:
//! a plain index that compares and hashes as an integer. The operator
//! registry and the type context key their tables on symbols, so two
//! occurrences of the same name are equal without touching string data.

use indexmap::IndexSet;

/// Handle to an interned string: the index at which it was first seen.
///
/// Symbols order by first use, not alphabetically; resolve through the
/// [`Interner`] when the spelling matters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// The raw index, for debug output.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Rebuild a symbol from a raw index. Only meaningful together with the
    /// interner that produced the index.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// Insertion-ordered set of canonical spellings.
///
/// Interning the same spelling twice yields the same symbol, and symbols
/// stay valid for the interner's whole lifetime. One interner serves one
/// compilation unit; nothing here is meant to be shared across units.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    strings: IndexSet<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a spelling, returning its stable symbol.
    pub fn intern(&mut self, text: &str) -> Symbol {
        let index = match self.strings.get_index_of(text) {
            Some(index) => index,
            None => self.strings.insert_full(text.to_owned()).0,
        };
        Symbol(index as u32)
    }

    /// Symbol for a spelling, if it has ever been interned. Never inserts.
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.strings
            .get_index_of(text)
            .map(|index| Symbol(index as u32))
    }

    /// The canonical spelling behind a symbol.
    ///
    /// # Panics
    /// Panics on a symbol from a different interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.try_resolve(sym)
            .expect("symbol from a different interner")
    }

    /// Like [`resolve`](Self::resolve), but `None` for foreign symbols.
    #[inline]
    pub fn try_resolve(&self, sym: Symbol) -> Option<&str> {
        self.strings
            .get_index(sym.0 as usize)
            .map(String::as_str)
    }

    /// Number of distinct spellings interned so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// All interned spellings, in first-use order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(index, s)| (Symbol(index as u32), s.as_str()))
    }
}
