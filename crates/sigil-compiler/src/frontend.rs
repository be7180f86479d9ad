//! High-level front-end facade.
//!
//! Ties the pipeline together: syntax rules -> lexer -> scoped parse (with
//! preprocessor side effects) -> type inference. The output — a typed
//! operator tree plus the populated type context — is the boundary consumed
//! by drivers and backends.

use std::path::Path;

use sigil_core::{Diagnostics, Interner};

use crate::ast::AstNode;
use crate::lexer::{Token, TokenKinds, tokenize};
use crate::parser::operators::OperatorRegistry;
use crate::parser::scoped::ScopedParser;
use crate::syntax::SyntaxSet;
use crate::typing::context::TypeContext;
use crate::typing::infer::TypeChecker;
use crate::{Error, PassResult, Result};

/// The front-end: one instance per compilation unit.
pub struct Frontend {
    interner: Interner,
    kinds: TokenKinds,
    registry: OperatorRegistry,
    syntax: SyntaxSet,
}

/// Result of compiling one source file.
#[derive(Debug)]
pub struct Output {
    /// File-level operator tree (an implicit `$block` when the file holds
    /// more than one statement).
    pub ast: AstNode,
    /// Type context describing every declared name.
    pub types: TypeContext,
    /// Module paths recorded by `$import`.
    pub imports: Vec<String>,
}

impl Frontend {
    /// Build a front-end from syntax-rule text. Rule problems are reported
    /// into `diag`; the front-end still works with the rules that loaded.
    pub fn new(syntax_text: &str, diag: &mut Diagnostics) -> Self {
        let mut interner = Interner::new();
        let kinds = TokenKinds::install(&mut interner);
        let registry = OperatorRegistry::new(&mut interner);
        let syntax = SyntaxSet::parse(syntax_text, &mut interner, diag);
        Self {
            interner,
            kinds,
            registry,
            syntax,
        }
    }

    /// Build a front-end with the bare-builtin fallback syntax (no rules).
    pub fn bare() -> Self {
        let mut diag = Diagnostics::new();
        Self::new("", &mut diag)
    }

    /// Build a front-end from a syntax-rule file.
    pub fn from_syntax_file(path: impl AsRef<Path>, diag: &mut Diagnostics) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(&text, diag))
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn kinds(&self) -> TokenKinds {
        self.kinds
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Tokenize `source` under the loaded syntax rules.
    pub fn tokenize(&mut self, path: &str, source: &str, diag: &mut Diagnostics) -> Vec<Token> {
        let path_sym = self.interner.intern(path);
        tokenize(&self.syntax, path_sym, source, &self.kinds, diag)
    }

    /// Compile one source file to a typed tree and type context.
    ///
    /// Type errors do not abort: the tree is still produced and the
    /// diagnostics carry the batch. Only an unparseable file returns `Err`.
    pub fn compile(&mut self, path: &str, source: &str) -> PassResult<Output> {
        let mut diag = Diagnostics::new();

        let path_sym = self.interner.intern(path);
        let tokens = tokenize(&self.syntax, path_sym, source, &self.kinds, &mut diag);

        let mut parser = ScopedParser::new(
            &mut self.interner,
            &self.registry,
            self.kinds,
            Some(Path::new(path)),
        );
        let Some(ast) = parser.parse(&tokens, &mut diag) else {
            return Err(Error::ParseFailed(diag));
        };
        let imports = parser.imports().to_vec();
        drop(parser);

        let mut types = TypeContext::new();
        let mut checker = TypeChecker::new(
            &mut types,
            &self.interner,
            &self.registry,
            self.kinds,
            &mut diag,
        );
        let _ = checker.check(&ast);
        types.check_unresolved_forwards(&self.interner, &mut diag);

        Ok((
            Output {
                ast,
                types,
                imports,
            },
            diag,
        ))
    }

    /// Compile a source file from disk.
    pub fn compile_file(&mut self, path: impl AsRef<Path>) -> PassResult<Output> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.compile(&path.display().to_string(), &source)
    }
}
