//! Scoped type context.
//!
//! Tracks variable bindings per lexical scope, a flat global function
//! registry, forward declarations awaiting bodies, the expected return type
//! while a function body is being checked, and the `$this`/`$file`/`$global`
//! namespace stacks.

use indexmap::IndexMap;
use sigil_core::{Code, Diagnostics, Interner, Span, Symbol};

use super::types::Type;

/// A forward declaration: a promised function type awaiting its body.
#[derive(Debug, Clone)]
pub struct ForwardDecl {
    pub name: Symbol,
    pub ty: Type,
    pub resolved: bool,
}

/// One lexical scope frame.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: IndexMap<Symbol, Type>,
    forwards: Vec<ForwardDecl>,
    has_forward_errors: bool,
}

/// Type checking context.
#[derive(Debug, Clone)]
pub struct TypeContext {
    /// Scope stack; index 0 is the global scope and is never popped.
    scopes: Vec<Scope>,
    /// Flat function registry: no shadowing across scopes.
    functions: IndexMap<Symbol, Type>,
    /// Set exactly while a function body is being checked.
    expected_return_type: Option<Type>,
    this_stack: Vec<Type>,
    file_type: Option<Type>,
    file_stack: Vec<Option<Type>>,
    global_type: Option<Type>,
    global_stack: Vec<Option<Type>>,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            functions: IndexMap::new(),
            expected_return_type: None,
            this_stack: Vec::new(),
            file_type: None,
            file_stack: Vec::new(),
            global_type: None,
            global_stack: Vec::new(),
        }
    }

    // ---- scopes ----

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope. Unresolved forward declarations are reported
    /// and make the pop return `false`, but the scope is unwound either way.
    pub fn pop_scope(&mut self, interner: &Interner, diag: &mut Diagnostics) -> bool {
        if self.scopes.len() <= 1 {
            return false;
        }
        let mut scope = self.scopes.pop().expect("scope count checked above");
        for forward in &scope.forwards {
            if !forward.resolved {
                diag.error(
                    Code::Type,
                    Span::UNKNOWN,
                    format!(
                        "$forward missing body for '{}'",
                        interner.try_resolve(forward.name).unwrap_or("?")
                    ),
                )
                .emit();
                scope.has_forward_errors = true;
            }
        }
        !scope.has_forward_errors
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    // ---- variables ----

    /// Bind a variable in the innermost scope.
    pub fn define_var(&mut self, name: Symbol, ty: Type) {
        self.current_scope_mut().vars.insert(name, ty);
    }

    /// Rebind an existing variable in the innermost scope only.
    pub fn update_var(&mut self, name: Symbol, ty: Type) -> bool {
        let scope = self.current_scope_mut();
        if scope.vars.contains_key(&name) {
            scope.vars.insert(name, ty);
            true
        } else {
            false
        }
    }

    /// Look up a variable, innermost scope first.
    pub fn lookup_var(&self, name: Symbol) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|s| s.vars.get(&name))
    }

    /// Whether the innermost scope already binds `name`.
    pub fn check_duplicate_var(&self, name: Symbol) -> bool {
        self.scopes
            .last()
            .is_some_and(|s| s.vars.contains_key(&name))
    }

    /// Variables of the innermost scope, in declaration order.
    pub fn current_vars(&self) -> impl Iterator<Item = (Symbol, &Type)> {
        self.scopes
            .last()
            .into_iter()
            .flat_map(|s| s.vars.iter().map(|(k, v)| (*k, v)))
    }

    // ---- functions ----

    /// Register a function. Fails on a name collision.
    pub fn define_func(&mut self, name: Symbol, ty: Type) -> bool {
        if self.functions.contains_key(&name) {
            return false;
        }
        self.functions.insert(name, ty);
        true
    }

    pub fn update_func(&mut self, name: Symbol, ty: Type) -> bool {
        if self.functions.contains_key(&name) {
            self.functions.insert(name, ty);
            true
        } else {
            false
        }
    }

    pub fn lookup_func(&self, name: Symbol) -> Option<&Type> {
        self.functions.get(&name)
    }

    // ---- forward declarations ----

    /// Record an unresolved forward declaration in the current scope.
    /// Fails if the scope already has a forward for `name`.
    pub fn define_forward(&mut self, name: Symbol, ty: Type) -> bool {
        let scope = self.current_scope_mut();
        if scope.forwards.iter().any(|f| f.name == name) {
            return false;
        }
        scope.forwards.push(ForwardDecl {
            name,
            ty,
            resolved: false,
        });
        true
    }

    /// Resolve a forward declaration with its body's type. Requires an
    /// existing, unresolved forward with a structurally equal type.
    pub fn define_forward_body(&mut self, name: Symbol, ty: &Type) -> bool {
        let scope = self.current_scope_mut();
        let Some(forward) = scope.forwards.iter_mut().find(|f| f.name == name) else {
            return false;
        };
        if forward.resolved || forward.ty != *ty {
            return false;
        }
        forward.resolved = true;
        true
    }

    /// Forward entry for `name` in the current scope.
    pub fn lookup_forward(&self, name: Symbol) -> Option<&ForwardDecl> {
        self.scopes
            .last()
            .and_then(|s| s.forwards.iter().find(|f| f.name == name))
    }

    /// End-of-unit validation: report forwards that never got a body, in any
    /// scope still live.
    pub fn check_unresolved_forwards(
        &mut self,
        interner: &Interner,
        diag: &mut Diagnostics,
    ) -> bool {
        let mut ok = true;
        for scope in &mut self.scopes {
            if scope.has_forward_errors {
                ok = false;
                continue;
            }
            for forward in &scope.forwards {
                if !forward.resolved {
                    diag.error(
                        Code::Type,
                        Span::UNKNOWN,
                        format!(
                            "$forward missing body for '{}'",
                            interner.try_resolve(forward.name).unwrap_or("?")
                        ),
                    )
                    .emit();
                    scope.has_forward_errors = true;
                    ok = false;
                    break;
                }
            }
        }
        ok
    }

    // ---- return type ----

    pub fn set_return_type(&mut self, ty: Option<Type>) -> Option<Type> {
        std::mem::replace(&mut self.expected_return_type, ty)
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.expected_return_type.as_ref()
    }

    // ---- namespace stacks ----

    pub fn push_this(&mut self, ty: Type) {
        self.this_stack.push(ty);
    }

    pub fn pop_this(&mut self) -> bool {
        self.this_stack.pop().is_some()
    }

    pub fn current_this(&self) -> Option<&Type> {
        self.this_stack.last()
    }

    pub fn push_file(&mut self, ty: Type) {
        self.file_stack.push(self.file_type.take());
        self.file_type = Some(ty);
    }

    pub fn pop_file(&mut self) -> bool {
        match self.file_stack.pop() {
            Some(prev) => {
                self.file_type = prev;
                true
            }
            None => false,
        }
    }

    pub fn file(&self) -> Option<&Type> {
        self.file_type.as_ref()
    }

    pub fn push_global(&mut self, ty: Type) {
        self.global_stack.push(self.global_type.take());
        self.global_type = Some(ty);
    }

    pub fn pop_global(&mut self) -> bool {
        match self.global_stack.pop() {
            Some(prev) => {
                self.global_type = prev;
                true
            }
            None => false,
        }
    }

    pub fn global(&self) -> Option<&Type> {
        self.global_type.as_ref()
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }
}
