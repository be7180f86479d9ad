//! Type inference.
//!
//! A single post-parse traversal of the operator tree. Dispatch is driven by
//! the [`TypeRule`] stored in the operator registry, so no operator names are
//! re-interned or compared at check time.
//!
//! Failure policy: every type error is reported through the diagnostics sink
//! and inference returns `None` for that node. Parents that require a
//! definite type may cascade, but the pass never aborts; sibling subtrees are
//! still checked so one file yields its whole error batch.

use sigil_core::{Code, Diagnostics, Interner, Symbol};

use crate::ast::{AstKind, AstNode};
use crate::lexer::TokenKinds;
use crate::parser::operators::{OperatorInfo, OperatorRegistry, TypeRule};
use crate::typing::context::TypeContext;
use crate::typing::types::Type;

/// AST walker that annotates the type context.
pub struct TypeChecker<'a> {
    ctx: &'a mut TypeContext,
    interner: &'a Interner,
    registry: &'a OperatorRegistry,
    kinds: TokenKinds,
    diag: &'a mut Diagnostics,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        ctx: &'a mut TypeContext,
        interner: &'a Interner,
        registry: &'a OperatorRegistry,
        kinds: TokenKinds,
        diag: &'a mut Diagnostics,
    ) -> Self {
        Self {
            ctx,
            interner,
            registry,
            kinds,
            diag,
        }
    }

    /// Check a file-level tree.
    ///
    /// The file block's declarations land in the global scope; nested blocks
    /// open their own scopes.
    pub fn check(&mut self, root: &AstNode) -> Option<Type> {
        if root.kind == AstKind::Block {
            let mut ok = true;
            for child in &root.children {
                if self.infer(child).is_none() {
                    ok = false;
                }
            }
            return ok.then_some(Type::Void);
        }
        self.infer(root)
    }

    pub fn infer(&mut self, node: &AstNode) -> Option<Type> {
        match node.kind {
            AstKind::Literal => Some(self.literal_type(node)),
            AstKind::Ident => self.ident_type(node),
            _ => self.infer_op(node),
        }
    }

    fn literal_type(&self, node: &AstNode) -> Type {
        if node.op == Some(self.kinds.float) {
            Type::Float
        } else if node.op == Some(self.kinds.string) {
            Type::Str
        } else if node.value.contains('.') {
            Type::Float
        } else {
            Type::Int
        }
    }

    fn ident_type(&mut self, node: &AstNode) -> Option<Type> {
        let name = node.op?;
        if let Some(ty) = self.ctx.lookup_var(name) {
            return Some(ty.clone());
        }
        let msg = format!("undefined variable '{}'", self.name_of(name));
        self.diag.error(Code::Type, node.span, msg).emit();
        None
    }

    fn infer_op(&mut self, node: &AstNode) -> Option<Type> {
        let Some(op) = node.op else {
            let _ = self.infer_children(node);
            return Some(Type::Void);
        };

        let registry = self.registry;
        let Some(info) = registry.lookup(op) else {
            let _ = self.infer_children(node);
            let msg = format!(
                "type inference not implemented for {}",
                self.name_of(op)
            );
            self.diag.warning(Code::Type, node.span, msg).emit();
            return Some(Type::Void);
        };

        let argc = node.children.len();
        if argc < info.min_args || argc > info.max_args {
            let expected = if info.is_variadic() {
                format!("at least {}", info.min_args)
            } else {
                format!("{}-{}", info.min_args, info.max_args)
            };
            let msg = format!(
                "operator {} expects {expected} args, got {argc}",
                info.name
            );
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }

        match info.rule {
            TypeRule::IntBinary | TypeRule::BitBinary => {
                self.homogeneous(node, info, &Type::Int, "int")
            }
            TypeRule::FloatBinary => self.homogeneous(node, info, &Type::Float, "float"),
            TypeRule::LogicBinary => self.homogeneous(node, info, &Type::Bool, "bool"),
            TypeRule::BitUnary => self.unary(node, info, &Type::Int, "int"),
            TypeRule::LogicUnary => self.unary(node, info, &Type::Bool, "bool"),
            TypeRule::Comparison => self.comparison(node, info),
            TypeRule::Void => {
                self.infer_children(node)?;
                Some(Type::Void)
            }
            TypeRule::Block => self.block(node),
            TypeRule::Decl => self.decl(node, info),
            TypeRule::Forward => self.forward(node),
            TypeRule::Func => self.func(node),
            TypeRule::If => self.if_expr(node),
            TypeRule::Set => self.set(node),
            TypeRule::Call => self.call(node),
            TypeRule::Ret => self.ret(node),
            TypeRule::RefMut => self.reference(node, true, false),
            TypeRule::RefConst => self.reference(node, false, false),
            TypeRule::RefInline => self.reference(node, false, true),
            TypeRule::This => self.namespace(node, self.ctx.current_this().cloned(), "$this"),
            TypeRule::File => self.namespace(node, self.ctx.file().cloned(), "$file"),
            TypeRule::Global => self.namespace(node, self.ctx.global().cloned(), "$global"),
            TypeRule::Member => self.member(node),
            TypeRule::IdentToString => {
                if node.children[0].kind != AstKind::Ident {
                    self.diag
                        .error(Code::Type, node.span, "$idtstr requires an identifier")
                        .emit();
                    return None;
                }
                Some(Type::Str)
            }
            TypeRule::StringToIdent => {
                if node.children[0].string_value().is_none() {
                    self.diag
                        .error(Code::Type, node.span, "$strtid requires a string literal")
                        .emit();
                    return None;
                }
                Some(Type::Ident)
            }
            TypeRule::Cast => {
                self.infer(&node.children[0])?;
                self.resolve_type_expr(&node.children[1])
            }
            TypeRule::Trait => Some(Type::Trait),
            TypeRule::Impl => {
                self.infer_children(node)?;
                Some(Type::Void)
            }
            // Validated by the preprocessor hook during the parse phase.
            TypeRule::Preprocessor => Some(Type::Void),
        }
    }

    /// Infer every child, reporting all failures; `None` if any child failed.
    fn infer_children(&mut self, node: &AstNode) -> Option<Vec<Type>> {
        let mut types = Vec::with_capacity(node.children.len());
        let mut ok = true;
        for child in &node.children {
            match self.infer(child) {
                Some(ty) => types.push(ty),
                None => ok = false,
            }
        }
        ok.then_some(types)
    }

    fn homogeneous(
        &mut self,
        node: &AstNode,
        info: &OperatorInfo,
        expected: &Type,
        what: &str,
    ) -> Option<Type> {
        let types = self.infer_children(node)?;
        if types.iter().any(|t| t != expected) {
            let msg = format!("{}: both arguments must be {what}", info.name);
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        Some(expected.clone())
    }

    fn unary(
        &mut self,
        node: &AstNode,
        info: &OperatorInfo,
        expected: &Type,
        what: &str,
    ) -> Option<Type> {
        let types = self.infer_children(node)?;
        if types[0] != *expected {
            let msg = format!("{}: argument must be {what}", info.name);
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        Some(expected.clone())
    }

    fn comparison(&mut self, node: &AstNode, info: &OperatorInfo) -> Option<Type> {
        let types = self.infer_children(node)?;
        if types[0] != types[1] {
            let msg = format!("{}: types not compatible", info.name);
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        Some(Type::Bool)
    }

    fn block(&mut self, node: &AstNode) -> Option<Type> {
        self.ctx.push_scope();
        let ok = self.infer_children(node).is_some();
        let popped = self.ctx.pop_scope(self.interner, self.diag);
        (ok && popped).then_some(Type::Void)
    }

    fn decl(&mut self, node: &AstNode, info: &OperatorInfo) -> Option<Type> {
        let name_node = &node.children[0];
        if name_node.kind != AstKind::Ident {
            let msg = format!("{}: first argument must be an identifier", info.name);
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        let name = name_node.op.expect("ident nodes carry their symbol");

        let value_ty = self.infer(&node.children[1])?;

        let resolves_forward = self
            .ctx
            .lookup_forward(name)
            .is_some_and(|f| !f.resolved);

        if resolves_forward {
            if !self.ctx.define_forward_body(name, &value_ty) {
                let msg = format!(
                    "body type does not match forward declaration for '{}'",
                    self.name_of(name)
                );
                self.diag.error(Code::Type, node.span, msg).emit();
                return None;
            }
            self.ctx.update_var(name, value_ty.clone());
            if matches!(value_ty, Type::Func { .. }) {
                let _ = self.ctx.define_func(name, value_ty);
            }
            return Some(Type::Void);
        }

        if self.ctx.check_duplicate_var(name) {
            let msg = format!("duplicate definition of '{}'", self.name_of(name));
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        self.ctx.define_var(name, value_ty.clone());

        if matches!(value_ty, Type::Func { .. }) && !self.ctx.define_func(name, value_ty) {
            let msg = format!("function '{}' already defined", self.name_of(name));
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }

        Some(Type::Void)
    }

    fn forward(&mut self, node: &AstNode) -> Option<Type> {
        let name_node = &node.children[0];
        if name_node.kind != AstKind::Ident {
            self.diag
                .error(
                    Code::Type,
                    node.span,
                    "$forward: first argument must be an identifier",
                )
                .emit();
            return None;
        }
        let name = name_node.op.expect("ident nodes carry their symbol");

        let ty = self.resolve_type_expr(&node.children[1])?;
        if !matches!(ty, Type::Func { .. }) {
            self.diag
                .error(Code::Type, node.span, "$forward requires a function type")
                .emit();
            return None;
        }

        if !self.ctx.define_forward(name, ty.clone()) {
            let msg = format!(
                "duplicate forward declaration of '{}'",
                self.name_of(name)
            );
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        self.ctx.define_var(name, ty);
        Some(Type::Void)
    }

    fn func(&mut self, node: &AstNode) -> Option<Type> {
        let params = self.resolve_params(&node.children[0])?;
        let ret = self.resolve_type_expr(&node.children[1])?;

        if let Some(body) = node.children.get(2) {
            let saved = self.ctx.set_return_type(Some(ret.clone()));
            self.ctx.push_scope();
            let body_ok = self.infer(body).is_some();
            let popped = self.ctx.pop_scope(self.interner, self.diag);
            self.ctx.set_return_type(saved);
            if !body_ok || !popped {
                return None;
            }
        }

        Some(Type::func(params, ret))
    }

    fn if_expr(&mut self, node: &AstNode) -> Option<Type> {
        let cond = self.infer(&node.children[0]);
        let then_ty = self.infer(&node.children[1]);
        let else_ty = self.infer(&node.children[2]);
        let (cond, then_ty, else_ty) = (cond?, then_ty?, else_ty?);

        if cond != Type::Bool {
            self.diag
                .error(Code::Type, node.span, "$if condition must be bool")
                .emit();
            return None;
        }
        if then_ty != else_ty {
            self.diag
                .error(Code::Type, node.span, "$if branches have mismatched types")
                .emit();
            return None;
        }
        Some(then_ty)
    }

    fn set(&mut self, node: &AstNode) -> Option<Type> {
        let name_node = &node.children[0];
        if name_node.kind != AstKind::Ident {
            self.diag
                .error(
                    Code::Type,
                    node.span,
                    "$set: first argument must be an identifier",
                )
                .emit();
            return None;
        }
        let name = name_node.op.expect("ident nodes carry their symbol");

        let Some(bound) = self.ctx.lookup_var(name).cloned() else {
            let msg = format!("undefined variable '{}'", self.name_of(name));
            self.diag.error(Code::Type, name_node.span, msg).emit();
            return None;
        };

        let value_ty = self.infer(&node.children[1])?;
        if value_ty != bound {
            let msg = format!("$set: type mismatch for '{}'", self.name_of(name));
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        Some(Type::Void)
    }

    fn call(&mut self, node: &AstNode) -> Option<Type> {
        let callee = &node.children[0];

        let callee_ty = if callee.kind == AstKind::Ident {
            let name = callee.op.expect("ident nodes carry their symbol");
            match self
                .ctx
                .lookup_var(name)
                .or_else(|| self.ctx.lookup_func(name))
                .cloned()
            {
                Some(ty) => ty,
                None => {
                    let msg = format!("undefined function '{}'", self.name_of(name));
                    self.diag.error(Code::Type, callee.span, msg).emit();
                    return None;
                }
            }
        } else {
            self.infer(callee)?
        };

        let Type::Func { params, ret } = callee_ty else {
            self.diag
                .error(Code::Type, node.span, "$call target is not a function")
                .emit();
            return None;
        };

        let mut args = Vec::with_capacity(node.children.len() - 1);
        let mut ok = true;
        for arg in &node.children[1..] {
            match self.infer(arg) {
                Some(ty) => args.push(ty),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }

        if args.len() != params.len() {
            let msg = format!("function expects {} args, got {}", params.len(), args.len());
            self.diag.error(Code::Type, node.span, msg).emit();
            return None;
        }
        for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
            if arg != param {
                let msg = format!("argument {} type mismatch", i + 1);
                self.diag.error(Code::Type, node.span, msg).emit();
                return None;
            }
        }

        Some(*ret)
    }

    fn ret(&mut self, node: &AstNode) -> Option<Type> {
        let value_ty = self.infer(&node.children[0])?;
        let Some(expected) = self.ctx.return_type().cloned() else {
            self.diag
                .error(Code::Type, node.span, "$ret outside of a function body")
                .emit();
            return None;
        };
        if value_ty != expected {
            self.diag
                .error(Code::Type, node.span, "$ret type mismatch")
                .emit();
            return None;
        }
        Some(Type::Void)
    }

    fn reference(&mut self, node: &AstNode, mutable: bool, inline: bool) -> Option<Type> {
        let target = self.infer(&node.children[0])?;
        Some(Type::reference(target, mutable, inline))
    }

    fn namespace(&mut self, node: &AstNode, ty: Option<Type>, what: &str) -> Option<Type> {
        match ty {
            Some(ty) => Some(ty),
            None => {
                let msg = format!("{what} is not available in this context");
                self.diag.error(Code::Type, node.span, msg).emit();
                None
            }
        }
    }

    fn member(&mut self, node: &AstNode) -> Option<Type> {
        let lhs_ty = self.infer(&node.children[0])?;
        let field_node = &node.children[1];
        if field_node.kind != AstKind::Ident {
            self.diag
                .error(
                    Code::Type,
                    node.span,
                    "$member: second argument must be an identifier",
                )
                .emit();
            return None;
        }
        let field = field_node.op.expect("ident nodes carry their symbol");

        let Type::Block { fields } = lhs_ty else {
            self.diag
                .error(Code::Type, node.span, "$member requires a block value")
                .emit();
            return None;
        };

        match fields.iter().find(|(name, _)| *name == field) {
            Some((_, ty)) => Some(ty.clone()),
            None => {
                let msg = format!("no member '{}'", self.name_of(field));
                self.diag.error(Code::Type, field_node.span, msg).emit();
                None
            }
        }
    }

    /// Resolve a type expression: primitive names, aliases, `$func` types,
    /// groups, references, and block field lists.
    fn resolve_type_expr(&mut self, node: &AstNode) -> Option<Type> {
        match node.kind {
            AstKind::Ident => {
                let name = node.op.expect("ident nodes carry their symbol");
                match self.interner.try_resolve(name).unwrap_or("") {
                    "int" => Some(Type::Int),
                    "float" => Some(Type::Float),
                    "bool" => Some(Type::Bool),
                    "string" => Some(Type::Str),
                    "ident" => Some(Type::Ident),
                    "void" => Some(Type::Void),
                    "trait" => Some(Type::Trait),
                    _ => match self.ctx.lookup_var(name).cloned() {
                        Some(ty) => Some(ty),
                        None => {
                            let msg = format!("unknown type '{}'", self.name_of(name));
                            self.diag.error(Code::Type, node.span, msg).emit();
                            None
                        }
                    },
                }
            }
            AstKind::Group => {
                let mut elems = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    elems.push(self.resolve_type_expr(child)?);
                }
                Some(Type::Group(elems))
            }
            AstKind::Func if node.children.len() >= 2 => {
                let params = self.resolve_params(&node.children[0])?;
                let ret = self.resolve_type_expr(&node.children[1])?;
                Some(Type::func(params, ret))
            }
            AstKind::Block => {
                let mut fields = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    if child.kind != AstKind::Decl || child.children.len() != 2 {
                        self.diag
                            .error(
                                Code::Type,
                                child.span,
                                "block types are built from $decl name type entries",
                            )
                            .emit();
                        return None;
                    }
                    let name_node = &child.children[0];
                    if name_node.kind != AstKind::Ident {
                        self.diag
                            .error(Code::Type, child.span, "field name must be an identifier")
                            .emit();
                        return None;
                    }
                    let field = name_node.op.expect("ident nodes carry their symbol");
                    let ty = self.resolve_type_expr(&child.children[1])?;
                    fields.push((field, ty));
                }
                Some(Type::Block { fields })
            }
            AstKind::Builtin => {
                let registry = self.registry;
                let info = node.op.and_then(|op| registry.lookup(op));
                match info.map(|i| i.rule) {
                    Some(TypeRule::RefMut) if node.children.len() == 1 => {
                        let target = self.resolve_type_expr(&node.children[0])?;
                        Some(Type::reference(target, true, false))
                    }
                    Some(TypeRule::RefConst) if node.children.len() == 1 => {
                        let target = self.resolve_type_expr(&node.children[0])?;
                        Some(Type::reference(target, false, false))
                    }
                    Some(TypeRule::RefInline) if node.children.len() == 1 => {
                        let target = self.resolve_type_expr(&node.children[0])?;
                        Some(Type::reference(target, false, true))
                    }
                    Some(TypeRule::Trait) => Some(Type::Trait),
                    _ => {
                        self.diag
                            .error(Code::Type, node.span, "expected a type expression")
                            .emit();
                        None
                    }
                }
            }
            _ => {
                self.diag
                    .error(Code::Type, node.span, "expected a type expression")
                    .emit();
                None
            }
        }
    }

    /// Parameter list of a `$func`: a group of type expressions, or a single
    /// bare type.
    fn resolve_params(&mut self, node: &AstNode) -> Option<Vec<Type>> {
        if node.kind == AstKind::Group {
            let mut params = Vec::with_capacity(node.children.len());
            for child in &node.children {
                params.push(self.resolve_type_expr(child)?);
            }
            return Some(params);
        }
        Some(vec![self.resolve_type_expr(node)?])
    }

    fn name_of(&self, sym: Symbol) -> &'a str {
        self.interner.try_resolve(sym).unwrap_or("?")
    }
}
