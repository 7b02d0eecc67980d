//! Semantic analysis state and declaration handling.
//!
//! Sema owns the AST context, the scope stack, and the compiler-action
//! registry. The parser never constructs AST nodes directly: it calls the
//! `act_on_*` methods here, which perform lookup, checking, canonical type
//! formation and node construction.

use std::rc::Rc;

use nyx_diagnostic::{DiagId, DiagnosticsEngine};
use nyx_ir::{
    AstContext, Decl, DeclId, DeclKind, IdentNamespace, Name, SharedInterner, SourceLocation,
    SourceRange, StmtId, StorageClass, TypeData, TypeId, Visibility,
};

use crate::actions::ActionRegistry;
use crate::declarator::{Declarator, DeclaratorContext, DeclaratorId, Initializer};
use crate::lookup::{LookupPurpose, LookupResult, LookupStatus};
use crate::scope::{Scope, ScopeFlags};
use crate::{eval, AliasTarget};

/// Result of resolving a name in type position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TypeNameResult {
    Type(TypeId),
    /// The name resolves to a phase-1 placeholder; the parser must resolve
    /// the named declarator first and retry.
    NeedsResolution(DeclId),
    NotFound,
}

/// Semantic analysis for one translation unit.
pub struct Sema {
    context: AstContext,
    interner: SharedInterner,
    diag: Rc<DiagnosticsEngine>,
    scopes: Vec<Scope>,
    actions: ActionRegistry,
}

impl Sema {
    pub fn new(interner: SharedInterner, diag: Rc<DiagnosticsEngine>) -> Self {
        let context = AstContext::default();
        let tu = context.translation_unit();
        Sema {
            context,
            interner,
            diag,
            scopes: vec![Scope::new(ScopeFlags::DECLARABLE, Some(tu))],
            actions: ActionRegistry::with_builtins(),
        }
    }

    #[inline]
    pub fn context(&self) -> &AstContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut AstContext {
        &mut self.context
    }

    pub fn into_context(self) -> AstContext {
        self.context
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn diag(&self) -> &DiagnosticsEngine {
        &self.diag
    }

    #[inline]
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    /// Resolve an interned name's text.
    pub fn name_text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    // === Scopes ===

    /// Push a scope. The `UNSAFE` flag is inherited from the enclosing
    /// scope, so anything inside an unsafe region stays unsafe.
    pub fn push_scope(&mut self, flags: ScopeFlags) {
        self.push_scope_with_entity(flags, None);
    }

    pub fn push_scope_with_entity(&mut self, mut flags: ScopeFlags, entity: Option<DeclId>) {
        if self
            .scopes
            .last()
            .is_some_and(|scope| scope.flags.contains(ScopeFlags::UNSAFE))
        {
            flags = flags.union(ScopeFlags::UNSAFE);
        }
        self.scopes.push(Scope::new(flags, entity));
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the translation unit scope");
        self.scopes.pop();
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_scope(&self) -> &Scope {
        self.scopes.last().expect("scope stack is never empty")
    }

    pub fn current_scope_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    pub fn in_unsafe_scope(&self) -> bool {
        self.current_scope().is_unsafe()
    }

    /// Innermost scope entity, i.e. the `DeclContext` new declarations
    /// belong to.
    pub fn current_decl_context(&self) -> DeclId {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.entity)
            .unwrap_or_else(|| self.context.translation_unit())
    }

    /// The function whose definition encloses the current scope, if any.
    pub fn current_function(&self) -> Option<DeclId> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.flags.contains(ScopeFlags::FUNCTION))
            .and_then(|scope| scope.entity)
    }

    fn scope_has_flag_within_function(&self, flag: ScopeFlags) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.flags.contains(flag) {
                return true;
            }
            if scope.flags.contains(ScopeFlags::FUNCTION) {
                break;
            }
        }
        false
    }

    pub fn in_breakable_scope(&self) -> bool {
        self.scope_has_flag_within_function(ScopeFlags::BREAKABLE)
    }

    pub fn in_continuable_scope(&self) -> bool {
        self.scope_has_flag_within_function(ScopeFlags::CONTINUABLE)
    }

    /// Report an unsafe-operation violation unless the current scope is
    /// unsafe. Returns whether the operation is permitted.
    pub fn check_unsafe(&self, location: SourceLocation) -> bool {
        if self.in_unsafe_scope() {
            return true;
        }
        self.diag.report(DiagId::ErrUnsafeOperation, location);
        false
    }

    // === Lookup ===

    /// Unqualified lookup: walk the scope stack outward. The innermost
    /// scope with any match wins (shadowing); each frame contributes its
    /// local declarations plus its entity's children.
    pub fn lookup_name(&self, result: &mut LookupResult) -> bool {
        let mask = result.purpose().namespaces();
        let name = result.name();
        for scope in self.scopes.iter().rev() {
            let mut found_here = false;
            for &decl in scope.local_decls(name) {
                if self.context.decl(decl).namespaces.intersects(mask) {
                    result.add_decl(decl);
                    found_here = true;
                }
            }
            if let Some(entity) = scope.entity {
                for decl in self.context.lookup_in_context(entity, name, mask) {
                    result.add_decl(decl);
                    found_here = true;
                }
            }
            if found_here {
                break;
            }
        }
        result.resolve(&self.context) != LookupStatus::NotFound
    }

    /// Qualified lookup inside one `DeclContext`.
    pub fn lookup_qualified(&self, result: &mut LookupResult, context: DeclId) -> bool {
        let mask = result.purpose().namespaces();
        result.add_decls(self.context.lookup_in_context(context, result.name(), mask));
        result.resolve(&self.context) != LookupStatus::NotFound
    }

    /// Resolve a nested-name specifier (`A.B.C`) left-to-right. Each step
    /// must name a `DeclContext`.
    pub fn resolve_nested_name(
        &self,
        path: &[(Name, SourceLocation)],
    ) -> Option<DeclId> {
        let mut current: Option<DeclId> = None;
        for &(name, location) in path {
            let mut result = LookupResult::new(
                name,
                if current.is_none() {
                    LookupPurpose::Ordinary
                } else {
                    LookupPurpose::Member
                },
            );
            let found = match current {
                None => self.lookup_name(&mut result),
                Some(context) => self.lookup_qualified(&mut result, context),
            };
            if !found {
                self.diag
                    .report(DiagId::ErrUndeclaredIdentifier, location)
                    .arg_ident(self.name_text(name));
                return None;
            }
            let decl = match result.single() {
                Some(decl) => decl,
                None => {
                    self.diag
                        .report(DiagId::ErrAmbiguousLookup, location)
                        .arg_ident(self.name_text(name));
                    return None;
                }
            };
            if !self.context.decl(decl).is_decl_context() {
                self.diag
                    .report(DiagId::ErrUndeclaredIdentifier, location)
                    .arg_ident(self.name_text(name));
                return None;
            }
            current = Some(decl);
        }
        current
    }

    /// Resolve a name in type position.
    pub fn get_type_name(&mut self, name: Name) -> TypeNameResult {
        let mut result = LookupResult::new(name, LookupPurpose::Tag);
        if self.lookup_name(&mut result) {
            if let Some(decl) = result.single() {
                return match self.context.decl(decl).kind {
                    DeclKind::Alias {
                        target: AliasTarget::Type(ty),
                    } => TypeNameResult::Type(ty),
                    DeclKind::Class => TypeNameResult::Type(self.context.class_type(decl)),
                    DeclKind::Enum { .. } => TypeNameResult::Type(self.context.enum_type(decl)),
                    DeclKind::Unresolved { .. } => TypeNameResult::NeedsResolution(decl),
                    _ => TypeNameResult::NotFound,
                };
            }
            return TypeNameResult::NotFound;
        }
        // Builtin type names are not declarations; they are recognized here
        // so aliases and tags can shadow them.
        match nyx_ir::BuiltinType::from_name(self.name_text(name)) {
            Some(builtin) => TypeNameResult::Type(self.context.builtin_type(builtin)),
            None => TypeNameResult::NotFound,
        }
    }

    // === Type formation ===

    /// Form `pointee*`. Forming a pointer type is an unsafe operation.
    pub fn act_on_pointer_type(&mut self, pointee: TypeId, location: SourceLocation) -> TypeId {
        self.check_unsafe(location);
        self.context.pointer_type(pointee)
    }

    /// Form `elem[size]` from a constant size expression.
    pub fn act_on_array_type(
        &mut self,
        elem: TypeId,
        size: nyx_ir::ExprId,
        location: SourceLocation,
    ) -> TypeId {
        match eval::evaluate_as_int(&mut self.context, size) {
            Some(count) => self.context.array_type(elem, count),
            None => {
                self.diag.report(DiagId::ErrNonConstantExpression, location);
                TypeId::ERROR
            }
        }
    }

    /// Form `(params...) -> ret`. A variadic parameter list is an unsafe
    /// operation.
    pub fn build_function_type(
        &mut self,
        params: Vec<TypeId>,
        ret: TypeId,
        varargs: bool,
        location: SourceLocation,
    ) -> TypeId {
        if varargs {
            self.check_unsafe(location);
        }
        self.context.function_type(params, ret, varargs)
    }

    // === Declarations ===

    fn make_decl(&mut self, kind: DeclKind, name: Name, range: SourceRange, visibility: Visibility) -> DeclId {
        let namespaces = Decl::namespaces_for(&kind);
        self.context.alloc_decl(Decl {
            kind,
            name,
            range,
            context: None,
            namespaces,
            visibility,
        })
    }

    /// Register a declaration in a `DeclContext` and the current scope.
    pub fn register_decl(&mut self, context: DeclId, decl: DeclId) {
        self.context.add_to_context(context, decl);
        let name = self.context.decl(decl).name;
        self.current_scope_mut().add_decl(name, decl);
    }

    /// Make a declaration findable by unqualified lookup from the current
    /// scope without changing its owner. Enum constants use this: they are
    /// owned by the enum but visible in the enclosing scope.
    pub fn expose_in_current_scope(&mut self, decl: DeclId) {
        let name = self.context.decl(decl).name;
        self.current_scope_mut().add_decl(name, decl);
    }

    /// Create and register the phase-1 placeholder for a deferred
    /// declarator.
    pub fn act_on_unresolved_declarator(
        &mut self,
        declarator: &Declarator,
        id: DeclaratorId,
    ) -> DeclId {
        tracing::trace!(
            name = self.name_text(declarator.name),
            declarator = id.0,
            "deferring declarator"
        );
        let placeholder = self.make_decl(
            DeclKind::Unresolved { declarator: id.0 },
            declarator.name,
            declarator.range,
            declarator.visibility.unwrap_or_default(),
        );
        self.register_decl(declarator.decl_context, placeholder);
        placeholder
    }

    /// Handle a fully parsed declarator, producing the declaration.
    ///
    /// For function-typed declarators the body is not yet parsed; it is
    /// attached afterwards with [`act_on_finish_function_body`]. Variable
    /// initializers must already be present in the declarator.
    pub fn handle_declarator(&mut self, declarator: &Declarator) -> Option<DeclId> {
        self.handle_declarator_impl(declarator, true)
    }

    /// Like [`handle_declarator`](Self::handle_declarator), but the
    /// declaration is not installed anywhere. Compiler-action arguments
    /// parse this way; the action decides which of them get registered.
    pub fn handle_declarator_detached(&mut self, declarator: &Declarator) -> Option<DeclId> {
        self.handle_declarator_impl(declarator, false)
    }

    fn handle_declarator_impl(&mut self, declarator: &Declarator, install: bool) -> Option<DeclId> {
        if !declarator.has_name() && !declarator.context.allows_anonymous() {
            self.diag
                .report(DiagId::ErrExpectedIdentifier, declarator.range.begin());
            return None;
        }

        if declarator.is_alias {
            return self.act_on_alias_declarator(declarator, install);
        }

        let is_function_type = declarator.ty.is_some_and(|ty| {
            matches!(
                self.context.type_data(self.context.underlying_type(ty)),
                TypeData::Function { .. }
            )
        });

        let decl = if is_function_type {
            self.act_on_function_declarator(declarator)?
        } else if declarator.context == DeclaratorContext::Member {
            self.act_on_field_declarator(declarator)?
        } else {
            self.act_on_variable_declarator(declarator)?
        };

        if install {
            self.install_declaration(declarator, decl)?;
        }
        Some(decl)
    }

    /// Check redeclarations, then insert the declaration into its context
    /// and scope, replacing the phase-1 placeholder when there is one.
    fn install_declaration(&mut self, declarator: &Declarator, decl: DeclId) -> Option<()> {
        let name = self.context.decl(decl).name;
        let target = declarator.decl_context;

        // A prior declaration with the same name must have an identical
        // signature; the new declaration then replaces it.
        let mask = self.context.decl(decl).namespaces;
        let mut replaced_prior = false;
        let prior_decls = self.context.lookup_in_context(target, name, mask);
        for prior in prior_decls {
            if Some(prior) == declarator.placeholder {
                continue;
            }
            if matches!(self.context.decl(prior).kind, DeclKind::Unresolved { .. }) {
                // Not yet resolved; the conflict is checked when it is.
                continue;
            }
            if self.signatures_match(prior, decl) {
                self.context.replace_in_context(target, prior, decl);
                self.replace_in_all_scopes(name, prior, decl);
                replaced_prior = true;
            } else {
                self.diag
                    .report(DiagId::ErrRedefinition, self.context.decl(decl).range.begin())
                    .arg_ident(self.name_text(name));
                self.diag
                    .report(DiagId::NoteDeclaredHere, self.context.decl(prior).range.begin())
                    .arg_ident(self.name_text(name));
                return None;
            }
        }

        if let Some(placeholder) = declarator.placeholder {
            // The placeholder may be cached in any still-live scope frame
            // (the top-level frame outlives phase 1); scrub them all. When
            // a prior declaration was already rewritten to `decl`, the
            // placeholder just disappears, otherwise the context would end
            // up with two entries for the same declaration.
            if replaced_prior {
                self.context.remove_from_context(target, placeholder);
                self.remove_in_all_scopes(name, placeholder);
            } else {
                self.context.replace_in_context(target, placeholder, decl);
                self.replace_in_all_scopes(name, placeholder, decl);
            }
        } else if !replaced_prior {
            self.register_decl(target, decl);
        }
        Some(())
    }

    fn replace_in_all_scopes(&mut self, name: Name, old: DeclId, new: DeclId) {
        for scope in &mut self.scopes {
            scope.replace_decl(name, old, new);
        }
    }

    fn remove_in_all_scopes(&mut self, name: Name, decl: DeclId) {
        for scope in &mut self.scopes {
            scope.remove_decl(name, decl);
        }
    }

    /// Whether two declarations may redeclare one another.
    fn signatures_match(&self, prior: DeclId, new: DeclId) -> bool {
        let prior_decl = self.context.decl(prior);
        let new_decl = self.context.decl(new);
        match (&prior_decl.kind, &new_decl.kind) {
            (DeclKind::Var { ty: a, .. }, DeclKind::Var { ty: b, .. }) => a == b,
            (DeclKind::Function { ty: a, .. }, DeclKind::Function { ty: b, .. })
            | (DeclKind::Method { ty: a, .. }, DeclKind::Method { ty: b, .. }) => a == b,
            (
                DeclKind::Alias { target: AliasTarget::Type(a) },
                DeclKind::Alias { target: AliasTarget::Type(b) },
            ) => a == b,
            _ => false,
        }
    }

    fn act_on_function_declarator(&mut self, declarator: &Declarator) -> Option<DeclId> {
        let ty = declarator.ty?;
        let params = declarator.params.clone().into_boxed_slice();
        let in_class = matches!(
            self.context.decl(declarator.decl_context).kind,
            DeclKind::Class
        );

        let kind = if declarator.is_constructor {
            DeclKind::Constructor { ty, params, body: None }
        } else if declarator.is_destructor {
            DeclKind::Destructor { ty, params, body: None }
        } else if in_class && declarator.storage != StorageClass::Static {
            DeclKind::Method { ty, params, body: None }
        } else {
            DeclKind::Function { ty, params, body: None }
        };

        let name = if declarator.is_constructor {
            self.interner.intern("this")
        } else if declarator.is_destructor {
            self.interner.intern("~this")
        } else {
            declarator.name
        };

        let decl = self.make_decl(kind, name, declarator.range, declarator.visibility.unwrap_or_default());

        // Methods, constructors and destructors carry an implicit `this`
        // parameter pointing at the enclosing class.
        let is_instance_member = matches!(
            self.context.decl(decl).kind,
            DeclKind::Method { .. } | DeclKind::Constructor { .. } | DeclKind::Destructor { .. }
        );
        if is_instance_member && in_class {
            let class_ty = self.context.class_type(declarator.decl_context);
            let this_ty = self.context.pointer_type(class_ty);
            let this_name = self.interner.intern("this");
            let implicit = self.make_decl(
                DeclKind::ImplicitParam { ty: this_ty },
                this_name,
                declarator.range,
                Visibility::Private,
            );
            self.context.add_to_context(decl, implicit);
        }

        // The parameters become children of the function's context.
        for &param in &declarator.params {
            self.context.add_to_context(decl, param);
        }
        Some(decl)
    }

    fn act_on_field_declarator(&mut self, declarator: &Declarator) -> Option<DeclId> {
        let ty = declarator.ty.or_else(|| {
            self.diag
                .report(DiagId::ErrCannotDeduceType, declarator.range.begin())
                .arg_ident(self.name_text(declarator.name));
            None
        })?;
        Some(self.make_decl(
            DeclKind::Field { ty },
            declarator.name,
            declarator.range,
            declarator.visibility.unwrap_or_default(),
        ))
    }

    fn act_on_variable_declarator(&mut self, declarator: &Declarator) -> Option<DeclId> {
        let init_expr = match &declarator.initializer {
            Some(Initializer::Expr(expr)) => Some(*expr),
            Some(Initializer::Body(_)) => {
                self.diag
                    .report(DiagId::ErrExpectedExpression, declarator.range.begin());
                None
            }
            _ => None,
        };

        // Deduce the type from the initializer when no annotation exists.
        let mut ty = match declarator.ty {
            Some(ty) => ty,
            None => match init_expr {
                Some(expr) => self.context.expr(expr).ty,
                None => {
                    self.diag
                        .report(DiagId::ErrCannotDeduceType, declarator.range.begin())
                        .arg_ident(self.name_text(declarator.name));
                    return None;
                }
            },
        };

        // An unknown-size array takes its extent from the initializer list.
        let mut init = init_expr;
        if let TypeData::IncompleteArray(elem) = *self.context.type_data(self.context.underlying_type(ty)) {
            match &declarator.initializer {
                Some(Initializer::List(items)) => {
                    ty = self.context.array_type(elem, items.len() as u64);
                }
                _ => {
                    self.diag
                        .report(DiagId::ErrCannotDeduceType, declarator.range.begin())
                        .arg_ident(self.name_text(declarator.name));
                    return None;
                }
            }
        }

        // Aggregate initializers become a construction of the declared
        // type from the list elements.
        if let Some(Initializer::List(items)) = &declarator.initializer {
            init = Some(self.context.alloc_expr(nyx_ir::Expr {
                kind: nyx_ir::ExprKind::Construct {
                    args: items.clone().into_boxed_slice(),
                },
                ty,
                category: nyx_ir::ValueCategory::RValue,
                range: declarator.range,
            }));
        }

        if declarator.storage == StorageClass::Extern && declarator.initializer.is_some() {
            self.diag
                .report(DiagId::ErrInitializerOnExtern, declarator.range.begin());
            init = None;
        } else if let Some(expr) = init {
            init = Some(self.perform_implicit_conversion(expr, ty, declarator.range.begin()));
        }

        Some(self.make_decl(
            DeclKind::Var {
                ty,
                storage: declarator.storage,
                init,
            },
            declarator.name,
            declarator.range,
            declarator.visibility.unwrap_or_default(),
        ))
    }

    fn act_on_alias_declarator(&mut self, declarator: &Declarator, install: bool) -> Option<DeclId> {
        // A failed target still produces the alias, with the error type as
        // its target, so later references do not cascade.
        let target = AliasTarget::Type(declarator.ty.unwrap_or(TypeId::ERROR));
        let decl = self.make_decl(
            DeclKind::Alias { target },
            declarator.name,
            declarator.range,
            declarator.visibility.unwrap_or_default(),
        );
        if install {
            self.install_declaration(declarator, decl)?;
        }
        Some(decl)
    }

    /// Create a parameter declaration in the current prototype scope.
    pub fn act_on_param_declarator(&mut self, declarator: &Declarator) -> DeclId {
        let ty = declarator.ty.unwrap_or(TypeId::ERROR);
        let decl = self.make_decl(
            DeclKind::ParmVar { ty },
            declarator.name,
            declarator.range,
            Visibility::Public,
        );
        self.current_scope_mut().add_decl(declarator.name, decl);
        decl
    }

    /// Attach a parsed body to a function-like declaration.
    pub fn act_on_finish_function_body(&mut self, decl: DeclId, body_stmt: StmtId) {
        match &mut self.context.decl_mut(decl).kind {
            DeclKind::Function { body, .. }
            | DeclKind::Method { body, .. }
            | DeclKind::Constructor { body, .. }
            | DeclKind::Destructor { body, .. } => *body = Some(body_stmt),
            _ => debug_assert!(false, "body attached to a non-function declaration"),
        }
    }

    /// The return type of a function-like declaration.
    pub fn function_return_type(&self, decl: DeclId) -> Option<TypeId> {
        let ty = self.context.decl(decl).value_type()?;
        match self.context.type_data(self.context.underlying_type(ty)) {
            TypeData::Function { ret, .. } => Some(*ret),
            _ => None,
        }
    }

    // === Classes, enums, modules ===

    pub fn act_on_start_class(
        &mut self,
        name: Name,
        visibility: Visibility,
        range: SourceRange,
    ) -> DeclId {
        let decl = self.make_decl(DeclKind::Class, name, range, visibility);
        let target = self.current_decl_context();
        self.register_decl(target, decl);
        decl
    }

    pub fn act_on_start_enum(
        &mut self,
        name: Name,
        underlying: TypeId,
        range: SourceRange,
    ) -> DeclId {
        let decl = self.make_decl(DeclKind::Enum { underlying }, name, range, Visibility::Public);
        let target = self.current_decl_context();
        self.register_decl(target, decl);
        decl
    }

    /// Create one enumerator. Without an initializer the value is one past
    /// the previous enumerator's.
    pub fn act_on_enum_constant(
        &mut self,
        enum_decl: DeclId,
        name: Name,
        init: Option<nyx_ir::ExprId>,
        previous: Option<i64>,
        range: SourceRange,
    ) -> DeclId {
        let value = match init {
            Some(expr) => match eval::evaluate_as_int(&mut self.context, expr) {
                Some(v) => v as i64,
                None => {
                    self.diag
                        .report(DiagId::ErrNonConstantExpression, range.begin());
                    previous.map_or(0, |p| p + 1)
                }
            },
            None => previous.map_or(0, |p| p + 1),
        };
        let ty = self.context.enum_type(enum_decl);
        let decl = self.make_decl(
            DeclKind::EnumConstant { ty, init, value },
            name,
            range,
            Visibility::Public,
        );
        self.register_decl(enum_decl, decl);
        decl
    }

    pub fn act_on_module(&mut self, name: Name, range: SourceRange) -> DeclId {
        let parent = self.current_decl_context();
        self.act_on_nested_module(parent, name, range)
    }

    /// Create or reuse a module named `name` directly under `parent`.
    pub fn act_on_nested_module(&mut self, parent: DeclId, name: Name, range: SourceRange) -> DeclId {
        let existing = self
            .context
            .lookup_in_context(parent, name, IdentNamespace::MODULE)
            .into_iter()
            .find(|&decl| matches!(self.context.decl(decl).kind, DeclKind::Module));
        if let Some(module) = existing {
            return module;
        }
        let decl = self.make_decl(DeclKind::Module, name, range, Visibility::Public);
        self.context.add_to_context(parent, decl);
        if parent == self.current_decl_context() {
            self.current_scope_mut().add_decl(name, decl);
        }
        decl
    }

    /// Record an import, resolving the module path if possible.
    pub fn act_on_import(
        &mut self,
        path: Vec<(Name, SourceLocation)>,
        range: SourceRange,
    ) -> DeclId {
        // Module paths resolve through the module namespace only.
        let mut target: Option<DeclId> = None;
        for (index, &(name, _)) in path.iter().enumerate() {
            let mut result = LookupResult::new(name, LookupPurpose::Module);
            let found = match target {
                None if index == 0 => self.lookup_name(&mut result),
                Some(context) => self.lookup_qualified(&mut result, context),
                None => false,
            };
            target = if found { result.single() } else { None };
            if target.is_none() {
                break;
            }
        }
        if target.is_none() {
            let dotted = path
                .iter()
                .map(|&(name, _)| self.name_text(name))
                .collect::<Vec<_>>()
                .join(".");
            self.diag
                .report(DiagId::ErrUnknownModule, range.begin())
                .arg_str(dotted);
        }
        let names: Box<[Name]> = path.iter().map(|&(name, _)| name).collect();
        let name = path.last().map(|&(name, _)| name).unwrap_or(Name::EMPTY);
        let decl = self.make_decl(
            DeclKind::Import { path: names, target },
            name,
            range,
            Visibility::Public,
        );
        let context = self.current_decl_context();
        self.register_decl(context, decl);
        decl
    }

    /// Create a statement label declaration.
    pub fn act_on_label_decl(&mut self, name: Name, range: SourceRange) -> DeclId {
        let decl = self.make_decl(DeclKind::Label { stmt: None }, name, range, Visibility::Public);
        let context = self.current_decl_context();
        self.register_decl(context, decl);
        decl
    }

    pub fn act_on_empty_decl(&mut self, range: SourceRange) -> DeclId {
        let decl = self.make_decl(DeclKind::Empty, Name::EMPTY, range, Visibility::Public);
        let context = self.current_decl_context();
        self.register_decl(context, decl);
        decl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_diagnostic::CollectingConsumer;

    fn sema() -> (Sema, CollectingConsumer) {
        let consumer = CollectingConsumer::new();
        let diag = Rc::new(DiagnosticsEngine::new(Box::new(consumer.clone())));
        (Sema::new(SharedInterner::new(), diag), consumer)
    }

    #[test]
    fn scope_stack_balance() {
        let (mut sema, _) = sema();
        let depth = sema.scope_depth();
        sema.push_scope(ScopeFlags::BLOCK.union(ScopeFlags::DECLARABLE));
        sema.push_scope(ScopeFlags::CONTROL);
        sema.pop_scope();
        sema.pop_scope();
        assert_eq!(sema.scope_depth(), depth);
    }

    #[test]
    fn unsafe_flag_is_inherited() {
        let (mut sema, _) = sema();
        assert!(!sema.in_unsafe_scope());
        sema.push_scope(ScopeFlags::BLOCK.union(ScopeFlags::UNSAFE));
        assert!(sema.in_unsafe_scope());
        sema.push_scope(ScopeFlags::BLOCK);
        assert!(sema.in_unsafe_scope());
        sema.pop_scope();
        sema.pop_scope();
        assert!(!sema.in_unsafe_scope());
    }

    #[test]
    fn unsafe_violation_reports() {
        let (mut sema, diags) = sema();
        let pointee = TypeId::INT;
        sema.act_on_pointer_type(pointee, SourceLocation::DUMMY);
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrUnsafeOperation);

        sema.push_scope(ScopeFlags::BLOCK.union(ScopeFlags::UNSAFE));
        sema.act_on_pointer_type(pointee, SourceLocation::DUMMY);
        sema.pop_scope();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn builtin_type_names_resolve() {
        let (mut sema, _) = sema();
        let int_name = sema.interner().intern("int");
        assert_eq!(sema.get_type_name(int_name), TypeNameResult::Type(TypeId::INT));
        let missing = sema.interner().intern("gadget");
        assert_eq!(sema.get_type_name(missing), TypeNameResult::NotFound);
    }

    #[test]
    fn breakable_scopes_stop_at_function_boundary() {
        let (mut sema, _) = sema();
        sema.push_scope(ScopeFlags::BREAKABLE.union(ScopeFlags::CONTINUABLE));
        assert!(sema.in_breakable_scope());
        sema.push_scope(ScopeFlags::FUNCTION);
        assert!(!sema.in_breakable_scope());
        assert!(!sema.in_continuable_scope());
        sema.pop_scope();
        sema.pop_scope();
    }

    #[test]
    fn variable_declarator_deduces_from_initializer() {
        let (mut sema, diags) = sema();
        let init = crate::exprs::tests_support::int_literal(&mut sema, 7);
        let tu = sema.context().translation_unit();
        let mut declarator = Declarator::new(DeclaratorContext::TopLevel, tu);
        declarator.name = sema.interner().intern("n");
        declarator.initializer = Some(Initializer::Expr(init));
        let decl = sema.handle_declarator(&declarator).unwrap();
        assert!(diags.is_empty());
        assert_eq!(sema.context().decl(decl).value_type(), Some(TypeId::INT));
        // Registered in the translation unit.
        assert_eq!(sema.context().decl(decl).context, Some(tu));
    }

    #[test]
    fn redefinition_with_different_type_reports() {
        let (mut sema, diags) = sema();
        let tu = sema.context().translation_unit();
        let name = sema.interner().intern("x");

        let mut first = Declarator::new(DeclaratorContext::TopLevel, tu);
        first.name = name;
        first.ty = Some(TypeId::INT);
        sema.handle_declarator(&first).unwrap();

        let mut second = Declarator::new(DeclaratorContext::TopLevel, tu);
        second.name = name;
        second.ty = Some(TypeId::DOUBLE);
        assert!(sema.handle_declarator(&second).is_none());
        let ids: Vec<_> = diags.diagnostics().iter().map(|d| d.id).collect();
        assert!(ids.contains(&DiagId::ErrRedefinition));
        assert!(ids.contains(&DiagId::NoteDeclaredHere));
    }

    #[test]
    fn matching_redeclaration_replaces() {
        let (mut sema, diags) = sema();
        let tu = sema.context().translation_unit();
        let name = sema.interner().intern("x");

        let mut first = Declarator::new(DeclaratorContext::TopLevel, tu);
        first.name = name;
        first.ty = Some(TypeId::INT);
        let a = sema.handle_declarator(&first).unwrap();

        let mut second = Declarator::new(DeclaratorContext::TopLevel, tu);
        second.name = name;
        second.ty = Some(TypeId::INT);
        let b = sema.handle_declarator(&second).unwrap();

        assert!(diags.is_empty());
        assert_ne!(a, b);
        // Only the replacement remains in the context.
        let children = sema.context().context_children(tu);
        assert!(children.contains(&b));
        assert!(!children.contains(&a));
    }

    #[test]
    fn enum_constants_auto_increment() {
        let (mut sema, _) = sema();
        let name = sema.interner().intern("Color");
        let e = sema.act_on_start_enum(name, TypeId::INT, SourceRange::DUMMY);
        let a = sema.act_on_enum_constant(e, sema.interner().intern("A"), None, None, SourceRange::DUMMY);
        let DeclKind::EnumConstant { value: va, .. } = sema.context().decl(a).kind else {
            panic!()
        };
        assert_eq!(va, 0);
        let b = sema.act_on_enum_constant(e, sema.interner().intern("B"), None, Some(va), SourceRange::DUMMY);
        let DeclKind::EnumConstant { value: vb, .. } = sema.context().decl(b).kind else {
            panic!()
        };
        assert_eq!(vb, 1);
    }
}
