//! Declaration parsing: top-level dispatch, the declarator grammar, the
//! type grammar, class/enum specifiers, modules and imports.
//!
//! In phase 1, `def`/`alias` declarators at top level and in class bodies
//! do not parse their type or initializer; the tokens are buffered and an
//! unresolved placeholder stands in for the declaration until
//! `divert_phase` replays them.

use nyx_diagnostic::DiagId;
use nyx_ir::{
    DeclId, DeclKind, SourceRange, StorageClass, Token, TokenKind, TypeData, TypeId, Visibility,
};
use nyx_sema::{
    Declarator, DeclaratorContext, DeclaratorId, Initializer, ScopeFlags, TypeNameResult,
};

use crate::recovery::{TokenSet, STMT_BOUNDARY, TOP_LEVEL_BOUNDARY};
use crate::Parser;

impl Parser<'_> {
    /// external-declaration:
    ///   `;` | `def …` | `alias …` | `class …` | `enum …`
    ///   | `unsafe { … }` | `unsafe def …` | `$action`
    pub(crate) fn parse_external_declaration(&mut self) -> Vec<DeclId> {
        match *self.kind() {
            TokenKind::Semi => {
                let token = self.consume();
                vec![self.sema_mut().act_on_empty_decl(token.range())]
            }
            TokenKind::RBrace => {
                self.diag()
                    .report(DiagId::ErrExtraneousClosingBrace, self.location());
                self.consume();
                Vec::new()
            }
            TokenKind::KwDef | TokenKind::KwAlias => self
                .parse_def_declaration(DeclaratorContext::TopLevel, false)
                .into_iter()
                .collect(),
            TokenKind::KwClass => self.parse_class_specifier().into_iter().collect(),
            TokenKind::KwEnum => self.parse_enum_specifier().into_iter().collect(),
            TokenKind::KwUnsafe => self.parse_unsafe_group(),
            TokenKind::Dollar => {
                if self.in_phase_one() {
                    // Buffer the whole action for replay in phase 2.
                    let tokens = self.skip_compiler_action_tokens();
                    let context = self.sema().current_decl_context();
                    self.cache_action(tokens, context);
                    Vec::new()
                } else {
                    self.parse_compiler_action_producing_decls()
                }
            }
            TokenKind::Eof => {
                self.diag().report(DiagId::ErrUnexpectedEof, self.location());
                Vec::new()
            }
            _ => {
                self.diag()
                    .report(DiagId::ErrExpectedDeclarator, self.location());
                self.consume();
                self.skip_until(TOP_LEVEL_BOUNDARY, true);
                Vec::new()
            }
        }
    }

    /// `unsafe { decls }` or `unsafe def …`.
    fn parse_unsafe_group(&mut self) -> Vec<DeclId> {
        self.consume();
        if self.check(TokenKind::LBrace) {
            self.consume();
            let flags = ScopeFlags::DECLARABLE.union(ScopeFlags::UNSAFE);
            let decls = self.with_scope(flags, None, |parser| {
                let mut decls = Vec::new();
                while !parser.check(TokenKind::RBrace) && !parser.at_eof() {
                    decls.extend(parser.parse_external_declaration());
                }
                decls
            });
            self.expect_and_consume(TokenKind::RBrace);
            decls
        } else if matches!(self.kind(), TokenKind::KwDef | TokenKind::KwAlias) {
            self.parse_def_declaration(DeclaratorContext::TopLevel, true)
                .into_iter()
                .collect()
        } else {
            self.diag()
                .report(DiagId::ErrExpectedDeclarator, self.location());
            Vec::new()
        }
    }

    /// `def`/`alias` declarator. Deferred to phase 2 at top level and in
    /// class bodies; parsed immediately everywhere else.
    pub(crate) fn parse_def_declaration(
        &mut self,
        context: DeclaratorContext,
        unsafe_prefix: bool,
    ) -> Option<DeclId> {
        let is_alias = self.check(TokenKind::KwAlias);
        let keyword = self.consume();

        let decl_context = self.sema().current_decl_context();
        let mut declarator = Declarator::new(context, decl_context);
        declarator.is_alias = is_alias;
        declarator.is_unsafe = unsafe_prefix;
        declarator.range = SourceRange::at(keyword.location, keyword.length);

        if self.parse_declarator_header(&mut declarator).is_none() {
            self.skip_until(STMT_BOUNDARY.union(TOP_LEVEL_BOUNDARY), true);
            if self.check(TokenKind::Semi) {
                self.consume();
            }
            return None;
        }

        let defer = self.in_phase_one()
            && matches!(
                context,
                DeclaratorContext::TopLevel | DeclaratorContext::Member
            );
        if defer {
            // The enclosing unsafety must survive into phase 2, where the
            // declarator is resolved in a freshly built scope.
            declarator.is_unsafe = declarator.is_unsafe || self.sema().in_unsafe_scope();
            declarator.cached_tokens = self.skip_type_and_initializer();
            let id = DeclaratorId(self.declarator_count() as u32);
            let placeholder = self
                .sema_mut()
                .act_on_unresolved_declarator(&declarator, id);
            declarator.placeholder = Some(placeholder);
            self.add_declarator(declarator);
            return Some(placeholder);
        }

        let (decl, had_body) = self.parse_declarator_tail(&mut declarator, false)?;
        if !had_body {
            self.expect_and_consume(TokenKind::Semi);
        }
        Some(decl)
    }

    /// Specifiers and the declarator name (`identifier`, `this`, `~this`).
    pub(crate) fn parse_declarator_header(&mut self, declarator: &mut Declarator) -> Option<()> {
        self.parse_specifiers(declarator);

        match *self.kind() {
            TokenKind::Ident(name) => {
                declarator.name = name;
                declarator.name_location = self.location();
                self.consume();
            }
            TokenKind::KwThis => {
                declarator.is_constructor = true;
                declarator.name_location = self.location();
                self.consume();
            }
            TokenKind::Tilde => {
                declarator.name_location = self.location();
                self.consume();
                if !self.expect_and_consume(TokenKind::KwThis) {
                    return None;
                }
                declarator.is_destructor = true;
            }
            _ => {
                if !declarator.context.allows_anonymous() {
                    self.diag()
                        .report(DiagId::ErrExpectedIdentifier, self.location());
                    return None;
                }
            }
        }
        Some(())
    }

    /// specifier-seq: each of `extern`, `static`, `const`, an access
    /// specifier, and `unsafe` may appear at most once.
    fn parse_specifiers(&mut self, declarator: &mut Declarator) {
        loop {
            let kind = *self.kind();
            match kind {
                TokenKind::KwExtern | TokenKind::KwStatic => {
                    if declarator.storage != StorageClass::None {
                        self.diag()
                            .report(DiagId::ErrDuplicateSpecifier, self.location())
                            .arg_token(kind);
                    }
                    declarator.storage = if kind.same_kind(&TokenKind::KwExtern) {
                        StorageClass::Extern
                    } else {
                        StorageClass::Static
                    };
                }
                TokenKind::KwConst => {
                    if declarator.is_const {
                        self.diag()
                            .report(DiagId::ErrDuplicateSpecifier, self.location())
                            .arg_token(kind);
                    }
                    declarator.is_const = true;
                }
                TokenKind::KwUnsafe => {
                    if declarator.is_unsafe {
                        self.diag()
                            .report(DiagId::ErrDuplicateSpecifier, self.location())
                            .arg_token(kind);
                    }
                    declarator.is_unsafe = true;
                }
                TokenKind::KwPublic
                | TokenKind::KwProtected
                | TokenKind::KwInternal
                | TokenKind::KwPrivate => {
                    if declarator.visibility.is_some() {
                        self.diag()
                            .report(DiagId::ErrDuplicateSpecifier, self.location())
                            .arg_token(kind);
                    }
                    declarator.visibility = Some(match kind {
                        TokenKind::KwPublic => Visibility::Public,
                        TokenKind::KwProtected => Visibility::Protected,
                        TokenKind::KwInternal => Visibility::Internal,
                        _ => Visibility::Private,
                    });
                }
                _ => return,
            }
            self.consume();
        }
    }

    /// Phase 1: buffer everything up to the declarator's end — the `;`
    /// (consumed, not buffered) or the matching `}` of a body (buffered).
    fn skip_type_and_initializer(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            match *self.kind() {
                TokenKind::Semi => {
                    self.consume();
                    return tokens;
                }
                TokenKind::RBrace | TokenKind::Eof => return tokens,
                TokenKind::LBrace => {
                    self.buffer_balanced_group(&mut tokens);
                    // An aggregate initializer is followed by `;`; a body
                    // ends the declarator by itself.
                    if self.check(TokenKind::Semi) {
                        self.consume();
                    }
                    return tokens;
                }
                TokenKind::LParen | TokenKind::LBracket => {
                    self.buffer_balanced_group(&mut tokens);
                }
                _ => {
                    tokens.push(self.consume());
                }
            }
        }
    }

    /// Buffer a balanced `(...)`, `[...]` or `{...}` group, delimiters
    /// included.
    pub(crate) fn buffer_balanced_group(&mut self, tokens: &mut Vec<Token>) {
        let open = *self.kind();
        let close = open.closed_by().expect("called on an opening delimiter");
        tokens.push(self.consume());
        let mut depth = 1u32;
        while depth > 0 && !self.at_eof() {
            if self.kind().same_kind(&open) {
                depth += 1;
            } else if self.kind().same_kind(&close) {
                depth -= 1;
            }
            tokens.push(self.consume());
        }
        if depth > 0 {
            self.diag()
                .report(DiagId::FatalUnexpectedEof, self.location())
                .arg_token(open);
        }
    }

    pub(crate) fn declarator_count(&self) -> usize {
        self.declarator_pool_len()
    }

    /// Phase 2 re-entry: the cached tokens are active, the identifier was
    /// already consumed in phase 1.
    pub(crate) fn parse_resolved_declarator_tail(&mut self, declarator: &mut Declarator) {
        let resolved = self
            .parse_declarator_tail(declarator, true)
            .map(|(decl, _)| decl);
        declarator.resolved_decl = resolved;
    }

    /// The type and initializer of a declarator, then the Sema hand-off.
    /// Returns the declaration and whether a function body was parsed.
    pub(crate) fn parse_declarator_tail(
        &mut self,
        declarator: &mut Declarator,
        _skip_identifier: bool,
    ) -> Option<(DeclId, bool)> {
        if declarator.is_alias {
            if !self.expect_and_consume(TokenKind::Eq) {
                return None;
            }
            declarator.ty = self.parse_typename();
            let decl = self.sema_mut().handle_declarator(declarator)?;
            return Some((decl, false));
        }

        if self.check(TokenKind::Colon) {
            self.consume();
            self.parse_type_into(declarator)?;
        }

        let is_function_type = declarator.ty.is_some_and(|ty| {
            matches!(
                self.sema()
                    .context()
                    .type_data(self.sema().context().underlying_type(ty)),
                TypeData::Function { .. }
            )
        });

        if is_function_type && self.check(TokenKind::LBrace) {
            // The declaration must exist before its body parses so the
            // body can refer to it.
            let decl = self.sema_mut().handle_declarator(declarator)?;
            let mut flags = ScopeFlags::FUNCTION.union(ScopeFlags::DECLARABLE);
            if declarator.is_unsafe {
                flags = flags.union(ScopeFlags::UNSAFE);
            }
            self.push_goto_frame();
            let body = self.with_scope(flags, Some(decl), |parser| {
                parser.parse_compound_statement()
            });
            self.check_pending_gotos(decl);
            let body = body?;
            self.sema_mut().act_on_finish_function_body(decl, body);
            return Some((decl, true));
        }

        if self.check(TokenKind::Eq) {
            self.consume();
            if self.check(TokenKind::LBrace) {
                self.consume();
                let items = self.parse_expression_list(TokenKind::RBrace)?;
                self.expect_and_consume(TokenKind::RBrace);
                declarator.initializer = Some(Initializer::List(items));
            } else {
                let expr = self.parse_assignment_expression()?;
                declarator.initializer = Some(Initializer::Expr(expr));
            }
        }

        let decl = self.sema_mut().handle_declarator(declarator)?;
        Some((decl, false))
    }

    // === Types ===

    /// A type in isolation (used by `as`, `new`, prototypes and actions).
    pub(crate) fn parse_typename(&mut self) -> Option<TypeId> {
        let ty = self.parse_type_specifier(None)?;
        self.parse_type_suffixes(ty)
    }

    /// `: type` of a declarator, including parameter collection for
    /// function types.
    pub(crate) fn parse_type_into(&mut self, declarator: &mut Declarator) -> Option<()> {
        let ty = self.parse_type_specifier(Some(declarator))?;
        let ty = self.parse_type_suffixes(ty)?;
        declarator.ty = Some(ty);
        Some(())
    }

    /// type-specifier:
    ///   identifier | `typeof ( expr )` | `( … )` | `$action`
    fn parse_type_specifier(&mut self, declarator: Option<&mut Declarator>) -> Option<TypeId> {
        match *self.kind() {
            TokenKind::Ident(name) => {
                let ty = match self.sema_mut().get_type_name(name) {
                    TypeNameResult::Type(ty) => ty,
                    TypeNameResult::NeedsResolution(decl) => {
                        self.resolve_type_placeholder(decl);
                        match self.sema_mut().get_type_name(name) {
                            TypeNameResult::Type(ty) => ty,
                            // Still unresolved: part of a rejected cycle.
                            _ => TypeId::ERROR,
                        }
                    }
                    TypeNameResult::NotFound => {
                        self.diag()
                            .report(DiagId::ErrUndeclaredIdentifier, self.location())
                            .arg_ident(self.sema().name_text(name));
                        return None;
                    }
                };
                self.consume();
                self.ensure_class_members_resolved(ty);
                Some(ty)
            }
            TokenKind::KwTypeof => {
                self.consume();
                if !self.expect_and_consume(TokenKind::LParen) {
                    return None;
                }
                let expr = self.parse_expression()?;
                self.expect_and_consume(TokenKind::RParen);
                Some(self.sema_mut().context_mut().typeof_type(expr))
            }
            TokenKind::LParen => self.parse_paren_or_function_type(declarator),
            TokenKind::Dollar => self.parse_action_type(),
            _ => {
                self.diag()
                    .report(DiagId::ErrExpectedTypeSpecifierGot, self.location())
                    .arg_token(*self.kind());
                None
            }
        }
    }

    fn resolve_type_placeholder(&mut self, decl: DeclId) {
        if let DeclKind::Unresolved { declarator } = self.sema().context().decl(decl).kind {
            self.resolve_declarator(DeclaratorId(declarator));
        }
    }

    /// A class named in type position may still have deferred members;
    /// anything that needs the class's layout (sizeof, field access) needs
    /// them resolved first.
    fn ensure_class_members_resolved(&mut self, ty: TypeId) {
        if self.in_phase_one() {
            return;
        }
        let class = match *self
            .sema()
            .context()
            .type_data(self.sema().context().underlying_type(ty))
        {
            TypeData::Class(class) => class,
            _ => return,
        };
        let pending: Vec<u32> = self
            .sema()
            .context()
            .context_children(class)
            .iter()
            .filter_map(|&child| match self.sema().context().decl(child).kind {
                DeclKind::Unresolved { declarator } => Some(declarator),
                _ => None,
            })
            .collect();
        for declarator in pending {
            self.resolve_declarator(DeclaratorId(declarator));
        }
    }

    /// Trailing `*` (pointer) and `[N]` / `[]` (array) suffixes.
    fn parse_type_suffixes(&mut self, mut ty: TypeId) -> Option<TypeId> {
        loop {
            let is_incomplete_array = matches!(
                self.sema().context().type_data(ty),
                TypeData::IncompleteArray(_)
            );
            match *self.kind() {
                TokenKind::Star => {
                    if is_incomplete_array {
                        self.diag()
                            .report(DiagId::ErrUnknownSizeArrayNotOutermost, self.location());
                        ty = TypeId::ERROR;
                    }
                    let location = self.location();
                    self.consume();
                    ty = self.sema_mut().act_on_pointer_type(ty, location);
                }
                TokenKind::LBracket => {
                    if is_incomplete_array {
                        self.diag()
                            .report(DiagId::ErrUnknownSizeArrayNotOutermost, self.location());
                        ty = TypeId::ERROR;
                    }
                    let location = self.location();
                    self.consume();
                    if self.check(TokenKind::RBracket) {
                        self.consume();
                        ty = self.sema_mut().context_mut().incomplete_array_type(ty);
                    } else {
                        let size = self.parse_assignment_expression()?;
                        self.expect_and_consume(TokenKind::RBracket);
                        ty = self.sema_mut().act_on_array_type(ty, size, location);
                    }
                }
                _ => return Some(ty),
            }
        }
    }

    /// `( … )` in type position: either a function type
    /// `( params ) -> ret` or a parenthesized type. The presence of `->`
    /// after the closing paren decides; without it, the group must contain
    /// exactly one anonymous parameter.
    fn parse_paren_or_function_type(
        &mut self,
        declarator: Option<&mut Declarator>,
    ) -> Option<TypeId> {
        let open_location = self.location();
        self.consume();

        self.sema_mut().push_scope(ScopeFlags::FUNCTION_PROTOTYPE);
        let prototype = self.parse_prototype_parameters();
        self.sema_mut().pop_scope();
        let (param_types, param_decls, varargs, all_anonymous) = prototype?;

        if self.check(TokenKind::Arrow) {
            self.consume();
            let ret = self.parse_typename()?;
            let ty = self
                .sema_mut()
                .build_function_type(param_types, ret, varargs, open_location);
            if let Some(declarator) = declarator {
                declarator.params = param_decls;
            }
            return Some(ty);
        }

        if param_types.len() == 1 && all_anonymous && !varargs {
            return Some(self.sema_mut().context_mut().paren_type(param_types[0]));
        }
        self.diag()
            .report(DiagId::ErrExpectedGot, self.location())
            .arg_token(TokenKind::Arrow)
            .arg_token(*self.kind());
        None
    }

    /// The parameter list of a prototype, up to and including `)`.
    #[allow(clippy::type_complexity)]
    fn parse_prototype_parameters(
        &mut self,
    ) -> Option<(Vec<TypeId>, Vec<DeclId>, bool, bool)> {
        let mut param_types = Vec::new();
        let mut param_decls = Vec::new();
        let mut varargs = false;
        let mut all_anonymous = true;

        if !self.check(TokenKind::RParen) {
            loop {
                if self.check(TokenKind::Ellipsis) {
                    varargs = true;
                    self.consume();
                    break;
                }

                let context = self.sema().current_decl_context();
                let mut proto = Declarator::new(DeclaratorContext::Prototype, context);
                proto.range = SourceRange::at(self.location(), 0);
                self.parse_declarator_header(&mut proto)?;
                if self.check(TokenKind::Colon) {
                    self.consume();
                    self.parse_type_into(&mut proto)?;
                }

                // `(int)` parses `int` as the parameter name; when a named,
                // untyped parameter turns out to name a type, it was an
                // anonymous parameter of that type.
                if proto.ty.is_none() && !proto.name.is_empty() {
                    if let TypeNameResult::Type(ty) = self.sema_mut().get_type_name(proto.name) {
                        let ty = self.parse_type_suffixes(ty)?;
                        proto.ty = Some(ty);
                        proto.name = nyx_ir::Name::EMPTY;
                    }
                }

                if proto.ty.is_none() {
                    self.diag()
                        .report(DiagId::ErrExpectedTypeSpecifierGot, self.location())
                        .arg_token(*self.kind());
                    proto.ty = Some(TypeId::ERROR);
                }

                if !proto.name.is_empty() {
                    all_anonymous = false;
                }
                let ty = proto.ty.unwrap_or(TypeId::ERROR);
                let decl = self.sema_mut().act_on_param_declarator(&proto);
                param_types.push(ty);
                param_decls.push(decl);

                if self.check(TokenKind::Comma) {
                    self.consume();
                    continue;
                }
                break;
            }
        }

        if !self.expect_and_consume(TokenKind::RParen) {
            return None;
        }
        Some((param_types, param_decls, varargs, all_anonymous))
    }

    // === Classes and enums ===

    /// `class Name { member-seq } [;]`
    pub(crate) fn parse_class_specifier(&mut self) -> Option<DeclId> {
        let keyword = self.consume();
        let (name, _) = self.expect_identifier()?;

        if self.check(TokenKind::Colon) {
            self.diag()
                .report(DiagId::ErrBaseClassesUnsupported, self.location());
            self.skip_until(TokenSet::new().with(TokenKind::LBrace), true);
        }

        let range = SourceRange::at(keyword.location, keyword.length);
        let class = self
            .sema_mut()
            .act_on_start_class(name, Visibility::Public, range);

        if !self.expect_and_consume(TokenKind::LBrace) {
            return Some(class);
        }
        let flags = ScopeFlags::CLASS.union(ScopeFlags::DECLARABLE);
        self.with_scope(flags, Some(class), |parser| {
            parser.parse_member_specification();
        });
        self.expect_and_consume(TokenKind::RBrace);
        if self.check(TokenKind::Semi) {
            self.consume();
        }
        Some(class)
    }

    /// member-seq: `def`/`alias` declarators, nested classes and enums,
    /// compiler actions.
    fn parse_member_specification(&mut self) {
        loop {
            match *self.kind() {
                TokenKind::RBrace | TokenKind::Eof => return,
                TokenKind::Semi => {
                    self.consume();
                }
                TokenKind::KwDef | TokenKind::KwAlias => {
                    self.parse_def_declaration(DeclaratorContext::Member, false);
                }
                TokenKind::KwUnsafe => {
                    self.consume();
                    if matches!(self.kind(), TokenKind::KwDef | TokenKind::KwAlias) {
                        self.parse_def_declaration(DeclaratorContext::Member, true);
                    } else {
                        self.diag()
                            .report(DiagId::ErrExpectedDeclarator, self.location());
                    }
                }
                TokenKind::KwClass => {
                    self.parse_class_specifier();
                }
                TokenKind::KwEnum => {
                    self.parse_enum_specifier();
                }
                TokenKind::Dollar => {
                    if self.in_phase_one() {
                        let tokens = self.skip_compiler_action_tokens();
                        let context = self.sema().current_decl_context();
                        self.cache_action(tokens, context);
                    } else {
                        self.parse_compiler_action_producing_decls();
                    }
                }
                _ => {
                    self.diag()
                        .report(DiagId::ErrExpectedDeclarator, self.location());
                    self.skip_until(
                        TokenSet::new().with(TokenKind::Semi).with(TokenKind::RBrace),
                        true,
                    );
                    if self.check(TokenKind::Semi) {
                        self.consume();
                    }
                }
            }
        }
    }

    /// `enum Name [: type] { Id [= const-expr], … } [;]`
    pub(crate) fn parse_enum_specifier(&mut self) -> Option<DeclId> {
        let keyword = self.consume();
        let (name, _) = self.expect_identifier()?;

        let underlying = if self.check(TokenKind::Colon) {
            self.consume();
            self.parse_typename().unwrap_or(TypeId::INT)
        } else {
            TypeId::INT
        };

        let range = SourceRange::at(keyword.location, keyword.length);
        let enum_decl = self.sema_mut().act_on_start_enum(name, underlying, range);

        if !self.expect_and_consume(TokenKind::LBrace) {
            return Some(enum_decl);
        }
        let flags = ScopeFlags::ENUM.union(ScopeFlags::DECLARABLE);
        self.with_scope(flags, Some(enum_decl), |parser| {
            let mut previous: Option<i64> = None;
            loop {
                if parser.check(TokenKind::RBrace) || parser.at_eof() {
                    return;
                }
                let Some((constant_name, location)) = parser.expect_identifier() else {
                    parser.skip_until(
                        TokenSet::new().with(TokenKind::Comma).with(TokenKind::RBrace),
                        true,
                    );
                    if parser.check(TokenKind::RBrace) || parser.at_eof() {
                        return;
                    }
                    continue;
                };
                let init = if parser.check(TokenKind::Eq) {
                    parser.consume();
                    parser.parse_assignment_expression()
                } else {
                    None
                };
                let constant = parser.sema_mut().act_on_enum_constant(
                    enum_decl,
                    constant_name,
                    init,
                    previous,
                    SourceRange::at(location, 0),
                );
                if let DeclKind::EnumConstant { value, .. } =
                    parser.sema().context().decl(constant).kind
                {
                    previous = Some(value);
                }
                if parser.check(TokenKind::Comma) {
                    parser.consume();
                } else {
                    return;
                }
            }
        });
        self.expect_and_consume(TokenKind::RBrace);
        if self.check(TokenKind::Semi) {
            self.consume();
        }

        // Enumerators are owned by the enum but visible in the enclosing
        // scope.
        let constants: Vec<DeclId> = self
            .sema()
            .context()
            .context_children(enum_decl)
            .to_vec();
        for constant in constants {
            self.sema_mut().expose_in_current_scope(constant);
        }
        Some(enum_decl)
    }

    // === Modules and imports ===

    /// `module a.b.c ;` or `module a.b.c { decls }`
    pub(crate) fn parse_module_decl(&mut self) -> Option<DeclId> {
        let keyword = self.consume();
        let path = self.parse_module_name()?;
        let range = SourceRange::at(keyword.location, keyword.length);

        let mut module = None;
        let mut parent = self.sema().current_decl_context();
        for &(name, _) in &path {
            let decl = self.sema_mut().act_on_nested_module(parent, name, range);
            parent = decl;
            module = Some(decl);
        }
        let module = module?;

        if self.check(TokenKind::LBrace) {
            self.consume();
            let flags = ScopeFlags::MODULE.union(ScopeFlags::DECLARABLE);
            self.with_scope(flags, Some(module), |parser| {
                while !parser.check(TokenKind::RBrace) && !parser.at_eof() {
                    parser.parse_external_declaration();
                }
            });
            self.expect_and_consume(TokenKind::RBrace);
        } else {
            self.expect_and_consume(TokenKind::Semi);
        }
        Some(module)
    }

    /// `import a.b.c ;`
    pub(crate) fn parse_module_import(&mut self) -> Option<DeclId> {
        let keyword = self.consume();
        let path = self.parse_module_name()?;
        self.expect_and_consume(TokenKind::Semi);
        let range = SourceRange::at(keyword.location, keyword.length);
        Some(self.sema_mut().act_on_import(path, range))
    }

    /// module-name: `identifier ( . identifier )*`
    fn parse_module_name(&mut self) -> Option<Vec<(nyx_ir::Name, nyx_ir::SourceLocation)>> {
        let mut path = Vec::new();
        loop {
            let (name, location) = self.expect_identifier()?;
            path.push((name, location));
            if self.check(TokenKind::Period) {
                self.consume();
            } else {
                return Some(path);
            }
        }
    }
}
