//! The declarator: a declaration under construction.
//!
//! The parser fills a declarator as it consumes specifiers, the name, the
//! type and the initializer, then hands it to Sema. In phase 1 a top-level
//! declarator instead captures its type/initializer tokens verbatim; the
//! cached tokens are replayed when the declarator is resolved in phase 2.

use nyx_ir::{
    DeclId, ExprId, Name, SourceLocation, SourceRange, StmtId, StorageClass, Token, TypeId,
    Visibility,
};

/// Index into the parser's declarator pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DeclaratorId(pub u32);

impl DeclaratorId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a declarator appears; selects which parts are required.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeclaratorContext {
    /// Top level of the translation unit or a module.
    TopLevel,
    /// Statement position inside a function body.
    Block,
    /// A parameter in a function prototype; the name may be omitted.
    Prototype,
    /// A class member.
    Member,
    /// A bare type position; only the type part is parsed.
    TypeName,
}

impl DeclaratorContext {
    /// Whether an omitted identifier is acceptable here.
    pub fn allows_anonymous(self) -> bool {
        matches!(self, DeclaratorContext::Prototype | DeclaratorContext::TypeName)
    }
}

/// Parsed initializer forms.
#[derive(Clone, Debug)]
pub enum Initializer {
    /// `= expr`
    Expr(ExprId),
    /// `= { expr-list }`
    List(Vec<ExprId>),
    /// `{ compound-statement }` (function body)
    Body(StmtId),
}

/// A declaration being built by the parser.
#[derive(Debug)]
pub struct Declarator {
    pub context: DeclaratorContext,
    pub range: SourceRange,

    /// `Name::EMPTY` when omitted (prototype/typename contexts).
    pub name: Name,
    pub name_location: SourceLocation,
    /// Declared with the name `this`.
    pub is_constructor: bool,
    /// Declared with the name `~this`.
    pub is_destructor: bool,

    pub storage: StorageClass,
    pub visibility: Option<Visibility>,
    pub is_const: bool,
    pub is_unsafe: bool,

    pub ty: Option<TypeId>,
    /// Parameter declarations created while parsing a function type.
    pub params: Vec<DeclId>,
    pub initializer: Option<Initializer>,

    /// Tokens captured in phase 1, replayed on resolution.
    pub cached_tokens: Vec<Token>,
    /// The context the declaration belongs to, restored for resolution.
    pub decl_context: DeclId,
    /// The phase-1 placeholder registered for this declarator.
    pub placeholder: Option<DeclId>,
    /// The declaration produced when this declarator was resolved.
    pub resolved_decl: Option<DeclId>,
    /// Set when this declarator is an `alias`, not a `def`.
    pub is_alias: bool,
}

impl Declarator {
    pub fn new(context: DeclaratorContext, decl_context: DeclId) -> Self {
        Declarator {
            context,
            range: SourceRange::DUMMY,
            name: Name::EMPTY,
            name_location: SourceLocation::DUMMY,
            is_constructor: false,
            is_destructor: false,
            storage: StorageClass::None,
            visibility: None,
            is_const: false,
            is_unsafe: false,
            ty: None,
            params: Vec::new(),
            initializer: None,
            cached_tokens: Vec::new(),
            decl_context,
            placeholder: None,
            resolved_decl: None,
            is_alias: false,
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty() || self.is_constructor || self.is_destructor
    }

    /// Whether phase 1 deferred this declarator's type and initializer.
    pub fn is_deferred(&self) -> bool {
        !self.cached_tokens.is_empty()
    }
}
