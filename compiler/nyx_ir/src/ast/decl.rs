//! Declaration nodes.

use super::{DeclId, ExprId, StmtId};
use crate::{Name, SourceRange, TypeId};

/// Bitmask classifying which identifier namespaces a declaration
/// contributes its name to.
///
/// A lookup carries a mask derived from its purpose and only sees
/// declarations whose namespaces intersect it.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct IdentNamespace(u8);

impl IdentNamespace {
    pub const NONE: IdentNamespace = IdentNamespace(0);
    /// Ordinary value names: variables, functions, parameters.
    pub const ORDINARY: IdentNamespace = IdentNamespace(1 << 0);
    /// Tag names: classes and enums as introduced by their declarations.
    pub const TAG: IdentNamespace = IdentNamespace(1 << 1);
    /// Member names: fields and methods of a class.
    pub const MEMBER: IdentNamespace = IdentNamespace(1 << 2);
    /// Module names.
    pub const MODULE: IdentNamespace = IdentNamespace(1 << 3);
    /// Type names: aliases and tags viewed as types.
    pub const TYPE: IdentNamespace = IdentNamespace(1 << 4);
    /// Statement labels.
    pub const LABEL: IdentNamespace = IdentNamespace(1 << 5);
    /// Every namespace; used by unresolved placeholders and `Any` lookups.
    pub const ALL: IdentNamespace = IdentNamespace(0x3F);

    #[inline]
    #[must_use]
    pub const fn union(self, other: IdentNamespace) -> IdentNamespace {
        IdentNamespace(self.0 | other.0)
    }

    #[inline]
    pub const fn intersects(self, other: IdentNamespace) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Debug for IdentNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentNamespace({:#04x})", self.0)
    }
}

/// Access control on a declaration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

/// Storage class on a variable declaration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum StorageClass {
    #[default]
    None,
    Extern,
    Static,
}

/// What an alias declaration stands for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AliasTarget {
    Type(TypeId),
}

/// A declaration.
///
/// `context` is the owning `DeclContext`; it is `None` only for the
/// translation unit itself. The ordered children and the name lookup map of
/// context declarations live in the [`AstContext`](crate::AstContext), keyed
/// by the context's id.
#[derive(Clone, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    /// `Name::EMPTY` for unnamed declarations.
    pub name: Name,
    pub range: SourceRange,
    pub context: Option<DeclId>,
    pub namespaces: IdentNamespace,
    pub visibility: Visibility,
}

/// Declaration kind and kind-specific payload.
#[derive(Clone, Debug)]
pub enum DeclKind {
    TranslationUnit,
    Module,
    Import {
        path: Box<[Name]>,
        /// The module declaration the path resolved to, if known.
        target: Option<DeclId>,
    },
    Alias {
        target: AliasTarget,
    },
    Label {
        stmt: Option<StmtId>,
    },
    Var {
        ty: TypeId,
        storage: StorageClass,
        init: Option<ExprId>,
    },
    /// The implicit `this` parameter of a method.
    ImplicitParam {
        ty: TypeId,
    },
    ParmVar {
        ty: TypeId,
    },
    Function {
        ty: TypeId,
        params: Box<[DeclId]>,
        body: Option<StmtId>,
    },
    Method {
        ty: TypeId,
        params: Box<[DeclId]>,
        body: Option<StmtId>,
    },
    Constructor {
        ty: TypeId,
        params: Box<[DeclId]>,
        body: Option<StmtId>,
    },
    Destructor {
        ty: TypeId,
        params: Box<[DeclId]>,
        body: Option<StmtId>,
    },
    Field {
        ty: TypeId,
    },
    Enum {
        underlying: TypeId,
    },
    EnumConstant {
        ty: TypeId,
        init: Option<ExprId>,
        value: i64,
    },
    Class,
    /// Phase-1 placeholder: the named entity exists but its type and
    /// initializer are still cached as tokens in the parser's declarator
    /// pool, at the given index.
    Unresolved {
        declarator: u32,
    },
    Empty,
}

impl Decl {
    /// Whether this declaration is also a `DeclContext` owning child
    /// declarations.
    pub fn is_decl_context(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::TranslationUnit
                | DeclKind::Module
                | DeclKind::Function { .. }
                | DeclKind::Method { .. }
                | DeclKind::Constructor { .. }
                | DeclKind::Destructor { .. }
                | DeclKind::Class
                | DeclKind::Enum { .. }
        )
    }

    /// The declared value type, for value declarations.
    pub fn value_type(&self) -> Option<TypeId> {
        match self.kind {
            DeclKind::Var { ty, .. }
            | DeclKind::ImplicitParam { ty }
            | DeclKind::ParmVar { ty }
            | DeclKind::Function { ty, .. }
            | DeclKind::Method { ty, .. }
            | DeclKind::Constructor { ty, .. }
            | DeclKind::Destructor { ty, .. }
            | DeclKind::Field { ty }
            | DeclKind::EnumConstant { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Whether this is one of the function-like declaration kinds.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Function { .. }
                | DeclKind::Method { .. }
                | DeclKind::Constructor { .. }
                | DeclKind::Destructor { .. }
        )
    }

    /// The namespaces a declaration of the given kind contributes to.
    pub fn namespaces_for(kind: &DeclKind) -> IdentNamespace {
        match kind {
            DeclKind::TranslationUnit | DeclKind::Empty => IdentNamespace::NONE,
            DeclKind::Module => IdentNamespace::MODULE,
            DeclKind::Import { .. } => IdentNamespace::MODULE,
            DeclKind::Alias { .. } => IdentNamespace::TYPE,
            DeclKind::Label { .. } => IdentNamespace::LABEL,
            DeclKind::Var { .. } | DeclKind::ParmVar { .. } | DeclKind::ImplicitParam { .. } => {
                IdentNamespace::ORDINARY
            }
            DeclKind::Function { .. } => IdentNamespace::ORDINARY,
            DeclKind::Method { .. }
            | DeclKind::Constructor { .. }
            | DeclKind::Destructor { .. }
            | DeclKind::Field { .. } => IdentNamespace::MEMBER.union(IdentNamespace::ORDINARY),
            DeclKind::Enum { .. } | DeclKind::Class => {
                IdentNamespace::TAG.union(IdentNamespace::TYPE)
            }
            DeclKind::EnumConstant { .. } => IdentNamespace::ORDINARY,
            DeclKind::Unresolved { .. } => IdentNamespace::ALL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_bit_algebra() {
        let ord_tag = IdentNamespace::ORDINARY.union(IdentNamespace::TAG);
        assert!(ord_tag.intersects(IdentNamespace::ORDINARY));
        assert!(ord_tag.intersects(IdentNamespace::TAG));
        assert!(!ord_tag.intersects(IdentNamespace::LABEL));
        assert!(IdentNamespace::ALL.intersects(IdentNamespace::MODULE));
        assert!(IdentNamespace::NONE.is_empty());
    }

    #[test]
    fn context_kinds() {
        let mk = |kind: DeclKind| Decl {
            kind,
            name: Name::EMPTY,
            range: SourceRange::DUMMY,
            context: None,
            namespaces: IdentNamespace::NONE,
            visibility: Visibility::Public,
        };
        assert!(mk(DeclKind::TranslationUnit).is_decl_context());
        assert!(mk(DeclKind::Class).is_decl_context());
        assert!(!mk(DeclKind::Field { ty: TypeId::INT }).is_decl_context());
        assert!(!mk(DeclKind::Empty).is_decl_context());
    }

    #[test]
    fn unresolved_lives_in_every_namespace() {
        let ns = Decl::namespaces_for(&DeclKind::Unresolved { declarator: 0 });
        assert!(ns.intersects(IdentNamespace::ORDINARY));
        assert!(ns.intersects(IdentNamespace::TYPE));
        assert!(ns.intersects(IdentNamespace::LABEL));
    }
}
