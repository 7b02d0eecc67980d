//! The canonical type representation.
//!
//! Structural types (pointer, array, function, paren, auto, unresolved) are
//! interned in [`AstContext`](crate::AstContext)'s type pool: equal
//! [`TypeData`] values always share one [`TypeId`]. Nominal types carry the
//! declaration id of their class or enum, which makes them unique per
//! declaration by construction.

use crate::ast::{DeclId, ExprId};
use crate::{BuiltinType, Token};

/// Index of a canonical type in the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    // Builtins are pre-interned in `BuiltinType::ALL` order, followed by the
    // error sentinel. These constants must match `AstContext::new`.
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const SHORT: TypeId = TypeId(3);
    pub const USHORT: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);
    pub const UINT: TypeId = TypeId(6);
    pub const LONG: TypeId = TypeId(7);
    pub const ULONG: TypeId = TypeId(8);
    pub const LONGLONG: TypeId = TypeId(9);
    pub const ULONGLONG: TypeId = TypeId(10);
    pub const INT128: TypeId = TypeId(11);
    pub const UINT128: TypeId = TypeId(12);
    pub const FLOAT: TypeId = TypeId(13);
    pub const DOUBLE: TypeId = TypeId(14);
    pub const LONGDOUBLE: TypeId = TypeId(15);
    pub const FLOAT128: TypeId = TypeId(16);
    pub const OVERLOAD: TypeId = TypeId(17);
    pub const BOUND_MEMBER: TypeId = TypeId(18);
    pub const BUILTIN_FN: TypeId = TypeId(19);
    /// Sentinel for expressions whose type could not be computed; a
    /// diagnostic has already been emitted wherever this appears.
    pub const ERROR: TypeId = TypeId(20);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == TypeId::ERROR.0
    }
}

impl std::fmt::Debug for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ty#{}", self.0)
    }
}

/// Canonical type payload.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    Builtin(BuiltinType),
    /// `T*`
    Pointer(TypeId),
    /// `T[N]`
    Array { elem: TypeId, size: u64 },
    /// `T[]`; only valid at the outermost level of a declarator, replaced
    /// by a sized array once the initializer fixes the length.
    IncompleteArray(TypeId),
    /// `(params...) -> ret`
    Function {
        params: Box<[TypeId]>,
        ret: TypeId,
        varargs: bool,
    },
    /// `(T)`
    Paren(TypeId),
    /// An `auto` placeholder, canonicalized per deduced type.
    Auto { deduced: Option<TypeId> },
    /// `typeof(expr)`
    TypeOf(ExprId),
    /// A type whose spelling was captured but not yet resolved; holds the
    /// cached tokens verbatim.
    Unresolved(Box<[Token]>),
    /// A class type, unique per declaration.
    Class(DeclId),
    /// An enum type, unique per declaration.
    Enum(DeclId),
    /// Error sentinel; see [`TypeId::ERROR`].
    Error,
}

impl TypeData {
    /// The builtin variant, if this is a builtin type.
    #[inline]
    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match self {
            TypeData::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this is one of the structural variants subject to
    /// canonicalization (as opposed to builtin, nominal or sentinel types).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TypeData::Pointer(_)
                | TypeData::Array { .. }
                | TypeData::IncompleteArray(_)
                | TypeData::Function { .. }
                | TypeData::Paren(_)
                | TypeData::Auto { .. }
                | TypeData::TypeOf(_)
                | TypeData::Unresolved(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_extraction() {
        assert_eq!(
            TypeData::Builtin(BuiltinType::Int).as_builtin(),
            Some(BuiltinType::Int)
        );
        assert_eq!(TypeData::Pointer(TypeId::INT).as_builtin(), None);
    }

    #[test]
    fn structural_classification() {
        assert!(TypeData::Pointer(TypeId::INT).is_structural());
        assert!(TypeData::Paren(TypeId::BOOL).is_structural());
        assert!(!TypeData::Builtin(BuiltinType::Int).is_structural());
        assert!(!TypeData::Class(DeclId(3)).is_structural());
    }
}
