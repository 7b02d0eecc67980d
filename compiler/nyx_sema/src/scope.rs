//! Lexical scopes.
//!
//! Scopes form a stack owned by Sema, pushed and popped as the parser
//! enters and leaves lexical regions. A scope carries a flag bitset, an
//! optional entity (the `DeclContext` it corresponds to), and the names
//! declared directly in it — block-scope variables live here even though
//! they are also owned by the enclosing function's declaration context.

use rustc_hash::FxHashMap;

use nyx_ir::{DeclId, Name};

/// Scope property bitset.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ScopeFlags(u16);

impl ScopeFlags {
    pub const NONE: ScopeFlags = ScopeFlags(0);
    /// Declarations may be introduced here.
    pub const DECLARABLE: ScopeFlags = ScopeFlags(1 << 0);
    /// A `{ ... }` compound statement.
    pub const COMPOUND: ScopeFlags = ScopeFlags(1 << 1);
    /// The controlled scope of an `if`/`while`/`for`/`switch`.
    pub const CONTROL: ScopeFlags = ScopeFlags(1 << 2);
    /// `break` binds here.
    pub const BREAKABLE: ScopeFlags = ScopeFlags(1 << 3);
    /// `continue` binds here.
    pub const CONTINUABLE: ScopeFlags = ScopeFlags(1 << 4);
    /// A block (function body or nested compound).
    pub const BLOCK: ScopeFlags = ScopeFlags(1 << 5);
    /// The scope of a function definition.
    pub const FUNCTION: ScopeFlags = ScopeFlags(1 << 6);
    /// The parameter scope of a function prototype.
    pub const FUNCTION_PROTOTYPE: ScopeFlags = ScopeFlags(1 << 7);
    /// The scope of a function declarator being parsed.
    pub const FUNCTION_DECLARATION: ScopeFlags = ScopeFlags(1 << 8);
    /// Inside a class specifier.
    pub const CLASS: ScopeFlags = ScopeFlags(1 << 9);
    /// Inside an enum specifier.
    pub const ENUM: ScopeFlags = ScopeFlags(1 << 10);
    /// Inside a module.
    pub const MODULE: ScopeFlags = ScopeFlags(1 << 11);
    /// Pointer and variadic operations are permitted.
    pub const UNSAFE: ScopeFlags = ScopeFlags(1 << 12);

    #[inline]
    #[must_use]
    pub const fn union(self, other: ScopeFlags) -> ScopeFlags {
        ScopeFlags(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: ScopeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: ScopeFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::fmt::Debug for ScopeFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopeFlags({:#06x})", self.0)
    }
}

/// One frame of the scope stack.
#[derive(Debug)]
pub struct Scope {
    pub flags: ScopeFlags,
    /// The `DeclContext` this scope corresponds to, when there is one.
    pub entity: Option<DeclId>,
    /// Declarations introduced directly in this scope.
    decls: FxHashMap<Name, Vec<DeclId>>,
}

impl Scope {
    pub fn new(flags: ScopeFlags, entity: Option<DeclId>) -> Self {
        Scope {
            flags,
            entity,
            decls: FxHashMap::default(),
        }
    }

    pub fn add_decl(&mut self, name: Name, decl: DeclId) {
        if !name.is_empty() {
            self.decls.entry(name).or_default().push(decl);
        }
    }

    /// Declarations of `name` introduced directly in this scope.
    pub fn local_decls(&self, name: Name) -> &[DeclId] {
        self.decls.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove a declaration (used when a placeholder is replaced).
    pub fn remove_decl(&mut self, name: Name, decl: DeclId) {
        if let Some(entries) = self.decls.get_mut(&name) {
            entries.retain(|&d| d != decl);
        }
    }

    /// Swap `old` for `new` in place, keeping the entry position.
    pub fn replace_decl(&mut self, name: Name, old: DeclId, new: DeclId) {
        if let Some(entries) = self.decls.get_mut(&name) {
            for entry in entries.iter_mut() {
                if *entry == old {
                    *entry = new;
                }
            }
        }
    }

    pub fn is_unsafe(&self) -> bool {
        self.flags.contains(ScopeFlags::UNSAFE)
    }
}
