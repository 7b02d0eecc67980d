//! Name lookup.
//!
//! A lookup is parameterized by its purpose, which selects the identifier
//! namespaces searched. Unqualified lookup walks the scope stack outward;
//! qualified lookup targets one `DeclContext`. After declarations are
//! collected, [`LookupResult::resolve`] classifies the outcome.

use nyx_ir::{AstContext, DeclId, IdentNamespace, Name};

/// Why a name is being looked up; selects the namespace mask.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LookupPurpose {
    /// An ordinary value reference.
    Ordinary,
    /// A tag (type) name.
    Tag,
    /// A statement label.
    Label,
    /// A member of a class.
    Member,
    /// A module name.
    Module,
    /// Anything; used by `$IsDefined`.
    Any,
}

impl LookupPurpose {
    /// The namespaces this purpose searches.
    pub fn namespaces(self) -> IdentNamespace {
        match self {
            LookupPurpose::Ordinary => IdentNamespace::ORDINARY
                .union(IdentNamespace::TAG)
                .union(IdentNamespace::MEMBER)
                .union(IdentNamespace::MODULE),
            LookupPurpose::Tag => IdentNamespace::TYPE,
            LookupPurpose::Label => IdentNamespace::LABEL,
            LookupPurpose::Member => IdentNamespace::MEMBER
                .union(IdentNamespace::TAG)
                .union(IdentNamespace::ORDINARY),
            LookupPurpose::Module => IdentNamespace::MODULE,
            LookupPurpose::Any => IdentNamespace::ALL,
        }
    }
}

/// Outcome classification of a lookup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LookupStatus {
    NotFound,
    Found,
    FoundOverloaded,
    Ambiguous,
}

/// A lookup in progress: the name, the purpose, and what was found.
#[derive(Debug)]
pub struct LookupResult {
    name: Name,
    purpose: LookupPurpose,
    decls: Vec<DeclId>,
    status: LookupStatus,
}

impl LookupResult {
    pub fn new(name: Name, purpose: LookupPurpose) -> Self {
        LookupResult {
            name,
            purpose,
            decls: Vec::new(),
            status: LookupStatus::NotFound,
        }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn purpose(&self) -> LookupPurpose {
        self.purpose
    }

    pub fn add_decl(&mut self, decl: DeclId) {
        if !self.decls.contains(&decl) {
            self.decls.push(decl);
        }
    }

    pub fn add_decls(&mut self, decls: impl IntoIterator<Item = DeclId>) {
        for decl in decls {
            self.add_decl(decl);
        }
    }

    pub fn decls(&self) -> &[DeclId] {
        &self.decls
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Classify: none found, one found, several functions (an overload
    /// set), or several non-functions (ambiguous).
    pub fn resolve(&mut self, context: &AstContext) -> LookupStatus {
        self.status = match self.decls.len() {
            0 => LookupStatus::NotFound,
            1 => LookupStatus::Found,
            _ => {
                if self
                    .decls
                    .iter()
                    .all(|&d| context.decl(d).is_function_like())
                {
                    LookupStatus::FoundOverloaded
                } else {
                    LookupStatus::Ambiguous
                }
            }
        };
        self.status
    }

    #[inline]
    pub fn status(&self) -> LookupStatus {
        self.status
    }

    /// The single found declaration, if the lookup resolved to exactly one.
    pub fn single(&self) -> Option<DeclId> {
        match self.status {
            LookupStatus::Found => Some(self.decls[0]),
            _ => None,
        }
    }

    /// The first declaration of an overload set or single result.
    pub fn first(&self) -> Option<DeclId> {
        self.decls.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_ir::{Decl, DeclKind, SourceRange, StorageClass, TypeId, Visibility};

    fn alloc(context: &mut AstContext, kind: DeclKind) -> DeclId {
        let namespaces = Decl::namespaces_for(&kind);
        context.alloc_decl(Decl {
            kind,
            name: Name::EMPTY,
            range: SourceRange::DUMMY,
            context: None,
            namespaces,
            visibility: Visibility::Public,
        })
    }

    #[test]
    fn purpose_masks_match_the_table() {
        assert!(LookupPurpose::Ordinary
            .namespaces()
            .intersects(IdentNamespace::MODULE));
        assert!(!LookupPurpose::Ordinary
            .namespaces()
            .intersects(IdentNamespace::TYPE));
        assert_eq!(LookupPurpose::Tag.namespaces(), IdentNamespace::TYPE);
        assert_eq!(LookupPurpose::Label.namespaces(), IdentNamespace::LABEL);
        assert_eq!(LookupPurpose::Any.namespaces(), IdentNamespace::ALL);
    }

    #[test]
    fn resolve_classifies_outcomes() {
        let mut context = AstContext::default();
        let var = alloc(
            &mut context,
            DeclKind::Var {
                ty: TypeId::INT,
                storage: StorageClass::None,
                init: None,
            },
        );
        let fn_ty = context.function_type(vec![], TypeId::VOID, false);
        let f1 = alloc(
            &mut context,
            DeclKind::Function {
                ty: fn_ty,
                params: Box::new([]),
                body: None,
            },
        );
        let f2 = alloc(
            &mut context,
            DeclKind::Function {
                ty: fn_ty,
                params: Box::new([]),
                body: None,
            },
        );

        let mut empty = LookupResult::new(Name::EMPTY, LookupPurpose::Ordinary);
        assert_eq!(empty.resolve(&context), LookupStatus::NotFound);

        let mut one = LookupResult::new(Name::EMPTY, LookupPurpose::Ordinary);
        one.add_decl(var);
        assert_eq!(one.resolve(&context), LookupStatus::Found);
        assert_eq!(one.single(), Some(var));

        let mut overloads = LookupResult::new(Name::EMPTY, LookupPurpose::Ordinary);
        overloads.add_decls([f1, f2]);
        assert_eq!(overloads.resolve(&context), LookupStatus::FoundOverloaded);
        assert_eq!(overloads.single(), None);

        let mut mixed = LookupResult::new(Name::EMPTY, LookupPurpose::Ordinary);
        mixed.add_decls([f1, var]);
        assert_eq!(mixed.resolve(&context), LookupStatus::Ambiguous);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let mut result = LookupResult::new(Name::EMPTY, LookupPurpose::Any);
        result.add_decl(DeclId(1));
        result.add_decl(DeclId(1));
        assert_eq!(result.decls().len(), 1);
    }
}
