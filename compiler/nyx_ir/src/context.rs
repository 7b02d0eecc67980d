//! The AST context: owner of all canonical types and AST nodes.
//!
//! One [`AstContext`] exists per translation unit. It owns:
//! - the canonical type pool (structural types interned by value),
//! - the declaration, statement and expression arenas,
//! - the `DeclContext` structure (ordered children plus a name multimap per
//!   context declaration),
//! - layout caches and the target description.
//!
//! Everything else in the compiler borrows from it through ids.

use rustc_hash::FxHashMap;

use crate::ast::{Decl, DeclId, DeclKind, ExprId, IdentNamespace, Stmt, StmtId, Visibility};
use crate::{BuiltinType, Expr, Name, SourceRange, Token, TypeData, TypeId};

/// Pointer size and alignment of the compilation target, in bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TargetInfo {
    pub pointer_size: u64,
    pub pointer_align: u64,
}

impl Default for TargetInfo {
    fn default() -> Self {
        TargetInfo {
            pointer_size: 8,
            pointer_align: 8,
        }
    }
}

/// Size and alignment of a type, in bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TypeSizeInfo {
    pub size: u64,
    pub align: u64,
}

/// Layout of a class: total size, alignment, and per-entry offsets.
///
/// Entries appear in declaration order; a `None` decl marks a padding
/// placeholder recorded at the pre-padding offset. The final size is not
/// rounded up to the alignment: the tail of a class is packed.
#[derive(Clone, Debug, Default)]
pub struct ClassLayout {
    pub size: u64,
    pub align: u64,
    pub field_offsets: Vec<(Option<DeclId>, u64)>,
}

impl ClassLayout {
    /// The entry index and byte offset of a field, if it belongs to this
    /// layout. The index counts layout entries, padding placeholders
    /// included.
    pub fn field_info(&self, field: DeclId) -> Option<(usize, u64)> {
        self.field_offsets
            .iter()
            .position(|(entry, _)| *entry == Some(field))
            .map(|index| (index, self.field_offsets[index].1))
    }
}

/// Ordered children and name lookup map of one `DeclContext`.
#[derive(Default, Debug)]
struct DeclContextData {
    children: Vec<DeclId>,
    lookup: FxHashMap<Name, Vec<DeclId>>,
}

const fn align_to(size: u64, align: u64) -> u64 {
    (size + align - 1) / align * align
}

/// Owner of all AST nodes and canonical types for one translation unit.
pub struct AstContext {
    target: TargetInfo,

    types: Vec<TypeData>,
    type_map: FxHashMap<TypeData, TypeId>,

    decls: Vec<Decl>,
    contexts: FxHashMap<DeclId, DeclContextData>,
    stmts: Vec<Stmt>,
    exprs: Vec<Expr>,

    type_info_cache: FxHashMap<TypeId, TypeSizeInfo>,
    class_layouts: FxHashMap<DeclId, ClassLayout>,
    size_type: Option<TypeId>,
    ptrdiff_type: Option<TypeId>,
}

impl AstContext {
    pub fn new(target: TargetInfo) -> Self {
        let mut context = AstContext {
            target,
            types: Vec::with_capacity(64),
            type_map: FxHashMap::default(),
            decls: Vec::with_capacity(64),
            contexts: FxHashMap::default(),
            stmts: Vec::new(),
            exprs: Vec::new(),
            type_info_cache: FxHashMap::default(),
            class_layouts: FxHashMap::default(),
            size_type: None,
            ptrdiff_type: None,
        };

        // Pre-intern builtins at the fixed TypeId constants, then the error
        // sentinel. Order must match the constants in `TypeId`.
        for &builtin in BuiltinType::ALL {
            let id = context.intern_type(TypeData::Builtin(builtin));
            debug_assert_eq!(id.0 as usize, builtin as usize);
        }
        let error = context.intern_type(TypeData::Error);
        debug_assert_eq!(error, TypeId::ERROR);

        // The translation unit is always declaration 0.
        let tu = context.alloc_decl(Decl {
            kind: DeclKind::TranslationUnit,
            name: Name::EMPTY,
            range: SourceRange::DUMMY,
            context: None,
            namespaces: IdentNamespace::NONE,
            visibility: Visibility::Public,
        });
        debug_assert_eq!(tu, DeclId::TRANSLATION_UNIT);

        context
    }

    #[inline]
    pub fn target(&self) -> TargetInfo {
        self.target
    }

    // === Types ===

    /// Intern a type, returning the canonical id.
    ///
    /// Structurally equal payloads always return the same id.
    pub fn intern_type(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.type_map.get(&data) {
            return id;
        }
        let id = TypeId(u32::try_from(self.types.len()).expect("type pool exceeded u32::MAX"));
        self.types.push(data.clone());
        self.type_map.insert(data, id);
        id
    }

    #[inline]
    pub fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    /// Number of canonical types currently interned.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// The canonical id of a builtin type.
    #[inline]
    pub fn builtin_type(&self, builtin: BuiltinType) -> TypeId {
        // Builtins are pre-interned in variant order starting at 0.
        TypeId(builtin as u32)
    }

    pub fn pointer_type(&mut self, pointee: TypeId) -> TypeId {
        self.intern_type(TypeData::Pointer(pointee))
    }

    pub fn array_type(&mut self, elem: TypeId, size: u64) -> TypeId {
        self.intern_type(TypeData::Array { elem, size })
    }

    pub fn incomplete_array_type(&mut self, elem: TypeId) -> TypeId {
        self.intern_type(TypeData::IncompleteArray(elem))
    }

    pub fn function_type(&mut self, params: Vec<TypeId>, ret: TypeId, varargs: bool) -> TypeId {
        self.intern_type(TypeData::Function {
            params: params.into_boxed_slice(),
            ret,
            varargs,
        })
    }

    pub fn paren_type(&mut self, inner: TypeId) -> TypeId {
        self.intern_type(TypeData::Paren(inner))
    }

    pub fn auto_type(&mut self, deduced: Option<TypeId>) -> TypeId {
        self.intern_type(TypeData::Auto { deduced })
    }

    pub fn typeof_type(&mut self, expr: ExprId) -> TypeId {
        self.intern_type(TypeData::TypeOf(expr))
    }

    pub fn unresolved_type(&mut self, tokens: Vec<Token>) -> TypeId {
        self.intern_type(TypeData::Unresolved(tokens.into_boxed_slice()))
    }

    pub fn class_type(&mut self, decl: DeclId) -> TypeId {
        self.intern_type(TypeData::Class(decl))
    }

    pub fn enum_type(&mut self, decl: DeclId) -> TypeId {
        self.intern_type(TypeData::Enum(decl))
    }

    /// Peel sugar: parens, deduced `auto`, and `typeof` of a typed
    /// expression. Undeduced `auto` and everything else stop the peel.
    pub fn underlying_type(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        loop {
            match self.type_data(current) {
                TypeData::Paren(inner) => current = *inner,
                TypeData::Auto {
                    deduced: Some(inner),
                } => current = *inner,
                TypeData::TypeOf(expr) => current = self.expr(*expr).ty,
                _ => return current,
            }
        }
    }

    /// The builtin class of a type after peeling sugar, if any.
    pub fn as_builtin(&self, ty: TypeId) -> Option<BuiltinType> {
        self.type_data(self.underlying_type(ty)).as_builtin()
    }

    pub fn is_pointer_type(&self, ty: TypeId) -> bool {
        matches!(
            self.type_data(self.underlying_type(ty)),
            TypeData::Pointer(_)
        )
    }

    /// The pointee of a pointer type, after peeling sugar.
    pub fn pointee_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.type_data(self.underlying_type(ty)) {
            TypeData::Pointer(pointee) => Some(*pointee),
            _ => None,
        }
    }

    pub fn is_arithmetic_type(&self, ty: TypeId) -> bool {
        self.as_builtin(ty).is_some_and(BuiltinType::is_arithmetic)
    }

    pub fn is_integer_type(&self, ty: TypeId) -> bool {
        self.as_builtin(ty).is_some_and(BuiltinType::is_integer)
    }

    pub fn is_floating_type(&self, ty: TypeId) -> bool {
        self.as_builtin(ty).is_some_and(BuiltinType::is_floating)
    }

    pub fn is_void_type(&self, ty: TypeId) -> bool {
        self.as_builtin(ty) == Some(BuiltinType::Void)
    }

    /// The smallest unsigned builtin whose size and alignment cover the
    /// target pointer; memoized.
    pub fn size_type(&mut self) -> TypeId {
        if let Some(ty) = self.size_type {
            return ty;
        }
        let builtin = self.pointer_sized_builtin().to_unsigned();
        let ty = self.builtin_type(builtin);
        self.size_type = Some(ty);
        ty
    }

    /// The smallest signed builtin whose size and alignment cover the
    /// target pointer; memoized.
    pub fn ptrdiff_type(&mut self) -> TypeId {
        if let Some(ty) = self.ptrdiff_type {
            return ty;
        }
        let builtin = self.pointer_sized_builtin().to_signed();
        let ty = self.builtin_type(builtin);
        self.ptrdiff_type = Some(ty);
        ty
    }

    fn pointer_sized_builtin(&self) -> BuiltinType {
        for &builtin in BuiltinType::ALL {
            if !builtin.is_integer() {
                continue;
            }
            let (size, align) = builtin.size_align();
            if size >= self.target.pointer_size && align >= self.target.pointer_align {
                return builtin;
            }
        }
        // The table always contains 16-byte integers, so a pointer wider
        // than that is unsupported.
        unreachable!("no builtin integer covers the target pointer size")
    }

    /// Size and alignment of a type; a pure function of its underlying
    /// type, memoized.
    pub fn type_info(&mut self, ty: TypeId) -> TypeSizeInfo {
        let underlying = self.underlying_type(ty);
        if let Some(&info) = self.type_info_cache.get(&underlying) {
            return info;
        }
        let info = self.compute_type_info(underlying);
        self.type_info_cache.insert(underlying, info);
        info
    }

    fn compute_type_info(&mut self, ty: TypeId) -> TypeSizeInfo {
        match self.type_data(ty).clone() {
            TypeData::Builtin(builtin) => {
                let (size, align) = builtin.size_align();
                TypeSizeInfo { size, align }
            }
            TypeData::Pointer(_) => TypeSizeInfo {
                size: self.target.pointer_size,
                align: self.target.pointer_align,
            },
            TypeData::Array { elem, size } => {
                let elem_info = self.type_info(elem);
                TypeSizeInfo {
                    size: elem_info.size * size,
                    align: elem_info.align,
                }
            }
            TypeData::IncompleteArray(elem) => {
                let elem_info = self.type_info(elem);
                TypeSizeInfo {
                    size: 0,
                    align: elem_info.align,
                }
            }
            TypeData::Function { .. } => TypeSizeInfo { size: 0, align: 0 },
            TypeData::Class(decl) => {
                let layout = self.class_layout(decl);
                TypeSizeInfo {
                    size: layout.size,
                    align: layout.align,
                }
            }
            TypeData::Enum(decl) => {
                let underlying = match &self.decl(decl).kind {
                    DeclKind::Enum { underlying } => *underlying,
                    _ => return TypeSizeInfo { size: 0, align: 0 },
                };
                self.type_info(underlying)
            }
            // Sugar is peeled before we get here; unresolved and error
            // types have no meaningful extent.
            _ => TypeSizeInfo { size: 0, align: 0 },
        }
    }

    /// Compute (and cache) the layout of a class.
    ///
    /// Greedy pack with per-field alignment: each field is placed at its
    /// offset aligned up to the running alignment; padding inserts a
    /// `None` placeholder entry. The final size is not trailing-padded.
    pub fn class_layout(&mut self, class: DeclId) -> &ClassLayout {
        if !self.class_layouts.contains_key(&class) {
            let fields: Vec<DeclId> = self
                .context_children(class)
                .iter()
                .copied()
                .filter(|&child| matches!(self.decl(child).kind, DeclKind::Field { .. }))
                .collect();

            let mut layout = ClassLayout {
                size: 0,
                align: 1,
                field_offsets: Vec::with_capacity(fields.len()),
            };
            for field in fields {
                let field_ty = self
                    .decl(field)
                    .value_type()
                    .expect("field declarations always carry a type");
                let field_info = self.type_info(field_ty);
                layout.align = layout.align.max(field_info.align.max(1));
                let offset = align_to(layout.size, layout.align);
                if offset != layout.size {
                    layout.field_offsets.push((None, layout.size));
                }
                layout.field_offsets.push((Some(field), offset));
                layout.size = offset + field_info.size;
            }
            self.class_layouts.insert(class, layout);
        }
        &self.class_layouts[&class]
    }

    /// Entry index and offset of a field within its class.
    pub fn field_info(&mut self, class: DeclId, field: DeclId) -> Option<(usize, u64)> {
        self.class_layout(class).field_info(field)
    }

    // === Declarations ===

    /// Allocate a declaration. Contexts get their child storage created
    /// eagerly.
    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(u32::try_from(self.decls.len()).expect("decl arena exceeded u32::MAX"));
        let is_context = decl.is_decl_context();
        self.decls.push(decl);
        if is_context {
            self.contexts.insert(id, DeclContextData::default());
        }
        id
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    #[inline]
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    /// Add `child` to `context`'s ordered children and, when named, to its
    /// lookup map. Sets the child's owner pointer.
    pub fn add_to_context(&mut self, context: DeclId, child: DeclId) {
        debug_assert!(
            self.decl(context).is_decl_context(),
            "{context:?} is not a DeclContext"
        );
        self.decl_mut(child).context = Some(context);
        let name = self.decl(child).name;
        let namespaces = self.decl(child).namespaces;
        let data = self
            .contexts
            .get_mut(&context)
            .expect("context storage exists for every DeclContext");
        data.children.push(child);
        if !name.is_empty() && !namespaces.is_empty() {
            data.lookup.entry(name).or_default().push(child);
        }
    }

    /// Replace `old` with `new` in `context`, preserving the child's
    /// position. Used in phase 2 to swap an unresolved placeholder for the
    /// resolved declaration.
    pub fn replace_in_context(&mut self, context: DeclId, old: DeclId, new: DeclId) {
        self.decl_mut(new).context = Some(context);
        let old_name = self.decl(old).name;
        let new_name = self.decl(new).name;
        let new_namespaces = self.decl(new).namespaces;
        let data = self
            .contexts
            .get_mut(&context)
            .expect("context storage exists for every DeclContext");
        if let Some(slot) = data.children.iter_mut().find(|slot| **slot == old) {
            *slot = new;
        }
        if let Some(entries) = data.lookup.get_mut(&old_name) {
            entries.retain(|&entry| entry != old);
            if entries.is_empty() {
                data.lookup.remove(&old_name);
            }
        }
        if !new_name.is_empty() && !new_namespaces.is_empty() {
            data.lookup.entry(new_name).or_default().push(new);
        }
    }

    /// Remove `child` from `context`'s child list and lookup map.
    pub fn remove_from_context(&mut self, context: DeclId, child: DeclId) {
        let name = self.decl(child).name;
        let Some(data) = self.contexts.get_mut(&context) else {
            return;
        };
        data.children.retain(|&entry| entry != child);
        if let Some(entries) = data.lookup.get_mut(&name) {
            entries.retain(|&entry| entry != child);
            if entries.is_empty() {
                data.lookup.remove(&name);
            }
        }
    }

    /// The ordered children of a context declaration.
    pub fn context_children(&self, context: DeclId) -> &[DeclId] {
        self.contexts
            .get(&context)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    /// Declarations named `name` in `context`, filtered by namespace mask.
    pub fn lookup_in_context(
        &self,
        context: DeclId,
        name: Name,
        namespaces: IdentNamespace,
    ) -> Vec<DeclId> {
        let Some(data) = self.contexts.get(&context) else {
            return Vec::new();
        };
        let Some(entries) = data.lookup.get(&name) else {
            return Vec::new();
        };
        entries
            .iter()
            .copied()
            .filter(|&id| self.decl(id).namespaces.intersects(namespaces))
            .collect()
    }

    #[inline]
    pub fn translation_unit(&self) -> DeclId {
        DeclId::TRANSLATION_UNIT
    }

    // === Statements and expressions ===

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(u32::try_from(self.stmts.len()).expect("stmt arena exceeded u32::MAX"));
        self.stmts.push(stmt);
        id
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).expect("expr arena exceeded u32::MAX"));
        self.exprs.push(expr);
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    /// Every declaration in the arena, in allocation order.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(index, decl)| (DeclId(index as u32), decl))
    }

    /// Every expression in the arena, in allocation order.
    pub fn exprs(&self) -> impl Iterator<Item = (ExprId, &Expr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(index, expr)| (ExprId(index as u32), expr))
    }

    /// Every statement in the arena, in allocation order.
    pub fn stmts(&self) -> impl Iterator<Item = (StmtId, &Stmt)> {
        self.stmts
            .iter()
            .enumerate()
            .map(|(index, stmt)| (StmtId(index as u32), stmt))
    }
}

impl Default for AstContext {
    fn default() -> Self {
        Self::new(TargetInfo::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StorageClass;

    fn field(ty: TypeId) -> Decl {
        Decl {
            kind: DeclKind::Field { ty },
            name: Name::EMPTY,
            range: SourceRange::DUMMY,
            context: None,
            namespaces: IdentNamespace::MEMBER,
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn builtins_are_pre_interned_at_fixed_ids() {
        let context = AstContext::default();
        assert_eq!(context.builtin_type(BuiltinType::Void), TypeId::VOID);
        assert_eq!(context.builtin_type(BuiltinType::Int), TypeId::INT);
        assert_eq!(context.builtin_type(BuiltinType::Float128), TypeId::FLOAT128);
        assert!(matches!(
            context.type_data(TypeId::ERROR),
            TypeData::Error
        ));
    }

    #[test]
    fn structural_types_are_canonical() {
        let mut context = AstContext::default();
        let a = context.array_type(TypeId::INT, 4);
        let b = context.array_type(TypeId::INT, 4);
        let c = context.array_type(TypeId::INT, 5);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let p1 = context.pointer_type(TypeId::INT);
        let p2 = context.pointer_type(TypeId::INT);
        assert_eq!(p1, p2);

        let f1 = context.function_type(vec![TypeId::INT], TypeId::VOID, false);
        let f2 = context.function_type(vec![TypeId::INT], TypeId::VOID, false);
        let f3 = context.function_type(vec![TypeId::INT], TypeId::VOID, true);
        assert_eq!(f1, f2);
        assert_ne!(f1, f3);
    }

    #[test]
    fn underlying_type_peels_sugar() {
        let mut context = AstContext::default();
        let paren = context.paren_type(TypeId::INT);
        let nested = context.paren_type(paren);
        assert_eq!(context.underlying_type(nested), TypeId::INT);

        let auto = context.auto_type(Some(TypeId::DOUBLE));
        assert_eq!(context.underlying_type(auto), TypeId::DOUBLE);

        let undeduced = context.auto_type(None);
        assert_eq!(context.underlying_type(undeduced), undeduced);
    }

    #[test]
    fn size_type_matches_pointer_width() {
        let mut context = AstContext::default();
        // Default target: 8-byte pointers -> ulong.
        assert_eq!(context.size_type(), TypeId::ULONG);
        assert_eq!(context.ptrdiff_type(), TypeId::LONG);

        let mut narrow = AstContext::new(TargetInfo {
            pointer_size: 4,
            pointer_align: 4,
        });
        assert_eq!(narrow.size_type(), TypeId::UINT);
        assert_eq!(narrow.ptrdiff_type(), TypeId::INT);
    }

    #[test]
    fn type_info_is_pure_in_underlying_type() {
        let mut context = AstContext::default();
        let paren = context.paren_type(TypeId::INT);
        assert_eq!(context.type_info(paren), context.type_info(TypeId::INT));

        let array = context.array_type(TypeId::INT, 3);
        let info = context.type_info(array);
        assert_eq!(info.size, 12);
        assert_eq!(info.align, 4);
    }

    #[test]
    fn class_layout_packs_greedily_without_trailing_padding() {
        let mut context = AstContext::default();
        let class = context.alloc_decl(Decl {
            kind: DeclKind::Class,
            name: Name::EMPTY,
            range: SourceRange::DUMMY,
            context: None,
            namespaces: IdentNamespace::TAG,
            visibility: Visibility::Public,
        });
        context.add_to_context(DeclId::TRANSLATION_UNIT, class);

        // char (1 byte), then long (8 bytes): padding placeholder expected.
        let char_field = context.alloc_decl(field(TypeId::CHAR));
        context.add_to_context(class, char_field);
        let long_field = context.alloc_decl(field(TypeId::LONG));
        context.add_to_context(class, long_field);
        // Trailing char: final size must not be rounded up to 8.
        let tail_field = context.alloc_decl(field(TypeId::CHAR));
        context.add_to_context(class, tail_field);

        let layout = context.class_layout(class).clone();
        assert_eq!(layout.align, 8);
        // Entries: char@0, padding@1, long@8, char@16.
        assert_eq!(layout.field_offsets.len(), 4);
        assert_eq!(layout.field_offsets[0], (Some(char_field), 0));
        assert_eq!(layout.field_offsets[1], (None, 1));
        assert_eq!(layout.field_offsets[2], (Some(long_field), 8));
        assert_eq!(layout.field_offsets[3], (Some(tail_field), 16));
        assert_eq!(layout.size, 17);

        assert_eq!(context.field_info(class, long_field), Some((2, 8)));
        assert_eq!(context.field_info(class, tail_field), Some((3, 16)));
    }

    #[test]
    fn context_children_and_lookup_agree() {
        let mut context = AstContext::default();
        let var = context.alloc_decl(Decl {
            kind: DeclKind::Var {
                ty: TypeId::INT,
                storage: StorageClass::None,
                init: None,
            },
            name: Name::EMPTY,
            range: SourceRange::DUMMY,
            context: None,
            namespaces: IdentNamespace::ORDINARY,
            visibility: Visibility::Public,
        });
        context.add_to_context(DeclId::TRANSLATION_UNIT, var);
        assert_eq!(context.context_children(DeclId::TRANSLATION_UNIT), &[var]);
        assert_eq!(context.decl(var).context, Some(DeclId::TRANSLATION_UNIT));
        // Unnamed: not in the lookup map.
        assert!(context
            .lookup_in_context(DeclId::TRANSLATION_UNIT, Name::EMPTY, IdentNamespace::ALL)
            .is_empty());
    }
}
