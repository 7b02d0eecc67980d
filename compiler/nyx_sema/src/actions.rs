//! Compiler actions: the `$Name(args)` meta-programming hooks.
//!
//! An action declares, one call at a time, which argument category it
//! expects next; the parser speculatively matches that category from the
//! token stream and feeds the produced node back. When the invocation ends
//! the action yields zero or more nodes through a callback, which the
//! parser splices into the surrounding construct.
//!
//! The registry is a namespaced map owned by Sema; actions are an open set,
//! the builtins here are just the pre-registered ones.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use nyx_diagnostic::DiagId;
use nyx_ir::{
    DeclId, DeclKind, Expr, ExprId, ExprKind, Name, SourceLocation, SourceRange, Stmt, StmtId,
    StmtKind, TypeData, TypeId, TypeTraitKind, ValueCategory,
};

use crate::eval;
use crate::lookup::{LookupPurpose, LookupResult};
use crate::sema::Sema;

/// Bitset describing one expected argument slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ArgKind(u16);

impl ArgKind {
    /// No further arguments.
    pub const NONE: ArgKind = ArgKind(0);
    pub const TYPE: ArgKind = ArgKind(1 << 0);
    pub const DECLARATION: ArgKind = ArgKind(1 << 1);
    pub const STATEMENT: ArgKind = ArgKind(1 << 2);
    pub const IDENTIFIER: ArgKind = ArgKind(1 << 3);
    pub const COMPILER_ACTION: ArgKind = ArgKind(1 << 4);
    /// The slot may be left unfilled.
    pub const OPTIONAL: ArgKind = ArgKind(1 << 5);
    /// The slot may be supplied as a bare single argument.
    pub const MAY_BE_SINGLE: ArgKind = ArgKind(1 << 6);
    /// The slot may be supplied inside a `{ ... }` sequence.
    pub const MAY_BE_SEQ: ArgKind = ArgKind(1 << 7);
    /// The argument may refer to not-yet-resolved declarations.
    pub const MAY_BE_UNRESOLVED: ArgKind = ArgKind(1 << 8);

    const CATEGORY_MASK: ArgKind = ArgKind(0x1F);

    #[inline]
    #[must_use]
    pub const fn union(self, other: ArgKind) -> ArgKind {
        ArgKind(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: ArgKind) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 & Self::CATEGORY_MASK.0 == 0
    }

    #[inline]
    pub const fn is_optional(self) -> bool {
        self.0 & Self::OPTIONAL.0 != 0
    }

    /// Just the category bits.
    #[inline]
    pub const fn categories(self) -> ArgKind {
        ArgKind(self.0 & Self::CATEGORY_MASK.0)
    }
}

impl std::fmt::Debug for ArgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArgKind({:#06x})", self.0)
    }
}

/// An AST node passed into or produced by an action.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionArg {
    Type(TypeId),
    Decl(DeclId),
    Stmt(StmtId),
    Expr(ExprId),
    Ident(Name),
}

/// One running invocation of an action.
pub trait ActionContext {
    /// The next expected argument slot; [`ArgKind::NONE`] ends the list.
    fn next_expected(&mut self) -> ArgKind;

    /// Accept the next argument.
    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg);

    /// Finish the invocation, yielding produced nodes.
    fn finish(self: Box<Self>, sema: &mut Sema, output: &mut dyn FnMut(ActionArg));
}

/// A named compiler action.
pub trait CompilerAction {
    fn name(&self) -> &'static str;
    fn start(&self) -> Box<dyn ActionContext>;
}

/// A nesting level of the action registry.
#[derive(Default)]
struct ActionNamespace {
    actions: FxHashMap<String, Rc<dyn CompilerAction>>,
    children: FxHashMap<String, ActionNamespace>,
}

/// Namespaced registry of compiler actions.
#[derive(Default)]
pub struct ActionRegistry {
    root: ActionNamespace,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default registry with all builtin actions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(&[], Rc::new(ActionDump));
        registry.register(&[], Rc::new(ActionDumpIf));
        registry.register(&[], Rc::new(ActionIsDefined));
        registry.register(&[], Rc::new(ActionTypeOf));
        registry.register(&[], Rc::new(ActionSizeOf));
        registry.register(&[], Rc::new(ActionAlignOf));
        registry.register(&[], Rc::new(ActionCreateAt));
        registry.register(&[], Rc::new(ActionDestroyAt));
        registry
    }

    /// Register an action under a namespace path (empty for the root).
    pub fn register(&mut self, namespace: &[&str], action: Rc<dyn CompilerAction>) {
        let mut node = &mut self.root;
        for part in namespace {
            node = node.children.entry((*part).to_owned()).or_default();
        }
        node.actions.insert(action.name().to_owned(), action);
    }

    /// Look up `ns.ns.Name`; all but the last path element are namespaces.
    pub fn lookup(&self, path: &[&str]) -> Option<Rc<dyn CompilerAction>> {
        let (name, namespaces) = path.split_last()?;
        let mut node = &self.root;
        for part in namespaces {
            node = node.children.get(*part)?;
        }
        node.actions.get(*name).cloned()
    }
}

fn any_node() -> ArgKind {
    ArgKind::TYPE
        .union(ArgKind::DECLARATION)
        .union(ArgKind::STATEMENT)
        .union(ArgKind::MAY_BE_UNRESOLVED)
}

// === Dump ===

/// `$Dump(args...)` passes its arguments through unchanged.
struct ActionDump;

struct DumpContext {
    args: Vec<ActionArg>,
}

impl CompilerAction for ActionDump {
    fn name(&self) -> &'static str {
        "Dump"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(DumpContext { args: Vec::new() })
    }
}

impl ActionContext for DumpContext {
    fn next_expected(&mut self) -> ArgKind {
        any_node().union(ArgKind::OPTIONAL)
    }

    fn add_argument(&mut self, _sema: &mut Sema, _location: SourceLocation, arg: ActionArg) {
        self.args.push(arg);
    }

    fn finish(self: Box<Self>, _sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        for arg in self.args {
            output(arg);
        }
    }
}

// === DumpIf ===

/// `$DumpIf(cond, then, [else])` emits `then` when `cond` folds non-zero,
/// otherwise `else` when present. The untaken branch is discarded.
struct ActionDumpIf;

struct DumpIfContext {
    index: usize,
    skip_then: Option<bool>,
    result: Option<ActionArg>,
}

impl CompilerAction for ActionDumpIf {
    fn name(&self) -> &'static str {
        "DumpIf"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(DumpIfContext {
            index: 0,
            skip_then: None,
            result: None,
        })
    }
}

impl ActionContext for DumpIfContext {
    fn next_expected(&mut self) -> ArgKind {
        match self.index {
            0 => ArgKind::STATEMENT,
            1 => any_node(),
            2 => any_node().union(ArgKind::OPTIONAL),
            _ => ArgKind::NONE,
        }
    }

    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg) {
        match self.index {
            0 => {
                let value = match arg {
                    ActionArg::Expr(expr) => eval::evaluate_as_int(sema.context_mut(), expr),
                    _ => None,
                };
                match value {
                    Some(v) => self.skip_then = Some(v == 0),
                    None => {
                        sema.diag().report(DiagId::ErrNonConstantExpression, location);
                        self.skip_then = Some(true);
                    }
                }
            }
            1 => {
                if self.skip_then == Some(false) {
                    self.result = Some(arg);
                }
            }
            2 => {
                if self.skip_then == Some(true) {
                    self.result = Some(arg);
                }
            }
            _ => {}
        }
        self.index += 1;
    }

    fn finish(self: Box<Self>, _sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        if let Some(result) = self.result {
            output(result);
        }
    }
}

// === IsDefined ===

/// `$IsDefined(name)` yields a bool literal: does any declaration with
/// that name exist in the current scope chain?
struct ActionIsDefined;

struct IsDefinedContext {
    found: Option<bool>,
}

impl CompilerAction for ActionIsDefined {
    fn name(&self) -> &'static str {
        "IsDefined"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(IsDefinedContext { found: None })
    }
}

impl ActionContext for IsDefinedContext {
    fn next_expected(&mut self) -> ArgKind {
        if self.found.is_none() {
            ArgKind::IDENTIFIER
        } else {
            ArgKind::NONE
        }
    }

    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg) {
        match arg {
            ActionArg::Ident(name) => {
                let mut result = LookupResult::new(name, LookupPurpose::Any);
                self.found = Some(sema.lookup_name(&mut result) && !result.is_empty());
            }
            _ => {
                sema.diag().report(DiagId::ErrActionArgumentMismatch, location);
                self.found = Some(false);
            }
        }
    }

    fn finish(self: Box<Self>, sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        if let Some(found) = self.found {
            let literal = sema.synthesize_bool_literal(found);
            output(ActionArg::Expr(literal));
        }
    }
}

// === TypeOf ===

/// `$TypeOf(expr)` yields the expression's static type.
struct ActionTypeOf;

struct TypeOfContext {
    ty: Option<TypeId>,
}

impl CompilerAction for ActionTypeOf {
    fn name(&self) -> &'static str {
        "TypeOf"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(TypeOfContext { ty: None })
    }
}

impl ActionContext for TypeOfContext {
    fn next_expected(&mut self) -> ArgKind {
        if self.ty.is_none() {
            ArgKind::STATEMENT
        } else {
            ArgKind::NONE
        }
    }

    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg) {
        match arg {
            ActionArg::Expr(expr) => self.ty = Some(sema.context().expr(expr).ty),
            _ => {
                sema.diag().report(DiagId::ErrActionArgumentMismatch, location);
                self.ty = Some(TypeId::ERROR);
            }
        }
    }

    fn finish(self: Box<Self>, _sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        if let Some(ty) = self.ty {
            output(ActionArg::Type(ty));
        }
    }
}

// === SizeOf / AlignOf ===

struct TypeTraitContext {
    trait_kind: TypeTraitKind,
    ty: Option<TypeId>,
}

impl ActionContext for TypeTraitContext {
    fn next_expected(&mut self) -> ArgKind {
        if self.ty.is_none() {
            ArgKind::TYPE
        } else {
            ArgKind::NONE
        }
    }

    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg) {
        match arg {
            ActionArg::Type(ty) => self.ty = Some(ty),
            _ => {
                sema.diag().report(DiagId::ErrActionArgumentMismatch, location);
                self.ty = Some(TypeId::ERROR);
            }
        }
    }

    fn finish(self: Box<Self>, sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        let Some(ty) = self.ty else { return };
        if ty.is_error() {
            return;
        }
        let info = sema.context_mut().type_info(ty);
        let value = match self.trait_kind {
            TypeTraitKind::SizeOf => info.size,
            TypeTraitKind::AlignOf => info.align,
        };
        let size_type = sema.context_mut().size_type();
        let literal = sema.synthesize_int_literal(value, size_type);
        output(ActionArg::Expr(literal));
    }
}

/// `$SizeOf(type)` yields the type's size as a size-type literal.
struct ActionSizeOf;

impl CompilerAction for ActionSizeOf {
    fn name(&self) -> &'static str {
        "SizeOf"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(TypeTraitContext {
            trait_kind: TypeTraitKind::SizeOf,
            ty: None,
        })
    }
}

/// `$AlignOf(type)` yields the type's alignment as a size-type literal.
struct ActionAlignOf;

impl CompilerAction for ActionAlignOf {
    fn name(&self) -> &'static str {
        "AlignOf"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(TypeTraitContext {
            trait_kind: TypeTraitKind::AlignOf,
            ty: None,
        })
    }
}

// === CreateAt / DestroyAt ===

/// Find the first child of `class` with the wanted member kind.
fn find_special_member(
    sema: &Sema,
    class: DeclId,
    want_constructor: bool,
) -> Option<DeclId> {
    sema.context()
        .context_children(class)
        .iter()
        .copied()
        .find(|&child| {
            let kind = &sema.context().decl(child).kind;
            if want_constructor {
                matches!(kind, DeclKind::Constructor { .. })
            } else {
                matches!(kind, DeclKind::Destructor { .. })
            }
        })
}

/// The class a pointer expression points at, if any.
fn pointee_class(sema: &Sema, ptr: ExprId) -> Option<DeclId> {
    let ty = sema.context().expr(ptr).ty;
    let pointee = sema.context().pointee_type(ty)?;
    match *sema.context().type_data(sema.context().underlying_type(pointee)) {
        TypeData::Class(class) => Some(class),
        _ => None,
    }
}

/// Build `ptr.member(args)` for a special member call.
fn member_call(
    sema: &mut Sema,
    ptr: ExprId,
    member: DeclId,
    args: Vec<ExprId>,
) -> ExprId {
    let member_ty = sema
        .context()
        .decl(member)
        .value_type()
        .unwrap_or(TypeId::ERROR);
    let ret = match sema.context().type_data(sema.context().underlying_type(member_ty)) {
        TypeData::Function { ret, .. } => *ret,
        _ => TypeId::VOID,
    };
    let name = sema.context().decl(member).name;
    let callee = sema.context_mut().alloc_expr(Expr {
        kind: ExprKind::Member {
            base: ptr,
            member,
            name,
        },
        ty: member_ty,
        category: ValueCategory::RValue,
        range: SourceRange::DUMMY,
    });
    sema.context_mut().alloc_expr(Expr {
        kind: ExprKind::MemberCall {
            callee,
            args: args.into_boxed_slice(),
        },
        ty: ret,
        category: ValueCategory::RValue,
        range: SourceRange::DUMMY,
    })
}

fn null_stmt(sema: &mut Sema) -> StmtId {
    sema.context_mut().alloc_stmt(Stmt {
        kind: StmtKind::Null,
        range: SourceRange::DUMMY,
    })
}

/// `$CreateAt(ptr, args...)` expands to a constructor call on the pointee.
struct ActionCreateAt;

struct CreateAtContext {
    ptr: Option<ExprId>,
    args: Vec<ExprId>,
}

impl CompilerAction for ActionCreateAt {
    fn name(&self) -> &'static str {
        "CreateAt"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(CreateAtContext {
            ptr: None,
            args: Vec::new(),
        })
    }
}

impl ActionContext for CreateAtContext {
    fn next_expected(&mut self) -> ArgKind {
        if self.ptr.is_none() {
            ArgKind::STATEMENT
        } else {
            ArgKind::STATEMENT.union(ArgKind::OPTIONAL)
        }
    }

    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg) {
        let ActionArg::Expr(expr) = arg else {
            sema.diag().report(DiagId::ErrActionArgumentMismatch, location);
            return;
        };
        if self.ptr.is_none() {
            if !sema.context().is_pointer_type(sema.context().expr(expr).ty) {
                sema.diag().report(DiagId::ErrActionExpectedPointer, location);
            }
            self.ptr = Some(expr);
        } else {
            self.args.push(expr);
        }
    }

    fn finish(self: Box<Self>, sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        let Some(ptr) = self.ptr else { return };
        let Some(class) = pointee_class(sema, ptr) else {
            // Non-class pointees need no construction.
            let stmt = null_stmt(sema);
            output(ActionArg::Stmt(stmt));
            return;
        };
        match find_special_member(sema, class, true) {
            Some(constructor) => {
                let call = member_call(sema, ptr, constructor, self.args);
                output(ActionArg::Expr(call));
            }
            None => {
                let stmt = null_stmt(sema);
                output(ActionArg::Stmt(stmt));
            }
        }
    }
}

/// `$DestroyAt(ptr)` expands to a destructor call on the pointee.
struct ActionDestroyAt;

struct DestroyAtContext {
    ptr: Option<ExprId>,
}

impl CompilerAction for ActionDestroyAt {
    fn name(&self) -> &'static str {
        "DestroyAt"
    }

    fn start(&self) -> Box<dyn ActionContext> {
        Box::new(DestroyAtContext { ptr: None })
    }
}

impl ActionContext for DestroyAtContext {
    fn next_expected(&mut self) -> ArgKind {
        if self.ptr.is_none() {
            ArgKind::STATEMENT
        } else {
            ArgKind::NONE
        }
    }

    fn add_argument(&mut self, sema: &mut Sema, location: SourceLocation, arg: ActionArg) {
        let ActionArg::Expr(expr) = arg else {
            sema.diag().report(DiagId::ErrActionArgumentMismatch, location);
            return;
        };
        if !sema.context().is_pointer_type(sema.context().expr(expr).ty) {
            sema.diag().report(DiagId::ErrActionExpectedPointer, location);
        }
        self.ptr = Some(expr);
    }

    fn finish(self: Box<Self>, sema: &mut Sema, output: &mut dyn FnMut(ActionArg)) {
        let Some(ptr) = self.ptr else { return };
        let Some(class) = pointee_class(sema, ptr) else {
            let stmt = null_stmt(sema);
            output(ActionArg::Stmt(stmt));
            return;
        };
        match find_special_member(sema, class, false) {
            Some(destructor) => {
                let call = member_call(sema, ptr, destructor, Vec::new());
                output(ActionArg::Expr(call));
            }
            None => {
                let stmt = null_stmt(sema);
                output(ActionArg::Stmt(stmt));
            }
        }
    }
}
