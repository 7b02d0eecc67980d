//! End-to-end front-end scenarios: source text in, typed AST and
//! diagnostics out.

use std::rc::Rc;

use nyx_compiler::{compile_text, AstConsumer, CompileResult};
use nyx_diagnostic::{CollectingConsumer, DiagId, DiagnosticsEngine};
use nyx_ir::{
    AstContext, DeclId, DeclKind, ExprKind, IdentNamespace, StmtKind, TypeData, TypeId,
};
use nyx_sema::eval;

#[derive(Default)]
struct RecordingConsumer {
    top_level_calls: usize,
    translation_unit_called: bool,
}

impl AstConsumer for RecordingConsumer {
    fn handle_top_level_decl(&mut self, _decls: &[DeclId], _context: &AstContext) -> bool {
        self.top_level_calls += 1;
        true
    }

    fn handle_translation_unit(&mut self, _context: &AstContext) {
        self.translation_unit_called = true;
    }
}

fn compile(source: &str) -> (CompileResult, CollectingConsumer, RecordingConsumer) {
    let diags = CollectingConsumer::new();
    let engine = Rc::new(DiagnosticsEngine::new(Box::new(diags.clone())));
    let mut consumer = RecordingConsumer::default();
    let result = compile_text("test.nyx", source, &mut consumer, engine);
    (result, diags, consumer)
}

fn find_decl(result: &CompileResult, name: &str) -> Option<DeclId> {
    let name = result.interner.intern(name);
    let tu = result.context.translation_unit();
    result
        .context
        .lookup_in_context(tu, name, IdentNamespace::ALL)
        .first()
        .copied()
}

#[test]
fn trivial_function() {
    let (result, diags, _) = compile("def Main: () -> int { return 0; }");
    assert!(diags.is_empty(), "{:?}", diags.messages());

    let main = find_decl(&result, "Main").expect("Main is declared");
    let DeclKind::Function { ty, body, .. } = &result.context.decl(main).kind else {
        panic!("Main should resolve to a function declaration");
    };
    let TypeData::Function { params, ret, varargs } =
        result.context.type_data(result.context.underlying_type(*ty))
    else {
        panic!("Main should have a function type");
    };
    assert!(params.is_empty());
    assert!(!varargs);
    assert_eq!(*ret, TypeId::INT);

    let body = body.expect("Main has a body");
    let StmtKind::Compound { stmts } = &result.context.stmt(body).kind else {
        panic!("the body is a compound statement");
    };
    assert_eq!(stmts.len(), 1);
    let StmtKind::Return { value: Some(value) } = &result.context.stmt(stmts[0]).kind else {
        panic!("the single statement is `return 0;`");
    };
    let value = result.context.expr(*value);
    assert!(matches!(value.kind, ExprKind::IntegerLiteral { value: 0 }));
    assert_eq!(value.ty, TypeId::INT);
}

#[test]
fn forward_reference_resolves_in_phase_two() {
    let (result, diags, _) = compile(
        "def a: () -> int { return b(); } \
         def b: () -> int { return 1; }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());

    let a = find_decl(&result, "a").unwrap();
    let b = find_decl(&result, "b").unwrap();
    assert!(matches!(result.context.decl(a).kind, DeclKind::Function { .. }));
    assert!(matches!(result.context.decl(b).kind, DeclKind::Function { .. }));

    // `a`'s return expression calls `b`.
    let DeclKind::Function { body: Some(body), .. } = &result.context.decl(a).kind else {
        panic!()
    };
    let StmtKind::Compound { stmts } = &result.context.stmt(*body).kind else {
        panic!()
    };
    let StmtKind::Return { value: Some(call) } = &result.context.stmt(stmts[0]).kind else {
        panic!()
    };
    let ExprKind::Call { callee, .. } = &result.context.expr(*call).kind else {
        panic!("the returned value is a call");
    };
    let ExprKind::DeclRef { decl } = result.context.expr(*callee).kind else {
        panic!("the callee is a direct reference");
    };
    assert_eq!(decl, b);
}

#[test]
fn circular_aliases_report_once_and_are_rejected() {
    let (result, diags, _) = compile("alias X = Y; alias Y = X;");
    let circular: Vec<_> = diags
        .diagnostics()
        .into_iter()
        .filter(|d| d.id == DiagId::ErrCircularDependency)
        .collect();
    assert_eq!(circular.len(), 1, "{:?}", diags.messages());

    for name in ["X", "Y"] {
        let decl = find_decl(&result, name).unwrap();
        let DeclKind::Alias { target } = result.context.decl(decl).kind else {
            panic!("{name} should still be an alias declaration");
        };
        let nyx_ir::AliasTarget::Type(ty) = target;
        assert!(ty.is_error(), "{name} must carry the error target");
    }
}

#[test]
fn typeof_cycle_is_circular_too() {
    let (_, diags, _) = compile("def a: typeof(b); def b: typeof(a);");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrCircularDependency),
        "{:?}",
        diags.messages()
    );
}

#[test]
fn unsafe_discipline_on_dereference() {
    let (_, diags, _) = compile("def f: (p: int*) -> int { return *p; }");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrUnsafeOperation),
        "{:?}",
        diags.messages()
    );

    let (result, diags, _) = compile("unsafe def f: (p: int*) -> int { return *p; }");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let f = find_decl(&result, "f").unwrap();
    assert!(matches!(result.context.decl(f).kind, DeclKind::Function { .. }));
}

#[test]
fn size_of_action_folds_into_initializer() {
    let (mut result, diags, _) = compile("def n: int = $SizeOf(int);");
    assert!(diags.is_empty(), "{:?}", diags.messages());

    let n = find_decl(&result, "n").unwrap();
    let DeclKind::Var { ty, init: Some(init), .. } = result.context.decl(n).kind else {
        panic!("n is an initialized variable");
    };
    assert_eq!(ty, TypeId::INT);
    // sizeof(int) == 4, surviving the implicit conversion to int.
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(4));
}

#[test]
fn dump_if_emits_only_the_taken_branch() {
    let (mut result, diags, _) =
        compile("$DumpIf(0, def a: int = 1/0;, def a: int = 2;)");
    assert!(diags.is_empty(), "{:?}", diags.messages());

    let a = find_decl(&result, "a").expect("the else branch declares a");
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(a).kind else {
        panic!("a is an initialized variable");
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(2));

    // Only one `a` was ever installed.
    let name = result.interner.intern("a");
    let tu = result.context.translation_unit();
    assert_eq!(
        result
            .context
            .lookup_in_context(tu, name, IdentNamespace::ALL)
            .len(),
        1
    );
}

#[test]
fn dump_if_true_takes_then_branch() {
    let (mut result, diags, _) = compile("$DumpIf(1, def a: int = 10;, def a: int = 20;)");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let a = find_decl(&result, "a").unwrap();
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(a).kind else {
        panic!()
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(10));
}

#[test]
fn empty_translation_unit_still_reaches_the_consumer() {
    let (result, diags, consumer) = compile("");
    assert!(diags.is_empty());
    assert!(result.top_level.is_empty());
    assert!(consumer.translation_unit_called);
}

#[test]
fn numeric_overflow_is_clamped_and_reported() {
    let (result, diags, _) = compile("def big: ulonglong = 99999999999999999999999999;");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrLiteralTooLarge),
        "{:?}",
        diags.messages()
    );
    // No crash, and the declaration still exists.
    assert!(find_decl(&result, "big").is_some());
}

#[test]
fn is_defined_reflects_scope_contents() {
    let (mut result, diags, _) = compile(
        "def marker: int = 1; \
         def yes: bool = $IsDefined(marker); \
         def no: bool = $IsDefined(missing);",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let yes = find_decl(&result, "yes").unwrap();
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(yes).kind else {
        panic!()
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(1));
    let no = find_decl(&result, "no").unwrap();
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(no).kind else {
        panic!()
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(0));
}

#[test]
fn class_members_and_layout() {
    let (mut result, diags, _) = compile(
        "class Point { def x: int; def y: int; } \
         def size: ulong = $SizeOf(Point);",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());

    let point = find_decl(&result, "Point").unwrap();
    assert!(matches!(result.context.decl(point).kind, DeclKind::Class));
    let fields: Vec<DeclId> = result
        .context
        .context_children(point)
        .iter()
        .copied()
        .filter(|&d| matches!(result.context.decl(d).kind, DeclKind::Field { .. }))
        .collect();
    assert_eq!(fields.len(), 2);
    for field in &fields {
        assert_eq!(result.context.decl(*field).context, Some(point));
    }

    let layout = result.context.class_layout(point).clone();
    assert_eq!(layout.size, 8);
    assert_eq!(layout.align, 4);
    assert_eq!(layout.field_offsets.len(), 2);
    assert_eq!(result.context.field_info(point, fields[1]), Some((1, 4)));

    let size = find_decl(&result, "size").unwrap();
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(size).kind else {
        panic!()
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(8));
}

#[test]
fn enum_constants_fold_and_auto_increment() {
    let (mut result, diags, _) = compile(
        "enum Color { Red, Green = 5, Blue } \
         def pick: int = Blue as int;",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let color = find_decl(&result, "Color").unwrap();
    let constants: Vec<i64> = result
        .context
        .context_children(color)
        .iter()
        .filter_map(|&d| match result.context.decl(d).kind {
            DeclKind::EnumConstant { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(constants, vec![0, 5, 6]);

    let pick = find_decl(&result, "pick").unwrap();
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(pick).kind else {
        panic!()
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(6));
}

#[test]
fn canonical_types_are_shared_across_occurrences() {
    let (result, diags, _) = compile("def a: int*; def b: int*;");
    // Pointer formation outside unsafe reports, but both declarations
    // still get the same canonical pointer type.
    let _ = diags;
    let a = find_decl(&result, "a").unwrap();
    let b = find_decl(&result, "b").unwrap();
    let ty_a = result.context.decl(a).value_type().unwrap();
    let ty_b = result.context.decl(b).value_type().unwrap();
    assert_eq!(ty_a, ty_b);
}

#[test]
fn redefinition_with_conflicting_type_reports() {
    let (_, diags, _) = compile("def x: int = 1; def x: double = 2.0;");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrRedefinition),
        "{:?}",
        diags.messages()
    );
}

#[test]
fn undeclared_identifier_in_body_reports() {
    let (_, diags, _) = compile("def f: () -> int { return ghost; }");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrUndeclaredIdentifier),
        "{:?}",
        diags.messages()
    );
}

#[test]
fn error_recovery_continues_to_later_declarations() {
    let (result, diags, _) = compile("def : int = 1; def ok: int = 2;");
    assert!(!diags.is_empty());
    assert!(find_decl(&result, "ok").is_some());
}

#[test]
fn string_literal_gets_char_array_type() {
    let (result, diags, _) = compile("def s: char[2] = \"hi\";");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let s = find_decl(&result, "s").unwrap();
    let ty = result.context.decl(s).value_type().unwrap();
    assert!(matches!(
        result.context.type_data(result.context.underlying_type(ty)),
        TypeData::Array { elem, size: 2 } if *elem == TypeId::CHAR
    ));
}

#[test]
fn unknown_size_array_takes_extent_from_initializer() {
    let (result, diags, _) = compile("def xs: int[] = { 1, 2, 3 };");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let xs = find_decl(&result, "xs").unwrap();
    let ty = result.context.decl(xs).value_type().unwrap();
    assert!(matches!(
        result.context.type_data(result.context.underlying_type(ty)),
        TypeData::Array { elem, size: 3 } if *elem == TypeId::INT
    ));
}

#[test]
fn extern_with_initializer_reports() {
    let (_, diags, _) = compile("def extern e: int = 1;");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrInitializerOnExtern),
        "{:?}",
        diags.messages()
    );
}

#[test]
fn consumer_sees_each_top_level_group() {
    let (_, _, consumer) = compile("def a: int = 1; def b: int = 2;");
    assert!(consumer.top_level_calls >= 2);
    assert!(consumer.translation_unit_called);
}

#[test]
fn type_of_action_in_type_position() {
    let (result, diags, _) = compile("def a: int = 3; def b: $TypeOf(a) = 4;");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let b = find_decl(&result, "b").unwrap();
    assert_eq!(result.context.decl(b).value_type(), Some(TypeId::INT));
}

#[test]
fn align_of_action() {
    let (mut result, diags, _) = compile("def a: ulong = $AlignOf(double);");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let a = find_decl(&result, "a").unwrap();
    let DeclKind::Var { init: Some(init), .. } = result.context.decl(a).kind else {
        panic!()
    };
    assert_eq!(eval::evaluate_as_int(&mut result.context, init), Some(8));
}

#[test]
fn auto_deduction_from_initializer() {
    let (result, diags, _) = compile("def x = 3.5;");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let x = find_decl(&result, "x").unwrap();
    assert_eq!(result.context.decl(x).value_type(), Some(TypeId::DOUBLE));
}

#[test]
fn goto_to_unknown_label_reports() {
    let (_, diags, _) = compile("def f: () -> int { goto nowhere; return 0; }");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrUndeclaredLabel),
        "{:?}",
        diags.messages()
    );
}

#[test]
fn forward_goto_resolves_against_a_later_label() {
    let (_, diags, _) = compile("def f: () -> int { goto done; @done: return 0; }");
    assert!(diags.is_empty(), "{:?}", diags.messages());
}

#[test]
fn discarded_expression_result_warns_without_erroring() {
    let (result, diags, _) = compile("def f: (n: int) -> int { n + 1; return n; }");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::WarnUnusedExpressionResult),
        "{:?}",
        diags.messages()
    );
    assert!(diags.diagnostics().iter().all(|d| !d.is_error()));
    assert!(find_decl(&result, "f").is_some());
}

#[test]
fn every_context_owns_its_children() {
    let (result, diags, _) = compile(
        "class Pair { def a: int; def b: int; } \
         enum Flag { Off, On } \
         def f: (x: int) -> int { def local: int = x; return local; }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());

    for (id, decl) in result.context.decls() {
        if !decl.is_decl_context() {
            continue;
        }
        for &child in result.context.context_children(id) {
            assert_eq!(
                result.context.decl(child).context,
                Some(id),
                "child {child:?} of {id:?} has the wrong owner"
            );
        }
    }
}

#[test]
fn every_expression_type_is_canonical() {
    let (result, diags, _) = compile(
        "def f: (n: int) -> double { return n as double + 1.5; } \
         def g: () -> bool { return 1 < 2 && true; }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());

    let type_count = result.context.type_count();
    for (_, expr) in result.context.exprs() {
        assert!(
            expr.ty.index() < type_count,
            "expression type {:?} is not in the canonical pool",
            expr.ty
        );
    }
}

#[test]
fn lookup_results_respect_owner_and_namespaces() {
    let (result, diags, _) = compile("class Box { def value: int; }");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let class = find_decl(&result, "Box").unwrap();
    let value = result.interner.intern("value");
    let found = result
        .context
        .lookup_in_context(class, value, IdentNamespace::MEMBER);
    assert_eq!(found.len(), 1);
    let member = result.context.decl(found[0]);
    assert_eq!(member.context, Some(class));
    assert_eq!(member.name, value);
    assert!(member.namespaces.intersects(IdentNamespace::MEMBER));
}

#[test]
fn module_members_resolve_through_qualified_names() {
    let (result, diags, _) = compile(
        "module util { def helper: () -> int { return 5; } } \
         def use_it: () -> int { return util.helper(); }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let use_it = find_decl(&result, "use_it").unwrap();
    assert!(matches!(
        result.context.decl(use_it).kind,
        DeclKind::Function { .. }
    ));
}

#[test]
fn unknown_import_reports() {
    let (_, diags, _) = compile("import nowhere.to.be.found;");
    assert!(
        diags
            .diagnostics()
            .iter()
            .any(|d| d.id == DiagId::ErrUnknownModule),
        "{:?}",
        diags.messages()
    );
}

#[test]
fn try_catch_and_throw_parse() {
    let (result, diags, _) = compile(
        "def risky: () -> int { \
            try { throw 1; } catch (e: int) { return 2; } \
            return 3; \
         }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let risky = find_decl(&result, "risky").unwrap();
    let DeclKind::Function { body: Some(body), .. } = result.context.decl(risky).kind else {
        panic!()
    };
    let StmtKind::Compound { ref stmts } = result.context.stmt(body).kind else {
        panic!()
    };
    let StmtKind::Try { ref handlers, .. } = result.context.stmt(stmts[0]).kind else {
        panic!("the first statement is the try");
    };
    assert_eq!(handlers.len(), 1);
    assert!(matches!(
        result.context.stmt(handlers[0]).kind,
        StmtKind::Catch { param: Some(_), .. }
    ));
}

#[test]
fn dump_action_sequence_emits_every_declaration() {
    let (mut result, diags, _) = compile("$Dump { def a: int = 1; def b: int = 2; }");
    assert!(diags.is_empty(), "{:?}", diags.messages());
    for (name, expected) in [("a", 1), ("b", 2)] {
        let decl = find_decl(&result, name).unwrap_or_else(|| panic!("{name} missing"));
        let DeclKind::Var { init: Some(init), .. } = result.context.decl(decl).kind else {
            panic!()
        };
        assert_eq!(
            eval::evaluate_as_int(&mut result.context, init),
            Some(expected)
        );
    }
}

#[test]
fn function_redeclaration_then_definition() {
    let (result, diags, _) = compile(
        "def f: () -> int; \
         def f: () -> int { return 1; }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());
    let f = find_decl(&result, "f").unwrap();
    let DeclKind::Function { body, .. } = &result.context.decl(f).kind else {
        panic!()
    };
    assert!(body.is_some(), "the definition replaced the declaration");
    // Exactly one `f` remains visible at top level.
    let name = result.interner.intern("f");
    let tu = result.context.translation_unit();
    assert_eq!(
        result
            .context
            .lookup_in_context(tu, name, IdentNamespace::ALL)
            .len(),
        1
    );
}

#[test]
fn statements_exercise_control_flow() {
    let (result, diags, _) = compile(
        "def f: (n: int) -> int { \
            def total: int = 0; \
            for (def i: int = 0; i < n; i++) { \
                if (i == 2) { continue; } \
                total += i; \
            } \
            while (total > 100) { break; } \
            do { total = total; } while (false); \
            switch (total) { case 0: return 0; default: ; } \
            @again: total--; \
            if (total > 0) { goto again; } \
            return total; \
         }",
    );
    assert!(diags.is_empty(), "{:?}", diags.messages());
    assert!(find_decl(&result, "f").is_some());
}
