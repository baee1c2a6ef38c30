//! End-to-end lowering and synthesis scenarios.

mod common;

use common::*;
use lljs::ir::{Case, Decl, Expr, IntOp, Stmt, Type, TypeDefs};
use lljs::js;
use lljs::typetest::{synthesize, TypeTestSet};
use lljs::{CompileError, EmitOptions};

fn names(decls: &[js::Decl]) -> Vec<&str> {
    decls.iter().map(js::Decl::name).collect()
}

#[test]
fn sum_of_two_bytes_is_masked() {
    let sum = sp(Expr::Integer {
        op: IntOp::Add,
        width: 8,
        lhs: b(var("a", Type::Int(8))),
        rhs: b(var("b", Type::Int(8))),
    });
    let p = program(vec![method(
        "add",
        vec![("a", Type::Int(8)), ("b", Type::Int(8))],
        vec![Type::Int(8)],
        vec![Stmt::Return(Some(sum))],
    )]);

    let out = lljs::compile(&p, &EmitOptions::off()).unwrap();
    match &out.decls[..] {
        [js::Decl::Method(m)] => {
            assert_eq!(m.name, "add");
            assert_eq!(m.params.len(), 2);
        }
        other => panic!("unexpected output {other:?}"),
    }
    assert_eq!(compile_text(&p), "function add(a, b) {\n    return (a + b) & 0xFF;\n}\n");
}

#[test]
fn record_equality_uses_runtime_equals() {
    let eq = sp(Expr::Equal {
        lhs_ty: point(),
        rhs_ty: point(),
        lhs: b(var("p", point())),
        rhs: b(var("q", point())),
    });
    let p = program(vec![method(
        "same",
        vec![("p", point()), ("q", point())],
        vec![Type::Bool],
        vec![Stmt::Return(Some(eq))],
    )]);
    let out = compile_text(&p);
    assert!(out.contains("return Wy.equals(p, q);"));
    assert!(!out.contains("p == q"));
}

#[test]
fn array_of_int_predicates() {
    let required: TypeTestSet = [Type::array(Type::Int(0))].into_iter().collect();
    let decls = synthesize(&required, &TypeDefs::new(), &EmitOptions::off()).unwrap();
    assert_eq!(names(&decls), vec!["is$aI", "is$I"]);

    let text = js::render(&js::Program { decls }, &EmitOptions::off());
    let array_fn = text.split("\n\n").next().unwrap();
    assert!(array_fn.contains("for(var i0 = 0;"));
    assert!(array_fn.contains("is$I(val[i0])"));
}

#[test]
fn union_of_bool_and_null_has_no_dependencies() {
    let required: TypeTestSet = [Type::Union(vec![Type::Bool, Type::Null])].into_iter().collect();
    let decls = synthesize(&required, &TypeDefs::new(), &EmitOptions::off()).unwrap();
    assert_eq!(names(&decls), vec!["is$u2BN"]);
    let text = js::render(&js::Program { decls }, &EmitOptions::off());
    assert!(!text.contains("is$B("));
    assert!(!text.contains("is$N("));
}

#[test]
fn record_arity_mismatch_aborts() {
    let init = at(Expr::RecordInit { ty: point(), operands: vec![int(0, 1)] }, 30, 42);
    let p = program(vec![sp(Decl::StaticVariable { name: "p".into(), ty: point(), init: Some(init) })]);
    let err = lljs::compile_to_string(&p, &EmitOptions::off()).unwrap_err();
    match err {
        CompileError::StructuralMismatch { span, .. } => assert_eq!((span.start, span.end), (30, 42)),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn switch_default_keeps_declaration_order() {
    let switch = Stmt::Switch {
        cond: var("x", Type::Int(0)),
        cases: vec![
            Case { labels: vec![1], body: block(vec![Stmt::Invoke(call("one", vec![]))]) },
            Case { labels: vec![], body: block(vec![Stmt::Invoke(call("other", vec![]))]) },
            Case { labels: vec![2], body: block(vec![]) },
        ],
    };
    let p = program(vec![method("pick", vec![("x", Type::Int(0))], vec![], vec![switch])]);
    let out = compile_text(&p);
    let expected = "\
function pick(x) {
    switch(x) {
        case 1:
            one();
            break;
        default:
            other();
            break;
        case 2:
            break;
    }
}
";
    assert_eq!(out, expected);
}

#[test]
fn clone_of_primitive_is_identity() {
    let clone = sp(Expr::Clone { ty: Type::Int(8), operand: b(var("x", Type::Int(8))) });
    let p = program(vec![method("f", vec![("x", Type::Int(8))], vec![Type::Int(8)], vec![Stmt::Return(Some(clone))])]);
    assert!(compile_text(&p).contains("    return x;\n"));
}

#[test]
fn clone_of_reference_types_copies() {
    let cases = [
        Type::array(Type::Int(0)),
        point(),
        Type::Union(vec![Type::Null, Type::Int(0)]),
        Type::reference(Type::Int(0)),
    ];
    for ty in cases {
        let clone = sp(Expr::Clone { ty: ty.clone(), operand: b(var("x", ty.clone())) });
        let p = program(vec![sp(Decl::StaticVariable { name: "y".into(), ty, init: Some(clone) })]);
        assert_eq!(compile_text(&p), "var y = Wy.copy(x);\n");
    }
}

#[test]
fn predicates_form_the_prologue() {
    let test = sp(Expr::TypeTest { ty: Type::array(Type::Bool), operand: b(var("v", Type::Null)) });
    let p = program(vec![
        method("first", vec![], vec![], vec![]),
        method("check", vec![("v", Type::Null)], vec![Type::Bool], vec![Stmt::Return(Some(test))]),
    ]);
    let out = lljs::compile(&p, &EmitOptions::off()).unwrap();
    assert_eq!(names(&out.decls), vec!["is$aB", "is$B", "first", "check"]);
}

#[test]
fn repeated_type_tests_share_one_predicate() {
    let test = || sp(Expr::TypeTest { ty: point(), operand: b(var("v", Type::Null)) });
    let p = program(vec![
        method("a", vec![], vec![], vec![Stmt::Return(Some(test()))]),
        method("b", vec![], vec![], vec![Stmt::Return(Some(test()))]),
    ]);
    let out = compile_text(&p);
    assert_eq!(out.matches("function is$r2I1xI1y(val)").count(), 1);
    assert_eq!(out.matches("function is$I(val)").count(), 1);
}

#[test]
fn custom_runtime_name() {
    let options = EmitOptions { runtime: "Rt".into(), ..EmitOptions::off() };
    let stmt = Stmt::Assert(sp(Expr::BoolConst(true)));
    let p = program(vec![method("f", vec![], vec![], vec![stmt])]);
    let out = lljs::compile_to_string(&p, &options).unwrap();
    assert!(out.contains("Rt.assert(true);"));
}

#[test]
fn lowering_reports_required_tests() {
    let test = sp(Expr::TypeTest { ty: Type::reference(Type::Bool), operand: b(var("v", Type::Null)) });
    let p = program(vec![method("f", vec![], vec![], vec![Stmt::Return(Some(test))])]);
    let lowered = lljs::lower(&p, &EmitOptions::off()).unwrap();
    assert_eq!(lowered.required.len(), 1);
    assert!(lowered.required.contains(&Type::reference(Type::Bool)));
}
