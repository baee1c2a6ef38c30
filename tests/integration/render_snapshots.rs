//! Snapshot tests for rendered output.
//!
//! Uses insta to capture whole rendered programs and detect regressions.
//! Run `cargo insta review` to review changes.

mod common;

use common::*;
use insta::assert_snapshot;
use lljs::ir::{Branch, Case, Decl, Expr, IntOp, MethodType, Stmt, Type, VarDecl};
use lljs::EmitOptions;

#[test]
fn program_with_predicate_prologue() {
    let origin = sp(Expr::RecordInit {
        ty: Type::Recursive("Point".into()),
        operands: vec![int(0, 0), int(0, 0)],
    });
    let test = sp(Expr::TypeTest {
        ty: Type::array(Type::Int(0)),
        operand: b(var("v", Type::Union(vec![Type::Null, Type::array(Type::Int(0))]))),
    });
    let p = program(vec![
        sp(Decl::TypeAlias { name: "Point".into(), def: point() }),
        sp(Decl::StaticVariable { name: "origin".into(), ty: Type::Recursive("Point".into()), init: Some(origin) }),
        method(
            "check",
            vec![("v", Type::Union(vec![Type::Null, Type::array(Type::Int(0))]))],
            vec![Type::Bool],
            vec![Stmt::Return(Some(test))],
        ),
    ]);

    assert_snapshot!(compile_text(&p).trim_end(), @r###"
    function is$aI(val) {
        if((val != null) && (val.constructor === Array)) {
            for(var i0 = 0; i0 < val.length; i0 = i0 + 1) {
                if(!is$I(val[i0])) {
                    return false;
                }
            }
            return true;
        }
        return false;
    }

    function is$I(val) {
        return (typeof val) === "number";
    }

    var origin = {x: 0, y: 0};

    function check(v) {
        return is$aI(v);
    }
    "###);
}

#[test]
fn debug_annotations_and_invariant_checks() {
    let next = sp(Expr::Integer {
        op: IntOp::Add,
        width: 8,
        lhs: b(var("n", Type::Int(8))),
        rhs: b(int(8, 1)),
    });
    let p = program(vec![method(
        "inc",
        vec![("n", Type::Int(8))],
        vec![Type::Int(8)],
        vec![
            Stmt::VarDecl(VarDecl { ty: Type::Int(8), name: "m".into(), init: Some(next) }),
            Stmt::Return(Some(var("m", Type::Int(8)))),
        ],
    )]);

    let out = lljs::compile_to_string(&p, &EmitOptions::debug()).unwrap();
    assert_snapshot!(out.trim_end(), @r###"
    function is$i8_(val) {
        return ((typeof val) === "number") && (val >= 0) && (val <= 0xFF);
    }

    function inc(/*int:8*/n) {
        Wy.assert(is$i8_(n));
        var /*int:8*/m = (n + 1) & 0xFF;
        return m;
    }
    "###);
}

#[test]
fn statements_and_references() {
    let int_ty = Type::Int(0);
    let cell_ty = Type::reference(Type::Int(0));
    let opt_ty = Type::Union(vec![Type::Null, Type::Int(0)]);
    let plus_one = |name: &str| {
        sp(Expr::Integer {
            op: IntOp::Add,
            width: 0,
            lhs: b(var(name, Type::Int(0))),
            rhs: b(int(0, 1)),
        })
    };

    let body = vec![
        Stmt::VarDecl(VarDecl {
            ty: cell_ty.clone(),
            name: "c".into(),
            init: Some(sp(Expr::New { ty: cell_ty.clone(), operand: b(var("x", int_ty.clone())) })),
        }),
        Stmt::Assign {
            lhs: sp(Expr::Dereference { ty: cell_ty.clone(), operand: b(var("c", cell_ty.clone())) }),
            rhs: plus_one("x"),
        },
        Stmt::Switch {
            cond: var("x", int_ty.clone()),
            cases: vec![
                Case { labels: vec![1, 2], body: block(vec![Stmt::Invoke(call("f", vec![]))]) },
                Case { labels: vec![], body: block(vec![]) },
            ],
        },
        Stmt::While {
            cond: sp(Expr::Integer {
                op: IntOp::Lt,
                width: 0,
                lhs: b(var("x", int_ty.clone())),
                rhs: b(int(0, 10)),
            }),
            body: block(vec![Stmt::Assign { lhs: var("x", int_ty.clone()), rhs: plus_one("x") }]),
        },
        Stmt::VarDecl(VarDecl {
            ty: opt_ty.clone(),
            name: "u".into(),
            init: Some(sp(Expr::UnionEnter { ty: opt_ty.clone(), tag: 1, operand: b(var("x", int_ty.clone())) })),
        }),
        Stmt::IfElse {
            branches: vec![Branch {
                cond: sp(Expr::Integer {
                    op: IntOp::Eq,
                    width: 0,
                    lhs: b(sp(Expr::UnionAccess { ty: opt_ty.clone(), operand: b(var("u", opt_ty.clone())) })),
                    rhs: b(int(0, 0)),
                }),
                body: block(vec![Stmt::Return(None)]),
            }],
            default: Some(block(vec![Stmt::VarDecl(VarDecl {
                ty: Type::Method(MethodType::default()),
                name: "g".into(),
                init: Some(sp(Expr::LambdaAccess { sig: MethodType::default(), name: "f".into() })),
            })])),
        },
        Stmt::DoWhile {
            body: block(vec![Stmt::Break]),
            cond: sp(Expr::Dereference { ty: cell_ty.clone(), operand: b(var("c", cell_ty)) }),
        },
    ];
    let p = program(vec![
        method("run", vec![("x", int_ty)], vec![], body),
        method("f", vec![], vec![], vec![]),
    ]);

    assert_snapshot!(compile_text(&p).trim_end(), @r###"
    function run(x) {
        var c = new Wy.Ref(x);
        c.$ref = x + 1;
        switch(x) {
            case 1:
                f();
                break;
            case 2:
                f();
                break;
            default:
                break;
        }
        while(x < 10) {
            x = x + 1;
        }
        var u = {tag: 1, data: x};
        if(u.tag == 0) {
            return;
        } else {
            var g = function() { return f(); };
        }
        do {
            break;
        } while(Wy.deref(c));
    }

    function f() {
    }
    "###);
}

#[test]
fn recursive_list_predicates() {
    let list = Type::record([
        (Type::Int(0), "head"),
        (Type::Union(vec![Type::Null, Type::Recursive("List".into())]), "tail"),
    ]);
    let test = sp(Expr::TypeTest {
        ty: Type::Recursive("List".into()),
        operand: b(var("v", Type::Null)),
    });
    let p = program(vec![
        sp(Decl::TypeAlias { name: "List".into(), def: list }),
        method("isList", vec![("v", Type::Null)], vec![Type::Bool], vec![Stmt::Return(Some(test))]),
    ]);

    assert_snapshot!(compile_text(&p).trim_end(), @r###"
    function is$Xr2I4headu2NR0_4tail(val) {
        if((val === null) || ((typeof val) !== "object")) {
            return false;
        }
        if(Object.keys(val).length !== 2) {
            return false;
        }
        if(((typeof val.head) === "undefined") || (!is$I(val.head))) {
            return false;
        }
        if(((typeof val.tail) === "undefined") || (!is$u2NXr2I4headu2NR0_4tail(val.tail))) {
            return false;
        }
        return true;
    }

    function is$I(val) {
        return (typeof val) === "number";
    }

    function is$u2NXr2I4headu2NR0_4tail(val) {
        if(val === null) {
            return true;
        }
        if(is$Xr2I4headu2NR0_4tail(val)) {
            return true;
        }
        return false;
    }

    function isList(v) {
        return is$Xr2I4headu2NR0_4tail(v);
    }
    "###);
}
