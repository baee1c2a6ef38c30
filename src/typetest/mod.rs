//! Runtime type-membership predicates.
//!
//! The target language has no static types, so every IR type that must be
//! checked at runtime gets a generated `is$<mangle>` function. Predicates of
//! nested types are generated transitively by a work-list fixpoint keyed on
//! the mangle, which terminates on cyclic type graphs and emits each shape
//! exactly once.

pub mod mangle;

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::config::EmitOptions;
use crate::diagnostics::CompileError;
use crate::ir::types::width_mask;
use crate::ir::{ResolveType, Type};
use crate::js::ast::{Block, Decl, Expr, Method, OpKind, Param, Stmt, VariableDeclaration};
use crate::span::Span;
pub use mangle::{mangle, predicate_name, UnresolvedType};

/// Parameter name of every generated predicate.
const VAL: &str = "val";

/// Types that need a runtime predicate, in discovery order, each with the
/// span of the first node that asked for it. Grows only.
#[derive(Debug, Clone, Default)]
pub struct TypeTestSet {
    order: Vec<(Type, Span)>,
    seen: HashSet<Type>,
}

impl TypeTestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ty`; returns false if it is already present, keeping the first span.
    pub fn insert(&mut self, ty: Type, span: Span) -> bool {
        if self.seen.insert(ty.clone()) {
            self.order.push((ty, span));
            true
        } else {
            false
        }
    }

    pub fn contains(&self, ty: &Type) -> bool {
        self.seen.contains(ty)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Type, Span)> {
        self.order.iter().map(|(ty, span)| (ty, *span))
    }
}

impl FromIterator<Type> for TypeTestSet {
    fn from_iter<I: IntoIterator<Item = Type>>(iter: I) -> Self {
        let mut set = TypeTestSet::new();
        for ty in iter {
            set.insert(ty, Span::dummy());
        }
        set
    }
}

/// Integer widths whose predicate carries a range check. Wider integers are
/// only checked to be numbers.
fn is_bounded(width: u32) -> bool {
    width > 0 && width < 53
}

/// True for types that have no inline test and need a generated predicate.
pub fn needs_predicate(ty: &Type) -> bool {
    match ty {
        Type::Null | Type::Bool => false,
        Type::Int(width) => is_bounded(*width),
        _ => true,
    }
}

/// Membership test of `value` against `ty`. Types without a predicate are
/// tested inline; everything else calls its predicate, so `value` is
/// evaluated exactly once either way.
pub fn test_expr(ty: &Type, value: Expr, defs: &dyn ResolveType) -> Result<Expr, UnresolvedType> {
    Ok(match ty {
        Type::Null => Expr::binary(OpKind::StrictEq, value, Expr::null()),
        Type::Bool => typeof_is(value, "boolean"),
        Type::Int(width) if !is_bounded(*width) => typeof_is(value, "number"),
        _ => Expr::call(predicate_name(ty, defs)?, vec![value]),
    })
}

fn typeof_is(value: Expr, tag: &str) -> Expr {
    Expr::binary(OpKind::StrictEq, Expr::unary(OpKind::TypeOf, value), Expr::str(tag))
}

/// Generate predicates for every type in `required` and, transitively, for
/// every type they depend on. Output is in discovery order.
pub fn synthesize(
    required: &TypeTestSet,
    defs: &dyn ResolveType,
    options: &EmitOptions,
) -> Result<Vec<Decl>, CompileError> {
    let mut ctx = SynthContext::new(defs, &options.runtime);
    let mut generated: HashSet<String> = HashSet::new();
    let mut pending = Vec::with_capacity(required.len());
    for (ty, span) in required.iter() {
        let name = mangle(ty, defs).map_err(|e| e.at(span))?;
        pending.push((ty.clone(), name, span));
    }
    let mut decls = Vec::new();
    let mut batch = 0;

    while !pending.is_empty() {
        batch += 1;
        trace!(batch, size = pending.len(), "type-test batch");

        let mut discovered = Vec::new();
        let mut queued: HashSet<String> = HashSet::new();
        for (ty, name, span) in std::mem::take(&mut pending) {
            if !generated.insert(name.clone()) {
                continue;
            }
            let mut deps = Vec::new();
            let decl = ctx.predicate(&ty, &name, span, &mut deps)?;
            debug!(predicate = %decl.name(), ty = %ty, "synthesized type test");
            decls.push(decl);

            // Dependencies are reported against the node that required their parent.
            for dep in deps {
                let dep_name = mangle(&dep, defs).map_err(|e| e.at(span))?;
                if !generated.contains(&dep_name) && queued.insert(dep_name.clone()) {
                    discovered.push((dep, dep_name, span));
                }
            }
        }
        pending = discovered;
    }

    Ok(decls)
}

/// Per-call synthesis state. Owns the loop-variable counter so that
/// independent synthesis runs never share naming state.
struct SynthContext<'a> {
    defs: &'a dyn ResolveType,
    runtime: &'a str,
    next_loop_var: usize,
}

impl<'a> SynthContext<'a> {
    fn new(defs: &'a dyn ResolveType, runtime: &'a str) -> Self {
        Self { defs, runtime, next_loop_var: 0 }
    }

    fn fresh_loop_var(&mut self) -> String {
        let name = format!("i{}", self.next_loop_var);
        self.next_loop_var += 1;
        name
    }

    fn call(&self, ty: &Type, value: Expr, span: Span) -> Result<Expr, CompileError> {
        let name = predicate_name(ty, self.defs).map_err(|e| e.at(span))?;
        Ok(Expr::call(name, vec![value]))
    }

    /// Follow alias placeholders to a structural definition.
    fn structural<'t>(&self, ty: &'t Type, span: Span) -> Result<&'t Type, CompileError>
    where
        'a: 't,
    {
        let defs: &'a dyn ResolveType = self.defs;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = ty;
        while let Type::Recursive(name) = current {
            if !seen.insert(name.as_str()) {
                return Err(CompileError::unsupported(
                    format!("recursive type '{name}' is an alias of itself"),
                    span,
                ));
            }
            current = defs
                .resolve(name)
                .ok_or_else(|| UnresolvedType { name: name.clone() }.at(span))?;
        }
        Ok(current)
    }

    fn predicate(
        &mut self,
        ty: &Type,
        mangled: &str,
        span: Span,
        deps: &mut Vec<Type>,
    ) -> Result<Decl, CompileError> {
        let ty = self.structural(ty, span)?;
        let stmts = match ty {
            Type::Void => vec![ret(Expr::bool(false))],
            Type::Int(width) if is_bounded(*width) => vec![ret(self.int_test(*width))],
            Type::Null | Type::Bool | Type::Int(_) => {
                let test = test_expr(ty, val(), self.defs).map_err(|e| e.at(span))?;
                vec![ret(test)]
            }
            Type::Method(_) => vec![ret(typeof_is(val(), "function"))],
            Type::Array(elem) => self.array_body(elem, span, deps)?,
            Type::Reference(elem) => {
                deps.push(elem.as_ref().clone());
                let is_cell = Expr::binary(
                    OpKind::StrictEq,
                    Expr::property(val(), "constructor"),
                    Expr::property(Expr::var(self.runtime), "Ref"),
                );
                let content = Expr::method_call(Expr::var(self.runtime), "deref", vec![val()]);
                let test = Expr::Operator {
                    kind: OpKind::And,
                    operands: vec![not_null(), is_cell, self.call(elem, content, span)?],
                };
                vec![ret(test)]
            }
            Type::Record(rt) => {
                let mut stmts = vec![reject_if(Expr::binary(
                    OpKind::Or,
                    Expr::binary(OpKind::StrictEq, val(), Expr::null()),
                    Expr::binary(OpKind::StrictNeq, Expr::unary(OpKind::TypeOf, val()), Expr::str("object")),
                ))];
                if !rt.is_open {
                    let keys = Expr::method_call(Expr::var("Object"), "keys", vec![val()]);
                    stmts.push(reject_if(Expr::binary(
                        OpKind::StrictNeq,
                        Expr::length(keys),
                        Expr::int(rt.fields.len() as i64),
                    )));
                }
                for field in &rt.fields {
                    deps.push(field.ty.clone());
                    let value = Expr::property(val(), &field.name);
                    let missing = Expr::binary(
                        OpKind::StrictEq,
                        Expr::unary(OpKind::TypeOf, value.clone()),
                        Expr::str("undefined"),
                    );
                    let invalid = Expr::not(self.call(&field.ty, value, span)?);
                    stmts.push(reject_if(Expr::binary(OpKind::Or, missing, invalid)));
                }
                stmts.push(ret(Expr::bool(true)));
                stmts
            }
            Type::Union(elems) => {
                let mut stmts = Vec::new();
                for elem in elems {
                    if needs_predicate(elem) {
                        deps.push(elem.clone());
                    }
                    let test = test_expr(elem, val(), self.defs).map_err(|e| e.at(span))?;
                    stmts.push(Stmt::IfElse {
                        cases: vec![(test, Block::new(vec![ret(Expr::bool(true))]))],
                        default: None,
                    });
                }
                stmts.push(ret(Expr::bool(false)));
                stmts
            }
            // structural() never returns a placeholder.
            Type::Recursive(_) => vec![ret(Expr::bool(false))],
        };

        Ok(Decl::Method(Method {
            name: format!("is${mangled}"),
            params: vec![Param::new(VAL)],
            body: Block::new(stmts),
        }))
    }

    fn int_test(&self, width: u32) -> Expr {
        Expr::Operator {
            kind: OpKind::And,
            operands: vec![
                typeof_is(val(), "number"),
                Expr::binary(OpKind::GtEq, val(), Expr::int(0)),
                Expr::binary(OpKind::LtEq, val(), Expr::hex(width_mask(width))),
            ],
        }
    }

    fn array_body(&mut self, elem: &Type, span: Span, deps: &mut Vec<Type>) -> Result<Vec<Stmt>, CompileError> {
        deps.push(elem.clone());
        let i = self.fresh_loop_var();
        let is_array = Expr::binary(OpKind::StrictEq, Expr::property(val(), "constructor"), Expr::var("Array"));
        let elem_ok = Expr::not(self.call(elem, Expr::index(val(), Expr::var(&i)), span)?);
        let each = Stmt::For {
            decl: VariableDeclaration::new(&i, Some(Expr::int(0))),
            cond: Expr::binary(OpKind::Lt, Expr::var(&i), Expr::length(val())),
            incr: Box::new(Stmt::Assignment {
                lhs: Expr::var(&i),
                rhs: Expr::binary(OpKind::Add, Expr::var(&i), Expr::int(1)),
            }),
            body: Block::new(vec![reject_if(elem_ok)]),
        };
        Ok(vec![
            Stmt::IfElse {
                cases: vec![(
                    Expr::binary(OpKind::And, not_null(), is_array),
                    Block::new(vec![each, ret(Expr::bool(true))]),
                )],
                default: None,
            },
            ret(Expr::bool(false)),
        ])
    }
}

fn val() -> Expr {
    Expr::var(VAL)
}

fn not_null() -> Expr {
    Expr::binary(OpKind::Neq, val(), Expr::null())
}

fn ret(value: Expr) -> Stmt {
    Stmt::Return(Some(value))
}

fn reject_if(cond: Expr) -> Stmt {
    Stmt::IfElse {
        cases: vec![(cond, Block::new(vec![ret(Expr::bool(false))]))],
        default: None,
    }
}
