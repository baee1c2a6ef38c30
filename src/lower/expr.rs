use crate::diagnostics::CompileError;
use crate::ir::types::{masked_width, width_mask};
use crate::ir::{BitOp, Expr, IntOp, LogicalOp, Type};
use crate::js::{self, OpKind};
use crate::span::{Span, Spanned};
use crate::typetest::{needs_predicate, test_expr};

use super::Lowerer;

impl Lowerer<'_> {
    pub fn lower_expr(&mut self, expr: &Spanned<Expr>) -> Result<js::Expr, CompileError> {
        let span = expr.span;
        match &expr.node {
            Expr::VariableAccess { name, .. } | Expr::StaticVariableAccess { name, .. } => {
                Ok(js::Expr::var(name))
            }
            Expr::NullConst => Ok(js::Expr::null()),
            Expr::BoolConst(b) => Ok(js::Expr::bool(*b)),
            Expr::IntConst { value, .. } => Ok(js::Expr::int(*value)),

            // ── Invocation ───────────────────────────────────────────
            Expr::Invoke { name, args, .. } => {
                let args = self.lower_exprs(args)?;
                Ok(js::Expr::call(name, args))
            }
            Expr::IndirectInvoke { target, args, .. } => {
                let target = self.lower_expr(target)?;
                let args = self.lower_exprs(args)?;
                Ok(js::Expr::IndirectInvoke { target: Box::new(target), args })
            }
            Expr::LambdaAccess { sig, name } => {
                let params: Vec<String> = (0..sig.params.len()).map(|i| format!("p{i}")).collect();
                let forwarded = params.iter().map(|p| js::Expr::var(p)).collect();
                Ok(js::Expr::Lambda {
                    params,
                    body: js::Block::new(vec![js::Stmt::Return(Some(js::Expr::call(name, forwarded)))]),
                })
            }

            // ── Value semantics ──────────────────────────────────────
            Expr::Equal { lhs_ty, rhs_ty, lhs, rhs } => self.lower_equality(lhs_ty, rhs_ty, lhs, rhs, false),
            Expr::NotEqual { lhs_ty, rhs_ty, lhs, rhs } => self.lower_equality(lhs_ty, rhs_ty, lhs, rhs, true),
            Expr::Clone { ty, operand } => {
                let value = self.lower_expr(operand)?;
                if self.is_copy(ty) {
                    Ok(value)
                } else {
                    Ok(self.runtime_call("copy", vec![value]))
                }
            }

            // ── Logical ──────────────────────────────────────────────
            Expr::Logical { op, lhs, rhs } => {
                let kind = match op {
                    LogicalOp::And => OpKind::And,
                    LogicalOp::Or => OpKind::Or,
                    LogicalOp::Eq => OpKind::Eq,
                    LogicalOp::Neq => OpKind::Neq,
                };
                Ok(js::Expr::binary(kind, self.lower_expr(lhs)?, self.lower_expr(rhs)?))
            }
            Expr::LogicalNot(operand) => Ok(js::Expr::not(self.lower_expr(operand)?)),

            // ── Fixed-width integers ─────────────────────────────────
            Expr::Integer { op, width, lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                Ok(match op {
                    IntOp::Div => js::Expr::method_call(
                        js::Expr::var("Math"),
                        "floor",
                        vec![js::Expr::binary(OpKind::Div, lhs, rhs)],
                    ),
                    IntOp::Add => mask(js::Expr::binary(OpKind::Add, lhs, rhs), *width),
                    IntOp::Sub => mask(js::Expr::binary(OpKind::Sub, lhs, rhs), *width),
                    IntOp::Mul => mask(js::Expr::binary(OpKind::Mul, lhs, rhs), *width),
                    IntOp::Rem => js::Expr::binary(OpKind::Rem, lhs, rhs),
                    IntOp::Eq => js::Expr::binary(OpKind::Eq, lhs, rhs),
                    IntOp::Neq => js::Expr::binary(OpKind::Neq, lhs, rhs),
                    IntOp::Lt => js::Expr::binary(OpKind::Lt, lhs, rhs),
                    IntOp::LtEq => js::Expr::binary(OpKind::LtEq, lhs, rhs),
                    IntOp::Gt => js::Expr::binary(OpKind::Gt, lhs, rhs),
                    IntOp::GtEq => js::Expr::binary(OpKind::GtEq, lhs, rhs),
                })
            }
            Expr::IntegerNegate { width, operand } => {
                let value = self.lower_expr(operand)?;
                Ok(mask(js::Expr::unary(OpKind::Neg, value), *width))
            }
            Expr::IntegerCoerce { target, actual, operand } => {
                let value = self.lower_expr(operand)?;
                match masked_width(*target) {
                    Some(w) if *actual == 0 || *actual > w => Ok(mask(value, w)),
                    _ => Ok(value),
                }
            }
            Expr::Bitwise { op, width, lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                Ok(match op {
                    BitOp::Eq => js::Expr::binary(OpKind::Eq, lhs, rhs),
                    BitOp::Neq => js::Expr::binary(OpKind::Neq, lhs, rhs),
                    BitOp::And => mask(js::Expr::binary(OpKind::BitAnd, lhs, rhs), *width),
                    BitOp::Or => mask(js::Expr::binary(OpKind::BitOr, lhs, rhs), *width),
                    BitOp::Xor => mask(js::Expr::binary(OpKind::BitXor, lhs, rhs), *width),
                    BitOp::Shl => mask(js::Expr::binary(OpKind::Shl, lhs, shift_count(rhs, *width)), *width),
                    BitOp::Shr => mask(js::Expr::binary(OpKind::Shr, lhs, shift_count(rhs, *width)), *width),
                })
            }
            Expr::BitwiseNot { width, operand } => {
                let value = self.lower_expr(operand)?;
                Ok(mask(js::Expr::unary(OpKind::BitNot, value), *width))
            }

            // ── Arrays ───────────────────────────────────────────────
            Expr::ArrayInit { elements, .. } => Ok(js::Expr::ArrayInitialiser(self.lower_exprs(elements)?)),
            // Length-only initialisation has no element values to fill with yet.
            Expr::ArrayInitLength { .. } => Ok(js::Expr::ArrayInitialiser(Vec::new())),
            Expr::ArrayGenerator { value, length, .. } => {
                let value = self.lower_expr(value)?;
                let length = self.lower_expr(length)?;
                Ok(self.runtime_call("array", vec![value, length]))
            }
            Expr::ArrayLength { source, .. } => Ok(js::Expr::length(self.lower_expr(source)?)),
            Expr::ArrayAccess { tys, source, index } => {
                let source = unwrap_array_union(self.lower_expr(source)?, tys);
                let index = self.lower_expr(index)?;
                Ok(js::Expr::index(source, index))
            }

            // ── Records ──────────────────────────────────────────────
            Expr::RecordInit { ty, operands } => {
                let fields = match self.expand(ty) {
                    Type::Record(rt) => &rt.fields,
                    other => {
                        return Err(CompileError::mismatch(
                            format!("record initialiser has non-record type {other}"),
                            span,
                        ));
                    }
                };
                if fields.len() != operands.len() {
                    return Err(CompileError::mismatch(
                        format!(
                            "record initialiser has {} operands but type {ty} has {} fields",
                            operands.len(),
                            fields.len()
                        ),
                        span,
                    ));
                }
                let mut lowered = Vec::with_capacity(fields.len());
                for (field, operand) in fields.iter().zip(operands) {
                    lowered.push((field.name.clone(), self.lower_expr(operand)?));
                }
                Ok(js::Expr::ObjectLiteral(lowered))
            }
            Expr::RecordAccess { source, field, .. } => Ok(js::Expr::property(self.lower_expr(source)?, field)),
            Expr::RecordCoerce { target, actual, operand } => {
                self.same_shape(target, actual, "record coercion", span)?;
                self.lower_expr(operand)
            }

            // ── Unions ───────────────────────────────────────────────
            Expr::UnionEnter { ty, tag, operand } => {
                match self.expand(ty) {
                    Type::Union(elems) if (*tag as usize) < elems.len() => {}
                    Type::Union(elems) => {
                        return Err(CompileError::mismatch(
                            format!("union tag {tag} out of range for {} elements", elems.len()),
                            span,
                        ));
                    }
                    other => {
                        return Err(CompileError::mismatch(
                            format!("union enter into non-union type {other}"),
                            span,
                        ));
                    }
                }
                let data = self.lower_expr(operand)?;
                Ok(js::Expr::ObjectLiteral(vec![
                    ("tag".to_string(), js::Expr::int(i64::from(*tag))),
                    ("data".to_string(), data),
                ]))
            }
            Expr::UnionLeave { operand, .. } => Ok(js::Expr::property(self.lower_expr(operand)?, "data")),
            Expr::UnionAccess { operand, .. } => Ok(js::Expr::property(self.lower_expr(operand)?, "tag")),
            Expr::UnionCoerce { target, actual, operand } => {
                self.same_shape(target, actual, "union coercion", span)?;
                self.lower_expr(operand)
            }

            // ── References ───────────────────────────────────────────
            Expr::New { operand, .. } => {
                let value = self.lower_expr(operand)?;
                let cell = js::Expr::method_call(js::Expr::var(&self.options.runtime), "Ref", vec![value]);
                Ok(js::Expr::unary(OpKind::New, cell))
            }
            Expr::Dereference { operand, .. } => {
                let cell = self.lower_expr(operand)?;
                Ok(self.runtime_call("deref", vec![cell]))
            }

            Expr::TypeTest { ty, operand } => {
                let value = self.lower_expr(operand)?;
                self.type_test(ty, value, span)
            }
        }
    }

    fn lower_exprs(&mut self, exprs: &[Spanned<Expr>]) -> Result<Vec<js::Expr>, CompileError> {
        exprs.iter().map(|e| self.lower_expr(e)).collect()
    }

    fn lower_equality(
        &mut self,
        lhs_ty: &Type,
        rhs_ty: &Type,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        negate: bool,
    ) -> Result<js::Expr, CompileError> {
        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;
        if self.is_copy(lhs_ty) && self.is_copy(rhs_ty) {
            let kind = if negate { OpKind::Neq } else { OpKind::Eq };
            return Ok(js::Expr::binary(kind, lhs, rhs));
        }
        let equals = self.runtime_call("equals", vec![lhs, rhs]);
        Ok(if negate { js::Expr::not(equals) } else { equals })
    }

    /// Runtime membership test of `value`; non-primitive types join the
    /// required set.
    pub(super) fn type_test(&mut self, ty: &Type, value: js::Expr, span: Span) -> Result<js::Expr, CompileError> {
        let test = test_expr(ty, value, self.defs).map_err(|e| e.at(span))?;
        if needs_predicate(ty) {
            self.required.insert(ty.clone(), span);
        }
        Ok(test)
    }

    fn same_shape(&self, target: &Type, actual: &Type, what: &str, span: Span) -> Result<(), CompileError> {
        if self.expand(target) == self.expand(actual) {
            Ok(())
        } else {
            Err(CompileError::not_implemented(format!("{what} from {actual} to {target}"), span))
        }
    }
}

/// Mask `expr` to `width` bits when the width is a fixed one.
fn mask(expr: js::Expr, width: u32) -> js::Expr {
    match masked_width(width) {
        Some(w) => js::Expr::binary(OpKind::BitAnd, expr, js::Expr::hex(width_mask(w))),
        None => expr,
    }
}

/// Native shifts take their count modulo 32, so a fixed-width count is
/// clamped to the width: shifting a `width`-bit value by `width` or more
/// then yields 0 once masked. Constant counts already in range are kept.
fn shift_count(count: js::Expr, width: u32) -> js::Expr {
    let Some(w) = masked_width(width) else {
        return count;
    };
    match count {
        js::Expr::Constant(js::Literal::Int(n)) if (0..i64::from(w)).contains(&n) => count,
        count => js::Expr::method_call(js::Expr::var("Math"), "min", vec![count, js::Expr::int(i64::from(w))]),
    }
}

/// A source whose static type spans several array shapes is a union value;
/// its array lives in the `data` field.
pub(super) fn unwrap_array_union(source: js::Expr, tys: &[Type]) -> js::Expr {
    if tys.len() > 1 { js::Expr::property(source, "data") } else { source }
}
