use crate::diagnostics::CompileError;
use crate::ir::Expr;
use crate::js;
use crate::span::Spanned;

use super::expr::unwrap_array_union;
use super::Lowerer;

impl Lowerer<'_> {
    /// Lower an assignment target.
    ///
    /// Targets form a small grammar: a variable, or an index, field or cell
    /// write applied to another target. A dereference on the left-hand side
    /// writes the cell's `$ref` slot directly instead of going through the
    /// runtime's `deref`.
    pub fn lower_lval(&mut self, lval: &Spanned<Expr>) -> Result<js::Expr, CompileError> {
        match &lval.node {
            Expr::VariableAccess { name, .. } | Expr::StaticVariableAccess { name, .. } => {
                Ok(js::Expr::var(name))
            }
            Expr::ArrayAccess { tys, source, index } => {
                let source = unwrap_array_union(self.lower_lval(source)?, tys);
                let index = self.lower_expr(index)?;
                Ok(js::Expr::index(source, index))
            }
            Expr::RecordAccess { source, field, .. } => Ok(js::Expr::property(self.lower_lval(source)?, field)),
            Expr::Dereference { operand, .. } => Ok(js::Expr::property(self.lower_lval(operand)?, "$ref")),
            other => Err(CompileError::unsupported(
                format!("{} is not an assignment target", other.kind_name()),
                lval.span,
            )),
        }
    }
}
