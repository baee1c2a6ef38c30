//! IR → target AST lowering.
//!
//! One pass over the program: each IR declaration yields at most one target
//! declaration, each statement one statement, each expression one
//! expression. Types that need a runtime membership test are collected on
//! the side for the predicate synthesizer.

mod expr;
mod lval;

use tracing::debug;

use crate::config::EmitOptions;
use crate::diagnostics::CompileError;
use crate::ir::{self, ResolveType, Type};
use crate::js;
use crate::span::Spanned;
use crate::typetest::TypeTestSet;

/// Upper bound on alias-to-alias hops when expanding a `Recursive` type.
const MAX_ALIAS_DEPTH: usize = 64;

/// Result of lowering one program.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub program: js::Program,
    /// Types whose predicates the lowered code calls.
    pub required: TypeTestSet,
}

pub fn lower_program(
    program: &ir::Program,
    defs: &dyn ResolveType,
    options: &EmitOptions,
) -> Result<Lowered, CompileError> {
    let mut lowerer = Lowerer::new(defs, options);
    let mut decls = Vec::new();
    for decl in &program.decls {
        if let Some(lowered) = lowerer.lower_decl(decl)? {
            decls.push(lowered);
        }
    }
    Ok(Lowered { program: js::Program { decls }, required: lowerer.required })
}

pub struct Lowerer<'a> {
    defs: &'a dyn ResolveType,
    options: &'a EmitOptions,
    required: TypeTestSet,
}

impl<'a> Lowerer<'a> {
    pub fn new(defs: &'a dyn ResolveType, options: &'a EmitOptions) -> Self {
        Self { defs, options, required: TypeTestSet::new() }
    }

    /// Types registered so far.
    pub fn required(&self) -> &TypeTestSet {
        &self.required
    }

    /// Follow `Recursive` placeholders to the structural definition.
    fn expand<'t>(&self, ty: &'t Type) -> &'t Type
    where
        'a: 't,
    {
        let defs: &'a dyn ResolveType = self.defs;
        let mut current = ty;
        for _ in 0..MAX_ALIAS_DEPTH {
            match current {
                Type::Recursive(name) => match defs.resolve(name) {
                    Some(def) => current = def,
                    None => return current,
                },
                _ => return current,
            }
        }
        current
    }

    fn is_copy(&self, ty: &Type) -> bool {
        self.expand(ty).is_copy()
    }

    /// Invocation of a runtime support function, e.g. `Wy.copy(x)`.
    fn runtime_call(&self, name: &str, args: Vec<js::Expr>) -> js::Expr {
        js::Expr::method_call(js::Expr::var(&self.options.runtime), name, args)
    }

    /// Type comment for a declared name; only rendered in debug mode.
    fn annotation(&self, ty: &Type) -> Option<String> {
        self.options.debug_annotations.then(|| ty.to_string())
    }

    // ── Declarations ─────────────────────────────────────────────────

    pub fn lower_decl(&mut self, decl: &Spanned<ir::Decl>) -> Result<Option<js::Decl>, CompileError> {
        match &decl.node {
            ir::Decl::TypeAlias { name, .. } => {
                debug!(alias = %name, "dropping type alias");
                Ok(None)
            }
            ir::Decl::StaticVariable { name, ty, init } => {
                let init = init.as_ref().map(|e| self.lower_expr(e)).transpose()?;
                debug!(name = %name, "lowered static variable");
                Ok(Some(js::Decl::Variable(js::VariableDeclaration {
                    name: name.clone(),
                    annotation: self.annotation(ty),
                    init,
                })))
            }
            ir::Decl::Method { name, params, body, .. } => {
                let mut lowered_params = Vec::with_capacity(params.len());
                for param in params {
                    if matches!(self.expand(&param.node.ty), Type::Reference(_)) {
                        return Err(CompileError::not_implemented(
                            format!("reference-typed parameter '{}' of '{name}'", param.node.name),
                            param.span,
                        ));
                    }
                    lowered_params.push(js::Param {
                        name: param.node.name.clone(),
                        annotation: self.annotation(&param.node.ty),
                    });
                }

                let mut stmts = self.entry_instrumentation(params)?;
                stmts.extend(self.lower_block(body)?.stmts);
                debug!(name = %name, params = params.len(), "lowered method");
                Ok(Some(js::Decl::Method(js::Method {
                    name: name.clone(),
                    params: lowered_params,
                    body: js::Block::new(stmts),
                })))
            }
        }
    }

    /// Optional method-entry scaffolding: parameter invariant checks and
    /// shadow copies, each enabled independently.
    fn entry_instrumentation(&mut self, params: &[Spanned<ir::Param>]) -> Result<Vec<js::Stmt>, CompileError> {
        let mut stmts = Vec::new();
        if self.options.invariant_checks {
            for param in params {
                let test = self.type_test(&param.node.ty, js::Expr::var(&param.node.name), param.span)?;
                stmts.push(js::Stmt::Expr(self.runtime_call("assert", vec![test])));
            }
        }
        if self.options.shadow_variables {
            for param in params {
                stmts.push(js::Stmt::Var(js::VariableDeclaration {
                    name: format!("${}", param.node.name),
                    annotation: self.annotation(&param.node.ty),
                    init: Some(js::Expr::var(&param.node.name)),
                }));
            }
        }
        Ok(stmts)
    }

    // ── Statements ───────────────────────────────────────────────────

    pub fn lower_block(&mut self, block: &ir::Block) -> Result<js::Block, CompileError> {
        let stmts = block
            .stmts
            .iter()
            .map(|s| self.lower_stmt(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(js::Block::new(stmts))
    }

    pub fn lower_stmt(&mut self, stmt: &Spanned<ir::Stmt>) -> Result<js::Stmt, CompileError> {
        match &stmt.node {
            ir::Stmt::Assert(cond) => {
                let cond = self.lower_expr(cond)?;
                Ok(js::Stmt::Expr(self.runtime_call("assert", vec![cond])))
            }
            ir::Stmt::Assign { lhs, rhs } => {
                let lhs = self.lower_lval(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                Ok(js::Stmt::Assignment { lhs, rhs })
            }
            ir::Stmt::Break => Ok(js::Stmt::Break),
            ir::Stmt::Continue => Ok(js::Stmt::Continue),
            ir::Stmt::DoWhile { body, cond } => Ok(js::Stmt::DoWhile {
                body: self.lower_block(body)?,
                cond: self.lower_expr(cond)?,
            }),
            ir::Stmt::For { decl, cond, incr, body } => Ok(js::Stmt::For {
                decl: self.lower_var_decl(decl)?,
                cond: self.lower_expr(cond)?,
                incr: Box::new(self.lower_stmt(incr)?),
                body: self.lower_block(body)?,
            }),
            ir::Stmt::IfElse { branches, default } => {
                let mut cases = Vec::with_capacity(branches.len());
                for branch in branches {
                    cases.push((self.lower_expr(&branch.cond)?, self.lower_block(&branch.body)?));
                }
                let default = default.as_ref().map(|b| self.lower_block(b)).transpose()?;
                Ok(js::Stmt::IfElse { cases, default })
            }
            ir::Stmt::Return(value) => {
                Ok(js::Stmt::Return(value.as_ref().map(|e| self.lower_expr(e)).transpose()?))
            }
            ir::Stmt::Switch { cond, cases } => {
                let cond = self.lower_expr(cond)?;
                let mut lowered = Vec::new();
                for case in cases {
                    let mut body = self.lower_block(&case.body)?;
                    body.stmts.push(js::Stmt::Break);
                    if case.labels.is_empty() {
                        lowered.push(js::SwitchCase { label: None, body });
                    } else {
                        for label in &case.labels {
                            lowered.push(js::SwitchCase {
                                label: Some(js::Literal::Int(*label)),
                                body: body.clone(),
                            });
                        }
                    }
                }
                Ok(js::Stmt::Switch { cond, cases: lowered })
            }
            ir::Stmt::While { cond, body } => Ok(js::Stmt::While {
                cond: self.lower_expr(cond)?,
                body: self.lower_block(body)?,
            }),
            ir::Stmt::VarDecl(decl) => Ok(js::Stmt::Var(self.lower_var_decl(decl)?)),
            ir::Stmt::Invoke(call) => match &call.node {
                ir::Expr::Invoke { .. } | ir::Expr::IndirectInvoke { .. } => {
                    Ok(js::Stmt::Expr(self.lower_expr(call)?))
                }
                other => Err(CompileError::unsupported(
                    format!("{} used as a statement", other.kind_name()),
                    call.span,
                )),
            },
        }
    }

    fn lower_var_decl(&mut self, decl: &ir::VarDecl) -> Result<js::VariableDeclaration, CompileError> {
        Ok(js::VariableDeclaration {
            name: decl.name.clone(),
            annotation: self.annotation(&decl.ty),
            init: decl.init.as_ref().map(|e| self.lower_expr(e)).transpose()?,
        })
    }
}
