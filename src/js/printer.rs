use std::fmt::{self, Write};

use crate::config::EmitOptions;
use crate::js::ast::*;

/// Render a target `Program` as source text.
pub fn render(program: &Program, options: &EmitOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = render_into(program, options, &mut out);
    out
}

/// Streaming variant of [`render`]: text goes straight into `out`.
pub fn render_into<W: Write>(program: &Program, options: &EmitOptions, out: &mut W) -> fmt::Result {
    let mut printer = Printer::new(out, options.debug_annotations);
    printer.emit_program(program)
}

struct Printer<'w, W: Write> {
    out: &'w mut W,
    indent: usize,
    annotate: bool,
}

impl<'w, W: Write> Printer<'w, W> {
    fn new(out: &'w mut W, annotate: bool) -> Self {
        Self { out, indent: 0, annotate }
    }

    fn write(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }

    fn newline(&mut self) -> fmt::Result {
        self.out.write_char('\n')
    }

    fn write_indent(&mut self) -> fmt::Result {
        for _ in 0..self.indent {
            self.out.write_str("    ")?;
        }
        Ok(())
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent -= 1;
    }

    fn emit_annotation(&mut self, annotation: Option<&str>) -> fmt::Result {
        match annotation {
            Some(ty) if self.annotate => write!(self.out, "/*{ty}*/"),
            _ => Ok(()),
        }
    }

    // ── Declarations ─────────────────────────────────────────────────

    fn emit_program(&mut self, program: &Program) -> fmt::Result {
        for (i, decl) in program.decls.iter().enumerate() {
            if i > 0 {
                self.newline()?;
            }
            self.emit_decl(decl)?;
            self.newline()?;
        }
        Ok(())
    }

    fn emit_decl(&mut self, decl: &Decl) -> fmt::Result {
        match decl {
            Decl::Variable(var) => {
                self.emit_var_decl(var)?;
                self.write(";")
            }
            Decl::Method(method) => {
                self.write("function ")?;
                self.write(&method.name)?;
                self.write("(")?;
                for (i, param) in method.params.iter().enumerate() {
                    if i > 0 {
                        self.write(", ")?;
                    }
                    self.emit_annotation(param.annotation.as_deref())?;
                    self.write(&param.name)?;
                }
                self.write(") ")?;
                self.emit_block(&method.body)
            }
        }
    }

    fn emit_var_decl(&mut self, var: &VariableDeclaration) -> fmt::Result {
        self.write("var ")?;
        self.emit_annotation(var.annotation.as_deref())?;
        self.write(&var.name)?;
        if let Some(init) = &var.init {
            self.write(" = ")?;
            self.emit_expr(init)?;
        }
        Ok(())
    }

    fn emit_block(&mut self, block: &Block) -> fmt::Result {
        self.write("{")?;
        self.newline()?;
        self.indent();
        self.emit_stmts(&block.stmts)?;
        self.dedent();
        self.write_indent()?;
        self.write("}")
    }

    fn emit_stmts(&mut self, stmts: &[Stmt]) -> fmt::Result {
        for stmt in stmts {
            self.write_indent()?;
            self.emit_stmt(stmt)?;
            self.newline()?;
        }
        Ok(())
    }

    // ── Statements ───────────────────────────────────────────────────

    fn emit_stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Assignment { .. }
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Return(_)
            | Stmt::Var(_)
            | Stmt::Expr(_) => {
                self.emit_simple_stmt(stmt)?;
                self.write(";")
            }
            Stmt::DoWhile { body, cond } => {
                self.write("do ")?;
                self.emit_block(body)?;
                self.write(" while(")?;
                self.emit_expr(cond)?;
                self.write(");")
            }
            Stmt::For { decl, cond, incr, body } => {
                self.write("for(")?;
                self.emit_var_decl(decl)?;
                self.write("; ")?;
                self.emit_expr(cond)?;
                self.write("; ")?;
                self.emit_simple_stmt(incr)?;
                self.write(") ")?;
                self.emit_block(body)
            }
            Stmt::IfElse { cases, default } => {
                for (i, (cond, body)) in cases.iter().enumerate() {
                    if i > 0 {
                        self.write(" else ")?;
                    }
                    self.write("if(")?;
                    self.emit_expr(cond)?;
                    self.write(") ")?;
                    self.emit_block(body)?;
                }
                if let Some(default) = default {
                    if !cases.is_empty() {
                        self.write(" else ")?;
                    }
                    self.emit_block(default)?;
                }
                Ok(())
            }
            Stmt::Switch { cond, cases } => {
                self.write("switch(")?;
                self.emit_expr(cond)?;
                self.write(") {")?;
                self.newline()?;
                self.indent();
                for case in cases {
                    self.write_indent()?;
                    match &case.label {
                        Some(label) => {
                            self.write("case ")?;
                            self.emit_literal(label)?;
                            self.write(":")?;
                        }
                        None => self.write("default:")?,
                    }
                    self.newline()?;
                    self.indent();
                    self.emit_stmts(&case.body.stmts)?;
                    self.dedent();
                }
                self.dedent();
                self.write_indent()?;
                self.write("}")
            }
            Stmt::While { cond, body } => {
                self.write("while(")?;
                self.emit_expr(cond)?;
                self.write(") ")?;
                self.emit_block(body)
            }
            Stmt::Block(block) => self.emit_block(block),
        }
    }

    /// A statement without its terminator, as used in `for` headers.
    fn emit_simple_stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Assignment { lhs, rhs } => {
                self.emit_expr(lhs)?;
                self.write(" = ")?;
                self.emit_expr(rhs)
            }
            Stmt::Break => self.write("break"),
            Stmt::Continue => self.write("continue"),
            Stmt::Return(None) => self.write("return"),
            Stmt::Return(Some(value)) => {
                self.write("return ")?;
                self.emit_expr(value)
            }
            Stmt::Var(var) => self.emit_var_decl(var),
            Stmt::Expr(expr) => self.emit_expr(expr),
            compound => self.emit_stmt(compound),
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn emit_expr(&mut self, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Constant(lit) => self.emit_literal(lit),
            Expr::VariableAccess(name) => self.write(name),
            Expr::Invoke { receiver, name, args } => {
                if let Some(receiver) = receiver {
                    self.emit_operand(receiver)?;
                    self.write(".")?;
                }
                self.write(name)?;
                self.emit_args(args)
            }
            Expr::IndirectInvoke { target, args } => {
                self.emit_operand(target)?;
                self.emit_args(args)
            }
            Expr::Operator { kind, operands } => {
                if kind.is_prefix() {
                    self.write(kind.symbol())?;
                    if let Some(operand) = operands.first() {
                        self.emit_operand(operand)?;
                    }
                    return Ok(());
                }
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        self.write(" ")?;
                        self.write(kind.symbol())?;
                        self.write(" ")?;
                    }
                    self.emit_operand(operand)?;
                }
                Ok(())
            }
            Expr::ArrayInitialiser(elements) => {
                self.write("[")?;
                self.emit_comma_list(elements)?;
                self.write("]")
            }
            Expr::ArrayLength(source) => {
                self.emit_operand(source)?;
                self.write(".length")
            }
            Expr::ArrayAccess { source, index } => {
                self.emit_operand(source)?;
                self.write("[")?;
                self.emit_expr(index)?;
                self.write("]")
            }
            Expr::ObjectLiteral(fields) => {
                self.write("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write(", ")?;
                    }
                    self.write(name)?;
                    self.write(": ")?;
                    self.emit_expr(value)?;
                }
                self.write("}")
            }
            Expr::PropertyAccess { source, field } => {
                self.emit_operand(source)?;
                self.write(".")?;
                self.write(field)
            }
            Expr::Lambda { params, body } => {
                self.write("function(")?;
                self.write(&params.join(", "))?;
                self.write(") ")?;
                match body.stmts.as_slice() {
                    [single @ Stmt::Return(_)] => {
                        self.write("{ ")?;
                        self.emit_stmt(single)?;
                        self.write(" }")
                    }
                    _ => self.emit_block(body),
                }
            }
        }
    }

    fn emit_operand(&mut self, expr: &Expr) -> fmt::Result {
        if expr.needs_brackets() {
            self.write("(")?;
            self.emit_expr(expr)?;
            self.write(")")
        } else {
            self.emit_expr(expr)
        }
    }

    fn emit_args(&mut self, args: &[Expr]) -> fmt::Result {
        self.write("(")?;
        self.emit_comma_list(args)?;
        self.write(")")
    }

    fn emit_comma_list(&mut self, exprs: &[Expr]) -> fmt::Result {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ")?;
            }
            self.emit_expr(expr)?;
        }
        Ok(())
    }

    fn emit_literal(&mut self, lit: &Literal) -> fmt::Result {
        match lit {
            Literal::Null => self.write("null"),
            Literal::Bool(b) => self.write(if *b { "true" } else { "false" }),
            Literal::Int(n) => write!(self.out, "{n}"),
            Literal::Hex(n) => write!(self.out, "0x{n:X}"),
            Literal::Str(s) => {
                self.write("\"")?;
                self.write(&escape_string(s))?;
                self.write("\"")
            }
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
