pub mod ast;
pub mod printer;

pub use ast::{Block, Decl, Expr, Literal, Method, OpKind, Param, Program, Stmt, SwitchCase, VariableDeclaration};
pub use printer::{render, render_into};
