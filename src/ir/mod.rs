//! The low-level IR handed over by the front end.
//!
//! Everything here is read-only input: names are resolved, types are checked
//! and every node carries the span it came from. The back end trusts these
//! invariants and reports a `CompileError` when it catches one broken.

pub mod types;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::CompileError;
use crate::span::Spanned;
pub use types::{Field, MethodType, RecordType, Type};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Spanned<Decl>>,
}

impl Program {
    /// Decode a front-end hand-off document.
    pub fn from_json(source: &str) -> Result<Program, CompileError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> Result<String, CompileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn type_defs(&self) -> TypeDefs {
        TypeDefs::from_program(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    StaticVariable {
        name: String,
        ty: Type,
        #[serde(default)]
        init: Option<Spanned<Expr>>,
    },
    /// Named type. Has no runtime representation.
    TypeAlias {
        name: String,
        def: Type,
    },
    Method {
        name: String,
        params: Vec<Spanned<Param>>,
        #[serde(default)]
        returns: Vec<Type>,
        body: Block,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

impl Block {
    pub fn new(stmts: Vec<Spanned<Stmt>>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub ty: Type,
    pub name: String,
    #[serde(default)]
    pub init: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub cond: Spanned<Expr>,
    pub body: Block,
}

/// A switch case. No labels means the default case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub labels: Vec<i64>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Assert(Spanned<Expr>),
    Assign {
        lhs: Spanned<Expr>,
        rhs: Spanned<Expr>,
    },
    Break,
    Continue,
    DoWhile {
        body: Block,
        cond: Spanned<Expr>,
    },
    For {
        decl: VarDecl,
        cond: Spanned<Expr>,
        incr: Box<Spanned<Stmt>>,
        body: Block,
    },
    IfElse {
        branches: Vec<Branch>,
        #[serde(default)]
        default: Option<Block>,
    },
    Return(Option<Spanned<Expr>>),
    Switch {
        cond: Spanned<Expr>,
        cases: Vec<Case>,
    },
    While {
        cond: Spanned<Expr>,
        body: Block,
    },
    VarDecl(VarDecl),
    /// An invocation evaluated for its effect.
    Invoke(Spanned<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Eq,
    Neq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntOp {
    Eq,
    Neq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitOp {
    Eq,
    Neq,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

type Operand = Box<Spanned<Expr>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    VariableAccess { ty: Type, name: String },
    StaticVariableAccess { ty: Type, name: String },
    NullConst,
    BoolConst(bool),
    IntConst { width: u32, value: i64 },

    Invoke { sig: MethodType, name: String, args: Vec<Spanned<Expr>> },
    IndirectInvoke { sig: MethodType, target: Operand, args: Vec<Spanned<Expr>> },
    /// A named method used as a value.
    LambdaAccess { sig: MethodType, name: String },

    Equal { lhs_ty: Type, rhs_ty: Type, lhs: Operand, rhs: Operand },
    NotEqual { lhs_ty: Type, rhs_ty: Type, lhs: Operand, rhs: Operand },
    /// Copy point marked by the front end.
    Clone { ty: Type, operand: Operand },

    Logical { op: LogicalOp, lhs: Operand, rhs: Operand },
    LogicalNot(Operand),

    Integer { op: IntOp, width: u32, lhs: Operand, rhs: Operand },
    IntegerNegate { width: u32, operand: Operand },
    IntegerCoerce { target: u32, actual: u32, operand: Operand },

    Bitwise { op: BitOp, width: u32, lhs: Operand, rhs: Operand },
    BitwiseNot { width: u32, operand: Operand },

    ArrayInit { ty: Type, elements: Vec<Spanned<Expr>> },
    ArrayInitLength { ty: Type, length: Operand },
    ArrayGenerator { ty: Type, value: Operand, length: Operand },
    ArrayLength { ty: Type, source: Operand },
    /// `tys` lists every array shape the source may have; more than one
    /// means the source is a union of arrays.
    ArrayAccess { tys: Vec<Type>, source: Operand, index: Operand },

    RecordInit { ty: Type, operands: Vec<Spanned<Expr>> },
    RecordAccess { ty: Type, source: Operand, field: String },
    RecordCoerce { target: Type, actual: Type, operand: Operand },

    UnionEnter { ty: Type, tag: u32, operand: Operand },
    UnionLeave { ty: Type, tag: u32, operand: Operand },
    UnionAccess { ty: Type, operand: Operand },
    UnionCoerce { target: Type, actual: Type, operand: Operand },

    New { ty: Type, operand: Operand },
    Dereference { ty: Type, operand: Operand },

    /// Runtime membership test of `operand` against `ty`.
    TypeTest { ty: Type, operand: Operand },
}

impl Expr {
    /// Short node-kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::VariableAccess { .. } => "variable access",
            Expr::StaticVariableAccess { .. } => "static variable access",
            Expr::NullConst => "null constant",
            Expr::BoolConst(_) => "bool constant",
            Expr::IntConst { .. } => "int constant",
            Expr::Invoke { .. } => "invocation",
            Expr::IndirectInvoke { .. } => "indirect invocation",
            Expr::LambdaAccess { .. } => "lambda access",
            Expr::Equal { .. } => "equality",
            Expr::NotEqual { .. } => "inequality",
            Expr::Clone { .. } => "clone",
            Expr::Logical { .. } => "logical operator",
            Expr::LogicalNot(_) => "logical not",
            Expr::Integer { .. } => "integer operator",
            Expr::IntegerNegate { .. } => "integer negation",
            Expr::IntegerCoerce { .. } => "integer coercion",
            Expr::Bitwise { .. } => "bitwise operator",
            Expr::BitwiseNot { .. } => "bitwise not",
            Expr::ArrayInit { .. } => "array initialiser",
            Expr::ArrayInitLength { .. } => "array length initialiser",
            Expr::ArrayGenerator { .. } => "array generator",
            Expr::ArrayLength { .. } => "array length",
            Expr::ArrayAccess { .. } => "array access",
            Expr::RecordInit { .. } => "record initialiser",
            Expr::RecordAccess { .. } => "record access",
            Expr::RecordCoerce { .. } => "record coercion",
            Expr::UnionEnter { .. } => "union enter",
            Expr::UnionLeave { .. } => "union leave",
            Expr::UnionAccess { .. } => "union access",
            Expr::UnionCoerce { .. } => "union coercion",
            Expr::New { .. } => "reference initialiser",
            Expr::Dereference { .. } => "dereference",
            Expr::TypeTest { .. } => "type test",
        }
    }
}

// ── Type resolution ──────────────────────────────────────────────────

/// Resolves the name carried by a `Type::Recursive` placeholder back to its
/// structural definition.
pub trait ResolveType {
    fn resolve(&self, name: &str) -> Option<&Type>;
}

/// Type definitions of one program, keyed by alias name.
#[derive(Debug, Clone, Default)]
pub struct TypeDefs {
    defs: HashMap<String, Type>,
}

impl TypeDefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_program(program: &Program) -> Self {
        let mut defs = Self::new();
        for decl in &program.decls {
            if let Decl::TypeAlias { name, def } = &decl.node {
                defs.insert(name.clone(), def.clone());
            }
        }
        defs
    }

    pub fn insert(&mut self, name: impl Into<String>, def: Type) {
        self.defs.insert(name.into(), def);
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl ResolveType for TypeDefs {
    fn resolve(&self, name: &str) -> Option<&Type> {
        self.defs.get(name)
    }
}
