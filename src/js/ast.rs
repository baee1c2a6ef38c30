//! Target AST for the dynamically-typed output language.
//!
//! Pure data: nodes are built once by lowering or predicate synthesis and
//! consumed once by the printer.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable(VariableDeclaration),
    Method(Method),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Variable(v) => &v.name,
            Decl::Method(m) => &m.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    /// Originating IR type, written as a comment in debug mode.
    pub annotation: Option<String>,
    pub init: Option<Expr>,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>, init: Option<Expr>) -> Self {
        Self { name: name.into(), annotation: None, init }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), annotation: None }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` is the default case.
    pub label: Option<Literal>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment { lhs: Expr, rhs: Expr },
    Break,
    Continue,
    DoWhile { body: Block, cond: Expr },
    For {
        decl: VariableDeclaration,
        cond: Expr,
        incr: Box<Stmt>,
        body: Block,
    },
    IfElse {
        cases: Vec<(Expr, Block)>,
        default: Option<Block>,
    },
    Return(Option<Expr>),
    Switch { cond: Expr, cases: Vec<SwitchCase> },
    While { cond: Expr, body: Block },
    Block(Block),
    Var(VariableDeclaration),
    /// Expression evaluated for its effect.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    /// Integer written in hexadecimal, used for masks.
    Hex(u64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Eq,
    Neq,
    StrictEq,
    StrictNeq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Not,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Shl,
    Shr,
    TypeOf,
    New,
}

impl OpKind {
    pub fn is_prefix(self) -> bool {
        matches!(self, OpKind::Neg | OpKind::Not | OpKind::BitNot | OpKind::TypeOf | OpKind::New)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OpKind::Add => "+",
            OpKind::Sub => "-",
            OpKind::Mul => "*",
            OpKind::Div => "/",
            OpKind::Rem => "%",
            OpKind::Neg => "-",
            OpKind::Eq => "==",
            OpKind::Neq => "!=",
            OpKind::StrictEq => "===",
            OpKind::StrictNeq => "!==",
            OpKind::Lt => "<",
            OpKind::LtEq => "<=",
            OpKind::Gt => ">",
            OpKind::GtEq => ">=",
            OpKind::And => "&&",
            OpKind::Or => "||",
            OpKind::Not => "!",
            OpKind::BitAnd => "&",
            OpKind::BitOr => "|",
            OpKind::BitXor => "^",
            OpKind::BitNot => "~",
            OpKind::Shl => "<<",
            OpKind::Shr => ">>",
            OpKind::TypeOf => "typeof ",
            OpKind::New => "new ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Literal),
    VariableAccess(String),
    Invoke {
        receiver: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    IndirectInvoke { target: Box<Expr>, args: Vec<Expr> },
    /// Prefix operators take one operand; infix operators two or more,
    /// joined left to right.
    Operator { kind: OpKind, operands: Vec<Expr> },
    ArrayInitialiser(Vec<Expr>),
    ArrayLength(Box<Expr>),
    ArrayAccess { source: Box<Expr>, index: Box<Expr> },
    ObjectLiteral(Vec<(String, Expr)>),
    PropertyAccess { source: Box<Expr>, field: String },
    Lambda { params: Vec<String>, body: Block },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::VariableAccess(name.into())
    }

    pub fn null() -> Expr {
        Expr::Constant(Literal::Null)
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Constant(Literal::Bool(value))
    }

    pub fn int(value: i64) -> Expr {
        Expr::Constant(Literal::Int(value))
    }

    pub fn hex(value: u64) -> Expr {
        Expr::Constant(Literal::Hex(value))
    }

    pub fn str(value: impl Into<String>) -> Expr {
        Expr::Constant(Literal::Str(value.into()))
    }

    pub fn unary(kind: OpKind, operand: Expr) -> Expr {
        Expr::Operator { kind, operands: vec![operand] }
    }

    pub fn binary(kind: OpKind, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Operator { kind, operands: vec![lhs, rhs] }
    }

    /// Direct call of a free function.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Invoke { receiver: None, name: name.into(), args }
    }

    /// Call of a method on `receiver`.
    pub fn method_call(receiver: Expr, name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Invoke { receiver: Some(Box::new(receiver)), name: name.into(), args }
    }

    pub fn property(source: Expr, field: impl Into<String>) -> Expr {
        Expr::PropertyAccess { source: Box::new(source), field: field.into() }
    }

    pub fn index(source: Expr, index: Expr) -> Expr {
        Expr::ArrayAccess { source: Box::new(source), index: Box::new(index) }
    }

    pub fn length(source: Expr) -> Expr {
        Expr::ArrayLength(Box::new(source))
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::unary(OpKind::Not, operand)
    }

    /// Conservative bracketing: every operator, object literal and lambda is
    /// bracketed when it appears as an operand or receiver, so evaluation
    /// order never depends on target-language precedence. Negative literals
    /// are bracketed too: `-` followed by `-5` would lex as `--`.
    pub fn needs_brackets(&self) -> bool {
        matches!(
            self,
            Expr::Operator { .. }
                | Expr::ObjectLiteral(_)
                | Expr::Lambda { .. }
                | Expr::Constant(Literal::Int(i64::MIN..=-1))
        )
    }
}
