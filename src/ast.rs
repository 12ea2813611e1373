#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    // Built-in output, without and with a trailing newline
    Print(Expr),
    PrintLine(Expr),

    // First binding of a name in the parse scope
    VarDecl(String, Expr),

    // Rebinding of an already-declared name
    Assign(String, Expr),

    // Control flow; bodies are nested Programs
    If(IfStmt),
    While(Expr, Program),

    // `for NAME in range(EXPR):` - counts from 0 up to (exclusive) the range
    For(String, Expr, Program),
}

/// One link of an if/else-if/else chain. `alternate` is the next link:
/// another `IfStmt` for an `else if`, a plain block for a final `else`,
/// `None` when the chain ends without an `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub body: Program,
    pub alternate: Option<Else>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Else {
    If(Box<IfStmt>),
    Block(Program),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(String),
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    BinOp(Box<Expr>, BinOp, Box<Expr>),

    // A string literal with <name> placeholders, split at parse time
    Template(Vec<TemplatePart>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Var(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Gt,
    Lt,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Lt => write!(f, "<"),
        }
    }
}
