use crate::ast::*;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Undefined variable: {0}")]
    UndefinedVar(String),
    #[error("Type mismatch: cannot apply {op} to {left} and {right}")]
    TypeMismatch {
        op: BinOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }
}

/// Prints the way the generated JavaScript would: integral numbers without
/// a decimal point, booleans lower-case, strings bare.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::Str(_) => f64::NAN,
    }
}

/// Tree-walking evaluator with an explicit scope stack. Blocks push a scope
/// on entry and pop it on exit; name resolution walks innermost-out.
pub struct Interpreter<W: Write> {
    pub scopes: Vec<HashMap<String, Value>>,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Interpreter::with_output(io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    /// Route print output to `out` instead of stdout.
    pub fn with_output(out: W) -> Self {
        Interpreter {
            scopes: vec![HashMap::new()],
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Drop everything but the global scope. The REPL calls this after a
    /// runtime error so an aborted block cannot leave scopes behind.
    pub fn reset_scopes(&mut self) {
        self.scopes.truncate(1);
    }

    /// Run top-level statements in the current innermost scope, so a
    /// long-lived interpreter (the REPL) keeps its globals between runs.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in &program.body {
            self.exec_stmt(stmt)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn exec_block(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.scopes.push(HashMap::new());
        let mut result = Ok(());
        for stmt in &program.body {
            result = self.exec_stmt(stmt);
            if result.is_err() {
                break;
            }
        }
        self.scopes.pop();
        result
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Print(expr) => {
                let value = self.eval_expr(expr)?;
                write!(self.out, "{}", value)?;
            }
            Stmt::PrintLine(expr) => {
                let value = self.eval_expr(expr)?;
                writeln!(self.out, "{}", value)?;
            }
            Stmt::VarDecl(name, expr) => {
                let value = self.eval_expr(expr)?;
                self.current_scope().insert(name.clone(), value);
            }
            Stmt::Assign(name, expr) => {
                let value = self.eval_expr(expr)?;
                *self.get_mut(name)? = value;
            }
            Stmt::If(node) => self.exec_if(node)?,
            Stmt::While(condition, body) => {
                while self.eval_expr(condition)?.is_truthy() {
                    self.exec_block(body)?;
                }
            }
            Stmt::For(variable, range, body) => self.exec_for(variable, range, body)?,
        }
        Ok(())
    }

    /// Walk an if/else-if/else chain link by link until a condition holds
    /// or the chain runs out.
    fn exec_if(&mut self, node: &IfStmt) -> Result<(), RuntimeError> {
        let mut current = node;
        loop {
            if self.eval_expr(&current.condition)?.is_truthy() {
                return self.exec_block(&current.body);
            }
            match &current.alternate {
                Some(Else::If(next)) => current = next,
                Some(Else::Block(block)) => return self.exec_block(block),
                None => return Ok(()),
            }
        }
    }

    fn exec_for(
        &mut self,
        variable: &str,
        range: &Expr,
        body: &Program,
    ) -> Result<(), RuntimeError> {
        let mut scope = HashMap::new();
        scope.insert(variable.to_string(), Value::Number(0.0));
        self.scopes.push(scope);
        let result = self.run_for_loop(variable, range, body);
        self.scopes.pop();
        result
    }

    fn run_for_loop(
        &mut self,
        variable: &str,
        range: &Expr,
        body: &Program,
    ) -> Result<(), RuntimeError> {
        loop {
            // The bound re-evaluates every iteration, exactly like the
            // condition of the generated counted loop
            let bound = as_number(&self.eval_expr(range)?);
            let current = as_number(self.lookup(variable)?);
            if !(current < bound) {
                return Ok(());
            }
            self.exec_block(body)?;

            // Increment whatever value the body left in the counter
            let after = as_number(self.lookup(variable)?);
            *self.get_mut(variable)? = Value::Number(after + 1.0);
        }
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Var(name) => self.lookup(name).map(Clone::clone),
            Expr::NumberLit(n) => Ok(Value::Number(*n)),
            Expr::StringLit(s) => Ok(Value::Str(s.clone())),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::BinOp(left, op, right) => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                apply(*op, left, right)
            }
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Var(name) => {
                            let value = self.lookup(name)?;
                            out.push_str(&value.to_string());
                        }
                    }
                }
                Ok(Value::Str(out))
            }
        }
    }

    fn current_scope(&mut self) -> &mut HashMap<String, Value> {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    fn lookup(&self, name: &str) -> Result<&Value, RuntimeError> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Ok(value);
            }
        }
        Err(RuntimeError::UndefinedVar(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Value, RuntimeError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(value) = scope.get_mut(name) {
                return Ok(value);
            }
        }
        Err(RuntimeError::UndefinedVar(name.to_string()))
    }
}

fn apply(op: BinOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => match (&left, &right) {
            // A string on either side concatenates, as `+` does in the
            // generated JavaScript
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", left, right)))
            }
            _ => Ok(Value::Number(as_number(&left) + as_number(&right))),
        },
        BinOp::Gt | BinOp::Lt => {
            let result = match (&left, &right) {
                (Value::Str(a), Value::Str(b)) => {
                    if op == BinOp::Gt {
                        a > b
                    } else {
                        a < b
                    }
                }
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    return Err(RuntimeError::TypeMismatch {
                        op,
                        left: left.type_name(),
                        right: right.type_name(),
                    })
                }
                _ => {
                    let a = as_number(&left);
                    let b = as_number(&right);
                    if op == BinOp::Gt {
                        a > b
                    } else {
                        a < b
                    }
                }
            };
            Ok(Value::Bool(result))
        }
    }
}
