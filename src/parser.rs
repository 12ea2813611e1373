use crate::ast::*;
use crate::lexer::{classify, Line};
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error on line {line}: unknown statement: {text}")]
    UnknownStatement { line: usize, text: String },
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded pattern")
}

/// The statement shapes, compiled once per parser. Order of use in
/// `parse_line` is the precedence order of the language.
struct Grammar {
    print: Regex,
    assign: Regex,
    if_stmt: Regex,
    while_stmt: Regex,
    for_stmt: Regex,
    else_if: Regex,
    placeholder: Regex,
}

impl Grammar {
    fn new() -> Self {
        Grammar {
            print: re(r"^(println|print)\((.*)\)$"),
            assign: re(r"^(\w+)\s*=\s*(.*)$"),
            if_stmt: re(r"^if (.*):$"),
            while_stmt: re(r"^while (.*):$"),
            for_stmt: re(r"^for (\w+) in range\((.*)\):$"),
            else_if: re(r"^else if (.*):$"),
            placeholder: re(r"<(\w+)>"),
        }
    }
}

pub struct Parser {
    lines: Vec<Line>,
    pos: usize,
    grammar: Grammar,
    /// Names declared so far, across the whole parse. Flat on purpose: a name
    /// declared inside one branch counts as declared in every later line,
    /// including sibling branches that may never run.
    scope: HashSet<String>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::with_scope(source, HashSet::new())
    }

    /// Start a parse with names already marked declared. The REPL uses this
    /// to keep declaration state across inputs.
    pub fn with_scope(source: &str, scope: HashSet<String>) -> Self {
        Parser {
            lines: classify(source),
            pos: 0,
            grammar: Grammar::new(),
            scope,
        }
    }

    /// The parse scope after parsing, for callers that carry it forward.
    pub fn into_scope(self) -> HashSet<String> {
        self.scope
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.parse_block(0)
    }

    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    /// Parse statements until a line dedents below `min_indent` or input
    /// runs out. The boundary line is left unconsumed for the caller.
    fn parse_block(&mut self, min_indent: usize) -> Result<Program, ParseError> {
        let mut body = Vec::new();

        while let Some(line) = self.peek().cloned() {
            if line.indent < min_indent {
                break;
            }
            self.pos += 1;

            let mut stmt = self.parse_line(&line)?;
            match &mut stmt {
                Stmt::If(node) => {
                    node.body = self.parse_block(line.indent + 1)?;
                    self.build_chain(node, line.indent)?;
                }
                Stmt::While(_, block) | Stmt::For(_, _, block) => {
                    *block = self.parse_block(line.indent + 1)?;
                }
                _ => {}
            }
            body.push(stmt);
        }

        Ok(Program { body })
    }

    /// Attach trailing `else if`/`else` clauses to an `if` as one linked
    /// chain. Built iteratively with a tail cursor so an arbitrarily long
    /// chain never recurses. An `else:` ends the chain.
    fn build_chain(&mut self, head: &mut IfStmt, indent: usize) -> Result<(), ParseError> {
        let mut tail = head;
        loop {
            let Some(next) = self.peek().cloned() else {
                break;
            };

            if next.text.starts_with("else if") {
                self.pos += 1;
                let Stmt::If(mut clause) = self.parse_line(&next)? else {
                    return Err(ParseError::UnknownStatement {
                        line: next.number,
                        text: next.text,
                    });
                };
                clause.body = self.parse_block(indent + 1)?;
                tail.alternate = Some(Else::If(Box::new(clause)));
                tail = match tail.alternate.as_mut() {
                    Some(Else::If(node)) => node.as_mut(),
                    _ => unreachable!("alternate was just set to an else-if"),
                };
            } else if next.text.starts_with("else:") {
                self.pos += 1;
                tail.alternate = Some(Else::Block(self.parse_block(indent + 1)?));
                break;
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Convert one trimmed line into one statement. First matching shape
    /// wins; a line matching nothing is a hard parse failure.
    fn parse_line(&mut self, line: &Line) -> Result<Stmt, ParseError> {
        if let Some(caps) = self.grammar.print.captures(&line.text) {
            let expr = self.parse_expression(caps[2].trim());
            return Ok(if &caps[1] == "println" {
                Stmt::PrintLine(expr)
            } else {
                Stmt::Print(expr)
            });
        }

        if line.text.contains('=') {
            if let Some(caps) = self.grammar.assign.captures(&line.text) {
                let name = caps[1].to_string();
                let value = self.parse_expression(caps[2].trim());
                return Ok(if self.scope.insert(name.clone()) {
                    Stmt::VarDecl(name, value)
                } else {
                    Stmt::Assign(name, value)
                });
            }
        }

        if let Some(caps) = self.grammar.if_stmt.captures(&line.text) {
            return Ok(Stmt::If(IfStmt {
                condition: self.parse_expression(caps[1].trim()),
                body: Program { body: Vec::new() },
                alternate: None,
            }));
        }

        if let Some(caps) = self.grammar.while_stmt.captures(&line.text) {
            let condition = self.parse_expression(caps[1].trim());
            return Ok(Stmt::While(condition, Program { body: Vec::new() }));
        }

        if let Some(caps) = self.grammar.for_stmt.captures(&line.text) {
            let name = caps[1].to_string();
            // The loop counter is implicitly declared
            self.scope.insert(name.clone());
            let range = self.parse_expression(caps[2].trim());
            return Ok(Stmt::For(name, range, Program { body: Vec::new() }));
        }

        // Normally consumed by build_chain; reachable for a stray leading
        // `else if`, which then behaves like a plain `if`.
        if let Some(caps) = self.grammar.else_if.captures(&line.text) {
            return Ok(Stmt::If(IfStmt {
                condition: self.parse_expression(caps[1].trim()),
                body: Program { body: Vec::new() },
                alternate: None,
            }));
        }

        Err(ParseError::UnknownStatement {
            line: line.number,
            text: line.text.clone(),
        })
    }

    /// Trial-order expression parsing over raw text. No tokens, no
    /// precedence climbing, no parentheses: each shape is tried in a fixed
    /// order and the first hit wins, so `+` always binds outside `>` and
    /// `<`. Never fails; unclassifiable text becomes an identifier.
    fn parse_expression(&self, expr: &str) -> Expr {
        if expr.contains('+') {
            // Split on the first `+`; the remainder re-joins and recurses,
            // so chained `+` associates to the right.
            let parts: Vec<&str> = expr.split('+').map(str::trim).collect();
            let left = self.parse_expression(parts[0]);
            let right = self.parse_expression(&parts[1..].join("+"));
            return Expr::BinOp(Box::new(left), BinOp::Add, Box::new(right));
        }

        if expr.len() >= 2 && expr.starts_with('"') && expr.ends_with('"') {
            let inner = &expr[1..expr.len() - 1];
            if inner.contains('<') && inner.contains('>') {
                return self.parse_template(inner);
            }
            return Expr::StringLit(inner.to_string());
        }

        if let Ok(n) = expr.parse::<f64>() {
            if n.is_finite() {
                return Expr::NumberLit(n);
            }
        }

        if expr == "True" {
            return Expr::BoolLit(true);
        }
        if expr == "False" {
            return Expr::BoolLit(false);
        }

        if expr.contains('>') {
            // Single split: only the first two segments survive, anything
            // after a second `>` is dropped, exactly as the language ships.
            let parts: Vec<&str> = expr.split('>').collect();
            return Expr::BinOp(
                Box::new(self.parse_expression(parts[0].trim())),
                BinOp::Gt,
                Box::new(self.parse_expression(parts[1].trim())),
            );
        }

        if expr.contains('<') {
            let parts: Vec<&str> = expr.split('<').collect();
            return Expr::BinOp(
                Box::new(self.parse_expression(parts[0].trim())),
                BinOp::Lt,
                Box::new(self.parse_expression(parts[1].trim())),
            );
        }

        Expr::Var(expr.to_string())
    }

    /// Split a string literal's interior on `<name>` placeholders into
    /// alternating literal / identifier parts, in source order.
    fn parse_template(&self, value: &str) -> Expr {
        let mut parts = Vec::new();
        let mut last = 0;

        for m in self.grammar.placeholder.find_iter(value) {
            if m.start() > last {
                parts.push(TemplatePart::Text(value[last..m.start()].to_string()));
            }
            let name = &value[m.start() + 1..m.end() - 1];
            parts.push(TemplatePart::Var(name.to_string()));
            last = m.end();
        }
        if last < value.len() {
            parts.push(TemplatePart::Text(value[last..].to_string()));
        }

        Expr::Template(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse_program().expect("parse failed")
    }

    fn parse_expr(text: &str) -> Expr {
        Parser::new("").parse_expression(text)
    }

    #[test]
    fn first_assignment_declares_then_reassigns() {
        let program = parse("x = 1\nx = 2\n");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[0], Stmt::VarDecl(name, _) if name == "x"));
        assert!(matches!(&program.body[1], Stmt::Assign(name, _) if name == "x"));
    }

    #[test]
    fn declaration_in_branch_marks_name_for_siblings() {
        // Flat whole-parse scope: the `else` branch sees `y` as declared
        // even though the `if` branch may never run.
        let program = parse("if True:\n  y = 1\nelse:\n  y = 2\n");
        let Stmt::If(node) = &program.body[0] else {
            panic!("expected if");
        };
        assert!(matches!(&node.body.body[0], Stmt::VarDecl(..)));
        let Some(Else::Block(block)) = &node.alternate else {
            panic!("expected else block");
        };
        assert!(matches!(&block.body[0], Stmt::Assign(..)));
    }

    #[test]
    fn chain_has_one_link_per_clause() {
        let source = "\
if a > b:
  println(\"1\")
else if b > a:
  println(\"2\")
else if a > c:
  println(\"3\")
else:
  println(\"4\")
";
        let program = parse(source);
        assert_eq!(program.body.len(), 1);
        let Stmt::If(first) = &program.body[0] else {
            panic!("expected if");
        };
        let Some(Else::If(second)) = &first.alternate else {
            panic!("expected first else-if");
        };
        let Some(Else::If(third)) = &second.alternate else {
            panic!("expected second else-if");
        };
        assert!(matches!(third.alternate, Some(Else::Block(_))));
    }

    #[test]
    fn chain_without_else_ends_open() {
        let program = parse("if a > b:\n  x = 1\nelse if b > a:\n  x = 2\n");
        let Stmt::If(first) = &program.body[0] else {
            panic!("expected if");
        };
        let Some(Else::If(second)) = &first.alternate else {
            panic!("expected else-if");
        };
        assert_eq!(second.alternate, None);
    }

    #[test]
    fn dedent_ends_nested_block() {
        let program = parse("while x < 3:\n  x = x + 1\nprintln(x)\n");
        assert_eq!(program.body.len(), 2);
        let Stmt::While(_, body) = &program.body[0] else {
            panic!("expected while");
        };
        assert_eq!(body.body.len(), 1);
        assert!(matches!(program.body[1], Stmt::PrintLine(_)));
    }

    #[test]
    fn for_declares_its_counter() {
        let mut parser = Parser::new("for i in range(5):\n  print(i)\n");
        parser.parse_program().expect("parse failed");
        assert!(parser.into_scope().contains("i"));
    }

    #[test]
    fn unknown_statement_aborts_with_line() {
        let err = Parser::new("x = 1\nwat wat\n").parse_program().unwrap_err();
        let ParseError::UnknownStatement { line, text } = err;
        assert_eq!(line, 2);
        assert_eq!(text, "wat wat");
    }

    #[test]
    fn plus_chains_to_the_right() {
        let expr = parse_expr("a + b + c");
        let Expr::BinOp(left, BinOp::Add, right) = expr else {
            panic!("expected add");
        };
        assert_eq!(*left, Expr::Var("a".to_string()));
        assert!(matches!(*right, Expr::BinOp(_, BinOp::Add, _)));
    }

    #[test]
    fn plus_binds_outside_comparison() {
        // Trial order, not precedence: `+` is tried first, so the
        // comparison ends up nested on the right.
        let expr = parse_expr("\"a\" + 1 > 2");
        let Expr::BinOp(left, BinOp::Add, right) = expr else {
            panic!("expected add at the root");
        };
        assert_eq!(*left, Expr::StringLit("a".to_string()));
        assert!(matches!(*right, Expr::BinOp(_, BinOp::Gt, _)));
    }

    #[test]
    fn comparison_split_drops_extra_segments() {
        let expr = parse_expr("a>b>c");
        let Expr::BinOp(left, BinOp::Gt, right) = expr else {
            panic!("expected gt");
        };
        assert_eq!(*left, Expr::Var("a".to_string()));
        assert_eq!(*right, Expr::Var("b".to_string()));
    }

    #[test]
    fn literal_classification() {
        assert_eq!(parse_expr("10"), Expr::NumberLit(10.0));
        assert_eq!(parse_expr("1.5"), Expr::NumberLit(1.5));
        assert_eq!(parse_expr("True"), Expr::BoolLit(true));
        assert_eq!(parse_expr("False"), Expr::BoolLit(false));
        assert_eq!(parse_expr("\"hi\""), Expr::StringLit("hi".to_string()));
        assert_eq!(parse_expr("name"), Expr::Var("name".to_string()));
    }

    #[test]
    fn template_splits_into_three_parts() {
        let expr = parse_expr("\"Hello, <name>!\"");
        assert_eq!(
            expr,
            Expr::Template(vec![
                TemplatePart::Text("Hello, ".to_string()),
                TemplatePart::Var("name".to_string()),
                TemplatePart::Text("!".to_string()),
            ])
        );
    }

    #[test]
    fn template_with_adjacent_placeholders() {
        let expr = parse_expr("\"<a><b>\"");
        assert_eq!(
            expr,
            Expr::Template(vec![
                TemplatePart::Var("a".to_string()),
                TemplatePart::Var("b".to_string()),
            ])
        );
    }

    #[test]
    fn angle_brackets_without_placeholder_stay_literal() {
        // Contains both < and > but nothing matching <word>, so the scan
        // yields a single literal part.
        let expr = parse_expr("\"a < b >\"");
        assert_eq!(
            expr,
            Expr::Template(vec![TemplatePart::Text("a < b >".to_string())])
        );
    }

    #[test]
    fn stray_else_if_parses_as_plain_if() {
        let program = parse("else if x > 1:\n  println(x)\n");
        assert!(matches!(&program.body[0], Stmt::If(node) if node.alternate.is_none()));
    }
}
