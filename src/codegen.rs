use crate::ast::*;

/// Lower a program to JavaScript source text. Pure and deterministic: the
/// same AST always yields byte-identical output. The generated code calls
/// exactly two primitives, `_print` and `_println`, which the evaluation
/// harness must supply.
pub fn transpile(program: &Program) -> String {
    gen_program(program)
}

fn gen_program(program: &Program) -> String {
    program
        .body
        .iter()
        .map(gen_stmt)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn gen_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Print(expr) => format!("_print({});", gen_expr(expr)),
        Stmt::PrintLine(expr) => format!("_println({});", gen_expr(expr)),
        Stmt::VarDecl(name, value) => format!("let {} = {};", name, gen_expr(value)),
        Stmt::Assign(name, value) => format!("{} = {};", name, gen_expr(value)),
        Stmt::If(node) => gen_if(node),
        Stmt::While(condition, body) => {
            format!("while ({}) {{\n{}\n}}", gen_expr(condition), gen_program(body))
        }
        Stmt::For(variable, range, body) => format!(
            "for (let {v} = 0; {v} < {r}; {v}++) {{\n{b}\n}}",
            v = variable,
            r = gen_expr(range),
            b = gen_program(body)
        ),
    }
}

fn gen_if(node: &IfStmt) -> String {
    let condition = gen_expr(&node.condition);
    let consequent = gen_program(&node.body);
    let alternate = match &node.alternate {
        Some(Else::If(next)) => format!(" else {}", gen_if(next)),
        Some(Else::Block(block)) => format!(" else {}", gen_program(block)),
        None => String::new(),
    };
    // An empty body drops the braces entirely
    let body_block = if consequent.is_empty() {
        String::new()
    } else {
        format!("{{\n{}\n}}", consequent)
    };
    format!("if ({}) {}{}", condition, body_block, alternate)
}

fn gen_expr(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) => name.clone(),
        Expr::NumberLit(n) => n.to_string(),
        Expr::StringLit(s) => quote(s),
        Expr::BoolLit(b) => b.to_string(),
        // Fully parenthesized so the naive parse grouping survives lowering
        Expr::BinOp(left, op, right) => {
            format!("({} {} {})", gen_expr(left), op, gen_expr(right))
        }
        Expr::Template(parts) => {
            let mut out = String::from("`");
            for part in parts {
                match part {
                    TemplatePart::Text(text) => out.push_str(&text.replace('`', "\\`")),
                    TemplatePart::Var(name) => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
            }
            out.push('`');
            out
        }
    }
}

/// Double-quoted JavaScript string literal with the usual escapes.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn lower(source: &str) -> String {
        let program = Parser::new(source).parse_program().expect("parse failed");
        transpile(&program)
    }

    #[test]
    fn declarations_and_assignments() {
        assert_eq!(lower("x = 10\nx = x + 1\n"), "let x = 10;\nx = (x + 1);");
    }

    #[test]
    fn print_statements_call_the_runtime_primitives() {
        assert_eq!(lower("print(\"a\")\nprintln(x)\n"), "_print(\"a\");\n_println(x);");
    }

    #[test]
    fn binary_expressions_are_fully_parenthesized() {
        assert_eq!(lower("z = a + b + c\n"), "let z = (a + (b + c));");
        assert_eq!(lower("cmp = a > b\n"), "let cmp = (a > b);");
    }

    #[test]
    fn empty_if_body_omits_the_braces() {
        let js = lower("if x > 5:\nprintln(x)\n");
        assert_eq!(js, "if ((x > 5)) \n_println(x);");
    }

    #[test]
    fn if_chain_lowers_to_nested_else() {
        let source = "\
x = 10
y = 20
if x > y:
  println(\"x is greater\")
else if y > x:
  println(\"y is greater\")
else:
  println(\"equal\")
";
        let expected = "\
let x = 10;
let y = 20;
if ((x > y)) {
_println(\"x is greater\");
} else if ((y > x)) {
_println(\"y is greater\");
} else _println(\"equal\");";
        assert_eq!(lower(source), expected);
    }

    #[test]
    fn for_lowers_to_a_counted_loop() {
        let js = lower("for i in range(5):\n  print(i)\n");
        assert_eq!(js, "for (let i = 0; i < 5; i++) {\n_print(i);\n}");
    }

    #[test]
    fn while_keeps_braces_even_when_empty() {
        assert_eq!(lower("while x < 3:\n"), "while ((x < 3)) {\n\n}");
    }

    #[test]
    fn template_lowers_to_backtick_interpolation() {
        let js = lower("println(\"Hello, <name>!\")\n");
        assert_eq!(js, "_println(`Hello, ${name}!`);");
    }

    #[test]
    fn template_literal_backticks_are_escaped() {
        let js = lower("println(\"a`b<x>\")\n");
        assert_eq!(js, "_println(`a\\`b${x}`);");
    }

    #[test]
    fn booleans_lower_case_and_numbers_stay_short() {
        assert_eq!(lower("t = True\n"), "let t = true;");
        assert_eq!(lower("n = 1.5\n"), "let n = 1.5;");
        assert_eq!(lower("m = 10\n"), "let m = 10;");
    }

    #[test]
    fn generation_is_deterministic() {
        let program = Parser::new("x = 1\nif x > 0:\n  println(\"<x>\")\n")
            .parse_program()
            .expect("parse failed");
        assert_eq!(transpile(&program), transpile(&program));
    }
}
