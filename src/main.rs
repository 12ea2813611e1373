mod ast;
mod codegen;
mod interpreter;
mod lexer;
mod parser;
mod repl;

use interpreter::Interpreter;
use parser::Parser;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

pub const VERSION: &str = "0.1.0";

fn print_help() {
    println!(
        r#"nova - The NovaScript Interpreter v{}

NovaScript is a small indentation-sensitive language: blocks are made by
indenting, the first assignment to a name declares it, and string literals
interpolate <name> placeholders.

USAGE:
    nova                    Start the REPL (interactive mode)
    nova <file.nova>        Run a NovaScript program
    nova -e "code"          Execute code directly
    nova -                  Read and execute code from stdin
    nova [OPTIONS]

OPTIONS:
    -h, --help          Print this help message
    -v, --version       Print version information
    -i, --repl          Start the REPL (interactive mode)
    -e <code>           Execute code directly
    --emit-js           Print the generated JavaScript instead of running

EXAMPLE:
    nova -e 'println("Hello, World!")'

    x = 10                  # first assignment declares
    x = x + 1               # later assignments rebind
    println("x is <x>")     # templates splice variables

FEATURES:
    - Statements: print, println, assignment, if/else if/else, while, for
    - Expressions: +, > and < with a fixed trial order (no parentheses)
    - Literals: numbers, "strings", True, False, "<name> templates"
    - Comments: # to end of line
    - for i in range(n): counts i from 0 to n - 1
"#,
        VERSION
    );
}

fn run_file(filename: &str, emit: bool) {
    let source = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };

    run_source(&source, emit);
}

fn run_source(source: &str, emit: bool) {
    let mut parser = Parser::new(source);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    };

    if emit {
        println!("{}", codegen::transpile(&program));
        return;
    }

    let mut interpreter = Interpreter::new();
    if let Err(e) = interpreter.run(&program) {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}

fn run_stdin(emit: bool) {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error reading stdin: {}", e);
        process::exit(1);
    }

    run_source(&source, emit);
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // --emit-js can appear anywhere
    let emit = args.iter().any(|arg| arg == "--emit-js");
    let args: Vec<String> = args.into_iter().filter(|arg| arg != "--emit-js").collect();

    // No arguments - start REPL
    if args.len() < 2 {
        repl::run_repl();
        return;
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            print_help();
        }
        "-v" | "--version" => {
            println!("nova {}", VERSION);
        }
        "-i" | "--repl" => {
            repl::run_repl();
        }
        "-e" => {
            if args.len() < 3 {
                eprintln!("Error: -e requires code argument");
                eprintln!("Usage: nova -e 'println(\"Hello\")'");
                process::exit(1);
            }
            run_source(&args[2], emit);
        }
        "-" => {
            run_stdin(emit);
        }
        filename => {
            run_file(filename, emit);
        }
    }
}
