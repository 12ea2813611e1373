use crate::codegen::transpile;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::collections::HashSet;
use std::fs;
use std::io;

const BANNER: &str = r#"
  _   _
 | \ | | _____   ____ _
 |  \| |/ _ \ \ / / _` |
 | |\  | (_) \ V / (_| |
 |_| \_|\___/ \_/ \__,_|

"#;

/// Everything that persists between REPL inputs: interpreter globals, the
/// parse scope (so reassignments keep working across lines), and the
/// JavaScript generated for the last input.
struct Session {
    interpreter: Interpreter<io::Stdout>,
    scope: HashSet<String>,
    last_js: String,
}

impl Session {
    fn new() -> Self {
        Session {
            interpreter: Interpreter::new(),
            scope: HashSet::new(),
            last_js: String::new(),
        }
    }
}

pub fn run_repl() {
    println!("{}", BANNER);
    println!("NovaScript REPL v{}", crate::VERSION);
    println!("Blocks: end a line with ':', then indent; a blank line runs the block.");
    println!("Type .help for commands, .exit to quit.\n");

    if let Err(e) = repl_loop() {
        eprintln!("REPL error: {}", e);
    }
}

fn repl_loop() -> RlResult<()> {
    let mut rl = DefaultEditor::new()?;
    let mut session = Session::new();
    let mut input_buffer = String::new();
    let mut in_block = false;

    // Try to load history
    let history_path = dirs_history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if in_block { "...> " } else { "nova> " };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                // Handle REPL commands (only when not inside a block)
                if !in_block && trimmed.starts_with('.') {
                    rl.add_history_entry(&line)?;

                    if handle_command(trimmed, &mut session) {
                        // Command requested exit
                        break;
                    }
                    continue;
                }

                if in_block {
                    if trimmed.is_empty() {
                        // A blank line closes the block and runs it
                        in_block = false;
                        let input = input_buffer.trim_end().to_string();
                        input_buffer.clear();
                        if !input.is_empty() {
                            rl.add_history_entry(&input)?;
                            execute_input(&mut session, &input);
                        }
                    } else {
                        input_buffer.push_str(&line);
                        input_buffer.push('\n');
                    }
                    continue;
                }

                // A trailing ':' opens an indented block
                if trimmed.ends_with(':') {
                    in_block = true;
                    input_buffer.push_str(&line);
                    input_buffer.push('\n');
                    continue;
                }

                if !trimmed.is_empty() {
                    rl.add_history_entry(&line)?;
                    execute_input(&mut session, &line);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C: clear current input
                println!("^C");
                input_buffer.clear();
                in_block = false;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D: exit
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    // Save history
    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

fn dirs_history_path() -> Option<String> {
    dirs::home_dir().map(|mut path| {
        path.push(".nova_history");
        path.to_string_lossy().to_string()
    })
}

/// Handle a REPL command. Returns true if the REPL should exit.
fn handle_command(cmd: &str, session: &mut Session) -> bool {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let command = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match command {
        ".exit" | ".quit" | ".q" => {
            println!("Goodbye!");
            return true;
        }
        ".help" | ".h" => {
            print_repl_help();
        }
        ".clear" => {
            *session = Session::new();
            println!("State cleared.");
        }
        ".vars" => {
            print_variables(session);
        }
        ".js" => {
            if session.last_js.is_empty() {
                println!("Nothing executed yet.");
            } else {
                println!("{}", session.last_js);
            }
        }
        ".load" => {
            if let Some(filename) = arg {
                load_file(session, filename);
            } else {
                eprintln!("Usage: .load <filename>");
            }
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Type .help for available commands.");
        }
    }

    false
}

fn load_file(session: &mut Session, filename: &str) {
    match fs::read_to_string(filename) {
        Ok(source) => execute_input(session, &source),
        Err(e) => eprintln!("Error reading file '{}': {}", filename, e),
    }
}

fn execute_input(session: &mut Session, input: &str) {
    // A failed parse must leave the session untouched, so the parser gets a
    // copy of the scope and only a successful parse writes it back.
    let mut parser = Parser::with_scope(input, session.scope.clone());
    match parser.parse_program() {
        Ok(program) => {
            session.scope = parser.into_scope();
            session.last_js = transpile(&program);
            if let Err(e) = session.interpreter.run(&program) {
                eprintln!("Runtime error: {}", e);
                session.interpreter.reset_scopes();
            }
        }
        Err(e) => {
            eprintln!("{}", e);
        }
    }
}

fn print_repl_help() {
    println!(
        r#"
REPL Commands:
    .help, .h          Show this help message
    .exit, .quit, .q   Exit the REPL
    .clear             Clear all variables
    .vars              Show all defined variables
    .js                Show the JavaScript generated for the last input
    .load <file>       Load and run a .nova file

Navigation:
    Up/Down arrows     Navigate command history
    Ctrl-C             Cancel current input
    Ctrl-D             Exit REPL

Examples:
    x = 5              First assignment declares a variable
    x = x + 1          Later assignments rebind it
    println("x is <x>")
                       Templates splice variables into strings

    for i in range(3):
      println(i)
                       End the line with ':', indent the body,
                       then enter a blank line to run the block

Tips:
    - Variables persist across inputs
    - History is saved to ~/.nova_history
    - Use .clear to start fresh
"#
    );
}

fn print_variables(session: &Session) {
    let globals = &session.interpreter.scopes[0];
    if globals.is_empty() {
        println!("No variables defined.");
        return;
    }

    println!("Variables:");
    let mut names: Vec<_> = globals.keys().collect();
    names.sort();
    for name in names {
        println!("  {} = {}", name, globals[name]);
    }
}
