use crate::ast::{Node, NodeKind};
use crate::interpreter::Interpreter;
use crate::parser::parse;
use crate::value::Value;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::fs;
use std::io::{self, Write};

pub fn run_repl() {
    println!("sapling REPL v{}", crate::VERSION);
    println!("Statements end with ';'. Type .help for commands, .exit to quit.\n");

    if let Err(e) = repl_loop() {
        eprintln!("REPL error: {}", e);
    }
}

fn repl_loop() -> RlResult<()> {
    let mut rl = DefaultEditor::new()?;
    let mut interpreter = Interpreter::new();
    let mut input_buffer = String::new();

    let history_path = dirs_history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if input_buffer.is_empty() { "sapling> " } else { "...> " };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if input_buffer.is_empty() && trimmed.starts_with('.') {
                    rl.add_history_entry(&line)?;
                    if handle_command(trimmed, &mut interpreter) == Command::Exit {
                        break;
                    }
                    continue;
                }

                input_buffer.push_str(&line);
                input_buffer.push('\n');

                if !is_complete(&input_buffer) {
                    continue;
                }

                let input = input_buffer.trim();
                if !input.is_empty() {
                    rl.add_history_entry(input)?;
                    execute_input(&mut interpreter, input);
                }
                input_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                input_buffer.clear();
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

fn dirs_history_path() -> Option<String> {
    dirs::home_dir().map(|mut path| {
        path.push(".sapling_history");
        path.to_string_lossy().to_string()
    })
}

/// An input is ready to run once its last non-comment text ends with `;`.
pub fn is_complete(input: &str) -> bool {
    input
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .last()
        .map_or(true, |line| line.ends_with(';'))
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Continue,
    Exit,
}

fn handle_command<W: Write>(cmd: &str, interpreter: &mut Interpreter<W>) -> Command {
    let (command, arg) = match cmd.split_once(' ') {
        Some((command, arg)) => (command, Some(arg.trim())),
        None => (cmd, None),
    };

    match command {
        ".exit" | ".quit" | ".q" => {
            println!("Goodbye!");
            return Command::Exit;
        }
        ".help" | ".h" => print_repl_help(),
        ".clear" => {
            interpreter.environment_mut().clear();
            println!("State cleared.");
        }
        ".vars" => print_variables(interpreter),
        ".stats" => match arg {
            Some(code) => match parse(code) {
                Ok(program) => {
                    if let Err(e) = crate::write_stats(&program, &mut io::stdout()) {
                        eprintln!("Error: {}", e);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            None => eprintln!("Usage: .stats <code>"),
        },
        ".load" => match arg {
            Some(filename) => load_file(interpreter, filename),
            None => eprintln!("Usage: .load <filename>"),
        },
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Type .help for available commands.");
        }
    }

    Command::Continue
}

fn load_file<W: Write>(interpreter: &mut Interpreter<W>, filename: &str) {
    match fs::read_to_string(filename) {
        Ok(source) => execute_input(interpreter, &source),
        Err(_) => eprintln!("CANNOT OPEN {}", filename),
    }
}

/// Run every statement of `input`, echoing the value of bare expressions.
/// Errors are printed and the session keeps its bindings.
pub fn execute_input<W: Write>(interpreter: &mut Interpreter<W>, input: &str) {
    let program = match parse(input) {
        Ok(prog) => prog,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let mut list = Some(&program);
    while let Some(node) = list.filter(|n| n.kind == NodeKind::StmtList) {
        if let Some(stmt) = node.left() {
            match interpreter.eval(stmt) {
                Ok(value) if echoes(stmt, &value) => println!("=> {}", value),
                Ok(_) => {}
                Err(e) => {
                    eprintln!("{}", e);
                    return;
                }
            }
        }
        list = node.right();
    }
}

fn echoes(stmt: &Node, value: &Value) -> bool {
    !value.is_empty()
        && !matches!(
            stmt.kind,
            NodeKind::PrintStatement | NodeKind::IfStatement | NodeKind::Assignment
        )
}

fn print_repl_help() {
    println!(
        r#"
REPL Commands:
    .help, .h          Show this help message
    .exit, .quit, .q   Exit the REPL
    .clear             Forget all variables
    .vars              Show all variables
    .stats <code>      Show leaf, identifier and string counts for <code>
    .load <file>       Run a file in this session

Navigation:
    Up/Down arrows     Navigate command history
    Ctrl-C             Cancel current input
    Ctrl-D             Exit REPL

Examples:
    x = 3 + 4;         Assign
    print x;           Print value
    x * 2;             Show a value without printing it
    if x > 5 then print "big";

Tips:
    - Input continues until a line ends with ';'
    - Variables persist across inputs
    - History is saved to ~/.sapling_history
"#
    );
}

fn print_variables<W: Write>(interpreter: &Interpreter<W>) {
    let env = interpreter.environment();
    if env.is_empty() {
        println!("No variables defined.");
        return;
    }

    println!("Variables:");
    for (name, value) in env.iter() {
        println!("  {}", describe_variable(name, value));
    }
}

/// `name = value (type)`, with strings shown quoted.
fn describe_variable(name: &str, value: &Value) -> String {
    let shown = match value.as_str() {
        Some(s) => format!("\"{}\"", s),
        None => value.to_string(),
    };
    format!("{} = {} ({})", name, shown, value.value_type())
}
