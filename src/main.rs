use sapling::{init_tracing, parse, repl, write_stats, Interpreter, VERSION};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

fn print_help() {
    println!(
        r#"sapling - a tree-walking interpreter v{}

USAGE:
    sapling                 Read a program from stdin and run it
    sapling <file>          Run the program in <file>
    sapling -               Read the program from stdin (same as no file)
    sapling [OPTIONS] [file]

OPTIONS:
    -h, --help          Print this help message
    -v, --version       Print version information
    -i, --repl          Start the REPL (interactive mode)
    -s, --stats         Print leaf, identifier and string counts before running
    --dump-ast          Print the syntax tree instead of running

LANGUAGE:
    x = 3 + 4;                  Assignment (any expression is a statement)
    print x;                    Print a value and a newline
    if x > 5 then print "big";  Conditional, no else
    Values: integers, "strings", true/false
    Operators: + - * / == != < <= > >= && ||
    # starts a comment

ENVIRONMENT:
    RUST_LOG            Enable diagnostics, e.g. RUST_LOG=sapling=trace
"#,
        VERSION
    );
}

#[derive(Default)]
struct Options {
    stats: bool,
    dump_ast: bool,
    files: Vec<String>,
}

fn read_source(files: &[String]) -> String {
    match files.first().filter(|path| path.as_str() != "-") {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(%path, error = %e, "cannot read program file");
                eprintln!("CANNOT OPEN {}", path);
                process::exit(1);
            }
        },
        None => {
            let mut source = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut source) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            source
        }
    }
}

fn run_program(options: &Options) {
    let source = read_source(&options.files);

    // Parse errors are reported here; they are not a failed run.
    let program = match parse(&source) {
        Ok(prog) => prog,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(0);
        }
    };

    if options.dump_ast {
        print!("{}", program);
        return;
    }

    if options.stats {
        if let Err(e) = write_stats(&program, &mut io::stdout()) {
            eprintln!("Error writing stats: {}", e);
            process::exit(1);
        }
    }

    let mut interpreter = Interpreter::new();
    if let Err(e) = interpreter.run(&program) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn main() {
    init_tracing();

    let mut options = Options::default();
    let mut start_repl = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                println!("sapling {}", VERSION);
                return;
            }
            "-i" | "--repl" => start_repl = true,
            "-s" | "--stats" => options.stats = true,
            "--dump-ast" => options.dump_ast = true,
            "-" => options.files.push(arg),
            flag if flag.starts_with('-') => {
                eprintln!("UNRECOGNIZED FLAG {}", flag);
                process::exit(1);
            }
            _ => options.files.push(arg),
        }
    }

    if options.files.len() > 1 {
        eprintln!("TOO MANY FILENAMES");
        process::exit(1);
    }

    if start_repl {
        repl::run_repl();
        return;
    }

    run_program(&options);
}
