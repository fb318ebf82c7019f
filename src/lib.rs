//! sapling - a tree-walking interpreter for a small imperative language.
//!
//! Programs are statements terminated by `;`: assignments, `print`, and
//! `if <expr> then <stmt>`, over integers, strings and booleans.

pub mod ast;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod stack;
pub mod value;

pub use ast::{Node, NodeKind, NodeType};
pub use environment::Environment;
pub use interpreter::{ErrorKind, Interpreter, RuntimeError};
pub use parser::{parse, ParseError};
pub use value::{Value, ValueError, ValueType};

use std::io::Write;
use std::sync::Once;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Anything that can stop a program: a syntax error or a runtime error.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Parse and evaluate `source`, printing to stdout.
pub fn run(source: &str) -> Result<(), Error> {
    let program = parse(source)?;
    Interpreter::new().run(&program)?;
    Ok(())
}

/// Parse and evaluate `source`, printing to `out`.
///
/// Output written before a runtime error stays in `out`.
pub fn run_with_output<W: Write>(source: &str, out: W) -> Result<(), Error> {
    let program = parse(source)?;
    Interpreter::with_output(out).run(&program)?;
    Ok(())
}

/// Tree statistics printed by `--stats` and the REPL's `.stats`.
pub fn write_stats<W: Write>(program: &Node, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "LEAF COUNT: {}", program.leaf_count())?;
    writeln!(out, "IDENT COUNT: {}", program.ident_count())?;
    writeln!(out, "STRING COUNT: {}", program.string_count())?;
    let vars = program.vars();
    if !vars.is_empty() {
        writeln!(out, "VARIABLES:")?;
        for (name, count) in &vars {
            writeln!(out, "{}: {}", name, count)?;
        }
    }
    Ok(())
}

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Safe to call more than once. Nothing is logged unless `RUST_LOG` is set,
/// e.g. `RUST_LOG=sapling=trace`. Logs go to stderr.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
