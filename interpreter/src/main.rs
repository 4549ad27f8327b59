use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use anyhow::{bail, Context};
use clap::Parser;
use foxlite::{parse, Interpreter, Repl};
use foxlite_core::Lexer;
use tracing::info;

/// FoxLite, a small interpreter for a FoxPro flavoured scripting language.
///
/// Runs FILE when given, otherwise starts an interactive prompt.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file to run.
    file: Option<PathBuf>,

    /// Print the tokens of FILE instead of running it.
    #[arg(long, requires = "file", conflicts_with = "ast")]
    tokens: bool,

    /// Print the parsed program of FILE instead of running it.
    #[arg(long, requires = "file")]
    ast: bool,

    /// Maximum number of nested function calls.
    #[arg(long, default_value_t = foxlite::limits::MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Log interpreter activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match &args.file {
        Some(path) if args.tokens => dump_tokens(path),
        Some(path) if args.ast => dump_ast(path),
        Some(path) => {
            if !run_file(path, args.max_depth)? {
                process::exit(65);
            }
            Ok(())
        }
        None => run_prompt(args.max_depth),
    }
}

// RUST_LOG takes precedence over --verbose
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("foxlite=debug")
    } else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn dump_tokens(path: &Path) -> anyhow::Result<()> {
    let src = read_source(path)?;
    let mut lexer = Lexer::new(&src);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for token in lexer.by_ref() {
        writeln!(out, "{}", token)?;
    }

    if let Some(err) = lexer.error() {
        bail!("[line {}] lexical error: {}", err.line(), err);
    }
    Ok(())
}

fn dump_ast(path: &Path) -> anyhow::Result<()> {
    let src = read_source(path)?;
    match parse(&src) {
        Ok(program) => {
            print!("{}", program);
            Ok(())
        }
        Err(errs) => {
            for err in &errs {
                eprintln!("{}", err);
            }
            bail!("{} error(s) in {}", errs.len(), path.display())
        }
    }
}

// Returns whether the program ran without errors
fn run_file(path: &Path, max_depth: usize) -> anyhow::Result<bool> {
    let src = read_source(path)?;
    info!(path = %path.display(), "running file");

    let program = match parse(&src) {
        Ok(program) => program,
        Err(errs) => {
            for err in errs {
                eprintln!("{}", err);
            }
            return Ok(false);
        }
    };

    let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(io::stdout()));
    let mut interpreter = Interpreter::new(stdout).max_call_depth(max_depth);
    match interpreter.interpret(&program) {
        Ok(_) => Ok(true),
        Err(err) => {
            eprintln!("{}", err);
            Ok(false)
        }
    }
}

fn run_prompt(max_depth: usize) -> anyhow::Result<()> {
    println!(
        "FoxLite {}. Type 'quit' to exit, end a line with ';' to continue it.",
        env!("CARGO_PKG_VERSION")
    );

    let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(io::stdout()));
    let interpreter = Interpreter::new(Rc::clone(&stdout)).max_call_depth(max_depth);
    let mut repl = Repl::with_interpreter(interpreter, stdout);

    let stdin = io::stdin();
    repl.run(stdin.lock()).context("failed to read input")?;
    println!();
    Ok(())
}
