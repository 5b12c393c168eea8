use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use colored::Colorize;
use moonlet::ast::Node;
use moonlet::lexer::tokenize;
use moonlet::parser::Parser;
use moonlet::{BuiltinRegistry, Error, Executor};

const SAMPLE_PROGRAM: &str = "warn('Hello!', 'World!')";

#[derive(clap::Parser)]
#[command(version, about = "Run a moonlet script", long_about = None)]
struct Args {
    /// Script file to run
    file: Option<PathBuf>,

    /// Run this source text instead of a file
    #[arg(short, long, conflicts_with = "file")]
    eval: Option<String>,

    /// Print the token stream and exit
    #[arg(long)]
    tokens: bool,

    /// Print the parsed tree and exit
    #[arg(long, conflicts_with = "tokens")]
    ast: bool,

    /// Maximum nesting depth of `do` blocks
    #[arg(long, default_value_t = 100)]
    max_depth: usize,

    /// Report progress of each stage on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match load_source(&args) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn load_source(args: &Args) -> io::Result<String> {
    match (&args.eval, &args.file) {
        (Some(source), _) => Ok(source.clone()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| io::Error::new(e.kind(), format!("failed to read {}: {}", path.display(), e))),
        (None, None) => Ok(SAMPLE_PROGRAM.to_string()),
    }
}

fn run(args: &Args, source: &str) -> Result<(), Error> {
    let tokens = tokenize(source)?;
    if args.verbose {
        eprintln!("{} {} tokens", "lexed".cyan(), tokens.len());
    }

    if args.tokens {
        let mut stdout = io::stdout().lock();
        for token in tokens.iter() {
            writeln!(stdout, "Token: '{}', Type: {}", token.text, token.kind)
                .map_err(|e| Error::Exec(e.into()))?;
        }
        return Ok(());
    }

    let forest: Vec<Node> = Parser::new(tokens)
        .with_max_depth(args.max_depth)
        .parse_program()?;
    if args.verbose {
        eprintln!("{} {} top-level nodes", "parsed".cyan(), forest.len());
    }

    if args.ast {
        println!("{forest:#?}");
        return Ok(());
    }

    let registry = BuiltinRegistry::standard();
    let outcome = Executor::new(&registry).run(&forest, &mut io::stdout().lock())?;
    if args.verbose {
        eprintln!("{} {} calls", "executed".cyan(), outcome.calls);
        for name in &outcome.unresolved {
            eprintln!("{} unresolved function '{}'", "warning:".yellow(), name);
        }
    }
    Ok(())
}
