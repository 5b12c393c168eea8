//! # moonlet
//!
//! A tiny Lua-flavoured script runner: source text is lexed, parsed into a
//! forest of [`ast::Node`]s, and walked once, calling named builtins such as
//! `print` and `warn`.
//!
//! ```text
//! warn('Hello!', 'World!')
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod processor;

use std::io::Write;

pub use error::Error;
pub use processor::{BuiltinRegistry, Executor, Outcome};

/// Lex, parse and execute `source` in one pass.
pub fn run<W: Write>(source: &str, registry: &BuiltinRegistry, out: &mut W) -> Result<Outcome, Error> {
    let forest = parser::Parser::parse_source(source)?;
    Ok(Executor::new(registry).run(&forest, out)?)
}
