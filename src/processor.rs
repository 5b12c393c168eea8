use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use crate::ast::*;
use crate::error::ExecError;

const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// An operation callable from scripts by name.
pub trait Builtin {
    fn call(&self, args: &[String], out: &mut dyn Write) -> io::Result<()>;
}

impl<F> Builtin for F
where
    F: Fn(&[String], &mut dyn Write) -> io::Result<()>,
{
    fn call(&self, args: &[String], out: &mut dyn Write) -> io::Result<()> {
        self(args, out)
    }
}

/// Writes all arguments back to back, then a newline.
pub struct Print;

impl Builtin for Print {
    fn call(&self, args: &[String], out: &mut dyn Write) -> io::Result<()> {
        for arg in args {
            out.write_all(arg.as_bytes())?;
        }
        writeln!(out)
    }
}

/// Like [`Print`], highlighted in yellow.
pub struct Warn;

impl Builtin for Warn {
    fn call(&self, args: &[String], out: &mut dyn Write) -> io::Result<()> {
        out.write_all(YELLOW.as_bytes())?;
        Print.call(args, out)?;
        out.write_all(RESET.as_bytes())
    }
}

/// Registry of builtin operations, keyed by the name scripts call them with
#[derive(Default)]
pub struct BuiltinRegistry(HashMap<String, Box<dyn Builtin>>);

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `print` and `warn`
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.define("print", Print);
        registry.define("warn", Warn);
        registry
    }

    /// Register a builtin, replacing any previous one with the same name
    pub fn define(&mut self, name: impl Into<String>, builtin: impl Builtin + 'static) {
        self.0.insert(name.into(), Box::new(builtin));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Builtin> {
        self.0.get(name).map(|builtin| builtin.as_ref())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BuiltinRegistry").field(&self.names()).finish()
    }
}

/// What a completed run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Calls dispatched to a builtin
    pub calls: usize,
    /// Names called but not registered, in call order
    pub unresolved: Vec<String>,
}

/// Walks a parsed forest and dispatches calls to the registry
pub struct Executor<'r> {
    registry: &'r BuiltinRegistry,
}

impl<'r> Executor<'r> {
    pub fn new(registry: &'r BuiltinRegistry) -> Self {
        Self { registry }
    }

    /// Execute top-level nodes in order, writing builtin output to `out`
    pub fn run<W: Write>(&self, forest: &[Node], out: &mut W) -> Result<Outcome, ExecError> {
        let mut outcome = Outcome::default();
        for node in forest {
            self.execute(node, out, &mut outcome)?;
        }
        out.flush()?;
        Ok(outcome)
    }

    fn execute<W: Write>(
        &self,
        node: &Node,
        out: &mut W,
        outcome: &mut Outcome,
    ) -> Result<(), ExecError> {
        match node {
            Node::FunctionCall(call) => self.execute_call(call, out, outcome),
            Node::DoBlock(_) => Err(ExecError::UnsupportedNode(node.kind())),
        }
    }

    fn execute_call<W: Write>(
        &self,
        call: &FunctionCall,
        out: &mut W,
        outcome: &mut Outcome,
    ) -> Result<(), ExecError> {
        match self.registry.get(&call.name) {
            Some(builtin) => {
                builtin.call(&call.arguments, out)?;
                outcome.calls += 1;
            }
            None => {
                writeln!(out, "Error: Function '{}' not found.", call.name)?;
                outcome.unresolved.push(call.name.clone());
            }
        }
        Ok(())
    }
}
