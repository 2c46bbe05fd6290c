//! A tree-walking interpreter for a small Lox-like scripting language.
//!
//! Source text flows through [`scanner::Scanner`] into tokens, through
//! [`parser::Parser`] into statements, and is executed by
//! [`interpreter::Interpreter`] against a chain of scopes.

mod callable;
pub mod environment;
pub mod error;
mod expr;
pub mod interpreter;
pub mod parser;
pub mod printer;
pub mod scanner;
mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

pub use crate::{
    error::{Error, ErrorKind, Result},
    stmt::Stmt,
};
use crate::{interpreter::Interpreter, parser::Parser, scanner::Scanner};

/// Stack size the `lox` binary runs programs on. Deep recursion in a script,
/// up to the interpreter's call-depth limit, fits within it.
pub const STACK_SIZE: usize = 256 * 1024 * 1024;

/// Scans and parses a whole program.
pub fn parse(source: &str) -> Result<Vec<Stmt>> {
    let tokens = Scanner::new(source).scan_tokens()?;
    Parser::new(tokens.into_iter()).parse()
}

/// Runs one program against a fresh global scope, writing `print` output
/// to `writer`. The first lexical, syntax or runtime error aborts the run.
///
/// Deeply nested or deeply recursive programs need more than the default
/// thread stack; run them on a thread with [`STACK_SIZE`] bytes of stack.
pub fn run<W: Write>(source: &str, writer: W) -> Result<()> {
    let statements = parse(source)?;
    Interpreter::new(writer).interpret(&statements)
}
