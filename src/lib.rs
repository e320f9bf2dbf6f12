//! Monkey is a small, dynamically typed scripting language with first-class
//! functions, lexical closures, integers, booleans, strings, arrays and hash
//! maps. This crate implements it as a tree-walk interpreter with a
//! hand-written lexer and a Pratt (top-down operator precedence) parser.
//!
//! Source text flows strictly left to right through three stages:
//!
//! ```text
//! source text -> Lexer -> tokens -> Parser -> Program -> Evaluator -> Value
//! ```
//!
//! ## Lexing
//! The [`lexer`] turns the source string into a lazy stream of tokens, one
//! [`token::Token`] per call. It only ever looks one character ahead and
//! never fails: characters it does not recognize become `Illegal` tokens and
//! are left for the parser to complain about.
//!
//! ## Parsing
//! The [`parser`] consumes the token stream and produces a
//! [`stmt::Program`], the AST root. Expressions are parsed by precedence
//! climbing: each token kind may have a prefix and an infix handler, and the
//! parser keeps folding infix handlers into the left operand while the next
//! operator binds tighter. Syntax errors are collected as plain strings
//! instead of aborting the parse, so one pass surfaces as many problems as
//! possible; a program with errors is never evaluated.
//!
//! ## Evaluating
//! The [`evaluator`] walks the AST and produces a [`object::Value`] under an
//! [`environment::Environment`]. Environments form a parent-linked chain of
//! scopes shared by reference: evaluating a function literal captures the
//! current scope, and every call of the resulting closure runs its body in a
//! fresh child of that captured scope. Runtime failures are ordinary
//! [`object::Value::Error`] values that short-circuit outwards through every
//! enclosing evaluation; the language has no try/catch.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::{fs, process};

pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod expr;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
pub mod stmt;
pub mod token;

use environment::Environment;
use evaluator::Evaluator;
use lexer::Lexer;
use object::Value;
use parser::Parser;

/// Drives whole programs through the interpreter against a persistent
/// environment. Interpreted output (`puts`) goes to the writer given at
/// construction, so callers can capture it.
pub struct Monkey<'a> {
    env: Rc<RefCell<Environment>>,
    out: &'a mut dyn Write,
}

impl<'a> Monkey<'a> {
    pub fn new(out: &'a mut dyn Write) -> Monkey<'a> {
        Monkey {
            env: Rc::new(RefCell::new(Environment::default())),
            out,
        }
    }

    /// Runs a source string to completion. Returns the final value, or the
    /// list of parse errors if the program was not fit for evaluation. A
    /// runtime failure is returned as an ordinary [`Value::Error`].
    pub fn run(&mut self, source: &str) -> Result<Value, Vec<String>> {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();

        if !parser.errors().is_empty() {
            return Err(parser.errors().to_vec());
        }

        Ok(Evaluator::new(&mut *self.out).eval(&program, &self.env))
    }

    /// Runs a script file. Parse errors exit with code 65, runtime errors
    /// with code 70, both after reporting to stderr.
    pub fn run_file(&mut self, path: &str) {
        let contents = fs::read_to_string(path)
            .expect("Should have been able to read the file");

        match self.run(&contents) {
            Err(errors) => {
                for error in errors {
                    eprintln!("{error}");
                }
                process::exit(65);
            },
            Ok(Value::Error(message)) => {
                eprintln!("ERROR: {message}");
                process::exit(70);
            },
            Ok(_) => (),
        }
    }
}
