use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};

use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

const PROMPT: &str = ">>> ";

/// Runs the interactive read-parse-evaluate-print loop until end of input.
///
/// The environment persists across lines, so `let` bindings and functions
/// defined on one line stay visible on the next. Lines that fail to parse
/// print every collected error and are not evaluated.
pub fn start() -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let history = home::home_dir().map(|dir| dir.join(".monkey_history"));
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    let env = Rc::new(RefCell::new(Environment::default()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                let mut parser = Parser::new(Lexer::new(&line));
                let program = parser.parse_program();

                if !parser.errors().is_empty() {
                    for error in parser.errors() {
                        println!("\t{error}");
                    }
                    continue;
                }

                let stdout = io::stdout();
                let mut out = stdout.lock();
                let value = Evaluator::new(&mut out).eval(&program, &env);
                let _ = writeln!(out, "{value}");
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error),
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }

    Ok(())
}
