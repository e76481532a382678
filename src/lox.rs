//! Pipeline driver: feed a source string, observe output and error flags.
//!
//! The pipeline is strictly staged with no back-edges.  Scanning collects
//! every token it can and reports lexical errors in-stream; if any stage sets
//! the compile-error flag, the following stages do not run.

use std::io::Write;

use log::info;

use crate::error::ErrorReporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

/// The interpreter host surface.
///
/// Holds the interpreter (so globals and definitions persist across `run`
/// calls, as the REPL requires) and the [`ErrorReporter`] the host consults
/// for exit codes.
pub struct Lox<'o, W: Write> {
    interpreter: Interpreter<'o, W>,
    reporter: ErrorReporter,
    next_id: usize,
}

impl<'o, W: Write> Lox<'o, W> {
    pub fn new(output: &'o mut W) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            reporter: ErrorReporter::new(),
            next_id: 0,
        }
    }

    /// Run one source string through the full pipeline.
    pub fn run(&mut self, source: &str) {
        info!("Running {} byte(s) of source", source.len());

        // 1. Scan.  Comments are token-typed; drop them here, before parsing.
        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source.as_bytes()) {
            match result {
                Ok(token) => {
                    if token.token_type != TokenType::COMMENT {
                        tokens.push(token);
                    }
                }

                Err(e) => self.reporter.error(&e),
            }
        }

        if self.reporter.had_error() {
            return;
        }

        // 2. Parse.
        let statements =
            Parser::new(tokens, &mut self.reporter, &mut self.next_id).parse();

        if self.reporter.had_error() {
            return;
        }

        // 3. Resolve.
        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);

        if self.reporter.had_error() {
            return;
        }

        // 4. Evaluate.
        if let Err(e) = self.interpreter.interpret(&statements) {
            self.reporter.runtime_error(&e);
        }
    }

    #[inline]
    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    #[inline]
    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    /// Clear the compile-error flag before a fresh REPL line.
    pub fn reset_error(&mut self) {
        self.reporter.reset();
    }
}
