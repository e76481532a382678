//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Printing and flag bookkeeping live in [`ErrorReporter`], which the driver
//! threads through every pipeline stage.  No stage writes to stderr on its own.

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position.
    #[error("[{line}:{column}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// 1‑based column where the offending lexeme starts.
        column: usize,
    },

    /// Syntactic (parser) error.  `location` is ` at end` or ` at 'LEXEME'`.
    #[error("[{line}:{column}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
        column: usize,
    },

    /// Static‑analysis failure (early‑binding and placement rules).
    #[error("[{line}:{column}] Error: {message}")]
    Resolve {
        message: String,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error, positioned at the culprit token.
    #[error("[{line}:{column}] Runtime error: {message}")]
    Runtime {
        message: String,
        line: usize,
        column: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: [{}:{}] {}", line, column, message);

        LoxError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.  The location suffix is derived
    /// from the offending token: ` at end` for `EOF`, ` at 'LEXEME'` otherwise.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        let location: String = if token.token_type == TokenType::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };

        debug!(
            "Creating Parse error: [{}:{}]{} {}",
            token.line, token.column, location, message
        );

        LoxError::Parse {
            message,
            location,
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating Resolve error: [{}:{}] {}",
            token.line, token.column, message
        );

        LoxError::Resolve {
            message,
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating Runtime error: [{}:{}] {}",
            token.line, token.column, message
        );

        LoxError::Runtime {
            message,
            line: token.line,
            column: token.column,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Diagnostic sink threaded through the pipeline.
///
/// Owns the two flags the driver consults between stages: `had_error` for any
/// compile‑time incident (scan, parse, resolve) and `had_runtime_error` for
/// evaluator failures.  Each reported incident is printed to stderr once.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a compile‑time (scan/parse/resolve) incident.
    pub fn error(&mut self, err: &LoxError) {
        eprintln!("{}", err);
        self.had_error = true;
    }

    /// Report a runtime incident.
    pub fn runtime_error(&mut self, err: &LoxError) {
        eprintln!("{}", err);
        self.had_runtime_error = true;
    }

    #[inline]
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    #[inline]
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear the compile‑error flag.  The REPL calls this before each line so
    /// one bad line does not poison the next; the runtime flag is left alone.
    pub fn reset(&mut self) {
        self.had_error = false;
    }
}
