//! Snek - a small S-expression interpreter core
//!
//! This crate provides the front-to-back pipeline for Snek, a minimal prefix-notation
//! language: a tokenizer, a recursive-descent parser producing a nested expression tree,
//! a chain of lexical scopes, and a tree-walking evaluator with a fixed set of built-in
//! procedures and one special form.
//!
//! ```text
//! ;; arithmetic on integers and floats
//! (+ 1 2)            ; 3
//! (* 2 3 4)          ; 24
//! (/ 1 2)            ; 0.5
//! ;; assignment yields the assigned value
//! (:= x 10)          ; 10
//! (* x 2)            ; 20
//! ```
//!
//! ## Pipeline
//!
//! Source text → [`tokenizer::tokenize`] → tokens → [`parser::parse`] → [`ast::Expr`]
//! → [`evaluator::evaluate`] (given an [`environment::Environment`]) → [`ast::Value`].
//!
//! ## Errors
//!
//! Every stage returns a [`Result`] with one of three error kinds, never collapsed:
//! - [`Error::SyntaxError`] - malformed token stream, raised only by the parser
//! - [`Error::NameError`] - a symbol with no binding anywhere in the scope chain
//! - [`Error::EvaluationError`] - any other evaluation fault (non-callable head, arity,
//!   division by zero, integer overflow)
//!
//! A failed evaluation never rolls back assignments that completed before the failure.
//!
//! ## Modules
//!
//! - `tokenizer`: source text to token strings
//! - `parser`: token strings to expression trees
//! - `ast`: expression, number and runtime value types
//! - `environment`: scope chain with name resolution
//! - `builtinops`: the built-in procedure registry
//! - `evaluator`: tree-walking evaluation
//! - `session`: persistent evaluation sessions for REPL-style drivers

use std::fmt;

/// Maximum nesting depth accepted by the parser
/// Deeper combinations are rejected before the evaluator ever sees them
pub const MAX_PARSE_DEPTH: usize = 32;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation
/// Set higher than parse depth to allow for nested procedure applications
pub const MAX_EVAL_DEPTH: usize = 64;

/// Categorizes the different kinds of syntax errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SyntaxErrorKind {
    /// Unequal counts of `(` and `)`, or a `)` with no matching open
    UnbalancedParens,
    /// No tokens at all (empty, whitespace-only or comment-only input)
    Empty,
    /// Extra tokens found after a complete expression
    TrailingContent,
    /// `()` has no meaning in this language
    EmptyCombination,
    /// `:=` with the wrong number of operands or a non-symbol target
    InvalidAssignment,
    /// Combination nesting exceeded [`MAX_PARSE_DEPTH`]
    TooDeeplyNested,
}

/// A structured error describing why a token stream is malformed.
#[derive(Debug, PartialEq, Clone)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    /// The problematic token, if identifiable
    pub found: Option<String>,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>, found: Option<String>) -> Self {
        SyntaxError {
            kind,
            message: message.into(),
            found,
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    SyntaxError(SyntaxError),
    NameError(String),
    EvaluationError(String),
}

impl Error {
    /// Create a SyntaxError with a kind and message but no offending token
    pub fn syntax(kind: SyntaxErrorKind, message: impl Into<String>) -> Self {
        Error::SyntaxError(SyntaxError::new(kind, message, None))
    }

    /// Create a SyntaxError naming the offending token
    pub fn syntax_at(
        kind: SyntaxErrorKind,
        message: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::SyntaxError(SyntaxError::new(kind, message, Some(found.into())))
    }

    /// Wrong number of arguments to a procedure; an evaluation-time fault
    pub fn arity_error(name: &str, expected: impl fmt::Display, got: usize) -> Self {
        Error::EvaluationError(format!(
            "{name} expected {expected} arguments, got {got}"
        ))
    }

    /// Short name of the error kind, for drivers that report it
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::SyntaxError(_) => "SyntaxError",
            Error::NameError(_) => "NameError",
            Error::EvaluationError(_) => "EvaluationError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SyntaxError(e) => {
                write!(f, "SyntaxError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                Ok(())
            }
            Error::NameError(name) => write!(f, "NameError: name '{name}' is not defined"),
            Error::EvaluationError(msg) => write!(f, "EvaluationError: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod parser;
pub mod session;
pub mod tokenizer;

pub use ast::{Expr, Number, Value};
pub use environment::Environment;
pub use evaluator::evaluate;
pub use parser::{parse, parse_program};
pub use session::{Session, result_and_env};
pub use tokenizer::tokenize;
