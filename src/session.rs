//! Persistent evaluation sessions.
//!
//! A [`Session`] owns one top-level scope, a child of the shared root of built-in
//! procedures, and evaluates successive programs in it, so later programs see the
//! assignments made by earlier ones. A failed evaluation is reported to the caller
//! and leaves the session usable with every binding made so far intact.
//!
//! ```
//! use snek::{Session, Value};
//!
//! let mut session = Session::new();
//! session.eval_source("(:= x 10)").unwrap();
//! assert_eq!(session.eval_source("(* x 2)").unwrap(), Value::from(20));
//! assert!(session.eval_source("(/ x 0)").is_err());
//! assert_eq!(session.eval_source("x").unwrap(), Value::from(10));
//! ```

use crate::Error;
use crate::ast::{Expr, Value};
use crate::environment::Environment;
use crate::evaluator::evaluate;
use crate::parser::parse_program;

/// Evaluate `expr` in `env`, or in a fresh session scope when none is given, and
/// hand the scope back alongside the result so it can be reused.
pub fn result_and_env(
    expr: &Expr,
    env: Option<Environment>,
) -> Result<(Value, Environment), Error> {
    let mut env = env.unwrap_or_else(Environment::session);
    let value = evaluate(expr, &mut env)?;
    Ok((value, env))
}

/// REPL-style driver core: one scope reused across evaluations
#[derive(Debug, Clone)]
pub struct Session {
    env: Environment,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with an empty top-level scope over the built-ins
    pub fn new() -> Self {
        Session {
            env: Environment::session(),
        }
    }

    /// Session continuing in an existing scope
    pub fn with_environment(env: Environment) -> Self {
        Session { env }
    }

    /// Tokenize, parse and evaluate one program
    pub fn eval_source(&mut self, source: &str) -> Result<Value, Error> {
        let expr = parse_program(source).inspect_err(|err| {
            log::debug!("{} in {source:?}", err.kind_name());
        })?;
        self.eval_expr(&expr)
    }

    /// Evaluate an already parsed expression
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, Error> {
        evaluate(expr, &mut self.env).inspect_err(|err| {
            log::debug!("{} while evaluating {expr}", err.kind_name());
        })
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Give up the session, keeping its scope
    pub fn into_environment(self) -> Environment {
        self.env
    }
}
