//! Core tree and value types for the interpreter. [`Expr`] is the parsed expression
//! tree (numbers, symbols and combinations), [`Value`] is what evaluation produces
//! (numbers and procedures), and [`Number`] carries the integer/float distinction
//! through arithmetic. Helpers such as `num`, `sym` and `comb` keep tree
//! construction in tests terse.

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::builtinops::BuiltinOp;
use crate::environment::Environment;

/// Type alias for integer values in the interpreter
pub(crate) type IntType = i64;

/// Numeric literal or result. Integers and floats are distinct so that arithmetic
/// on integers stays exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(IntType),
    Float(f64),
}

impl Number {
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub(crate) fn mul(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map(Number::Int)
                .ok_or_else(|| overflow("multiplication")),
            _ => Ok(Number::Float(self.as_f64() * other.as_f64())),
        }
    }

    pub(crate) fn neg(self) -> Result<Number, Error> {
        match self {
            Number::Int(n) => n
                .checked_neg()
                .map(Number::Int)
                .ok_or_else(|| overflow("negation")),
            Number::Float(x) => Ok(Number::Float(-x)),
        }
    }

    /// Exact division: two integers that divide evenly stay an integer, anything
    /// else becomes a float. A zero divisor is always an error.
    pub(crate) fn div(self, divisor: Number) -> Result<Number, Error> {
        if divisor.is_zero() {
            return Err(Error::EvaluationError("division by zero".into()));
        }
        match (self, divisor) {
            (Number::Int(a), Number::Int(b)) => match a.checked_rem(b) {
                Some(0) => a
                    .checked_div(b)
                    .map(Number::Int)
                    .ok_or_else(|| overflow("division")),
                Some(_) => Ok(Number::Float(self.as_f64() / divisor.as_f64())),
                None => Err(overflow("division")),
            },
            _ => Ok(Number::Float(self.as_f64() / divisor.as_f64())),
        }
    }
}

fn overflow(op: &str) -> Error {
    Error::EvaluationError(format!("Integer overflow in {op}"))
}

impl From<IntType> for Number {
    fn from(n: IntType) -> Self {
        Number::Int(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Int(IntType::from(n))
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Number::Float(x)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            // Debug formatting keeps the fractional part: 2.0, not 2
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// Parsed expression tree. Immutable once built; evaluation only touches environments.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    /// Identifier; resolves to a value through the environment chain
    Symbol(String),
    /// Parenthesized application or special form
    Combination(Vec<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Combination(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// User-defined procedure: parameters, a body, and the scope it was created in.
///
/// Nothing in the surface language builds one yet; extensions (e.g. a function
/// definition special form) construct closures and the evaluator applies them by
/// binding parameters in a fresh child scope of `env`.
#[derive(Clone)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Box<Expr>,
    pub env: Arc<Environment>,
}

impl Closure {
    pub fn new(params: Vec<String>, body: Expr, env: Arc<Environment>) -> Self {
        Closure {
            params,
            body: Box::new(body),
            env,
        }
    }
}

/// Result of evaluation
#[derive(Clone)]
pub enum Value {
    Number(Number),
    /// Built-in procedure from the static registry
    Builtin(&'static BuiltinOp),
    Closure(Closure),
}

impl Value {
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Builtin(_) | Value::Closure(_) => None,
        }
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Builtin(_) | Value::Closure(_))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(Number::Int(n)) => write!(f, "Int({n})"),
            Value::Number(Number::Float(x)) => write!(f, "Float({x:?})"),
            Value::Builtin(op) => write!(f, "Builtin({})", op.name),
            Value::Closure(closure) => write!(
                f,
                "Closure(params={:?}, body={})",
                closure.params, closure.body
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Builtin(op) => write!(f, "#<builtin:{}>", op.name),
            Value::Closure(_) => write!(f, "#<closure>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            // Builtins compare by registry name, not function pointer
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Closure(a), Value::Closure(b)) => {
                a.params == b.params && a.body == b.body && Arc::ptr_eq(&a.env, &b.env)
            }
            _ => false,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<IntType> for Value {
    fn from(n: IntType) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::Int(IntType::from(n)))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(Number::Float(x))
    }
}

/// Helper for numeric leaves
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn num<T: Into<Number>>(n: T) -> Expr {
    Expr::Number(n.into())
}

/// Helper for symbol leaves, from both &str and String
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Expr {
    Expr::Symbol(name.as_ref().to_owned())
}

/// Helper for combinations
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn comb<I: IntoIterator<Item = Expr>>(items: I) -> Expr {
    Expr::Combination(items.into_iter().collect())
}

/// Helper for numeric values
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Number>>(n: T) -> Value {
    Value::Number(n.into())
}
