//! Built-in procedure registry.
//!
//! The root scope is populated from a fixed, process-wide table of built-in
//! procedures. The table is immutable: it is a `static` array, and the name index
//! over it is built once on first use.
//!
//! ```text
//! (+ 1 2 3)     ; 6      variadic sum, (+) is 0
//! (- 5)         ; -5     one argument negates
//! (- 10 3 2)    ; 5      first minus the sum of the rest
//! (* 2 3 4)     ; 24     variadic product, (*) is 1
//! (/ 2)         ; 0.5    one argument is the reciprocal
//! (/ 12 2 3)    ; 2      left-to-right division
//! ```
//!
//! ## Numeric semantics
//!
//! - Integer-only `+`, `-` and `*` stay integers; overflow is an evaluation error
//!   rather than silent wrap-around. `+` and `-` keep an exact running total, so
//!   only a final result outside `i64` overflows.
//! - Any float operand promotes that step's result to a float.
//! - Division is exact: each step of the left-to-right fold keeps an integer result
//!   when both operands are integers that divide evenly, and yields a float
//!   otherwise. `(/ 6 3)` is `2`, `(/ 1 2)` is `0.5`.
//! - Dividing by zero, integer or float, is always an evaluation error.
//!
//! ## Adding New Operations
//!
//! 1. Implement the function with the signature `fn(&[Value]) -> Result<Value, Error>`
//! 2. Add it to `BUILTIN_OPS` with its name and arity
//! 3. Add tests covering edge cases and error conditions

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{IntType, Number, Value};

/// Canonical signature of a built-in procedure
pub type BuiltinFn = fn(&[Value]) -> Result<Value, Error>;

/// Accepted argument counts for a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an argument count, producing an EvaluationError on mismatch
    pub fn validate(self, name: &str, count: usize) -> Result<(), Error> {
        let ok = match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::arity_error(name, self, count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Definition of a built-in procedure
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// Name the procedure is bound to in the root scope
    pub name: &'static str,
    /// Expected number of arguments
    pub arity: Arity,
    pub func: BuiltinFn,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Names uniquely identify registry entries
        self.name == other.name
    }
}

impl BuiltinOp {
    /// Validate the argument count, then run the procedure
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        self.arity.validate(self.name, args.len())?;
        (self.func)(args)
    }
}

/// Numeric view over arguments; non-numbers become EvaluationErrors
fn numbers<'a>(
    name: &'static str,
    args: &'a [Value],
) -> impl Iterator<Item = Result<Number, Error>> + 'a {
    args.iter().map(move |arg| {
        arg.as_number()
            .ok_or_else(|| Error::EvaluationError(format!("{name} requires numbers, got {arg}")))
    })
}

/// Exact running total for `+` and `-`. Integers accumulate in `i128` and are
/// narrowed once at the end, so only a final result outside `i64` overflows. The
/// first float operand turns the rest of the total into float arithmetic.
#[derive(Debug, Clone, Copy)]
enum Total {
    Int(i128),
    Float(f64),
}

impl Total {
    fn accumulate(self, name: &str, n: Number, negate: bool) -> Result<Total, Error> {
        match (self, n) {
            (Total::Int(acc), Number::Int(i)) => {
                let i = i128::from(i);
                let next = if negate {
                    acc.checked_sub(i)
                } else {
                    acc.checked_add(i)
                };
                next.map(Total::Int).ok_or_else(|| overflow(name))
            }
            (acc, n) => {
                let (acc, x) = (acc.as_f64(), n.as_f64());
                Ok(Total::Float(if negate { acc - x } else { acc + x }))
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Total::Int(n) => n as f64,
            Total::Float(x) => x,
        }
    }

    fn finish(self, name: &str) -> Result<Number, Error> {
        match self {
            Total::Int(n) => IntType::try_from(n)
                .map(Number::Int)
                .map_err(|_| overflow(name)),
            Total::Float(x) => Ok(Number::Float(x)),
        }
    }
}

impl From<Number> for Total {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Total::Int(i128::from(i)),
            Number::Float(x) => Total::Float(x),
        }
    }
}

fn overflow(name: &str) -> Error {
    Error::EvaluationError(format!("Integer overflow in {name}"))
}

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    numbers("+", args)
        .try_fold(Total::Int(0), |total, n| total.accumulate("+", n?, false))?
        .finish("+")
        .map(Value::Number)
}

fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    let mut nums = numbers("-", args);
    let Some(first) = nums.next() else {
        return Err(Error::arity_error("-", Arity::AtLeast(1), 0));
    };
    let first = first?;

    if args.len() == 1 {
        return first.neg().map(Value::Number);
    }

    // Subtracting each trailing argument in turn equals subtracting their sum
    nums.try_fold(Total::from(first), |total, n| {
        total.accumulate("-", n?, true)
    })?
    .finish("-")
    .map(Value::Number)
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    numbers("*", args)
        .try_fold(Number::Int(1), |product, n| product.mul(n?))
        .map(Value::Number)
}

fn builtin_div(args: &[Value]) -> Result<Value, Error> {
    let mut nums = numbers("/", args);
    let Some(first) = nums.next() else {
        return Err(Error::arity_error("/", Arity::AtLeast(1), 0));
    };
    let first = first?;

    if args.len() == 1 {
        return Number::Int(1).div(first).map(Value::Number);
    }

    nums.try_fold(first, |quotient, n| quotient.div(n?))
        .map(Value::Number)
}

/// Global registry of all built-in procedures
static BUILTIN_OPS: [BuiltinOp; 4] = [
    BuiltinOp {
        name: "+",
        arity: Arity::Any,
        func: builtin_add,
    },
    BuiltinOp {
        name: "-",
        arity: Arity::AtLeast(1),
        func: builtin_sub,
    },
    BuiltinOp {
        name: "*",
        arity: Arity::Any,
        func: builtin_mul,
    },
    BuiltinOp {
        name: "/",
        arity: Arity::AtLeast(1),
        func: builtin_div,
    },
];

/// Lazy static map from name to BuiltinOp (private - use find_builtin)
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.name, op)).collect());

/// All builtin procedures (used to populate the root scope)
pub fn builtin_ops() -> &'static [BuiltinOp] {
    &BUILTIN_OPS
}

/// Find a builtin procedure by name
pub fn find_builtin(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(name).copied()
}
