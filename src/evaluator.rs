//! Tree-walking evaluation.
//!
//! [`evaluate`] is an exhaustive match over the three expression shapes:
//!
//! - a number evaluates to itself
//! - a symbol resolves through the scope chain, failing with a NameError
//! - a combination is either the `:=` special form or a procedure application
//!
//! For an application the head is resolved first. A symbol head must name a
//! procedure: an unbound head or one bound to a number is an EvaluationError, not
//! a NameError, since nothing was looked up as a value. Any other head expression
//! is evaluated and must produce a procedure. Operands are then evaluated left to
//! right in the current scope and the procedure is applied to them.
//!
//! Evaluation never mutates the tree; `:=` is the only thing that writes to an
//! environment, and it writes to the scope evaluation was started in.

use std::sync::Arc;

use crate::ast::{Closure, Expr, Value};
use crate::environment::Environment;
use crate::parser::ASSIGNMENT;
use crate::{Error, MAX_EVAL_DEPTH};

/// Evaluate an expression tree in `env` (public API)
pub fn evaluate(expr: &Expr, env: &mut Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Apply a procedure value to already-evaluated arguments
pub fn apply(procedure: &Value, args: &[Value]) -> Result<Value, Error> {
    apply_with_depth_tracking(procedure, args, 0)
}

/// Evaluate an expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(
    expr: &Expr,
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvaluationError(format!(
            "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }

    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),

        Expr::Symbol(name) => env.lookup(name).cloned(),

        Expr::Combination(elements) => match elements.as_slice() {
            [] => Err(Error::EvaluationError(
                "Cannot evaluate empty combination".to_owned(),
            )),
            [Expr::Symbol(head), operands @ ..] if head == ASSIGNMENT => {
                eval_assignment(operands, env, depth)
            }
            [head, operands @ ..] => eval_application(head, operands, env, depth),
        },
    }
}

/// `(:= name value)`: bind in the current scope and yield the value
fn eval_assignment(
    operands: &[Expr],
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    match operands {
        [Expr::Symbol(name), value_expr] => {
            let value = eval_with_depth_tracking(value_expr, env, depth + 1)?;
            log::debug!("{name} := {value}");
            env.define(name.as_str(), value.clone());
            Ok(value)
        }
        // Trees built outside the parser can still be malformed
        [target, _] => Err(Error::EvaluationError(format!(
            "{ASSIGNMENT} target must be a symbol, got {target}"
        ))),
        _ => Err(Error::arity_error(ASSIGNMENT, "exactly 2", operands.len())),
    }
}

/// Resolve the head, evaluate operands left to right, then apply
fn eval_application(
    head: &Expr,
    operands: &[Expr],
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    let procedure = match head {
        Expr::Symbol(name) => match env.get(name) {
            Some(value) if value.is_procedure() => value.clone(),
            Some(value) => {
                return Err(Error::EvaluationError(format!(
                    "'{name}' is not a procedure (bound to {value})"
                )));
            }
            None => {
                return Err(Error::EvaluationError(format!(
                    "'{name}' is not a procedure"
                )));
            }
        },
        _ => {
            let value = eval_with_depth_tracking(head, env, depth + 1)?;
            if !value.is_procedure() {
                return Err(Error::EvaluationError(format!(
                    "Cannot apply non-procedure: {value}"
                )));
            }
            value
        }
    };

    let args = eval_args(operands, env, depth)?;
    log::trace!("applying {procedure} to {} arguments", args.len());
    apply_with_depth_tracking(&procedure, &args, depth + 1)
}

/// Helper function to evaluate a list of argument expressions with depth tracking
fn eval_args(args: &[Expr], env: &mut Environment, depth: usize) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, env, depth + 1))
        .collect()
}

fn apply_with_depth_tracking(
    procedure: &Value,
    args: &[Value],
    depth: usize,
) -> Result<Value, Error> {
    match procedure {
        Value::Builtin(op) => op.call(args),
        Value::Closure(closure) => apply_closure(closure, args, depth),
        Value::Number(_) => Err(Error::EvaluationError(format!(
            "Cannot apply non-procedure: {procedure}"
        ))),
    }
}

/// Bind parameters in a fresh child of the captured scope and evaluate the body
fn apply_closure(closure: &Closure, args: &[Value], depth: usize) -> Result<Value, Error> {
    if closure.params.len() != args.len() {
        return Err(Error::arity_error(
            "procedure",
            format!("exactly {}", closure.params.len()),
            args.len(),
        ));
    }

    let mut call_env = Environment::with_parent(Arc::clone(&closure.env));
    for (param, arg) in closure.params.iter().zip(args) {
        call_env.define(param.as_str(), arg.clone());
    }

    eval_with_depth_tracking(&closure.body, &mut call_env, depth + 1)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{comb, num, sym, val};
    use crate::builtinops::find_builtin;
    use crate::parser::parse_program;

    /// Test result variants for comprehensive testing
    #[derive(Debug)]
    enum TestResult {
        EvalResult(Value),           // Evaluation should succeed with this value
        SpecificError(&'static str), // Evaluation should fail with error containing this string
        NameErr,                     // Evaluation should fail with a NameError
        EvalErr,                     // Evaluation should fail with an EvaluationError
    }
    use TestResult::*;

    /// Test environment containing test cases that share state
    struct TestEnvironment(Vec<(&'static str, TestResult)>);

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> TestResult {
        EvalResult(value.into())
    }

    /// Run tests in isolated session scopes with shared state
    fn run_tests_in_environment(test_environments: Vec<TestEnvironment>) {
        for (env_idx, TestEnvironment(test_cases)) in test_environments.iter().enumerate() {
            let mut env = Environment::session();

            for (test_idx, (input, expected)) in test_cases.iter().enumerate() {
                let test_id = format!("Environment #{} test #{}", env_idx + 1, test_idx + 1);
                execute_test_case(input, expected, &mut env, &test_id);
            }
        }
    }

    /// Execute a single test case with detailed error reporting
    fn execute_test_case(input: &str, expected: &TestResult, env: &mut Environment, test_id: &str) {
        let expr = match parse_program(input) {
            Ok(expr) => expr,
            Err(parse_err) => {
                panic!("{test_id}: unexpected parse error for '{input}': {parse_err:?}");
            }
        };

        match (evaluate(&expr, env), expected) {
            (Ok(actual), EvalResult(expected_val)) => {
                assert_eq!(actual, *expected_val, "{test_id}: '{input}'");
            }
            (Err(Error::NameError(_)), NameErr) | (Err(Error::EvaluationError(_)), EvalErr) => {}
            (Err(e), SpecificError(expected_text)) => {
                let error_msg = format!("{e}");
                assert!(
                    error_msg.contains(expected_text),
                    "{test_id}: error should contain '{expected_text}', got: {error_msg}"
                );
            }
            (Err(err), NameErr | EvalErr) => {
                panic!("{test_id}: '{input}' expected {expected:?}, got {err:?}");
            }
            (Ok(actual), NameErr | EvalErr | SpecificError(_)) => {
                panic!("{test_id}: '{input}' expected {expected:?}, got {actual:?}");
            }
            (Err(err), EvalResult(expected_val)) => {
                panic!("{test_id}: '{input}' expected {expected_val:?}, got error {err:?}");
            }
        }
    }

    /// Simplified test runner: every case gets a fresh session
    fn run_comprehensive_tests(test_cases: Vec<(&str, TestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let mut env = Environment::session();
            let test_id = format!("#{}", i + 1);
            execute_test_case(input, expected, &mut env, &test_id);
        }
    }

    #[test]
    fn test_comprehensive_operations_data_driven() {
        let test_cases = vec![
            // === SELF-EVALUATING NUMBERS ===
            ("42", success(42)),
            ("-271", success(-271)),
            ("2.5", success(2.5)),
            ("9223372036854775807", success(i64::MAX)),
            // === ARITHMETIC ===
            ("(+ 1 2)", success(3)),
            ("(+)", success(0)),
            ("(+ 1 2.5)", success(3.5)),
            ("(* 2 3 4)", success(24)),
            ("(*)", success(1)),
            ("(- 5)", success(-5)),
            ("(- 10 3 2)", success(5)),
            ("(/ 1 2)", success(0.5)),
            ("(/ 6 3)", success(2)),
            ("(/ 4)", success(0.25)),
            ("(+ (* 2 3) (- 8 2))", success(12)),
            ("(* (+ 1 2) (- 5 2))", success(9)),
            ("(/ (+ 1 1) (* 2 2))", success(0.5)),
            // Integer-only trees stay exact
            ("(- (* 1000 1000 1000) 1)", success(999_999_999)),
            // === EVALUATION ERRORS ===
            ("(/ 1 0)", SpecificError("division by zero")),
            ("(/ 1 (- 2 2))", EvalErr),
            ("(/ 1.0 0.0)", EvalErr),
            ("(-)", EvalErr),
            ("(/)", EvalErr),
            ("(+ 9223372036854775807 1)", SpecificError("overflow")),
            ("(1 2 3)", EvalErr),
            ("(2.5)", EvalErr),
            ("((+ 1 2) 4)", SpecificError("Cannot apply non-procedure: 3")),
            ("(undefined-proc 1 2)", SpecificError("'undefined-proc' is not a procedure")),
            // An unresolvable head is reported before its operands are touched
            ("(undefined-proc missing)", EvalErr),
            // === NAME ERRORS ===
            ("undefined-var", NameErr),
            ("(+ 1 undefined-var)", SpecificError("name 'undefined-var' is not defined")),
            // === PROCEDURES AS VALUES ===
            ("+", EvalResult(Value::Builtin(find_builtin("+").unwrap()))),
            ("(+ 1 +)", SpecificError("+ requires numbers")),
            // === ASSIGNMENT YIELDS ITS VALUE ===
            ("(:= x 10)", success(10)),
            ("(+ (:= y 2) y)", success(4)),
        ];

        run_comprehensive_tests(test_cases);
    }

    #[test]
    fn test_environment_sensitive_evaluation() {
        let environment_test_cases = vec![
            // === ASSIGN AND LOOKUP ===
            TestEnvironment(vec![
                ("(:= x 10)", success(10)),
                ("x", success(10)),
                ("(* x 2)", success(20)),
                ("y", NameErr),
            ]),
            // === REASSIGNMENT OVERWRITES ===
            TestEnvironment(vec![
                ("(:= x 1)", success(1)),
                ("(:= x (+ x 1))", success(2)),
                ("(:= x (* x 1.5))", success(3.0)),
                ("x", success(3.0)),
            ]),
            // === BUILTINS VIA ALIASES ===
            TestEnvironment(vec![
                ("(:= add +)", EvalResult(Value::Builtin(find_builtin("+").unwrap()))),
                ("(add 10 20)", success(30)),
            ]),
            // === SHADOWING A BUILTIN IN THE SESSION ===
            TestEnvironment(vec![
                ("(:= + 5)", success(5)),
                ("+", success(5)),
                ("(+ 1 2)", SpecificError("'+' is not a procedure (bound to 5)")),
                ("(* + 2)", success(10)),
            ]),
            // === FAILURES KEEP EARLIER BINDINGS ===
            TestEnvironment(vec![
                ("(:= a 1)", success(1)),
                ("(+ (:= b 2) (/ a 0))", EvalErr),
                ("a", success(1)),
                // The inner assignment completed before the failure
                ("b", success(2)),
                ("(+ (:= c 3) missing)", NameErr),
                ("c", success(3)),
            ]),
            // === LEFT-TO-RIGHT OPERAND EVALUATION ===
            TestEnvironment(vec![
                ("(:= n 1)", success(1)),
                ("(- (:= n 10) n)", success(0)),
                ("(+ n (:= n 5) n)", success(20)),
            ]),
        ];

        run_tests_in_environment(environment_test_cases);

        // Bindings never leak between sessions
        let mut env = Environment::session();
        assert_eq!(
            evaluate(&parse_program("x").unwrap(), &mut env),
            Err(Error::NameError("x".into()))
        );
    }

    #[test]
    fn test_closure_application() {
        let mut env = Environment::session();
        env.define("k", val(100));
        let captured = Arc::new(env.clone());

        // (square x) => (* x x)
        let square = Closure::new(
            vec!["x".into()],
            parse_program("(* x x)").unwrap(),
            Arc::clone(&captured),
        );
        // (add-k x) => (+ x k), with k captured
        let add_k = Closure::new(vec!["x".into()], parse_program("(+ x k)").unwrap(), captured);
        env.define("square", Value::Closure(square.clone()));
        env.define("add-k", Value::Closure(add_k));
        env.define("x", val(-1));

        let test_cases = vec![
            ("(square 5)", success(25)),
            ("(square (square 2))", success(16)),
            ("(add-k 1)", success(101)),
            // Parameters shadow the session's x only inside the body
            ("(square 3)", success(9)),
            ("x", success(-1)),
            ("(square)", SpecificError("procedure expected exactly 1 arguments, got 0")),
            ("(square 1 2)", EvalErr),
        ];
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            execute_test_case(input, expected, &mut env, &format!("Closure test #{}", i + 1));
        }

        // Assignment inside a body binds in the call scope, not the caller's
        let setter = Closure::new(
            vec!["v".into()],
            parse_program("(:= inner v)").unwrap(),
            Environment::builtins(),
        );
        assert_eq!(apply(&Value::Closure(setter), &[val(7)]).unwrap(), val(7));
        assert!(env.get("inner").is_none());

        assert_eq!(apply(&Value::Closure(square), &[val(1.5)]).unwrap(), val(2.25));
    }

    #[test]
    fn test_apply_builtins_directly() {
        let times = Value::Builtin(find_builtin("*").unwrap());
        assert_eq!(apply(&times, &[val(6), val(7)]).unwrap(), val(42));
        assert!(matches!(
            apply(&val(1), &[val(2)]),
            Err(Error::EvaluationError(_))
        ));
    }

    #[test]
    fn test_malformed_trees_built_by_hand() {
        let mut env = Environment::session();
        let cases = vec![
            Expr::Combination(vec![]),
            comb([sym(":="), num(1), num(2)]),
            comb([sym(":="), sym("x")]),
            comb([sym(":="), sym("x"), num(1), num(2)]),
        ];

        for (i, expr) in cases.iter().enumerate() {
            assert!(
                matches!(evaluate(expr, &mut env), Err(Error::EvaluationError(_))),
                "case #{}: {expr}",
                i + 1
            );
        }
        assert!(env.get("x").is_none());
    }

    #[test]
    fn test_evaluation_depth_limit() {
        let mut env = Environment::session();

        // Nesting the parser accepts evaluates fine
        let mut shallow = num(0);
        for _ in 0..20 {
            shallow = comb([sym("+"), num(1), shallow]);
        }
        assert_eq!(evaluate(&shallow, &mut env).unwrap(), val(20));

        // Trees built by hand can nest past the evaluator's limit
        let mut deep = num(0);
        for _ in 0..MAX_EVAL_DEPTH {
            deep = comb([sym("+"), num(1), deep]);
        }
        let err = evaluate(&deep, &mut env).unwrap_err();
        assert!(format!("{err}").contains("depth"), "{err}");

        // Self-application through a closure hits the same limit
        let omega = Closure::new(
            vec!["f".into()],
            comb([sym("f"), sym("f")]),
            Environment::builtins(),
        );
        let omega = Value::Closure(omega);
        let err = apply(&omega, std::slice::from_ref(&omega)).unwrap_err();
        assert!(format!("{err}").contains("depth"), "{err}");
    }
}
