//! Token strings to expression trees.
//!
//! Recursive descent over the token slice: each step consumes a prefix of the slice
//! and hands back the rest. Atoms are classified as an integer if they parse as
//! one, else as a float if they parse as one, else as a symbol. Combinations are
//! checked against the special-form rules as soon as their closing `)` is reached.

use crate::ast::{Expr, Number};
use crate::tokenizer::tokenize;
use crate::{Error, MAX_PARSE_DEPTH, SyntaxErrorKind};

/// Head symbol of the assignment special form
pub const ASSIGNMENT: &str = ":=";

type ParseResult<'t, S> = Result<(&'t [S], Expr), Error>;

/// Reject unequal counts of `(`/`)` and any `)` that closes nothing
fn check_balanced<S: AsRef<str>>(tokens: &[S]) -> Result<(), Error> {
    let mut open = 0usize;
    for tok in tokens {
        match tok.as_ref() {
            "(" => open += 1,
            ")" => {
                open = open.checked_sub(1).ok_or_else(|| {
                    Error::syntax_at(
                        SyntaxErrorKind::UnbalancedParens,
                        "Unmatched closing parenthesis",
                        ")",
                    )
                })?;
            }
            _ => {}
        }
    }

    if open == 0 {
        Ok(())
    } else {
        Err(Error::syntax(
            SyntaxErrorKind::UnbalancedParens,
            format!("{open} unclosed parenthesis"),
        ))
    }
}

/// Integer first, then float, else symbol
fn classify_atom(atom: &str) -> Expr {
    if let Ok(n) = atom.parse::<i64>() {
        Expr::Number(Number::Int(n))
    } else if let Ok(x) = atom.parse::<f64>() {
        Expr::Number(Number::Float(x))
    } else {
        Expr::Symbol(atom.to_owned())
    }
}

/// Parse one expression from the front of `tokens`
fn parse_expression<S: AsRef<str>>(tokens: &[S], depth: usize) -> ParseResult<'_, S> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(Error::syntax(
            SyntaxErrorKind::TooDeeplyNested,
            format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
        ));
    }

    match tokens.split_first() {
        None => Err(Error::syntax(
            SyntaxErrorKind::UnbalancedParens,
            "Unexpected end of input",
        )),
        Some((tok, rest)) => match tok.as_ref() {
            "(" => parse_combination(rest, depth),
            ")" => Err(Error::syntax_at(
                SyntaxErrorKind::UnbalancedParens,
                "Unexpected closing parenthesis",
                ")",
            )),
            atom => Ok((rest, classify_atom(atom))),
        },
    }
}

/// Parse the elements after an opening `(` up to and including its `)`
fn parse_combination<S: AsRef<str>>(mut tokens: &[S], depth: usize) -> ParseResult<'_, S> {
    let mut elements = Vec::new();

    loop {
        match tokens.split_first() {
            Some((tok, rest)) if tok.as_ref() == ")" => {
                validate_combination(&elements)?;
                return Ok((rest, Expr::Combination(elements)));
            }
            Some(_) => {
                let (rest, element) = parse_expression(tokens, depth + 1)?;
                elements.push(element);
                tokens = rest;
            }
            None => {
                return Err(Error::syntax(
                    SyntaxErrorKind::UnbalancedParens,
                    "Expected closing parenthesis",
                ));
            }
        }
    }
}

/// Special-form rules applied to every freshly closed combination
fn validate_combination(elements: &[Expr]) -> Result<(), Error> {
    match elements {
        [] => Err(Error::syntax_at(
            SyntaxErrorKind::EmptyCombination,
            "Empty combination has no meaning",
            "()",
        )),
        [Expr::Symbol(head), operands @ ..] if head == ASSIGNMENT => match operands {
            [Expr::Symbol(_), _] => Ok(()),
            [target, _] => Err(Error::syntax_at(
                SyntaxErrorKind::InvalidAssignment,
                "Assignment target must be a symbol",
                target.to_string(),
            )),
            _ => Err(Error::syntax(
                SyntaxErrorKind::InvalidAssignment,
                format!(
                    "{ASSIGNMENT} expects exactly 2 operands, got {}",
                    operands.len()
                ),
            )),
        },
        _ => Ok(()),
    }
}

/// Parse a token sequence holding exactly one expression.
///
/// Accepts the tokenizer's `Vec<String>` as well as `&str` slices.
pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Expr, Error> {
    check_balanced(tokens)?;

    if tokens.is_empty() {
        return Err(Error::syntax(SyntaxErrorKind::Empty, "No expression to parse"));
    }

    let (rest, expr) = parse_expression(tokens, 0)?;

    if let Some(extra) = rest.first() {
        return Err(Error::syntax_at(
            SyntaxErrorKind::TrailingContent,
            "A program must be exactly one expression",
            extra.as_ref(),
        ));
    }

    log::trace!("parsed {} tokens into {expr}", tokens.len());
    Ok(expr)
}

/// Tokenize and parse source text
pub fn parse_program(source: &str) -> Result<Expr, Error> {
    parse(&tokenize(source))
}
