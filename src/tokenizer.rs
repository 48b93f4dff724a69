//! Source text to token strings.
//!
//! A token is `(`, `)`, or an atom: a maximal run of characters that are not
//! parentheses, whitespace or `;`. Whitespace separates atoms and a `;` starts a
//! comment that runs to the end of the line; neither produces tokens. Tokenizing
//! never fails, since every character is either trivia or part of some token.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_while1},
    character::complete::char,
    combinator::{recognize, value},
    multi::many0_count,
    sequence::preceded,
};

fn is_delimiter(c: char) -> bool {
    c == '(' || c == ')' || c == ';' || c.is_whitespace()
}

/// Skip any mix of whitespace and `;` line comments
fn trivia(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0_count(alt((
            take_while1(|c: char| c.is_whitespace()),
            recognize(preceded(char(';'), take_till(|c: char| c == '\n'))),
        ))),
    )
    .parse(input)
}

fn atom(input: &str) -> IResult<&str, &str> {
    take_till1(is_delimiter).parse(input)
}

/// Next token after any leading trivia; fails only once the input is exhausted
fn token(input: &str) -> IResult<&str, &str> {
    preceded(trivia, alt((tag("("), tag(")"), atom))).parse(input)
}

/// Split source text into `(`, `)` and atom tokens, in source order.
pub fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Ok((remaining, tok)) = token(rest) {
        tokens.push(tok.to_owned());
        rest = remaining;
    }

    log::trace!(
        "tokenized {} bytes into {} tokens",
        source.len(),
        tokens.len()
    );
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_data_driven() {
        let test_cases: Vec<(&str, Vec<&str>)> = vec![
            // ===== BASIC COMBINATIONS =====
            ("(+ 1 2)", vec!["(", "+", "1", "2", ")"]),
            ("(:= x 10)", vec!["(", ":=", "x", "10", ")"]),
            ("(* (+ 1 2) 3.5)", vec!["(", "*", "(", "+", "1", "2", ")", "3.5", ")"]),
            // ===== BARE ATOMS =====
            ("x", vec!["x"]),
            ("-42", vec!["-42"]),
            ("1.5e3", vec!["1.5e3"]),
            // ===== COMMENTS =====
            ("(+ 1 2) ; comment", vec!["(", "+", "1", "2", ")"]),
            ("; only a comment", vec![]),
            ("(+ 1 ; first operand\n 2)", vec!["(", "+", "1", "2", ")"]),
            ("abc;def", vec!["abc"]),
            ("(x;)\n)", vec!["(", "x", ")"]),
            // ===== WHITESPACE =====
            ("", vec![]),
            ("   \t\n  ", vec![]),
            ("  (  +\t1\r\n2  )  ", vec!["(", "+", "1", "2", ")"]),
            ("\n\n(a\n\nb)\n", vec!["(", "a", "b", ")"]),
            // ===== PARENTHESES DELIMIT ATOMS =====
            ("(a)", vec!["(", "a", ")"]),
            ("a(b", vec!["a", "(", "b"]),
            ("((()))", vec!["(", "(", "(", ")", ")", ")"]),
            (")(", vec![")", "("]),
            // ===== NON-ASCII ATOMS =====
            ("(λ ü)", vec!["(", "λ", "ü", ")"]),
        ];

        for (i, (input, expected)) in test_cases.iter().enumerate() {
            assert_eq!(
                tokenize(input),
                *expected,
                "Tokenize test #{}: {input:?}",
                i + 1
            );
        }
    }

    #[test]
    fn test_tokenize_multiline_program_keeps_order() {
        let source = "\
; compute something
(:= total
    (+ 1    ; one
       2))  ; two
";
        assert_eq!(
            tokenize(source),
            vec!["(", ":=", "total", "(", "+", "1", "2", ")", ")"]
        );
    }
}
