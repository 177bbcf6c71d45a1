//! Nom-based parser for infix arithmetic formulas
//!
//! Produces an `Expr` tree for identifier extraction. Supported syntax:
//! operators `+ - * / // % **`, parentheses, numeric literals, identifiers
//! and unary signs. Assignment, function calls, attribute access and any
//! other non-expression syntax fail to parse.
//!
//! Precedence, loosest to tightest:
//!
//! ```text
//! expr   := term (("+" | "-") term)*
//! term   := power (("*" | "/" | "//" | "%") power)*
//! power  := unary ("**" power)?            right-associative
//! unary  := ("+" | "-")* atom
//! atom   := number | identifier | "(" expr ")"
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    error::{convert_error, ParseError as NomParseError, VerboseError},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, UnaryOp};

/// Error raised when an expression does not parse
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Syntax(String),
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a complete arithmetic expression from source text
///
/// The whole input must be consumed; trailing garbage is a syntax error.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    match all_consuming(delimited(
        multispace0::<_, VerboseError<&str>>,
        expr,
        multispace0,
    ))(input)
    {
        Ok((_, tree)) => Ok(tree),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(ParseError::Syntax(convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax("incomplete input".to_string())),
    }
}

/// Extract the free identifiers referenced by an expression
///
/// Returns the sorted, deduplicated list of names appearing in the
/// expression. Purely syntactic; the expression is never evaluated.
pub fn extract_identifiers(input: &str) -> Result<Vec<String>, ParseError> {
    Ok(parse_expression(input)?.identifiers())
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn expr<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Expr, E> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(additive_op, term))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn term<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Expr, E> {
    let (input, first) = power(input)?;
    let (input, rest) = many0(pair(multiplicative_op, power))(input)?;
    Ok((input, fold_binary(first, rest)))
}

/// `**` is right-associative and binds tighter than the other operators
fn power<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Expr, E> {
    let (input, base) = unary(input)?;
    let (input, exponent) = opt(preceded(preceded(multispace0, tag("**")), power))(input)?;
    let node = match exponent {
        Some(rhs) => Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(rhs),
        },
        None => base,
    };
    Ok((input, node))
}

fn unary<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Expr, E> {
    let (input, _) = multispace0(input)?;
    let (input, signs) = many0(terminated(one_of("+-"), multispace0))(input)?;
    let (input, mut node) = atom(input)?;
    for sign in signs.into_iter().rev() {
        let op = if sign == '-' { UnaryOp::Neg } else { UnaryOp::Pos };
        node = Expr::Unary {
            op,
            operand: Box::new(node),
        };
    }
    Ok((input, node))
}

fn atom<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Expr, E> {
    preceded(
        multispace0,
        alt((
            map(number, Expr::Number),
            map(identifier, Expr::Identifier),
            delimited(
                char('('),
                expr,
                preceded(multispace0, char(')')),
            ),
        )),
    )(input)
}

// ============================================================================
// Operators
// ============================================================================

fn additive_op<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, BinaryOp, E> {
    preceded(
        multispace0,
        alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        )),
    )(input)
}

fn multiplicative_op<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, BinaryOp, E> {
    // "//" must be tried before "/"
    preceded(
        multispace0,
        alt((
            value(BinaryOp::FloorDiv, tag("//")),
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Mod, char('%')),
        )),
    )(input)
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |left, (op, right)| Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

// ============================================================================
// Terminals
// ============================================================================

/// Numeric literal: integer or decimal, optional exponent
fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
        recognize(tuple((
            digit1,
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.to_string(),
    )(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_expression() {
        let result = extract_identifiers("temperature + pressure").unwrap();
        assert_eq!(result, vec!["pressure", "temperature"]);
    }

    #[test]
    fn test_extraction_is_sorted() {
        let result = extract_identifiers("temperature + pressure * 2").unwrap();
        assert_eq!(result, vec!["pressure", "temperature"]);
    }

    #[test]
    fn test_expression_with_constants() {
        let result = extract_identifiers("temperature * 2 + 100").unwrap();
        assert_eq!(result, vec!["temperature"]);
    }

    #[test]
    fn test_complex_expression() {
        let result = extract_identifiers("(flow_rate * pressure) / (temperature + 273)").unwrap();
        assert_eq!(result, vec!["flow_rate", "pressure", "temperature"]);
    }

    #[test]
    fn test_duplicate_identifiers() {
        let result = extract_identifiers("temperature + temperature * 2").unwrap();
        assert_eq!(result, vec!["temperature"]);
    }

    #[test]
    fn test_no_identifiers() {
        let result = extract_identifiers("42 + 10").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_extraction_is_pure() {
        let first = extract_identifiers("a * b + c").unwrap();
        let second = extract_identifiers("a * b + c").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_operators() {
        let result = extract_identifiers("a + b - c * d / e // f % g ** h").unwrap();
        assert_eq!(result, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    }

    #[test]
    fn test_unary_signs() {
        let result = extract_identifiers("-temperature + +pressure").unwrap();
        assert_eq!(result, vec!["pressure", "temperature"]);
    }

    #[test]
    fn test_decimal_and_exponent_literals() {
        let result = extract_identifiers("1.5e3 * x + 2.25").unwrap();
        assert_eq!(result, vec!["x"]);
    }

    #[test]
    fn test_power_is_right_associative() {
        let tree = parse_expression("a ** b ** c").unwrap();
        if let Expr::Binary { op, right, .. } = tree {
            assert_eq!(op, BinaryOp::Pow);
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Pow, .. }));
        } else {
            panic!("Expected Binary");
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let tree = parse_expression("a + b * c").unwrap();
        if let Expr::Binary { op, right, .. } = tree {
            assert_eq!(op, BinaryOp::Add);
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
        } else {
            panic!("Expected Binary");
        }
    }

    #[test]
    fn test_syntax_error_garbage() {
        assert!(extract_identifiers("temperature @#$ pressure").is_err());
    }

    #[test]
    fn test_syntax_error_dangling_operator() {
        assert!(extract_identifiers("temperature ++").is_err());
    }

    #[test]
    fn test_syntax_error_empty() {
        assert!(extract_identifiers("").is_err());
    }

    #[test]
    fn test_syntax_error_unclosed_paren() {
        assert!(extract_identifiers("(a + b").is_err());
    }

    #[test]
    fn test_rejects_assignment() {
        assert!(extract_identifiers("a = b").is_err());
    }

    #[test]
    fn test_rejects_function_call() {
        assert!(extract_identifiers("sqrt(x)").is_err());
    }

    #[test]
    fn test_rejects_attribute_access() {
        assert!(extract_identifiers("plant.temperature").is_err());
    }

    #[test]
    fn test_rejects_comparison() {
        assert!(extract_identifiers("a < b").is_err());
    }

    #[test]
    fn test_syntax_error_carries_diagnostic() {
        let err = parse_expression("a +* b").unwrap_err();
        let ParseError::Syntax(message) = err;
        assert!(!message.is_empty());
    }
}
