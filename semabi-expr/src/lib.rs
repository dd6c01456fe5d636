//! The expression language (C4): lexer, precedence-climbing parser, and evaluator for
//! the small arithmetic/string DSL used by parameter transforms, `@expressions`, and
//! table-scope ABI expressions.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinOp, Expr, UnaryOp};
pub use eval::evaluate;
pub use parser::parse;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("unexpected end of expression")]
    UnexpectedEof,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("trailing input after expression: '{0}'")]
    TrailingInput(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("'{op}' requires matching string or numeric operands, got {lhs} and {rhs}")]
    MixedOperands { op: &'static str, lhs: String, rhs: String },

    #[error("'{op}' requires a numeric operand, got {0}", op = .op)]
    NotNumeric { op: &'static str, value: String },

    #[error("division by zero")]
    DivisionByZero,
}

/// Parses and immediately evaluates `source` against `variables`. Convenience wrapper
/// used by pipeline stages that only need a one-shot evaluation.
pub fn parse_and_evaluate(
    source: &str,
    variables: &std::collections::HashMap<String, semabi_codec::Cell>,
) -> Result<semabi_codec::Cell, Error> {
    let expr = parse(source)?;
    evaluate(&expr, variables)
}

/// Statically walks an expression, returning every variable name it references. Used
/// at load time to validate that per-cell transforms reference only `this`, and that
/// `@expressions` reference only known columns.
pub fn referenced_variables(expr: &Expr) -> std::collections::HashSet<String> {
    let mut names = std::collections::HashSet::new();
    ast::walk_variables(expr, &mut names);
    names
}
