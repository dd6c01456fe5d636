//! Hand-written precedence-climbing parser, per the grammar in §4.2:
//! `**` binds tightest (right-assoc), then `*`/`/`, then `+`/`-`/`||` (all left-assoc).

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::lexer::{Lexer, Token};
use crate::Error;
use num_bigint::BigInt;
use semabi_codec::Cell;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item.map(|(t, _)| t)
    }

    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr, Error> {
        let mut lhs = self.parse_unary()?;

        while let Some(tok) = self.peek() {
            let Some((op, prec, right_assoc)) = binop_info(tok) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_expr(next_min)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Plus, Box::new(self.parse_unary()?)))
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Minus, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, Error> {
        match self.advance() {
            Some(Token::Number(raw)) => Ok(Expr::Number(parse_number_literal(&raw))),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let inner = self.parse_expr(0)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(Error::UnexpectedToken(format!("{other:?}"))),
                    None => Err(Error::UnexpectedEof),
                }
            }
            Some(other) => Err(Error::UnexpectedToken(format!("{other:?}"))),
            None => Err(Error::UnexpectedEof),
        }
    }
}

fn binop_info(tok: &Token) -> Option<(BinOp, u8, bool)> {
    match tok {
        Token::StarStar => Some((BinOp::Pow, 3, true)),
        Token::Star => Some((BinOp::Mul, 2, false)),
        Token::Slash => Some((BinOp::Div, 2, false)),
        Token::Plus => Some((BinOp::Add, 1, false)),
        Token::Minus => Some((BinOp::Sub, 1, false)),
        Token::PipePipe => Some((BinOp::Concat, 1, false)),
        _ => None,
    }
}

fn parse_number_literal(raw: &str) -> Cell {
    match raw.parse::<BigInt>() {
        Ok(i) => Cell::Integer(i),
        Err(_) => Cell::Float(raw.parse::<f64>().unwrap_or(f64::NAN)),
    }
}

pub fn parse(source: &str) -> Result<Expr, Error> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr(0)?;
    if parser.pos != parser.tokens.len() {
        let remaining: Vec<String> = parser.tokens[parser.pos..]
            .iter()
            .map(|(t, _)| format!("{t:?}"))
            .collect();
        return Err(Error::TrailingInput(remaining.join(" ")));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_matches_grammar() {
        // 2 + 3 * 4 ** 2 => 2 + (3 * (4 ** 2)) => 2 + 48 => 50
        let expr = parse("2 + 3 * 4 ** 2").unwrap();
        let result = crate::eval::evaluate(&expr, &Default::default()).unwrap();
        assert_eq!(result, Cell::Integer(BigInt::from(50)));
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ** 3 ** 2 => 2 ** (3 ** 2) => 2 ** 9 => 512
        let expr = parse("2 ** 3 ** 2").unwrap();
        let result = crate::eval::evaluate(&expr, &Default::default()).unwrap();
        assert_eq!(result, Cell::Integer(BigInt::from(512)));
    }

    #[test]
    fn unary_minus_binds_tighter_than_binary() {
        let expr = parse("-2 + 3").unwrap();
        let result = crate::eval::evaluate(&expr, &Default::default()).unwrap();
        assert_eq!(result, Cell::Integer(BigInt::from(1)));
    }

    #[test]
    fn parenthesized_expression_overrides_precedence() {
        let expr = parse("(2 + 3) * 4").unwrap();
        let result = crate::eval::evaluate(&expr, &Default::default()).unwrap();
        assert_eq!(result, Cell::Integer(BigInt::from(20)));
    }

    #[test]
    fn rejects_trailing_input() {
        assert!(parse("1 + 2 3").is_err());
    }

    proptest::proptest! {
        // `a + b * c` must always evaluate as `a + (b * c)`, regardless of the three
        // operands' values, since `*` binds tighter than `+` (§4.2's grammar).
        #[test]
        fn add_mul_precedence_round_trips(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
            let source = format!("{a} + {b} * {c}");
            let expr = parse(&source).unwrap();
            let result = crate::eval::evaluate(&expr, &Default::default()).unwrap();
            prop_assert_eq!(result, Cell::Integer(BigInt::from(a) + BigInt::from(b) * BigInt::from(c)));
        }
    }
}
