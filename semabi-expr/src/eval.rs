//! Expression evaluator. `||` concatenates when both operands are strings, sums when
//! both are numeric, and is a transform error for any other operand combination —
//! the explicit resolution of the `+`-polymorphism ambiguity noted in the design notes.

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::Error;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use semabi_codec::Cell;
use std::collections::HashMap;

enum Numeric {
    Int(BigInt),
    Float(f64),
}

fn as_numeric(op: &'static str, cell: &Cell) -> Result<Numeric, Error> {
    match cell {
        Cell::Integer(i) => Ok(Numeric::Int(i.clone())),
        Cell::Float(f) => Ok(Numeric::Float(*f)),
        other => Err(Error::NotNumeric {
            op,
            value: other.to_string(),
        }),
    }
}

fn to_f64(n: &Numeric) -> f64 {
    match n {
        Numeric::Int(i) => i.to_f64().unwrap_or(f64::NAN),
        Numeric::Float(f) => *f,
    }
}

fn numeric_to_cell(n: Numeric) -> Cell {
    match n {
        Numeric::Int(i) => Cell::Integer(i),
        Numeric::Float(f) => Cell::Float(f),
    }
}

fn negate(n: Numeric) -> Numeric {
    match n {
        Numeric::Int(i) => Numeric::Int(-i),
        Numeric::Float(f) => Numeric::Float(-f),
    }
}

fn bigint_pow(base: &BigInt, mut exp: u32) -> BigInt {
    let mut result = BigInt::from(1);
    let mut squared = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result = &result * &squared;
        }
        squared = &squared * &squared;
        exp >>= 1;
    }
    result
}

fn op_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Pow => "**",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Concat => "||",
    }
}

fn arith(op: BinOp, lhs: Numeric, rhs: Numeric) -> Result<Numeric, Error> {
    match (op, lhs, rhs) {
        (BinOp::Add, Numeric::Int(a), Numeric::Int(b)) => Ok(Numeric::Int(a + b)),
        (BinOp::Add, a, b) => Ok(Numeric::Float(to_f64(&a) + to_f64(&b))),

        (BinOp::Sub, Numeric::Int(a), Numeric::Int(b)) => Ok(Numeric::Int(a - b)),
        (BinOp::Sub, a, b) => Ok(Numeric::Float(to_f64(&a) - to_f64(&b))),

        (BinOp::Mul, Numeric::Int(a), Numeric::Int(b)) => Ok(Numeric::Int(a * b)),
        (BinOp::Mul, a, b) => Ok(Numeric::Float(to_f64(&a) * to_f64(&b))),

        (BinOp::Div, a, b) => {
            let rhs = to_f64(&b);
            if rhs == 0.0 {
                return Err(Error::DivisionByZero);
            }
            Ok(Numeric::Float(to_f64(&a) / rhs))
        }

        (BinOp::Pow, Numeric::Int(a), Numeric::Int(b)) => match b.to_u32() {
            Some(exp) if !b.is_negative() => Ok(Numeric::Int(bigint_pow(&a, exp))),
            _ => Ok(Numeric::Float(to_f64(&Numeric::Int(a)).powf(to_f64(&Numeric::Int(b))))),
        },
        (BinOp::Pow, a, b) => Ok(Numeric::Float(to_f64(&a).powf(to_f64(&b)))),

        (BinOp::Concat, _, _) => unreachable!("Concat is evaluated separately"),
    }
}

pub fn evaluate(expr: &Expr, variables: &HashMap<String, Cell>) -> Result<Cell, Error> {
    match expr {
        Expr::Number(cell) => Ok(cell.clone()),
        Expr::Str(s) => Ok(Cell::String(s.clone())),
        Expr::Var(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownVariable(name.clone())),
        Expr::Unary(op, inner) => {
            let value = evaluate(inner, variables)?;
            let numeric = as_numeric(if *op == UnaryOp::Plus { "+" } else { "-" }, &value)?;
            let numeric = match op {
                UnaryOp::Plus => numeric,
                UnaryOp::Minus => negate(numeric),
            };
            Ok(numeric_to_cell(numeric))
        }
        Expr::Binary(BinOp::Concat, lhs, rhs) => {
            let lv = evaluate(lhs, variables)?;
            let rv = evaluate(rhs, variables)?;
            match (&lv, &rv) {
                (Cell::String(a), Cell::String(b)) => Ok(Cell::String(format!("{a}{b}"))),
                _ => {
                    let mixed = || Error::MixedOperands {
                        op: "||",
                        lhs: lv.to_string(),
                        rhs: rv.to_string(),
                    };
                    let ln = as_numeric("||", &lv).map_err(|_| mixed())?;
                    let rn = as_numeric("||", &rv).map_err(|_| mixed())?;
                    Ok(numeric_to_cell(arith(BinOp::Add, ln, rn)?))
                }
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let lv = evaluate(lhs, variables)?;
            let rv = evaluate(rhs, variables)?;
            let ln = as_numeric(op_name(*op), &lv)?;
            let rn = as_numeric(op_name(*op), &rv)?;
            Ok(numeric_to_cell(arith(*op, ln, rn)?))
        }
    }
}
