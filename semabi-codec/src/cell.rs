//! `Cell` is the tagged sum-typed value that flows through the pipeline before it is
//! projected into a row under its column's storage type. Decoded ABI leaves, expression
//! results, and default-column values are all represented as `Cell`s.

use num_bigint::BigInt;
use std::fmt;

/// A single dynamically-typed value produced by decoding, flattening, or expression
/// evaluation. Column descriptors (see [`crate::column::DatasetColumn`]) dictate how a
/// `Cell` is ultimately stored; mismatches are only caught at schema-union time, never
/// per-row, mirroring the source system's dynamic typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Boolean(bool),
    Integer(BigInt),
    Float(f64),
    /// Lower-case hex string without a `0x` prefix (addresses, `bytes`/`bytesN` leaves).
    Hex(String),
    String(String),
    List(Vec<Cell>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Cell::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Cell::Float(f) => Some(*f),
            Cell::Integer(i) => num_traits::ToPrimitive::to_f64(i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(s) | Cell::Hex(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Cell]> {
        match self {
            Cell::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Boolean(b) => write!(f, "{b}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Hex(h) => write!(f, "0x{h}"),
            Cell::String(s) => write!(f, "{s}"),
            Cell::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Boolean(value)
    }
}

impl From<BigInt> for Cell {
    fn from(value: BigInt) -> Self {
        Cell::Integer(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(BigInt::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_hex_null_and_list_values() {
        assert_eq!(Cell::Hex("ab12".into()).to_string(), "0xab12");
        assert_eq!(Cell::Null.to_string(), "null");
        assert_eq!(
            Cell::List(vec![Cell::from(1i64), Cell::from(2i64)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn as_float_coerces_integers() {
        assert_eq!(Cell::from(42i64).as_float(), Some(42.0));
    }
}
