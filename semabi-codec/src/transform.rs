//! Per-cell transform functions composed after raw decoding. These are pure tags (not
//! closures) so that [`crate::column::DatasetColumn`] equality stays structural.

use crate::cell::Cell;
use num_bigint::BigInt;
use num_traits::Num;

/// A named, composable per-cell conversion applied when a decoded [`Cell`] is projected
/// into its column's storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTransform {
    /// Hex string (no `0x`) to arbitrary-precision integer.
    HexToInt,
    /// Hex string (no `0x`) to floating point, via its integer value.
    HexToFloat,
    /// Lower-cases and strips any `0x` prefix; used for `address` normalization.
    HexNormalize,
    /// Renders any cell through its `Display` implementation.
    ToString,
}

impl CellTransform {
    pub fn apply(self, cell: &Cell) -> Result<Cell, crate::Error> {
        match (self, cell) {
            (_, Cell::Null) => Ok(Cell::Null),
            (CellTransform::HexToInt, Cell::Hex(h)) => BigInt::from_str_radix(h, 16)
                .map(Cell::Integer)
                .map_err(|e| crate::Error::TransformMismatch(e.to_string())),
            (CellTransform::HexToFloat, Cell::Hex(h)) => {
                let i = BigInt::from_str_radix(h, 16)
                    .map_err(|e| crate::Error::TransformMismatch(e.to_string()))?;
                num_traits::ToPrimitive::to_f64(&i)
                    .map(Cell::Float)
                    .ok_or_else(|| crate::Error::TransformMismatch(format!("{h} overflows f64")))
            }
            (CellTransform::HexNormalize, Cell::Hex(h)) => {
                Ok(Cell::Hex(h.trim_start_matches("0x").to_ascii_lowercase()))
            }
            (CellTransform::HexNormalize, Cell::String(s)) => {
                Ok(Cell::Hex(s.trim_start_matches("0x").to_ascii_lowercase()))
            }
            (CellTransform::ToString, other) => Ok(Cell::String(other.to_string())),
            (transform, other) => Err(crate::Error::TransformMismatch(format!(
                "{transform:?} cannot be applied to {other:?}"
            ))),
        }
    }
}
