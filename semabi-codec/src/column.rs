//! Column descriptors: the typed, analytic-storage-oriented counterpart of a [`crate::Cell`].

use crate::transform::CellTransform;

/// The physical storage representation a column's values are projected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    /// Fixed-point decimal, used for integer widths wider than 64 bits but no wider
    /// than 38 decimal digits of precision.
    Decimal { precision: u8, scale: u8 },
    /// Precision-78 integers (`int256`/`uint256` and friends) are too wide for any
    /// native decimal type, so they are coerced to their base-10 string form.
    CoercedDecimalString,
    Float32,
    Float64,
    /// Second-granularity Unix timestamp.
    Timestamp,
    String,
}

/// The analytic role a column plays, independent of its storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticalType {
    Dimension,
    Measure,
    Date,
}

/// Indexing hint surfaced to a downstream analytic store; this crate never builds an
/// index itself, it only carries the hint through to the schema descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    Inverted,
    Text,
    Native,
    Timestamp,
    Range,
}

/// A single output column. Two columns are equal iff every descriptor attribute is
/// equal — this is the equality schema union relies on to detect type conflicts.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetColumn {
    pub name: String,
    pub storage_type: StorageType,
    pub analytical_type: AnalyticalType,
    pub index_type: Option<IndexType>,
    pub transform: Option<CellTransform>,
    pub nullable: bool,
}

impl DatasetColumn {
    pub fn new(name: impl Into<String>, storage_type: StorageType, analytical_type: AnalyticalType) -> Self {
        DatasetColumn {
            name: name.into(),
            storage_type,
            analytical_type,
            index_type: None,
            transform: None,
            nullable: true,
        }
    }

    pub fn with_index(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    pub fn with_transform(mut self, transform: CellTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut column = self.clone();
        column.name = name.into();
        column
    }

    /// Picks the smallest natural fixed-width integer column able to hold a signed or
    /// unsigned integer of `bits` width, falling back to decimal/coerced-string storage
    /// for anything wider than a native 64-bit integer, per §4.3.3.
    pub fn numeric_for_width(name: impl Into<String>, bits: u16, signed: bool) -> Self {
        let storage_type = match (bits, signed) {
            (b, true) if b <= 8 => StorageType::Int8,
            (b, true) if b <= 16 => StorageType::Int16,
            (b, true) if b <= 32 => StorageType::Int32,
            (b, true) if b <= 64 => StorageType::Int64,
            (b, false) if b <= 8 => StorageType::UInt8,
            (b, false) if b <= 16 => StorageType::UInt16,
            (b, false) if b <= 32 => StorageType::UInt32,
            (b, false) if b <= 64 => StorageType::UInt64,
            (b, _) if b <= 128 => StorageType::Decimal { precision: 38, scale: 0 },
            _ => StorageType::CoercedDecimalString,
        };

        let transform = match storage_type {
            StorageType::CoercedDecimalString => Some(CellTransform::ToString),
            _ => Some(CellTransform::HexToInt),
        };

        DatasetColumn {
            name: name.into(),
            storage_type,
            analytical_type: AnalyticalType::Measure,
            index_type: Some(IndexType::Range),
            transform,
            nullable: true,
        }
    }
}
