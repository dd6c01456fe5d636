//! Column model, typed cell values, and schema algebra for the semantic ABI pipeline.

pub mod cell;
pub mod column;
pub mod schema;
pub mod transform;

pub use cell::Cell;
pub use column::{AnalyticalType, DatasetColumn, IndexType, StorageType};
pub use schema::AbiSchema;
pub use transform::CellTransform;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("column '{0}' has conflicting types: {1:?} and {2:?}")]
    SchemaConflict(String, Box<DatasetColumn>, Box<DatasetColumn>),

    #[error("cell transform applied to incompatible value: {0}")]
    TransformMismatch(String),
}
