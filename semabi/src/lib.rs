//! The top-level semantic ABI compiler and block transformation pipeline (C9): builds
//! one [`semabi_pipeline::ItemPipeline`] per primary item declared in a
//! [`SemanticAbi`], unions their per-item schemas into a single output schema, and
//! drives every transaction in a block through every primary item's pipeline.

#[cfg(feature = "json")]
pub mod json;

pub use semabi_codec::{AbiSchema, AnalyticalType, Cell, DatasetColumn, StorageType};
pub use semabi_metadata::{Block, EvmChain};
pub use semabi_pipeline::{ItemPipeline, Row};
pub use semabi_semantic::SemanticAbi;

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] semabi_codec::Error),

    #[error(transparent)]
    Semantic(#[from] semabi_semantic::Error),

    #[error(transparent)]
    Pipeline(#[from] semabi_pipeline::Error),

    #[cfg(feature = "json")]
    #[error(transparent)]
    Metadata(#[from] semabi_metadata::Error),
}

/// The compiled form of a [`SemanticAbi`]: one [`ItemPipeline`] per primary item, and
/// the union of their schemas (§4.5). Built once per ABI document and then reused for
/// every block handed to [`Transformer::transform`].
pub struct Transformer {
    abi: SemanticAbi,
    pipelines: Vec<ItemPipeline>,
    schema: AbiSchema,
}

impl Transformer {
    /// Builds one pipeline per primary item and unions their schemas, rejecting the
    /// ABI if two primary items disagree on the descriptor of a same-named column
    /// (§4.5 step 5). A construction-time error, raised before any block is touched.
    pub fn build(abi: SemanticAbi) -> Result<Self, Error> {
        let pipelines = abi
            .primary_items()
            .map(|item| ItemPipeline::build(&abi, item))
            .collect::<Result<Vec<_>, _>>()?;

        let schema = AbiSchema::union(pipelines.iter().map(ItemPipeline::schema))?;

        debug!(items = pipelines.len(), columns = schema.columns().len(), "built transformer");

        Ok(Transformer { abi, pipelines, schema })
    }

    pub fn schema(&self) -> &AbiSchema {
        &self.schema
    }

    pub fn is_valid_for_chain(&self, chain: &str) -> bool {
        self.abi.is_valid_for_chain(chain)
    }

    /// The output schema as `(column name, storage type)` pairs, so any downstream
    /// columnar library can consume it without this crate depending on one.
    pub fn metadata(&self) -> Vec<(String, StorageType)> {
        self.schema.columns().iter().map(|c| (c.name.clone(), c.storage_type)).collect()
    }

    /// Runs every transaction in `block` through every primary item's pipeline,
    /// skipping the block entirely if the ABI doesn't target its chain. Every emitted
    /// row is padded against the unioned schema, so a row produced by one item's
    /// pipeline (a narrower schema) still carries every column of the wider output.
    pub fn transform(&self, block: &Block) -> Vec<Row> {
        if !self.is_valid_for_chain(block.chain.name()) {
            debug!(chain = block.chain.name(), "block chain not targeted by this ABI, skipping");
            return Vec::new();
        }

        let mut out = Vec::new();
        for transaction in &block.transactions {
            for pipeline in &self.pipelines {
                for row in pipeline.transform_transaction(block, transaction) {
                    out.push(pad_row(&self.schema, row));
                }
            }
        }
        debug!(
            block = block.header.number,
            transactions = block.transactions.len(),
            rows = out.len(),
            "transformed block"
        );
        out
    }
}

fn pad_row(schema: &AbiSchema, row: Row) -> Row {
    let mut padded: Row = HashMap::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let cell = row.get(&column.name).cloned().unwrap_or(Cell::Null);
        padded.insert(column.name.clone(), cell);
    }
    padded
}
