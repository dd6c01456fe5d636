//! [`ItemPipeline`]: the full per-primary-item stage chain (§4.3), built once from a
//! [`SemanticAbi`] and one of its primary items, then invoked once per transaction.

use crate::row::Row;
use crate::transform_item::TransformItem;
use crate::{defaults, explode, expressions, flatten, init, matchstep, project, stage};
use crate::Error;
use num_bigint::BigInt;
use semabi_codec::{AbiSchema, AnalyticalType, Cell, DatasetColumn, StorageType};
use semabi_metadata::{Block, Transaction};
use semabi_semantic::{SemanticAbi, SemanticAbiItem};

/// Stage chain: `Init → DefaultColumns → FlattenParameters → Explode → Match →
/// ExplodeIndex → Expressions(item) → Expressions(abi) → TransformError` (§4.3),
/// followed by the final projection against the item's unioned schema.
pub struct ItemPipeline {
    abi: SemanticAbi,
    item: SemanticAbiItem,
    schema: AbiSchema,
}

fn explode_index_column() -> DatasetColumn {
    DatasetColumn::new("explodeIndex", StorageType::UInt16, AnalyticalType::Dimension).non_nullable()
}

fn transform_error_column() -> DatasetColumn {
    DatasetColumn::new("transform_error", StorageType::String, AnalyticalType::Dimension)
}

fn assign_explode_index(items: Vec<(TransformItem, Vec<Row>)>) -> Vec<(TransformItem, Vec<Row>)> {
    stage::run_stage(items, |_item, rows| {
        let mut rows = rows;
        for (idx, row) in rows.iter_mut().enumerate() {
            row.insert("explodeIndex".into(), Cell::Integer(BigInt::from(idx)));
        }
        Ok(rows)
    })
}

impl ItemPipeline {
    pub fn build(abi: &SemanticAbi, item: &SemanticAbiItem) -> Result<Self, Error> {
        let mut schema = AbiSchema::empty();
        for col in defaults::schema() {
            schema.set(col);
        }
        for col in flatten::schema(item) {
            schema.set(col);
        }
        for col in explode::schema(item) {
            schema.set(col);
        }
        for m in &item.matches {
            schema = matchstep::build_schema(&schema, abi, m)?;
        }
        schema.set(explode_index_column());
        schema = expressions::build_schema(&schema, &item.expressions)?;
        schema = expressions::build_schema(&schema, &abi.table_expressions)?;
        schema.set(transform_error_column());

        Ok(ItemPipeline { abi: abi.clone(), item: item.clone(), schema })
    }

    pub fn schema(&self) -> &AbiSchema {
        &self.schema
    }

    pub fn item(&self) -> &SemanticAbiItem {
        &self.item
    }

    pub fn transform_transaction(&self, block: &Block, transaction: &Transaction) -> Vec<Row> {
        let allow_list = &self.abi.contract_allow_list;

        let mut items = init::init(&self.item, allow_list, transaction);
        items = defaults::transform(block, transaction, items);
        items = flatten::transform(&self.item, items);
        items = explode::transform(&self.item, items);
        for m in &self.item.matches {
            items = matchstep::transform(m, &self.abi, allow_list, transaction, items);
        }
        items = assign_explode_index(items);
        items = expressions::transform(&self.item.expressions, items);
        items = expressions::transform(&self.abi.table_expressions, items);

        project::project(&self.schema, items)
    }
}
