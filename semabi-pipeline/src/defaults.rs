//! DefaultColumnsStep (§4.3.2): twelve columns populated directly from the block,
//! transaction, and item — no decoding needed.

use crate::row::Row;
use crate::stage::run_stage;
use crate::transform_item::TransformItem;
use num_bigint::BigInt;
use semabi_codec::{AnalyticalType, Cell, DatasetColumn, IndexType, StorageType};
use semabi_metadata::{Block, Transaction};

pub fn schema() -> Vec<DatasetColumn> {
    vec![
        DatasetColumn::new("chain", StorageType::String, AnalyticalType::Dimension).non_nullable(),
        DatasetColumn::new("blockHash", StorageType::String, AnalyticalType::Dimension).non_nullable(),
        DatasetColumn::new("blockNumber", StorageType::UInt64, AnalyticalType::Dimension)
            .with_index(IndexType::Range)
            .non_nullable(),
        DatasetColumn::new("blockTimestamp", StorageType::Timestamp, AnalyticalType::Date)
            .with_index(IndexType::Timestamp)
            .non_nullable(),
        DatasetColumn::new("transactionHash", StorageType::String, AnalyticalType::Dimension)
            .with_index(IndexType::Inverted)
            .non_nullable(),
        DatasetColumn::new("transactionFrom", StorageType::String, AnalyticalType::Dimension),
        DatasetColumn::new("transactionTo", StorageType::String, AnalyticalType::Dimension),
        DatasetColumn::new("contractAddress", StorageType::String, AnalyticalType::Dimension)
            .with_index(IndexType::Inverted)
            .non_nullable(),
        DatasetColumn::new("status", StorageType::UInt8, AnalyticalType::Dimension).non_nullable(),
        DatasetColumn::new("gasUsed", StorageType::UInt64, AnalyticalType::Measure),
        DatasetColumn::new("itemType", StorageType::String, AnalyticalType::Dimension).non_nullable(),
        DatasetColumn::new("internalIndex", StorageType::String, AnalyticalType::Dimension).non_nullable(),
    ]
}

pub fn transform(block: &Block, transaction: &Transaction, items: Vec<(TransformItem, Vec<Row>)>) -> Vec<(TransformItem, Vec<Row>)> {
    run_stage(items, |item, rows| {
        let mut rows = rows;
        for row in &mut rows {
            row.insert("chain".into(), Cell::String(block.chain.name().to_string()));
            row.insert("blockHash".into(), Cell::String(block.header.hash.clone()));
            row.insert("blockNumber".into(), Cell::Integer(BigInt::from(block.header.number)));
            row.insert("blockTimestamp".into(), Cell::Integer(BigInt::from(block.header.timestamp)));
            row.insert("transactionHash".into(), Cell::String(transaction.hash.clone()));
            row.insert("transactionFrom".into(), Cell::String(transaction.from.clone()));
            row.insert(
                "transactionTo".into(),
                transaction.to.clone().map(Cell::String).unwrap_or(Cell::Null),
            );
            row.insert("contractAddress".into(), Cell::String(item.contract_address.clone()));
            row.insert("status".into(), Cell::Integer(BigInt::from(transaction.effective_status())));
            row.insert("gasUsed".into(), Cell::Integer(BigInt::from(transaction.receipt.gas_used)));
            row.insert("itemType".into(), Cell::String(item.kind.as_str().to_string()));
            row.insert("internalIndex".into(), Cell::String(item.internal_index.clone()));
        }
        Ok(rows)
    })
}
