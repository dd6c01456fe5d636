//! Final projection (§4.3 step 3): every schema column is present in output order,
//! missing values are explicit nulls, each column's cell transform is applied, and
//! `transform_error` (if present in the schema) is filled from the item's latched
//! error.

use crate::row::Row;
use crate::transform_item::TransformItem;
use semabi_codec::{AbiSchema, Cell};

pub fn project(schema: &AbiSchema, items: Vec<(TransformItem, Vec<Row>)>) -> Vec<Row> {
    let mut out = Vec::new();
    for (item, rows) in items {
        for row in rows {
            let mut projected = Row::new();
            for column in schema.columns() {
                if column.name == "transform_error" {
                    let cell = item.error.clone().map(Cell::String).unwrap_or(Cell::Null);
                    projected.insert(column.name.clone(), cell);
                    continue;
                }
                let raw = row.get(&column.name).cloned().unwrap_or(Cell::Null);
                let value = match column.transform {
                    Some(transform) => transform.apply(&raw).unwrap_or(Cell::Null),
                    None => raw,
                };
                projected.insert(column.name.clone(), value);
            }
            out.push(projected);
        }
    }
    out
}
