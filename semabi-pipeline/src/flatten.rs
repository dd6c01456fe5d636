//! FlattenParametersStep (§4.3.3): one column per non-excluded, non-array primitive
//! leaf across an item's inputs (and, for functions, its outputs).

use crate::leaf::{collect_leaves, leaf_column, lookup_leaf, LeafSpec};
use crate::row::Row;
use crate::stage::run_stage;
use crate::transform_item::TransformItem;
use semabi_codec::{Cell, DatasetColumn};
use semabi_semantic::SemanticAbiItem;
use std::collections::HashMap;

fn leaves_for(item: &SemanticAbiItem) -> Vec<LeafSpec> {
    let mut leaves = collect_leaves(&item.inputs);
    leaves.extend(collect_leaves(&item.outputs));
    leaves
}

pub fn schema(item: &SemanticAbiItem) -> Vec<DatasetColumn> {
    leaves_for(item).iter().map(leaf_column).collect()
}

fn cell_for_leaf(leaf: &LeafSpec, fields: &[(String, semabi_abi::decode::Decoded)]) -> Result<Cell, String> {
    let raw = lookup_leaf(fields, &leaf.path).ok_or_else(|| format!("decoded path missing: {}", leaf.column_name))?;
    match &leaf.transform {
        Some(t) if t.expression.is_some() => {
            let mut vars = HashMap::new();
            vars.insert("this".to_string(), raw.clone());
            semabi_expr::evaluate(t.expression.as_ref().unwrap(), &vars).map_err(|e| e.to_string())
        }
        _ => Ok(raw.clone()),
    }
}

pub fn transform(item: &SemanticAbiItem, rows: Vec<(TransformItem, Vec<Row>)>) -> Vec<(TransformItem, Vec<Row>)> {
    let leaves = leaves_for(item);
    run_stage(rows, |transform_item, rows| {
        let fields = transform_item.decode()?;
        let mut rows = rows;
        for row in &mut rows {
            for leaf in &leaves {
                row.insert(leaf.column_name.clone(), cell_for_leaf(leaf, fields)?);
            }
        }
        Ok(rows)
    })
}
