//! ExpressionListStep (§4.3.7): shared by both the item-scope and ABI-scope
//! expression lists. Evaluated sequentially so a later expression may reference an
//! earlier one's column; schema validation happens once, up front, against the
//! accumulating schema.

use crate::row::Row;
use crate::stage::run_stage;
use crate::transform_item::TransformItem;
use crate::Error;
use semabi_codec::{AbiSchema, AnalyticalType, DatasetColumn, StorageType};
use semabi_semantic::ItemExpression;
use std::collections::HashSet;

fn column_for(expr: &ItemExpression) -> DatasetColumn {
    match expr.result_type {
        Some(result_type) => DatasetColumn::new(expr.name.clone(), result_type, AnalyticalType::Measure),
        None => DatasetColumn::new(expr.name.clone(), StorageType::String, AnalyticalType::Dimension),
    }
}

pub fn build_schema(current: &AbiSchema, expressions: &[ItemExpression]) -> Result<AbiSchema, Error> {
    let mut schema = current.clone();
    let mut known: HashSet<String> = schema.columns().iter().map(|c| c.name.clone()).collect();
    for expr in expressions {
        for var in semabi_expr::referenced_variables(&expr.expression) {
            if !known.contains(&var) {
                return Err(Error::UnknownExpressionColumn(var));
            }
        }
        schema.set(column_for(expr));
        known.insert(expr.name.clone());
    }
    Ok(schema)
}

pub fn transform(expressions: &[ItemExpression], rows: Vec<(TransformItem, Vec<Row>)>) -> Vec<(TransformItem, Vec<Row>)> {
    if expressions.is_empty() {
        return rows;
    }
    run_stage(rows, |_item, rows| {
        let mut rows = rows;
        for row in &mut rows {
            for expr in expressions {
                let value = semabi_expr::evaluate(&expr.expression, row).map_err(|e| e.to_string())?;
                row.insert(expr.name.clone(), value);
            }
        }
        Ok(rows)
    })
}
