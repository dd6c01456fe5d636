//! The shared "first-failure latches" stage-invocation discipline (§4.3, §9): a stage
//! whose item already carries a transform error is skipped; otherwise the stage runs,
//! and any error it raises is latched onto the item while the item's prior rows pass
//! through unchanged.

use crate::row::Row;
use crate::transform_item::TransformItem;
use tracing::warn;

pub fn run_stage<F>(items: Vec<(TransformItem, Vec<Row>)>, mut f: F) -> Vec<(TransformItem, Vec<Row>)>
where
    F: FnMut(&TransformItem, Vec<Row>) -> Result<Vec<Row>, String>,
{
    items
        .into_iter()
        .map(|(mut item, rows)| {
            if item.error.is_some() {
                return (item, rows);
            }
            let previous = rows.clone();
            match f(&item, rows) {
                Ok(updated) => (item, updated),
                Err(message) => {
                    warn!(contract = %item.contract_address, internal_index = %item.internal_index, %message, "stage failed, latching transform error");
                    item.latch_error(message);
                    (item, previous)
                }
            }
        })
        .collect()
}
