//! MatchStep (§4.3.5): for each declared `Match`, pulls candidate rows from a sibling
//! pipeline (event/function: `Init → Flatten`; transfer: [`crate::transfer`]), filters
//! them by conjunctive predicate evaluation against the current row, and folds the
//! result in under the match's column prefix per its assertion.

use crate::row::Row;
use crate::stage::run_stage;
use crate::transform_item::TransformItem;
use crate::{flatten, init, transfer};
use crate::Error;
use semabi_codec::{AbiSchema, Cell};
use semabi_metadata::Transaction;
use semabi_semantic::{Match, MatchAssert, MatchType, Predicate, SemanticAbi};

fn sibling_schema(m: &Match, abi: &SemanticAbi) -> Result<AbiSchema, Error> {
    match m.match_type {
        MatchType::Transfer => {
            let mut schema = AbiSchema::empty();
            for col in transfer::schema() {
                schema.set(col);
            }
            Ok(schema)
        }
        MatchType::Event | MatchType::Function => {
            let sig = m.signature.as_deref().unwrap_or_default();
            let target = abi
                .item_by_signature(sig)
                .ok_or_else(|| Error::UnknownMatchTarget(sig.to_string()))?;
            let mut schema = AbiSchema::empty();
            for col in flatten::schema(target) {
                schema.set(col);
            }
            Ok(schema)
        }
    }
}

fn predicate_columns(p: &Predicate) -> (Vec<&str>, Vec<&str>) {
    match p {
        Predicate::Equal { source_col, matched_col } => (vec![source_col.as_str()], vec![matched_col.as_str()]),
        Predicate::Bound { source_col, matched_col, .. } => (vec![source_col.as_str()], vec![matched_col.as_str()]),
        Predicate::InSet { source_col, matched_cols } => {
            (vec![source_col.as_str()], matched_cols.iter().map(String::as_str).collect())
        }
    }
}

/// Folds this match's prefixed sibling schema into `current`, validating that every
/// predicate's source column already exists in `current` and every matched column
/// exists in the sibling schema (§4.3.5). A construction-time error, never a
/// per-row transform error.
pub fn build_schema(current: &AbiSchema, abi: &SemanticAbi, m: &Match) -> Result<AbiSchema, Error> {
    let sibling = sibling_schema(m, abi)?;
    for predicate in &m.predicates {
        let (source_cols, matched_cols) = predicate_columns(predicate);
        for col in source_cols {
            if !current.contains(col) {
                return Err(Error::UnknownSourceColumn(col.to_string()));
            }
        }
        for col in matched_cols {
            if !sibling.contains(col) {
                return Err(Error::UnknownMatchedColumn(col.to_string()));
            }
        }
    }
    let mut result = current.clone();
    for col in sibling.with_prefix(&m.prefix).columns() {
        result.append_distinct(col.clone())?;
    }
    Ok(result)
}

fn sibling_rows(m: &Match, abi: &SemanticAbi, allow_list: &[String], transaction: &Transaction) -> Result<Vec<Row>, String> {
    match m.match_type {
        MatchType::Transfer => Ok(transfer::candidate_rows(transaction)),
        MatchType::Event | MatchType::Function => {
            let sig = m.signature.as_deref().unwrap_or_default();
            let target = abi
                .item_by_signature(sig)
                .ok_or_else(|| format!("match targets unknown item signature '{sig}'"))?;
            let items = init::init(target, allow_list, transaction);
            let transformed = flatten::transform(target, items);
            Ok(transformed.into_iter().filter(|(item, _)| item.error.is_none()).flat_map(|(_, rows)| rows).collect())
        }
    }
}

fn predicate_holds(predicate: &Predicate, source: &Row, candidate: &Row) -> bool {
    match predicate {
        Predicate::Equal { source_col, matched_col } => {
            matches!((source.get(source_col), candidate.get(matched_col)), (Some(a), Some(b)) if a == b)
        }
        Predicate::Bound { source_col, matched_col, lower, upper } => {
            let (Some(source_value), Some(matched_value)) =
                (source.get(source_col).and_then(Cell::as_float), candidate.get(matched_col).and_then(Cell::as_float))
            else {
                return false;
            };
            if let Some(lower) = lower {
                if matched_value < lower * source_value {
                    return false;
                }
            }
            if let Some(upper) = upper {
                if matched_value > upper * source_value {
                    return false;
                }
            }
            true
        }
        Predicate::InSet { source_col, matched_cols } => match source.get(source_col) {
            Some(source_value) => matched_cols.iter().any(|col| candidate.get(col) == Some(source_value)),
            None => false,
        },
    }
}

fn matches_row(m: &Match, source: &Row, candidate: &Row) -> bool {
    m.predicates.iter().all(|p| predicate_holds(p, source, candidate))
}

fn merge_prefixed(row: &mut Row, candidate: &Row, prefix: &str) {
    for (name, cell) in candidate {
        row.insert(format!("{prefix}_{name}"), cell.clone());
    }
}

fn fill_null_prefixed(row: &mut Row, columns: &[String], prefix: &str) {
    for name in columns {
        row.insert(format!("{prefix}_{name}"), Cell::Null);
    }
}

pub fn transform(
    m: &Match,
    abi: &SemanticAbi,
    allow_list: &[String],
    transaction: &Transaction,
    rows: Vec<(TransformItem, Vec<Row>)>,
) -> Vec<(TransformItem, Vec<Row>)> {
    let candidates = match sibling_rows(m, abi, allow_list, transaction) {
        Ok(c) => c,
        Err(message) => {
            tracing::warn!(prefix = %m.prefix, %message, "match sibling pipeline failed, latching transform error");
            return rows
                .into_iter()
                .map(|(mut item, rows)| {
                    item.latch_error(message.clone());
                    (item, rows)
                })
                .collect();
        }
    };
    let sibling_cols: Vec<String> =
        sibling_schema(m, abi).map(|s| s.columns().iter().map(|c| c.name.clone()).collect()).unwrap_or_default();

    run_stage(rows, move |_item, rows| {
        if m.assert == MatchAssert::Many && rows.len() != 1 {
            return Err("many match requires exactly one input row".to_string());
        }
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let filtered: Vec<&Row> = candidates.iter().filter(|c| matches_row(m, &row, c)).collect();
            match m.assert {
                MatchAssert::OnlyOne => match filtered.len() {
                    0 => return Err(format!("match '{}': no match", m.prefix)),
                    1 => {
                        let mut merged = row.clone();
                        merge_prefixed(&mut merged, filtered[0], &m.prefix);
                        out.push(merged);
                    }
                    _ => return Err(format!("match '{}': multiple matches", m.prefix)),
                },
                MatchAssert::OptionalOne => match filtered.len() {
                    0 => {
                        let mut merged = row.clone();
                        fill_null_prefixed(&mut merged, &sibling_cols, &m.prefix);
                        out.push(merged);
                    }
                    1 => {
                        let mut merged = row.clone();
                        merge_prefixed(&mut merged, filtered[0], &m.prefix);
                        out.push(merged);
                    }
                    _ => return Err(format!("match '{}': multiple matches", m.prefix)),
                },
                MatchAssert::Many => {
                    if filtered.is_empty() {
                        return Err(format!("match '{}': no match", m.prefix));
                    }
                    for candidate in filtered {
                        let mut merged = row.clone();
                        merge_prefixed(&mut merged, candidate, &m.prefix);
                        out.push(merged);
                    }
                }
            }
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformKind;
    use num_bigint::BigInt;
    use semabi_metadata::Receipt;
    use semabi_semantic::SemanticAbi;

    fn empty_transaction() -> Transaction {
        Transaction {
            hash: "0xabc".into(),
            from: "0xfrom".into(),
            to: Some("0xto".into()),
            input: "0x".into(),
            receipt: Receipt { transaction_hash: "0xabc".into(), status: Some(1), gas_used: 1, logs: vec![] },
            traces: vec![],
        }
    }

    fn transfer_only_one(prefix: &str) -> Match {
        Match {
            signature: None,
            match_type: MatchType::Transfer,
            prefix: prefix.into(),
            assert: MatchAssert::OnlyOne,
            predicates: vec![],
        }
    }

    #[test]
    fn only_one_with_no_candidates_is_a_transform_error() {
        let m = transfer_only_one("t");
        let abi = SemanticAbi::new(
            vec!["ethereum".into()],
            vec![],
            vec![],
            vec![semabi_semantic::SemanticAbiItem {
                name: "f".into(),
                kind: semabi_semantic::ItemKind::Function,
                inputs: vec![],
                outputs: vec![],
                is_primary: true,
                explode: vec![],
                matches: vec![],
                expressions: vec![],
            }],
        )
        .unwrap();
        let tx = empty_transaction();
        let transform_item = TransformItem::new("0xc", "0", TransformKind::Function, || Ok(vec![]));
        let out = transform(&m, &abi, &[], &tx, vec![(transform_item, vec![Row::new()])]);
        assert!(out[0].0.error.as_deref() == Some("match 't': no match"));
    }

    #[test]
    fn predicate_bound_scales_source_by_factor() {
        let mut source = Row::new();
        source.insert("value".into(), Cell::Integer(BigInt::from(100)));
        let mut candidate = Row::new();
        candidate.insert("matchedValue".into(), Cell::Integer(BigInt::from(90)));
        let predicate = Predicate::Bound {
            source_col: "value".into(),
            matched_col: "matchedValue".into(),
            lower: Some(0.8),
            upper: Some(1.0),
        };
        assert!(predicate_holds(&predicate, &source, &candidate));
    }
}
