//! InitStep (§4.3.1): scans a transaction's logs or traces for instances of one
//! primary item, past the contract allow-list, and seeds one [`TransformItem`] with
//! an empty row per match.

use crate::row::Row;
use crate::transform_item::{TransformItem, TransformKind};
use semabi_abi::decode::{decode_event, decode_function_input};
use semabi_metadata::{Log, Trace, Transaction};
use semabi_semantic::{ItemKind, SemanticAbiItem};

fn allowed(allow_list: &[String], address: &str) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|a| a == &address.to_lowercase())
}

fn decode_log_bytes(log: &Log) -> Result<Vec<u8>, String> {
    hex::decode(log.data.trim_start_matches("0x")).map_err(|e| e.to_string())
}

fn init_event(item: &SemanticAbiItem, allow_list: &[String], transaction: &Transaction) -> Vec<(TransformItem, Vec<Row>)> {
    let expected_hash = item.hash();
    transaction
        .logs()
        .iter()
        .filter(|log| {
            log.topics
                .first()
                .map(|t| t.trim_start_matches("0x").eq_ignore_ascii_case(&expected_hash))
                .unwrap_or(false)
        })
        .filter(|log| allowed(allow_list, &log.address))
        .map(|log| {
            let raw_item = item.raw_item();
            let topics = log.topics.clone();
            let data = decode_log_bytes(log);
            let transform_item = TransformItem::new(log.address.clone(), log.log_index.to_string(), TransformKind::Event, move || {
                let data = data?;
                decode_event(&raw_item, &topics, &data).map_err(|e| e.to_string())
            });
            (transform_item, vec![Row::new()])
        })
        .collect()
}

fn selector_matches(trace: &Trace, expected_hash: &str) -> bool {
    let input = trace.input.trim_start_matches("0x");
    input.len() >= 8 && input[..8].eq_ignore_ascii_case(expected_hash)
}

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

fn init_function(item: &SemanticAbiItem, allow_list: &[String], transaction: &Transaction) -> Vec<(TransformItem, Vec<Row>)> {
    let expected_hash = item.hash();
    transaction
        .traces
        .iter()
        .filter(|trace| selector_matches(trace, &expected_hash))
        .filter(|trace| allowed(allow_list, trace.to.as_deref().unwrap_or(ZERO_ADDRESS)))
        .map(|trace| {
            let raw_item = item.raw_item();
            let calldata = hex::decode(trace.input.trim_start_matches("0x")).map_err(|e| e.to_string());
            let contract_address = trace.to.clone().unwrap_or_else(|| ZERO_ADDRESS.to_string());
            let transform_item = TransformItem::new(contract_address, trace.path_key(), TransformKind::Function, move || {
                let calldata = calldata?;
                decode_function_input(&raw_item, &calldata).map_err(|e| e.to_string())
            });
            (transform_item, vec![Row::new()])
        })
        .collect()
}

/// Dispatches on the item's kind: an event item scans logs, a function item scans
/// trace call sites.
pub fn init(item: &SemanticAbiItem, allow_list: &[String], transaction: &Transaction) -> Vec<(TransformItem, Vec<Row>)> {
    match item.kind {
        ItemKind::Event => init_event(item, allow_list, transaction),
        ItemKind::Function => init_function(item, allow_list, transaction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semabi_abi::parameter::{DataType, ParamKind, Parameter};
    use semabi_metadata::Receipt;
    use semabi_semantic::SemanticParameter;

    fn transfer_item() -> SemanticAbiItem {
        let from = Parameter::new("from", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
        let to = Parameter::new("to", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
        let value = Parameter::new("value", ParamKind::Primitive(DataType::Uint(256))).unwrap();
        SemanticAbiItem {
            name: "Transfer".into(),
            kind: ItemKind::Event,
            inputs: vec![SemanticParameter::from_raw(&from), SemanticParameter::from_raw(&to), SemanticParameter::from_raw(&value)],
            outputs: vec![],
            is_primary: true,
            explode: vec![],
            matches: vec![],
            expressions: vec![],
        }
    }

    #[test]
    fn finds_matching_log_and_builds_one_item_per_match() {
        let item = transfer_item();
        let log = Log {
            address: "0xtoken".into(),
            topics: vec![format!("0x{}", item.hash())],
            data: "0x".into(),
            log_index: 3,
        };
        let tx = Transaction {
            hash: "0xabc".into(),
            from: "0xfrom".into(),
            to: Some("0xto".into()),
            input: "0x".into(),
            receipt: Receipt { transaction_hash: "0xabc".into(), status: Some(1), gas_used: 1, logs: vec![log] },
            traces: vec![],
        };
        let items = init(&item, &[], &tx);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0.internal_index, "3");
    }

    #[test]
    fn allow_list_filters_out_other_contracts() {
        let item = transfer_item();
        let log = Log {
            address: "0xtoken".into(),
            topics: vec![format!("0x{}", item.hash())],
            data: "0x".into(),
            log_index: 0,
        };
        let tx = Transaction {
            hash: "0xabc".into(),
            from: "0xfrom".into(),
            to: Some("0xto".into()),
            input: "0x".into(),
            receipt: Receipt { transaction_hash: "0xabc".into(), status: Some(1), gas_used: 1, logs: vec![log] },
            traces: vec![],
        };
        let items = init(&item, &["0xother".to_string()], &tx);
        assert!(items.is_empty());
    }
}
