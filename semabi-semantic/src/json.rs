//! Parses the semantic ABI document shape (§6): a standard ABI item list where each
//! item and each nested parameter may carry `@`-prefixed directive keys.

use crate::item::{ItemExpression, ItemKind, Match, MatchAssert, MatchType, Predicate, SemanticAbi, SemanticAbiItem};
use crate::parameter::{ParameterTransform, SemanticParamKind, SemanticParameter};
use crate::Error;
use semabi_abi::parameter::{DataType, ParamKind, Parameter};
use semabi_codec::StorageType;
use serde_json::Value;

fn parse_result_type(raw: &str) -> Result<StorageType, Error> {
    match raw {
        "int" => Ok(StorageType::Int64),
        "double" => Ok(StorageType::Float64),
        "string" => Ok(StorageType::String),
        other => Err(Error::Abi(semabi_abi::Error::MalformedJson(format!(
            "unknown expression result type '{other}'"
        )))),
    }
}

fn parse_expression(value: &Value) -> Result<ItemExpression, Error> {
    let name = value
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Abi(semabi_abi::Error::MalformedJson("expression missing 'name'".into())))?
        .to_string();
    let expr_src = value
        .get("expression")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Abi(semabi_abi::Error::MalformedJson(format!("expression '{name}' missing 'expression'"))))?;
    let expression = semabi_expr::parse(expr_src)?;
    let result_type = value
        .get("type")
        .and_then(|v| v.as_str())
        .map(parse_result_type)
        .transpose()?;
    Ok(ItemExpression { name, expression, result_type })
}

fn parse_transform(value: &Value) -> Result<ParameterTransform, Error> {
    let name = value.get("name").and_then(|v| v.as_str()).map(str::to_string);
    let expression = value
        .get("expression")
        .and_then(|v| v.as_str())
        .map(semabi_expr::parse)
        .transpose()?;
    let result_type = value
        .get("type")
        .and_then(|v| v.as_str())
        .map(parse_result_type)
        .transpose()?;
    Ok(ParameterTransform { name, expression, result_type })
}

fn parse_semantic_parameter(value: &Value) -> Result<SemanticParameter, Error> {
    let name = value
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Abi(semabi_abi::Error::MalformedJson("parameter missing 'name'".into())))?;
    let raw_type = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Abi(semabi_abi::Error::MalformedJson(format!("parameter '{name}' missing 'type'"))))?;
    let indexed = value.get("indexed").and_then(|v| v.as_bool()).unwrap_or(false);
    let exclude = value.get("@exclude").and_then(|v| v.as_bool()).unwrap_or(false);

    let (base, depth) = Parameter::split_array_suffix(raw_type);

    let kind = if base == "tuple" {
        let components = value
            .get("components")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::Abi(semabi_abi::Error::MalformedJson(format!("tuple parameter '{name}' missing 'components'"))))?;
        let parsed = components
            .iter()
            .map(parse_semantic_parameter)
            .collect::<Result<Vec<_>, _>>()?;
        SemanticParamKind::Tuple(parsed)
    } else {
        SemanticParamKind::Primitive(DataType::parse(base).map_err(Error::Abi)?)
    };

    let transform = value.get("@transform").map(parse_transform).transpose()?;

    Ok(SemanticParameter {
        name: name.to_string(),
        kind,
        is_indexed: indexed,
        is_array: depth >= 1,
        is_array_of_arrays: depth == 2,
        exclude,
        transform,
    })
}

fn parse_predicate(value: &Value) -> Result<Predicate, Error> {
    let malformed = |msg: String| Error::Abi(semabi_abi::Error::MalformedJson(msg));
    let ty = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("predicate missing 'type'".into()))?;
    let source_col = value
        .get("source")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("predicate missing 'source'".into()))?
        .to_string();
    match ty {
        "equal" => {
            let matched_col = value
                .get("matched")
                .and_then(|v| v.as_str())
                .ok_or_else(|| malformed("equal predicate missing 'matched'".into()))?
                .to_string();
            Ok(Predicate::Equal { source_col, matched_col })
        }
        "bound" => {
            let matched_col = value
                .get("matched")
                .and_then(|v| v.as_str())
                .ok_or_else(|| malformed("bound predicate missing 'matched'".into()))?
                .to_string();
            let lower = value.get("lower").and_then(Value::as_f64);
            let upper = value.get("upper").and_then(Value::as_f64);
            Ok(Predicate::Bound { source_col, matched_col, lower, upper })
        }
        "in" => {
            let matched_cols = value
                .get("matched")
                .and_then(|v| v.as_array())
                .ok_or_else(|| malformed("in predicate missing 'matched'".into()))?
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| malformed("in predicate 'matched' must be an array of strings".into()))?;
            Ok(Predicate::InSet { source_col, matched_cols })
        }
        other => Err(malformed(format!("unknown predicate type '{other}'"))),
    }
}

fn parse_match(value: &Value) -> Result<Match, Error> {
    let malformed = |msg: String| Error::Abi(semabi_abi::Error::MalformedJson(msg));
    let signature = value.get("signature").and_then(|v| v.as_str()).map(str::to_string);
    let match_type = match value.get("type").and_then(|v| v.as_str()) {
        Some("event") => MatchType::Event,
        Some("function") => MatchType::Function,
        Some("transfer") => MatchType::Transfer,
        other => return Err(malformed(format!("unknown match type {other:?}"))),
    };
    let prefix = value
        .get("prefix")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("match missing 'prefix'".into()))?
        .to_string();
    let assert = match value.get("assert").and_then(|v| v.as_str()) {
        Some("onlyOne") => MatchAssert::OnlyOne,
        Some("many") => MatchAssert::Many,
        Some("optionalOne") => MatchAssert::OptionalOne,
        other => return Err(malformed(format!("unknown match assert {other:?}"))),
    };
    let predicates = value
        .get("predicates")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(parse_predicate).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    Ok(Match { signature, match_type, prefix, assert, predicates })
}

fn parse_item(value: &Value) -> Result<Option<SemanticAbiItem>, Error> {
    let malformed = |msg: String| Error::Abi(semabi_abi::Error::MalformedJson(msg));
    let item_type = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let kind = match item_type {
        "event" => ItemKind::Event,
        "function" => ItemKind::Function,
        _ => return Ok(None), // `constructor`, `fallback`, `receive`, etc. never participate.
    };
    let name = value
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("item missing 'name'".into()))?
        .to_string();

    let inputs = value
        .get("inputs")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(parse_semantic_parameter).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    let outputs = if kind == ItemKind::Function {
        value
            .get("outputs")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().map(parse_semantic_parameter).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default()
    } else {
        vec![]
    };

    let is_primary = value.get("@isPrimary").and_then(|v| v.as_bool()).unwrap_or(false);
    let explode = value
        .get("@explode")
        .and_then(|v| v.get("paths"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| malformed("@explode.paths must be an array of strings".into()))
        })
        .transpose()?
        .unwrap_or_default();
    let matches = value
        .get("@matches")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(parse_match).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    let expressions = value
        .get("@expressions")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(parse_expression).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    Ok(Some(SemanticAbiItem { name, kind, inputs, outputs, is_primary, explode, matches, expressions }))
}

/// Parses a full semantic ABI document (`{"metadata": {...}, "abi": [...]}`).
pub fn semantic_abi_from_json(document: &Value) -> Result<SemanticAbi, Error> {
    let malformed = |msg: String| Error::Abi(semabi_abi::Error::MalformedJson(msg));
    let metadata = document.get("metadata").ok_or_else(|| malformed("document missing 'metadata'".into()))?;
    let chains = metadata
        .get("chains")
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed("metadata missing 'chains'".into()))?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| malformed("'chains' must be an array of strings".into()))?;
    let contract_allow_list = metadata
        .get("contractAddresses")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| malformed("'contractAddresses' must be an array of strings".into()))
        })
        .transpose()?
        .unwrap_or_default();
    let table_expressions = metadata
        .get("expressions")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(parse_expression).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    let items = document
        .get("abi")
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed("document missing 'abi'".into()))?
        .iter()
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();

    SemanticAbi::new(chains, contract_allow_list, table_expressions, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_document_with_one_primary_event() {
        let doc = json!({
            "metadata": { "chains": ["ethereum"] },
            "abi": [{
                "type": "event",
                "name": "Transfer",
                "@isPrimary": true,
                "inputs": [
                    {"name": "from", "type": "address", "indexed": true},
                    {"name": "to", "type": "address", "indexed": true},
                    {"name": "value", "type": "uint256", "indexed": false}
                ]
            }]
        });
        let abi = semantic_abi_from_json(&doc).unwrap();
        assert_eq!(abi.primary_items().count(), 1);
        assert!(abi.is_valid_for_chain("ethereum"));
    }

    #[test]
    fn parses_exclude_and_transform_directives() {
        let doc = json!({
            "metadata": { "chains": ["ethereum"] },
            "abi": [{
                "type": "event",
                "name": "Transfer",
                "@isPrimary": true,
                "inputs": [
                    {"name": "from", "type": "address", "indexed": true, "@exclude": true},
                    {"name": "to", "type": "address", "indexed": true},
                    {"name": "value", "type": "uint256", "indexed": false,
                     "@transform": {"name": "amount", "type": "string"}}
                ]
            }]
        });
        let abi = semantic_abi_from_json(&doc).unwrap();
        let item = abi.primary_items().next().unwrap();
        assert!(item.inputs[0].exclude);
        assert_eq!(item.inputs[2].transform.as_ref().unwrap().name.as_deref(), Some("amount"));
    }

    #[test]
    fn non_abi_item_types_are_skipped() {
        let doc = json!({
            "metadata": { "chains": ["ethereum"] },
            "abi": [
                {"type": "constructor", "inputs": []},
                {"type": "event", "name": "Transfer", "@isPrimary": true, "inputs": []}
            ]
        });
        let abi = semantic_abi_from_json(&doc).unwrap();
        assert_eq!(abi.items().len(), 1);
    }
}
