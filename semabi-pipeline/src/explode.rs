//! ExplodeStep (§4.3.4): fans a single row out into one row per element of the
//! declared `@explode` array paths, requiring every exploded array to share a common
//! length `N` for this item instance.

use crate::leaf::default_column;
use crate::row::Row;
use crate::stage::run_stage;
use crate::transform_item::TransformItem;
use semabi_abi::decode::Decoded;
use semabi_abi::parameter::DataType;
use semabi_codec::{Cell, DatasetColumn};
use semabi_semantic::parameter::SemanticParamKind;
use semabi_semantic::{SemanticAbiItem, SemanticParameter};

struct ExplodeTarget {
    column_name: String,
    segments: Vec<String>,
    anchor_index: usize,
    data_type: DataType,
}

fn resolve_target(params: &[SemanticParameter], path: &str) -> Option<ExplodeTarget> {
    let segments: Vec<String> = path.split('.').map(str::to_string).collect();
    let mut current = params;
    let mut anchor_index = None;
    let mut final_param: Option<&SemanticParameter> = None;

    for (i, seg) in segments.iter().enumerate() {
        let param = current.iter().find(|p| &p.name == seg)?;
        if param.is_array || param.is_array_of_arrays {
            anchor_index = Some(i);
        }
        if i == segments.len() - 1 {
            final_param = Some(param);
        } else {
            current = param.components();
        }
    }

    let final_param = final_param?;
    let data_type = match &final_param.kind {
        SemanticParamKind::Primitive(dt) => *dt,
        SemanticParamKind::Tuple(_) => return None,
    };
    let parent_path = segments[..segments.len() - 1].join("_");
    let column_name = final_param.flattened_name(&parent_path);

    Some(ExplodeTarget {
        column_name,
        segments,
        anchor_index: anchor_index?,
        data_type,
    })
}

fn targets(item: &SemanticAbiItem) -> Vec<ExplodeTarget> {
    item.explode.iter().filter_map(|path| resolve_target(&item.inputs, path)).collect()
}

fn array_len(fields: &[(String, Decoded)], segments: &[String], anchor_index: usize) -> Option<usize> {
    let mut current = fields;
    for (i, seg) in segments.iter().enumerate() {
        let (_, decoded) = current.iter().find(|(n, _)| n == seg)?;
        if i == anchor_index {
            return decoded.as_array().map(<[Decoded]>::len);
        }
        current = decoded.as_tuple()?;
    }
    None
}

fn element_leaf<'a>(fields: &'a [(String, Decoded)], segments: &[String], anchor_index: usize, element_index: usize) -> Option<&'a Cell> {
    let mut current = fields;
    for (i, seg) in segments.iter().enumerate() {
        let (_, decoded) = current.iter().find(|(n, _)| n == seg)?;
        if i == anchor_index {
            let element = decoded.as_array()?.get(element_index)?;
            if i == segments.len() - 1 {
                return element.as_leaf();
            }
            current = element.as_tuple()?;
            continue;
        }
        if i == segments.len() - 1 {
            return decoded.as_leaf();
        }
        current = decoded.as_tuple()?;
    }
    None
}

pub fn schema(item: &SemanticAbiItem) -> Vec<DatasetColumn> {
    targets(item).into_iter().map(|t| default_column(t.column_name, t.data_type)).collect()
}

pub fn transform(item: &SemanticAbiItem, rows: Vec<(TransformItem, Vec<Row>)>) -> Vec<(TransformItem, Vec<Row>)> {
    if item.explode.is_empty() {
        return rows;
    }
    let targets = targets(item);
    run_stage(rows, move |transform_item, rows| {
        if rows.len() != 1 {
            return Err("explode requires exactly one input row".to_string());
        }
        let base_row = rows.into_iter().next().expect("checked len == 1");
        let fields = transform_item.decode()?;

        let mut common_len = None;
        for target in &targets {
            let len = array_len(fields, &target.segments, target.anchor_index)
                .ok_or_else(|| format!("decoded path missing: {}", target.column_name))?;
            match common_len {
                None => common_len = Some(len),
                Some(n) if n != len => return Err("exploded arrays have different lengths".to_string()),
                Some(_) => {}
            }
        }
        let n = common_len.unwrap_or(0);

        let mut out = Vec::with_capacity(n);
        for idx in 0..n {
            let mut row = base_row.clone();
            for target in &targets {
                let cell = element_leaf(fields, &target.segments, target.anchor_index, idx)
                    .ok_or_else(|| format!("decoded path missing: {}", target.column_name))?
                    .clone();
                row.insert(target.column_name.clone(), cell);
            }
            out.push(row);
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformKind;
    use semabi_abi::parameter::{ParamKind, Parameter};
    use num_bigint::BigInt;
    use semabi_semantic::ItemKind;

    fn prim(name: &str, dt: DataType) -> SemanticParameter {
        SemanticParameter::from_raw(&Parameter::new(name, ParamKind::Primitive(dt)).unwrap())
    }

    fn order_item() -> SemanticAbiItem {
        let mut order_tuple = prim("parameters", DataType::Address);
        order_tuple.kind = SemanticParamKind::Tuple(vec![prim("offerer", DataType::Address)]);
        let mut orders = prim("orders", DataType::Address);
        orders.kind = SemanticParamKind::Tuple(vec![order_tuple]);
        orders.is_array = true;

        SemanticAbiItem {
            name: "fulfillAvailableOrders".into(),
            kind: ItemKind::Function,
            inputs: vec![orders],
            outputs: vec![],
            is_primary: true,
            explode: vec!["orders.parameters.offerer".into()],
            matches: vec![],
            expressions: vec![],
        }
    }

    #[test]
    fn explodes_two_orders_into_two_rows() {
        let item = order_item();
        let elem = |addr: &str| {
            Decoded::Tuple(vec![(
                "parameters".to_string(),
                Decoded::Tuple(vec![("offerer".to_string(), Decoded::Leaf(Cell::Hex(addr.repeat(20))))]),
            )])
        };
        let transform_item = TransformItem::new("0xc", "0", TransformKind::Function, move || {
            Ok(vec![("orders".to_string(), Decoded::Array(vec![elem("aa"), elem("bb")]))])
        });
        let out = transform(&item, vec![(transform_item, vec![Row::new()])]);
        assert_eq!(out[0].1.len(), 2);
        assert_eq!(out[0].1[0].get("orders_parameters_offerer"), Some(&Cell::Hex("aa".repeat(20))));
        assert_eq!(out[0].1[1].get("orders_parameters_offerer"), Some(&Cell::Hex("bb".repeat(20))));
    }

    #[test]
    fn length_mismatch_is_a_transform_error() {
        let mut item = order_item();
        item.explode.push("amounts".into());
        item.inputs.push({
            let mut amounts = prim("amounts", DataType::Uint(256));
            amounts.is_array = true;
            amounts
        });
        let transform_item = TransformItem::new("0xc", "0", TransformKind::Function, || {
            Ok(vec![
                (
                    "orders".to_string(),
                    Decoded::Array(vec![Decoded::Tuple(vec![(
                        "parameters".to_string(),
                        Decoded::Tuple(vec![("offerer".to_string(), Decoded::Leaf(Cell::Hex("aa".repeat(20))))]),
                    )])]),
                ),
                (
                    "amounts".to_string(),
                    Decoded::Array(vec![
                        Decoded::Leaf(Cell::Integer(BigInt::from(1))),
                        Decoded::Leaf(Cell::Integer(BigInt::from(2))),
                    ]),
                ),
            ])
        });
        let out = transform(&item, vec![(transform_item, vec![Row::new()])]);
        assert_eq!(out[0].1.len(), 1);
        assert_eq!(out[0].0.error.as_deref(), Some("exploded arrays have different lengths"));
    }
}
