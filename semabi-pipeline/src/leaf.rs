//! Flattening a semantic parameter tree into primitive leaf columns (§4.3.3), and the
//! typed-column derivation rules for each primitive ABI type. Shared by
//! [`crate::flatten`], [`crate::explode`], and the sibling-schema builder in
//! [`crate::matchstep`].

use semabi_abi::decode::Decoded;
use semabi_abi::parameter::DataType;
use semabi_codec::{AnalyticalType, Cell, CellTransform, DatasetColumn, StorageType};
use semabi_semantic::{ParameterTransform, SemanticParameter};
use semabi_semantic::parameter::SemanticParamKind;

/// A single flattened leaf: its final column name, the dot-path of raw parameter
/// names needed to find it in a [`Decoded`] tree, its primitive type, and any
/// per-parameter transform that applies to it.
#[derive(Debug, Clone)]
pub struct LeafSpec {
    pub column_name: String,
    pub path: Vec<String>,
    pub data_type: DataType,
    pub transform: Option<ParameterTransform>,
}

/// Walks `params`, skipping `@exclude`d and array-valued nodes — this crate's column
/// model (C1) has no storage type for a raw list, so an un-exploded array parameter
/// contributes no column at all; only [`crate::explode::ExplodeStep`] ever turns an
/// array into per-element scalar columns. See DESIGN.md for this scope decision.
pub fn collect_leaves(params: &[SemanticParameter]) -> Vec<LeafSpec> {
    let mut out = Vec::new();
    walk(params, &[], &mut out);
    out
}

fn walk(params: &[SemanticParameter], prefix: &[String], out: &mut Vec<LeafSpec>) {
    let parent = prefix.join("_");
    for param in params {
        if param.exclude {
            continue;
        }
        if param.is_array || param.is_array_of_arrays {
            continue;
        }
        match &param.kind {
            SemanticParamKind::Primitive(dt) => {
                let mut path = prefix.to_vec();
                path.push(param.name.clone());
                out.push(LeafSpec {
                    column_name: param.flattened_name(&parent),
                    path,
                    data_type: *dt,
                    transform: param.transform.clone(),
                });
            }
            SemanticParamKind::Tuple(children) => {
                let mut path = prefix.to_vec();
                path.push(param.name.clone());
                walk(children, &path, out);
            }
        }
    }
}

/// Navigates a decoded tree along `path`, returning the leaf cell at the end.
/// `None` means the path didn't resolve — a `decoded path missing` transform error
/// at the caller.
pub fn lookup_leaf<'a>(fields: &'a [(String, Decoded)], path: &[String]) -> Option<&'a Cell> {
    let mut current = fields;
    for (i, segment) in path.iter().enumerate() {
        let (_, decoded) = current.iter().find(|(name, _)| name == segment)?;
        if i == path.len() - 1 {
            return decoded.as_leaf();
        }
        current = decoded.as_tuple()?;
    }
    None
}

/// Picks the smallest natural integer column for `bits`, correcting
/// [`DatasetColumn::numeric_for_width`]'s default assumption that the raw cell is a
/// hex string needing [`CellTransform::HexToInt`]: this decoder (C3) already decodes
/// `intN`/`uintN` leaves straight to [`Cell::Integer`], so no transform is needed
/// except the precision-78 coercion to a decimal string.
fn numeric_column(name: impl Into<String>, bits: u16, signed: bool) -> DatasetColumn {
    let mut column = DatasetColumn::numeric_for_width(name, bits, signed);
    if !matches!(column.storage_type, StorageType::CoercedDecimalString) {
        column.transform = None;
    }
    column
}

/// The default typed column a primitive leaf produces, per §4.3.3's type table.
pub fn default_column(name: impl Into<String>, data_type: DataType) -> DatasetColumn {
    let name = name.into();
    match data_type {
        DataType::Bool => DatasetColumn::new(name, StorageType::Boolean, AnalyticalType::Dimension),
        DataType::Address => {
            DatasetColumn::new(name, StorageType::String, AnalyticalType::Dimension).with_transform(CellTransform::ToString)
        }
        DataType::String => DatasetColumn::new(name, StorageType::String, AnalyticalType::Dimension),
        DataType::Bytes | DataType::FixedBytes(_) => {
            DatasetColumn::new(name, StorageType::String, AnalyticalType::Dimension).with_transform(CellTransform::ToString)
        }
        DataType::Int(bits) => numeric_column(name, bits, true),
        DataType::Uint(bits) => numeric_column(name, bits, false),
    }
}

/// Builds the final column for a leaf, honoring any `@transform` re-type/rename.
pub fn leaf_column(leaf: &LeafSpec) -> DatasetColumn {
    let base = default_column(leaf.column_name.clone(), leaf.data_type);
    match &leaf.transform {
        Some(ParameterTransform { result_type: Some(result_type), .. }) => {
            DatasetColumn::new(leaf.column_name.clone(), *result_type, AnalyticalType::Measure)
        }
        _ => base,
    }
}
