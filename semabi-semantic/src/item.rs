//! Semantic ABI items and the ABI-level directive set (`matches`, `explode`,
//! `expressions`) plus the semantic ABI as a whole (§3, §7).

use crate::parameter::SemanticParameter;
use crate::Error;
use semabi_abi::item::AbiItem;
use semabi_abi::parameter::{DataType, ParamKind, Parameter};
use semabi_codec::StorageType;
use semabi_expr::Expr;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Event,
    Function,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchAssert {
    OnlyOne,
    Many,
    OptionalOne,
}

#[derive(Debug, Clone)]
pub enum Predicate {
    Equal { source_col: String, matched_col: String },
    Bound { source_col: String, matched_col: String, lower: Option<f64>, upper: Option<f64> },
    InSet { source_col: String, matched_cols: Vec<String> },
}

impl Predicate {
    fn validate(&self) -> Result<(), Error> {
        if let Predicate::Bound { source_col, lower, upper, .. } = self {
            match (lower, upper) {
                (None, None) => return Err(Error::BoundMissingLowerAndUpper(source_col.clone())),
                (Some(l), Some(u)) if l > u => {
                    return Err(Error::BoundLowerGreaterThanUpper(source_col.clone()))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    pub signature: Option<String>,
    pub match_type: MatchType,
    pub prefix: String,
    pub assert: MatchAssert,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone)]
pub struct ItemExpression {
    pub name: String,
    pub expression: Expr,
    pub result_type: Option<StorageType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Event,
    Function,
}

/// A single ABI item (event or function) augmented with the directives in §3:
/// `is_primary`, `explode`, `matches`, `expressions`.
#[derive(Debug, Clone)]
pub struct SemanticAbiItem {
    pub name: String,
    pub kind: ItemKind,
    pub inputs: Vec<SemanticParameter>,
    pub outputs: Vec<SemanticParameter>,
    pub is_primary: bool,
    pub explode: Vec<String>,
    pub matches: Vec<Match>,
    pub expressions: Vec<ItemExpression>,
}

impl SemanticAbiItem {
    /// Reconstructs the raw item (dropping semantic directives) for signature and
    /// hash synthesis, which only depend on the canonical type tree.
    pub fn raw_item(&self) -> AbiItem {
        let inputs = self.inputs.iter().map(to_raw_parameter).collect();
        match self.kind {
            ItemKind::Event => AbiItem::Event { name: self.name.clone(), inputs },
            ItemKind::Function => {
                let outputs = self.outputs.iter().map(to_raw_parameter).collect();
                AbiItem::Function { name: self.name.clone(), inputs, outputs }
            }
        }
    }

    pub fn signature(&self) -> String {
        self.raw_item().signature()
    }

    pub fn hash(&self) -> String {
        self.raw_item().hash()
    }

    fn validate_own_directives(&self) -> Result<(), Error> {
        if !self.is_primary
            && (!self.explode.is_empty() || !self.matches.is_empty() || !self.expressions.is_empty())
        {
            return Err(Error::NonPrimaryWithDirectives(self.name.clone()));
        }

        let mut input_names = HashSet::new();
        for param in &self.inputs {
            if !input_names.insert(&param.name) {
                return Err(Error::DuplicateParameterName(param.name.clone(), self.name.clone()));
            }
            param.validate(&self.name)?;
        }
        if self.kind == ItemKind::Function {
            let mut output_names = HashSet::new();
            for param in &self.outputs {
                if !output_names.insert(&param.name) {
                    return Err(Error::DuplicateParameterName(param.name.clone(), self.name.clone()));
                }
                if input_names.contains(&param.name) {
                    return Err(Error::InputOutputNameOverlap(self.name.clone(), param.name.clone()));
                }
                param.validate(&self.name)?;
            }
        }

        for path in &self.explode {
            resolve_explode_path(&self.inputs, path)
                .map_err(|e| annotate_path(e, path))?;
        }

        let mut many_count = 0;
        let mut seen_sig_prefix = HashSet::new();
        for m in &self.matches {
            if m.match_type != MatchType::Transfer && m.signature.is_none() {
                return Err(Error::MatchSignatureRequired);
            }
            if let Some(sig) = &m.signature {
                if sig == &self.signature() {
                    return Err(Error::MatchToSelf(self.name.clone()));
                }
            }
            let key = (m.signature.clone().unwrap_or_default(), m.prefix.clone());
            if !seen_sig_prefix.insert(key) {
                return Err(Error::DuplicateMatchSignaturePrefix(
                    m.signature.clone().unwrap_or_default(),
                    m.prefix.clone(),
                    self.name.clone(),
                ));
            }
            if self.inputs.iter().any(|p| p.name == m.prefix) || self.outputs.iter().any(|p| p.name == m.prefix)
            {
                return Err(Error::MatchPrefixCollision(m.prefix.clone(), self.name.clone()));
            }
            if m.assert == MatchAssert::Many {
                many_count += 1;
            }
            for predicate in &m.predicates {
                predicate.validate()?;
            }
        }
        if many_count > 1 {
            return Err(Error::MultipleManyMatches(self.name.clone()));
        }
        if many_count > 0 && !self.explode.is_empty() {
            return Err(Error::ManyMatchWithExplode(self.name.clone()));
        }

        let mut known: HashSet<String> = HashSet::new();
        for param in self.inputs.iter().chain(self.outputs.iter()) {
            param.flatten_names("", &mut Vec::new());
            let mut names = Vec::new();
            param.flatten_names("", &mut names);
            known.extend(names);
        }
        for expr in &self.expressions {
            for var in semabi_expr::referenced_variables(&expr.expression) {
                if !known.contains(&var) {
                    return Err(Error::ExpressionUnknownColumn(expr.name.clone(), var));
                }
            }
            known.insert(expr.name.clone());
        }

        Ok(())
    }
}

fn annotate_path(err: Error, path: &str) -> Error {
    match err {
        Error::ExplodePathNotFound(_) => Error::ExplodePathNotFound(path.to_string()),
        Error::ExplodePathNotArray(_) => Error::ExplodePathNotArray(path.to_string()),
        Error::ExplodePathArrayOfArrays(_) => Error::ExplodePathArrayOfArrays(path.to_string()),
        Error::ExplodePathExcluded(_) => Error::ExplodePathExcluded(path.to_string()),
        Error::ExplodePathNestedInArray(_) => Error::ExplodePathNestedInArray(path.to_string()),
        other => other,
    }
}

/// Walks a dot-path against a parameter list. At most one segment along the path may
/// be array-valued (the explode anchor); once found, later segments navigate the
/// structure of a single array element. A second array segment is rejected as
/// nested-in-array; an excluded segment at any point is rejected.
fn resolve_explode_path<'a>(params: &'a [SemanticParameter], path: &str) -> Result<&'a SemanticParameter, Error> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = params;
    let mut found_array = false;
    let mut node: Option<&SemanticParameter> = None;

    for (i, segment) in segments.iter().enumerate() {
        let param = current
            .iter()
            .find(|p| p.name == *segment)
            .ok_or_else(|| Error::ExplodePathNotFound(String::new()))?;
        if param.exclude {
            return Err(Error::ExplodePathExcluded(String::new()));
        }
        if param.is_array || param.is_array_of_arrays {
            if found_array {
                return Err(Error::ExplodePathNestedInArray(String::new()));
            }
            if param.is_array_of_arrays {
                return Err(Error::ExplodePathArrayOfArrays(String::new()));
            }
            found_array = true;
        }
        let is_last = i == segments.len() - 1;
        if is_last {
            node = Some(param);
        } else {
            current = param.components();
        }
    }

    if !found_array {
        return Err(Error::ExplodePathNotArray(String::new()));
    }
    node.ok_or_else(|| Error::ExplodePathNotFound(String::new()))
}

fn to_raw_parameter(param: &SemanticParameter) -> Parameter {
    let kind = match &param.kind {
        crate::parameter::SemanticParamKind::Primitive(dt) => ParamKind::Primitive(*dt),
        crate::parameter::SemanticParamKind::Tuple(components) => {
            ParamKind::Tuple(components.iter().map(to_raw_parameter).collect())
        }
    };
    Parameter::new(param.name.clone(), kind)
        .expect("semantic parameter names are validated non-empty at construction")
        .indexed(param.is_indexed)
        .arrayed(param.is_array, param.is_array_of_arrays)
}

/// The whole semantic ABI: target chains, optional contract allow-list, table-scope
/// expressions, and the item set, keyed both by hash and by signature (§3).
#[derive(Debug, Clone)]
pub struct SemanticAbi {
    pub chains: Vec<String>,
    pub contract_allow_list: Vec<String>,
    pub table_expressions: Vec<ItemExpression>,
    items: Vec<SemanticAbiItem>,
    by_hash: HashMap<String, usize>,
    by_signature: HashMap<String, usize>,
}

impl SemanticAbi {
    pub fn new(
        chains: Vec<String>,
        contract_allow_list: Vec<String>,
        table_expressions: Vec<ItemExpression>,
        items: Vec<SemanticAbiItem>,
    ) -> Result<Self, Error> {
        if chains.is_empty() {
            return Err(Error::NoChains);
        }
        if !items.iter().any(|i| i.is_primary) {
            return Err(Error::NoPrimaryItem);
        }

        let contract_allow_list = contract_allow_list.into_iter().map(|a| a.to_lowercase()).collect();

        let mut by_hash = HashMap::new();
        let mut by_signature = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            item.validate_own_directives()?;
            let hash = item.hash();
            if by_hash.insert(hash.clone(), idx).is_some() {
                return Err(Error::DuplicateItemHash(hash));
            }
            by_signature.insert(item.signature(), idx);
        }

        let abi = SemanticAbi {
            chains,
            contract_allow_list,
            table_expressions,
            items,
            by_hash,
            by_signature,
        };

        for item in &abi.items {
            for m in &item.matches {
                if m.match_type == MatchType::Transfer {
                    continue;
                }
                let sig = m.signature.as_deref().unwrap_or_default();
                let target = abi.item_by_signature(sig).ok_or_else(|| Error::MatchSignatureUnresolved(sig.to_string()))?;
                let expects_event = m.match_type == MatchType::Event;
                if target.kind == ItemKind::Event && !expects_event {
                    return Err(Error::MatchSignatureUnresolved(sig.to_string()));
                }
                if target.kind == ItemKind::Function && expects_event {
                    return Err(Error::MatchSignatureUnresolved(sig.to_string()));
                }
            }
        }

        Ok(abi)
    }

    pub fn items(&self) -> &[SemanticAbiItem] {
        &self.items
    }

    pub fn primary_items(&self) -> impl Iterator<Item = &SemanticAbiItem> {
        self.items.iter().filter(|i| i.is_primary)
    }

    pub fn item_by_hash(&self, hash: &str) -> Option<&SemanticAbiItem> {
        self.by_hash.get(hash).map(|&idx| &self.items[idx])
    }

    pub fn item_by_signature(&self, signature: &str) -> Option<&SemanticAbiItem> {
        self.by_signature.get(signature).map(|&idx| &self.items[idx])
    }

    pub fn is_valid_for_chain(&self, chain: &str) -> bool {
        self.chains.iter().any(|c| c == chain)
    }

    pub fn allows_contract(&self, address: &str) -> bool {
        self.contract_allow_list.is_empty() || self.contract_allow_list.iter().any(|a| a == &address.to_lowercase())
    }
}
