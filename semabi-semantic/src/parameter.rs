//! Semantic parameters: a raw [`semabi_abi::Parameter`] tree augmented with
//! `exclude` and an optional per-cell `transform` (§3).

use crate::Error;
use semabi_abi::parameter::{DataType, ParamKind, Parameter};
use semabi_codec::StorageType;
use semabi_expr::Expr;

/// Rename, re-expression, and/or re-type of a single primitive leaf. Tuples may
/// never carry one (enforced at construction).
#[derive(Debug, Clone)]
pub struct ParameterTransform {
    pub name: Option<String>,
    pub expression: Option<Expr>,
    pub result_type: Option<StorageType>,
}

#[derive(Debug, Clone)]
pub enum SemanticParamKind {
    Primitive(DataType),
    Tuple(Vec<SemanticParameter>),
}

/// A parameter node augmented with the directives that apply to it.
#[derive(Debug, Clone)]
pub struct SemanticParameter {
    pub name: String,
    pub kind: SemanticParamKind,
    pub is_indexed: bool,
    pub is_array: bool,
    pub is_array_of_arrays: bool,
    pub exclude: bool,
    pub transform: Option<ParameterTransform>,
}

impl SemanticParameter {
    /// Wraps a raw parameter tree with no directives applied, recursively.
    pub fn from_raw(param: &Parameter) -> Self {
        let kind = match &param.kind {
            ParamKind::Primitive(dt) => SemanticParamKind::Primitive(*dt),
            ParamKind::Tuple(components) => {
                SemanticParamKind::Tuple(components.iter().map(SemanticParameter::from_raw).collect())
            }
        };
        SemanticParameter {
            name: param.name.clone(),
            kind,
            is_indexed: param.is_indexed,
            is_array: param.is_array,
            is_array_of_arrays: param.is_array_of_arrays,
            exclude: false,
            transform: None,
        }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, SemanticParamKind::Tuple(_))
    }

    pub fn components(&self) -> &[SemanticParameter] {
        match &self.kind {
            SemanticParamKind::Tuple(c) => c,
            SemanticParamKind::Primitive(_) => &[],
        }
    }

    /// Validates this node and every descendant: tuples may not carry a transform,
    /// sibling names must be unique at every level, and any transform expression may
    /// reference only the pseudo-variable `this`.
    pub fn validate(&self, context: &str) -> Result<(), Error> {
        if self.is_tuple() && self.transform.is_some() {
            return Err(Error::TupleWithTransform(format!("{context}.{}", self.name)));
        }
        if let Some(transform) = &self.transform {
            if let Some(expr) = &transform.expression {
                let vars = semabi_expr::referenced_variables(expr);
                for var in &vars {
                    if var != "this" {
                        return Err(Error::TransformNotThis(
                            format!("{context}.{}", self.name),
                            var.clone(),
                        ));
                    }
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        for child in self.components() {
            if !seen.insert(&child.name) {
                return Err(Error::DuplicateParameterName(
                    child.name.clone(),
                    format!("{context}.{}", self.name),
                ));
            }
            child.validate(&format!("{context}.{}", self.name))?;
        }
        Ok(())
    }

    /// The column name this leaf (or, for tuples, each flattened leaf) ultimately
    /// produces: `_`-joined parent path, or the transform's override name for a
    /// renamed primitive leaf (§8).
    pub fn flattened_name(&self, parent_path: &str) -> String {
        let path = if parent_path.is_empty() {
            self.name.clone()
        } else {
            format!("{parent_path}_{}", self.name)
        };
        match &self.transform {
            Some(ParameterTransform { name: Some(override_name), .. }) => override_name.clone(),
            _ => path,
        }
    }

    /// Flattens this node (and, for tuples, its non-excluded descendants) into the
    /// ordered list of column names the default flatten predicate produces: every
    /// non-excluded primitive leaf that is not itself an array.
    pub fn flatten_names(&self, parent_path: &str, out: &mut Vec<String>) {
        if self.exclude {
            return;
        }
        match &self.kind {
            SemanticParamKind::Primitive(_) => {
                if !self.is_array && !self.is_array_of_arrays {
                    out.push(self.flattened_name(parent_path));
                }
            }
            SemanticParamKind::Tuple(components) => {
                if self.is_array || self.is_array_of_arrays {
                    return;
                }
                let path = if parent_path.is_empty() {
                    self.name.clone()
                } else {
                    format!("{parent_path}_{}", self.name)
                };
                for child in components {
                    child.flatten_names(&path, out);
                }
            }
        }
    }
}
