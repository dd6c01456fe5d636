//! Parameter trees: the typed shape of an event's or function's inputs/outputs.

use crate::Error;

/// A primitive ABI type, per the grammar in §3 of the parameter data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Address,
    Bool,
    String,
    /// Dynamic-length `bytes`.
    Bytes,
    /// Fixed-length `bytesN`, `1 <= N <= 32`.
    FixedBytes(u8),
    /// Signed integer, width in bits, `8 <= N <= 256`, multiple of 8.
    Int(u16),
    /// Unsigned integer, width in bits, `8 <= N <= 256`, multiple of 8.
    Uint(u16),
}

impl DataType {
    pub fn canonical_name(&self) -> String {
        match self {
            DataType::Address => "address".to_string(),
            DataType::Bool => "bool".to_string(),
            DataType::String => "string".to_string(),
            DataType::Bytes => "bytes".to_string(),
            DataType::FixedBytes(n) => format!("bytes{n}"),
            DataType::Int(w) => format!("int{w}"),
            DataType::Uint(w) => format!("uint{w}"),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, DataType::String | DataType::Bytes)
    }

    /// Parses a base type name, handling the `int`/`uint` (256-bit) aliases. Does not
    /// handle `[]`/`[][]` suffixes or `tuple` — callers strip those first.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "address" => Ok(DataType::Address),
            "bool" => Ok(DataType::Bool),
            "string" => Ok(DataType::String),
            "bytes" => Ok(DataType::Bytes),
            "int" => Ok(DataType::Int(256)),
            "uint" => Ok(DataType::Uint(256)),
            s if s.starts_with("bytes") => {
                let width: u8 = s[5..]
                    .parse()
                    .map_err(|_| Error::UnknownType(raw.to_string()))?;
                if (1..=32).contains(&width) {
                    Ok(DataType::FixedBytes(width))
                } else {
                    Err(Error::UnknownType(raw.to_string()))
                }
            }
            s if s.starts_with("int") => {
                let width: u16 = s[3..]
                    .parse()
                    .map_err(|_| Error::UnknownType(raw.to_string()))?;
                if (8..=256).contains(&width) && width % 8 == 0 {
                    Ok(DataType::Int(width))
                } else {
                    Err(Error::UnknownType(raw.to_string()))
                }
            }
            s if s.starts_with("uint") => {
                let width: u16 = s[4..]
                    .parse()
                    .map_err(|_| Error::UnknownType(raw.to_string()))?;
                if (8..=256).contains(&width) && width % 8 == 0 {
                    Ok(DataType::Uint(width))
                } else {
                    Err(Error::UnknownType(raw.to_string()))
                }
            }
            _ => Err(Error::UnknownType(raw.to_string())),
        }
    }
}

/// Either a primitive leaf or a tuple of nested parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Primitive(DataType),
    Tuple(Vec<Parameter>),
}

/// A node in a parameter tree: a named, possibly-array, possibly-indexed leaf or tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub is_indexed: bool,
    pub is_array: bool,
    pub is_array_of_arrays: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyParameterName);
        }
        Ok(Parameter {
            name,
            kind,
            is_indexed: false,
            is_array: false,
            is_array_of_arrays: false,
        })
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.is_indexed = indexed;
        self
    }

    pub fn arrayed(mut self, is_array: bool, is_array_of_arrays: bool) -> Self {
        self.is_array = is_array;
        self.is_array_of_arrays = is_array_of_arrays;
        self
    }

    /// Strips `[]`/`[][]` suffixes from a raw ABI type string, returning the base type
    /// name and the array depth (0, 1, or 2).
    pub fn split_array_suffix(raw: &str) -> (&str, u8) {
        if let Some(base) = raw.strip_suffix("[][]") {
            (base, 2)
        } else if let Some(base) = raw.strip_suffix("[]") {
            (base, 1)
        } else {
            (raw, 0)
        }
    }

    pub fn canonical_type(&self) -> String {
        let base = match &self.kind {
            ParamKind::Primitive(dt) => dt.canonical_name(),
            ParamKind::Tuple(components) => format!(
                "({})",
                components
                    .iter()
                    .map(Parameter::canonical_type)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        };
        if self.is_array_of_arrays {
            format!("{base}[][]")
        } else if self.is_array {
            format!("{base}[]")
        } else {
            base
        }
    }

    pub fn is_dynamic(&self) -> bool {
        if self.is_array || self.is_array_of_arrays {
            return true;
        }
        match &self.kind {
            ParamKind::Primitive(dt) => dt.is_dynamic(),
            ParamKind::Tuple(components) => components.iter().any(Parameter::is_dynamic),
        }
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;

    /// Parses a single standard-ABI parameter JSON node: `{"name","type","components"?,"indexed"?}`.
    pub fn parameter_from_json(value: &serde_json::Value) -> Result<Parameter, Error> {
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::MalformedJson("parameter missing 'name'".into()))?;
        let raw_type = value
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::MalformedJson(format!("parameter '{name}' missing 'type'")))?;
        let indexed = value.get("indexed").and_then(|v| v.as_bool()).unwrap_or(false);

        let (base, depth) = Parameter::split_array_suffix(raw_type);

        let kind = if base == "tuple" {
            let components = value
                .get("components")
                .and_then(|v| v.as_array())
                .ok_or_else(|| Error::MalformedJson(format!("tuple parameter '{name}' missing 'components'")))?;
            let parsed = components
                .iter()
                .map(parameter_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            ParamKind::Tuple(parsed)
        } else {
            ParamKind::Primitive(DataType::parse(base)?)
        };

        Ok(Parameter::new(name, kind)?
            .indexed(indexed)
            .arrayed(depth >= 1, depth == 2))
    }
}
