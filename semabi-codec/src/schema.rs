//! Schema algebra (C6): append, rename-on-match, and union with type-equality checking.

use crate::column::DatasetColumn;
use crate::Error;

/// An ordered, name-unique collection of [`DatasetColumn`]s. Each pipeline stage (C7)
/// exposes a resulting schema that is a pure function of its input schema and
/// configuration; `AbiSchema` is the value those functions build up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbiSchema {
    columns: Vec<DatasetColumn>,
}

impl AbiSchema {
    pub fn empty() -> Self {
        AbiSchema { columns: Vec::new() }
    }

    pub fn columns(&self) -> &[DatasetColumn] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&DatasetColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Inserts a column, replacing any existing column of the same name. Used by
    /// stages that are allowed to overwrite a prior column in the same pipeline (e.g.
    /// `ExpressionListStep` re-typing a column by name).
    pub fn set(&mut self, column: DatasetColumn) {
        match self.columns.iter().position(|c| c.name == column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
    }

    /// Appends a column, rejecting a conflicting re-definition of the same name. Used
    /// when a sibling schema is folded into the current one (match-step prefixing,
    /// top-level schema union) where a name collision indicates a real conflict rather
    /// than an intentional overwrite.
    pub fn append_distinct(&mut self, column: DatasetColumn) -> Result<(), Error> {
        match self.columns.iter().find(|c| c.name == column.name) {
            Some(existing) if existing != &column => Err(Error::SchemaConflict(
                column.name.clone(),
                Box::new(existing.clone()),
                Box::new(column),
            )),
            Some(_) => Ok(()),
            None => {
                self.columns.push(column);
                Ok(())
            }
        }
    }

    /// Renames every column in this schema by prepending `{prefix}_`, the way a match's
    /// sibling schema is folded into the current schema (§4.3.5).
    pub fn with_prefix(&self, prefix: &str) -> AbiSchema {
        AbiSchema {
            columns: self
                .columns
                .iter()
                .map(|c| c.renamed(format!("{prefix}_{}", c.name)))
                .collect(),
        }
    }

    /// Folds `other`'s columns into `self`, rejecting name conflicts with a
    /// different descriptor. Used both for match-step schema folding and for C9's
    /// top-level union across primary items' schemas.
    pub fn merge(&mut self, other: &AbiSchema) -> Result<(), Error> {
        for column in &other.columns {
            self.append_distinct(column.clone())?;
        }
        Ok(())
    }

    /// Unions a list of per-primary-item schemas into one schema, failing if two items
    /// define the same column name with unequal descriptors (§4.5 step 5).
    pub fn union<'a>(schemas: impl IntoIterator<Item = &'a AbiSchema>) -> Result<AbiSchema, Error> {
        let mut iter = schemas.into_iter();
        let mut result = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(AbiSchema::empty()),
        };
        for schema in iter {
            result.merge(schema)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{AnalyticalType, StorageType};
    use proptest::prelude::*;

    fn col(name: &str, storage: StorageType) -> DatasetColumn {
        DatasetColumn::new(name, storage, AnalyticalType::Dimension)
    }

    fn storage_type_strategy() -> impl Strategy<Value = StorageType> {
        prop_oneof![
            Just(StorageType::Boolean),
            Just(StorageType::Int8),
            Just(StorageType::Int64),
            Just(StorageType::UInt64),
            Just(StorageType::Float64),
            Just(StorageType::String),
            Just(StorageType::CoercedDecimalString),
        ]
    }

    fn schema_from(names: Vec<String>, types: Vec<StorageType>) -> AbiSchema {
        AbiSchema {
            columns: names.into_iter().zip(types).map(|(n, t)| col(&n, t)).collect(),
        }
    }

    proptest! {
        // Disjoint name alphabets guarantee the union never hits a type conflict, so
        // the property holds for every generated pair, not just the non-error cases.
        #[test]
        fn union_commutes_for_disjoint_schemas(
            a_names in prop::collection::hash_set("[a-e]{2}", 1..5),
            b_names in prop::collection::hash_set("[v-z]{2}", 1..5),
            a_types in prop::collection::vec(storage_type_strategy(), 5),
            b_types in prop::collection::vec(storage_type_strategy(), 5),
        ) {
            let a_names: Vec<String> = a_names.into_iter().collect();
            let b_names: Vec<String> = b_names.into_iter().collect();
            let a = schema_from(a_names.clone(), a_types[..a_names.len()].to_vec());
            let b = schema_from(b_names.clone(), b_types[..b_names.len()].to_vec());

            let ab = AbiSchema::union([&a, &b]).unwrap();
            let ba = AbiSchema::union([&b, &a]).unwrap();

            let mut ab_names: Vec<_> = ab.columns().iter().map(|c| c.name.clone()).collect();
            let mut ba_names: Vec<_> = ba.columns().iter().map(|c| c.name.clone()).collect();
            ab_names.sort();
            ba_names.sort();
            prop_assert_eq!(ab_names, ba_names);
        }
    }

    #[test]
    fn union_is_commutative_modulo_order() {
        let a = AbiSchema {
            columns: vec![col("x", StorageType::Boolean), col("y", StorageType::String)],
        };
        let b = AbiSchema {
            columns: vec![col("y", StorageType::String), col("z", StorageType::Int64)],
        };

        let ab = AbiSchema::union([&a, &b]).unwrap();
        let ba = AbiSchema::union([&b, &a]).unwrap();

        let names = |s: &AbiSchema| {
            let mut v: Vec<_> = s.columns().iter().map(|c| c.name.clone()).collect();
            v.sort();
            v
        };
        assert_eq!(names(&ab), names(&ba));
    }

    #[test]
    fn union_rejects_conflicting_types() {
        let a = AbiSchema {
            columns: vec![col("startTime", StorageType::Int64)],
        };
        let b = AbiSchema {
            columns: vec![col("startTime", StorageType::String)],
        };
        assert!(AbiSchema::union([&a, &b]).is_err());
    }

    #[test]
    fn with_prefix_renames_every_column() {
        let s = AbiSchema {
            columns: vec![col("offerer", StorageType::String)],
        };
        let prefixed = s.with_prefix("order");
        assert!(prefixed.contains("order_offerer"));
    }
}
