//! Normalized call traces (§3, §4.4): both Erigon's flat `traceAddress`-indexed list
//! and Geth's nested `calls` tree collapse into the same flat shape, each leg carrying
//! a depth-first `path` used as its internal-index component for function items.

use num_bigint::BigInt;
use num_traits::Zero;

/// One call-tree leg, already flattened from either wire shape. Only the fields C3
/// and C8 actually read survive normalization (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub from: String,
    pub to: Option<String>,
    pub input: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub value: BigInt,
    pub path: Vec<usize>,
}

impl Trace {
    /// Underscore-joined trace path, used as a function item's internal index. The
    /// root call (empty path) is rendered as `"0"`.
    pub fn path_key(&self) -> String {
        if self.path.is_empty() {
            "0".to_string()
        } else {
            self.path.iter().map(usize::to_string).collect::<Vec<_>>().join("_")
        }
    }

    pub fn is_contract_creation_failure(&self) -> bool {
        self.error.is_some() && self.to.is_none()
    }

    pub fn has_nonzero_value(&self) -> bool {
        !self.value.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_key_is_zero() {
        let trace = Trace {
            from: "0xabc".into(),
            to: Some("0xdef".into()),
            input: "0x".into(),
            output: None,
            error: None,
            value: BigInt::from(0),
            path: vec![],
        };
        assert_eq!(trace.path_key(), "0");
    }

    #[test]
    fn nested_path_key_is_underscore_joined() {
        let trace = Trace {
            from: "0xabc".into(),
            to: Some("0xdef".into()),
            input: "0x".into(),
            output: None,
            error: None,
            value: BigInt::from(0),
            path: vec![0, 2, 1],
        };
        assert_eq!(trace.path_key(), "0_2_1");
    }
}
