//! ABI items: events and functions, with hash and signature synthesis.

use crate::parameter::Parameter;
use sha3::{Digest, Keccak256};

/// A single top-level ABI item: an event (identified by its log topic) or a function
/// (identified by its 4-byte selector).
#[derive(Debug, Clone, PartialEq)]
pub enum AbiItem {
    Event {
        name: String,
        inputs: Vec<Parameter>,
    },
    Function {
        name: String,
        inputs: Vec<Parameter>,
        outputs: Vec<Parameter>,
    },
}

impl AbiItem {
    pub fn name(&self) -> &str {
        match self {
            AbiItem::Event { name, .. } => name,
            AbiItem::Function { name, .. } => name,
        }
    }

    pub fn inputs(&self) -> &[Parameter] {
        match self {
            AbiItem::Event { inputs, .. } => inputs,
            AbiItem::Function { inputs, .. } => inputs,
        }
    }

    pub fn outputs(&self) -> &[Parameter] {
        match self {
            AbiItem::Event { .. } => &[],
            AbiItem::Function { outputs, .. } => outputs,
        }
    }

    /// `name(type,type,…)` over the item's inputs, per §3.
    pub fn signature(&self) -> String {
        format!(
            "{}({})",
            self.name(),
            self.inputs()
                .iter()
                .map(Parameter::canonical_type)
                .collect::<Vec<_>>()
                .join(",")
        )
    }

    fn signature_hash(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(self.signature().as_bytes());
        hasher.finalize().into()
    }

    /// The item's canonical hash, lower-case hex without a `0x` prefix: the full
    /// 32-byte keccak digest for events (matched against `topics[0]`), or its leading
    /// 4 bytes (8 hex chars) for functions (matched against the calldata selector).
    pub fn hash(&self) -> String {
        let digest = self.signature_hash();
        match self {
            AbiItem::Event { .. } => hex::encode(digest),
            AbiItem::Function { .. } => hex::encode(&digest[..4]),
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, AbiItem::Event { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{DataType, ParamKind};

    fn param(name: &str, ty: DataType) -> Parameter {
        Parameter::new(name, ParamKind::Primitive(ty)).unwrap()
    }

    #[test]
    fn event_hash_is_full_keccak_of_signature() {
        let item = AbiItem::Event {
            name: "Transfer".into(),
            inputs: vec![
                param("from", DataType::Address),
                param("to", DataType::Address),
                param("value", DataType::Uint(256)),
            ],
        };
        assert_eq!(item.signature(), "Transfer(address,address,uint256)");
        // Well-known ERC-20 Transfer topic.
        assert_eq!(
            item.hash(),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn function_hash_is_first_four_bytes() {
        let item = AbiItem::Function {
            name: "transfer".into(),
            inputs: vec![param("to", DataType::Address), param("value", DataType::Uint(256))],
            outputs: vec![param("success", DataType::Bool)],
        };
        assert_eq!(item.hash().len(), 8);
    }
}
