//! JSON document loading, feature-gated the same way the sub-crates gate their own
//! `json` feature: a semantic ABI document (§6) parsed into a [`SemanticAbi`], and a
//! wire block document parsed into a [`semabi_metadata::Block`] for a given chain.

use crate::Error;
use semabi_metadata::{Block, EvmChain};
use semabi_semantic::SemanticAbi;
use serde_json::Value;

/// Parses a semantic ABI document (the `@`-directive-annotated ABI item list, §6)
/// into a [`SemanticAbi`], ready to hand to [`crate::Transformer::build`].
pub fn load_abi(document: &Value) -> Result<SemanticAbi, Error> {
    Ok(semabi_semantic::semantic_abi_from_json(document)?)
}

/// Parses a wire block document (§6) into a [`Block`] for `chain`, ready to hand to
/// [`crate::Transformer::transform`]. The chain tag is supplied out-of-band since the
/// wire document never names it.
pub fn load_block(document: &Value, chain: EvmChain) -> Result<Block, Error> {
    Ok(semabi_metadata::raw::parse_block_document(document, chain)?)
}
