//! The EVM chain/block/transaction/trace model (§3) and the canonical token-transfer
//! decoder (C8, §4.4).

pub mod block;
pub mod chain;
pub mod trace;
pub mod transfer;

#[cfg(feature = "json")]
pub mod raw;

pub use block::{Block, BlockHeader, Log, Receipt, Transaction};
pub use chain::EvmChain;
pub use trace::Trace;
pub use transfer::{TokenType, Transfer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown chain '{0}'")]
    UnknownChain(String),

    #[error("malformed block document: {0}")]
    MalformedDocument(String),

    #[error("receipt for transaction '{expected}' does not match transaction '{actual}' at the same position")]
    ReceiptMismatch { expected: String, actual: String },
}
