//! Block, transaction, log, and receipt model (§3): the external input shape, reduced
//! to the fields C3/C7/C8 actually read.

use crate::chain::EvmChain;
use crate::trace::Trace;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub log_index: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: String,
    pub status: Option<u8>,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub input: String,
    pub receipt: Receipt,
    pub traces: Vec<Trace>,
}

impl Transaction {
    /// `1` when the receipt carries no explicit status and no root trace errored,
    /// `0` otherwise; mirrors `DefaultColumnsStep`'s `status` derivation (§4.3.2).
    pub fn effective_status(&self) -> u8 {
        if let Some(status) = self.receipt.status {
            return status;
        }
        let root_errored = self.traces.iter().any(|t| t.path.is_empty() && t.error.is_some());
        if root_errored {
            0
        } else {
            1
        }
    }

    pub fn logs(&self) -> &[Log] {
        &self.receipt.logs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub chain: EvmChain,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}
