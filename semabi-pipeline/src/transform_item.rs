//! [`TransformItem`]: the per-instance carrier threaded through every stage. Decoding
//! is lazy (§9 "Lazy decoding") — at most one actual decode per item, triggered by the
//! first stage that reads it — and any stage failure is latched here rather than
//! unwinding the pipeline (§7, §9 "Exception-driven control flow").

use semabi_abi::decode::Decoded;
use std::cell::{OnceCell, RefCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Event,
    Function,
    Transfer,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Event => "event",
            TransformKind::Function => "function",
            TransformKind::Transfer => "transfer",
        }
    }
}

type DecodeResult = Result<Vec<(String, Decoded)>, String>;
type Decoder = Box<dyn FnOnce() -> DecodeResult>;

pub struct TransformItem {
    pub contract_address: String,
    pub internal_index: String,
    pub kind: TransformKind,
    pub error: Option<String>,
    decoded: OnceCell<DecodeResult>,
    decoder: RefCell<Option<Decoder>>,
}

impl TransformItem {
    pub fn new(
        contract_address: impl Into<String>,
        internal_index: impl Into<String>,
        kind: TransformKind,
        decoder: impl FnOnce() -> DecodeResult + 'static,
    ) -> Self {
        TransformItem {
            contract_address: contract_address.into(),
            internal_index: internal_index.into(),
            kind,
            error: None,
            decoded: OnceCell::new(),
            decoder: RefCell::new(Some(Box::new(decoder))),
        }
    }

    /// Forces the decode the first time it's called; every later call returns the
    /// cached outcome without re-decoding.
    pub fn decode(&self) -> Result<&[(String, Decoded)], String> {
        let result = self.decoded.get_or_init(|| {
            let decoder = self.decoder.borrow_mut().take().expect("decoded at most once");
            decoder()
        });
        result.as_ref().map(Vec::as_slice).map_err(Clone::clone)
    }

    /// First-failure-latches: a stage that already errored never gets overwritten by
    /// a later, less informative failure.
    pub fn latch_error(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }
}
