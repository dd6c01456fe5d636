//! Contract ABI item model (C2) and raw event/function decoder (C3).

pub mod decode;
pub mod item;
pub mod parameter;

pub use decode::Decoded;
pub use item::AbiItem;
pub use parameter::{DataType, Parameter, ParamKind};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty parameter name")]
    EmptyParameterName,

    #[error("unknown ABI type: {0}")]
    UnknownType(String),

    #[error("malformed ABI json: {0}")]
    MalformedJson(String),

    #[error("log topic count {actual} does not match {expected} indexed parameters")]
    TopicCountMismatch { expected: usize, actual: usize },

    #[error("log topic[0] {actual} does not match event hash {expected}")]
    EventHashMismatch { expected: String, actual: String },

    #[error("truncated ABI-encoded data: need at least {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("dynamic value offset {0} is out of bounds")]
    BadOffset(usize),

    #[error("function input is shorter than the 4-byte selector")]
    MissingSelector,
}
