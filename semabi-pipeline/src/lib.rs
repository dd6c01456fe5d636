//! The per-primary-item row transformation pipeline (C7) and the canonical
//! token-transfer match support (C8). A [`pipeline::ItemPipeline`] is built once per
//! primary item from a [`semabi_semantic::SemanticAbi`] and then invoked once per
//! transaction to produce that item's rows.

pub mod explode;
pub mod expressions;
pub mod flatten;
pub mod init;
pub mod leaf;
pub mod matchstep;
pub mod pipeline;
pub mod project;
pub mod row;
pub mod stage;
pub mod transfer;
pub mod transform_item;

pub use pipeline::ItemPipeline;
pub use row::Row;
pub use transform_item::{TransformItem, TransformKind};

use thiserror::Error;

/// Pipeline *construction* errors: a malformed match, an unresolvable predicate
/// column, or a schema conflict while folding a sibling schema in. All of these are
/// detected while building an [`pipeline::ItemPipeline`], before any transaction is
/// processed — distinct from the per-row transform errors latched on a
/// [`TransformItem`] at run time (§7).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] semabi_codec::Error),

    #[error(transparent)]
    Semantic(#[from] semabi_semantic::Error),

    #[error("match predicate references unknown source column '{0}'")]
    UnknownSourceColumn(String),

    #[error("match predicate references unknown matched column '{0}'")]
    UnknownMatchedColumn(String),

    #[error("match targets unknown item signature '{0}'")]
    UnknownMatchTarget(String),

    #[error("expression references unknown column '{0}'")]
    UnknownExpressionColumn(String),
}
