//! The semantic ABI model (C5): directives layered over [`semabi_abi`]'s raw item
//! model — `exclude`, `transform`, `explode`, `matches`, and `expressions` — plus the
//! construction-time validation that rejects an invalid ABI before any block is
//! touched (§7).

pub mod item;
pub mod parameter;

#[cfg(feature = "json")]
pub mod json;

pub use item::{ItemExpression, ItemKind, Match, MatchAssert, MatchType, Predicate, SemanticAbi, SemanticAbiItem};
pub use parameter::{ParameterTransform, SemanticParameter};

#[cfg(feature = "json")]
pub use json::semantic_abi_from_json;

use thiserror::Error;

/// Construction errors: an invalid semantic ABI is rejected in full before any block
/// is processed. None of these are ever deferred to transform time (§7).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Abi(#[from] semabi_abi::Error),

    #[error("semantic ABI declares no target chains")]
    NoChains,

    #[error("semantic ABI has no item marked as primary")]
    NoPrimaryItem,

    #[error("duplicate item hash '{0}'")]
    DuplicateItemHash(String),

    #[error("duplicate parameter name '{0}' in {1}")]
    DuplicateParameterName(String, String),

    #[error("tuple parameter '{0}' may not carry a transform")]
    TupleWithTransform(String),

    #[error("non-primary item '{0}' may not carry explode, matches, or expressions")]
    NonPrimaryWithDirectives(String),

    #[error("explode path '{0}' does not resolve to a parameter")]
    ExplodePathNotFound(String),

    #[error("explode path '{0}' does not target an array")]
    ExplodePathNotArray(String),

    #[error("explode path '{0}' targets an array-of-arrays, which is not explodable")]
    ExplodePathArrayOfArrays(String),

    #[error("explode path '{0}' passes through an excluded parameter")]
    ExplodePathExcluded(String),

    #[error("explode path '{0}' passes through an array segment before its terminal")]
    ExplodePathNestedInArray(String),

    #[error("match signature '{0}' does not resolve to a known item")]
    MatchSignatureUnresolved(String),

    #[error("match signature is required for non-transfer matches")]
    MatchSignatureRequired,

    #[error("item '{0}' may not match itself")]
    MatchToSelf(String),

    #[error("duplicate (signature, prefix) pair '{0}'/'{1}' in item '{2}'")]
    DuplicateMatchSignaturePrefix(String, String, String),

    #[error("match prefix '{0}' collides with a sibling tuple parameter name in item '{1}'")]
    MatchPrefixCollision(String, String),

    #[error("item '{0}' declares more than one 'many' match")]
    MultipleManyMatches(String),

    #[error("item '{0}' combines 'explode' with a 'many' match")]
    ManyMatchWithExplode(String),

    #[error("bound predicate on '{0}' requires at least one of lower/upper")]
    BoundMissingLowerAndUpper(String),

    #[error("bound predicate on '{0}' has lower > upper")]
    BoundLowerGreaterThanUpper(String),

    #[error("expression '{0}' references unknown column '{1}'")]
    ExpressionUnknownColumn(String, String),

    #[error("parameter transform on '{0}' must reference only 'this', found '{1}'")]
    TransformNotThis(String, String),

    #[error("function '{0}' has an input/output name collision: '{1}'")]
    InputOutputNameOverlap(String, String),

    #[error(transparent)]
    Expression(#[from] semabi_expr::Error),
}
