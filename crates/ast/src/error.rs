use crate::{NodeId, NodeKind};

/// Errors produced while reading or rewriting an AST.
#[derive(Debug, thiserror::Error)]
pub enum AstError {
    #[error("failed to read AST: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown node kind `{0}`")]
    UnknownKind(String),
    #[error("`{kind}` node is missing attribute `{attr}`")]
    MissingAttr { kind: NodeKind, attr: &'static str },
    #[error("`{kind}` node has invalid `{attr}` value `{value}`")]
    InvalidAttr { kind: NodeKind, attr: &'static str, value: String },
    #[error("`{kind}` node has {found} children, expected {expected}")]
    Arity { kind: NodeKind, expected: &'static str, found: usize },
    #[error("attribute `{0}` must be a string, number or boolean")]
    NonScalarAttr(String),
    #[error("program has no class declaration")]
    MissingClass,
    #[error("node {0:?} is not attached to a parent")]
    Detached(NodeId),
    #[error("node {0:?} is already attached to a parent")]
    AlreadyAttached(NodeId),
}
