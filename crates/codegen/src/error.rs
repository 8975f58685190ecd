use crate::ir::Label;
use jmmc_ast::{AstError, NodeKind};

/// Internal backend errors.
///
/// These mean the input broke the front-end contract, so they abort the compilation unit.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Ast(#[from] AstError),
    #[error("division by zero while folding `{lhs} / 0`")]
    DivisionByZero { lhs: i32 },
    #[error("cannot lower `{kind}` node in method `{method}`")]
    UnsupportedNode { kind: NodeKind, method: String },
    #[error("cannot emit `{inst}` in method `{method}`")]
    UnsupportedInst { inst: String, method: String },
    #[error("array of {len} elements in method `{method}` exceeds the JVM size limit")]
    ArrayTooLong { len: usize, method: String },
    #[error("method `{0}` is missing from the symbol table")]
    UnknownMethod(String),
    #[error("unknown variable `{name}` in method `{method}`")]
    UnknownVar { name: String, method: String },
    #[error("label `{label}` in method `{method}` is not followed by an instruction")]
    DanglingLabel { label: Label, method: String },
    #[error("jump to undefined label `{label}` in method `{method}`")]
    UndefinedLabel { label: Label, method: String },
}
