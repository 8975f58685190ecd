//! jmm Abstract Syntax Tree (AST) definitions.
//!
//! The tree is an arena of uniform nodes: each node has a [`NodeKind`], a string-keyed attribute
//! map, an ordered child list, and a parent index. Rewrites go through [`Ast::replace`] and
//! [`Ast::remove`], which never invalidate other [`NodeId`]s.

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate tracing;

pub mod ast;
pub use ast::{Ast, Literal, Node, NodeId, NodeKind};

pub mod build;

mod error;
pub use error::AstError;

mod json;
pub use json::RawNode;

mod pretty;

mod symbol_table;
pub use symbol_table::{MethodSig, SymbolTable, VarOrigin};

mod ty;
pub use ty::{Symbol, Type};
