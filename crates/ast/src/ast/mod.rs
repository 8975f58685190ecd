//! The node arena.

use crate::AstError;
use jmmc_data_structures::{index::IndexVec, map::FxIndexMap, newtype_index};
use std::fmt;

mod kind;
pub use kind::{BinOpKind, BoolOpKind, CmpOpKind, NodeKind, UnOpKind};

newtype_index! {
    /// A node in an [`Ast`].
    pub struct NodeId;
}

/// A single AST node.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub attrs: FxIndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    /// Returns the children of this node.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the parent of this node, if attached.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A compile-time constant held by a literal node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Literal {
    Int(i32),
    Bool(bool),
}

impl Literal {
    /// Returns the integer value, if this is an integer literal.
    pub fn as_int(self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(v),
            Self::Bool(_) => None,
        }
    }

    /// Returns the boolean value, if this is a boolean literal.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(v),
            Self::Int(_) => None,
        }
    }
}

/// An arena-allocated AST.
///
/// Nodes are never freed: removing a node only detaches it from its parent, so every [`NodeId`]
/// stays valid for the lifetime of the tree.
#[derive(Clone)]
pub struct Ast {
    nodes: IndexVec<NodeId, Node>,
    root: NodeId,
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tree_string(self.root))
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

/// Construction.
impl Ast {
    /// Creates a tree holding a single root node of the given kind.
    pub fn new(root: NodeKind) -> Self {
        let mut nodes = IndexVec::new();
        let root = nodes.push(Node {
            kind: root,
            attrs: FxIndexMap::default(),
            children: Vec::new(),
            parent: None,
        });
        Self { nodes, root }
    }

    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of allocated nodes, attached or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Allocates a detached node.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            attrs: FxIndexMap::default(),
            children: Vec::new(),
            parent: None,
        })
    }

    /// Allocates a detached literal node.
    pub fn alloc_literal(&mut self, lit: Literal) -> NodeId {
        let (kind, value) = match lit {
            Literal::Int(v) => (NodeKind::IntLiteral, v.to_string()),
            Literal::Bool(v) => (NodeKind::BoolLiteral, v.to_string()),
        };
        let id = self.alloc(kind);
        self.set_attr(id, "value", value);
        id
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attr(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.nodes[id].attrs.insert(key.into(), value.into())
    }

    /// Appends a detached node to `parent`'s children.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), AstError> {
        self.ensure_detached(child)?;
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    fn ensure_detached(&self, id: NodeId) -> Result<(), AstError> {
        if self.nodes[id].parent.is_some() || id == self.root {
            return Err(AstError::AlreadyAttached(id));
        }
        Ok(())
    }
}

/// Rewriting.
impl Ast {
    /// Puts the detached node `new` in `old`'s position and detaches `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), AstError> {
        self.ensure_detached(new)?;
        let parent = self.nodes[old].parent.ok_or(AstError::Detached(old))?;
        let pos = self.position(parent, old).ok_or(AstError::Detached(old))?;
        self.nodes[parent].children[pos] = new;
        self.nodes[new].parent = Some(parent);
        self.nodes[old].parent = None;
        Ok(())
    }

    /// Detaches `id` from its parent, returning its former position.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, AstError> {
        let parent = self.nodes[id].parent.ok_or(AstError::Detached(id))?;
        let pos = self.position(parent, id).ok_or(AstError::Detached(id))?;
        self.nodes[parent].children.remove(pos);
        self.nodes[id].parent = None;
        Ok(pos)
    }

    /// Deletes a statement.
    ///
    /// Statements in a statement list are removed; a statement in any other position, such as the
    /// body of a `while`, is replaced by an empty block so its parent keeps its shape.
    pub fn delete_stmt(&mut self, id: NodeId) -> Result<(), AstError> {
        let parent = self.nodes[id].parent.ok_or(AstError::Detached(id))?;
        if self.nodes[parent].kind.is_stmt_list() {
            self.remove(id).map(drop)
        } else {
            let empty = self.alloc(NodeKind::BlockStmt);
            self.replace(id, empty)
        }
    }

    /// Returns `true` if `id` is reachable from the root.
    pub fn is_attached(&self, mut id: NodeId) -> bool {
        loop {
            if id == self.root {
                return true;
            }
            match self.nodes[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes[parent].children.iter().position(|&c| c == child)
    }
}

/// Queries.
impl Ast {
    /// Returns the kind of a node.
    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    /// Returns the children of a node.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Returns the `i`th child of a node.
    #[inline]
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.nodes[id].children.get(i).copied()
    }

    /// Returns the `i`th child of a node, or an arity error.
    pub fn expect_child(&self, id: NodeId, i: usize) -> Result<NodeId, AstError> {
        self.child(id, i).ok_or_else(|| {
            let (_, _, expected) = self.kind(id).arity();
            AstError::Arity { kind: self.kind(id), expected, found: self.children(id).len() }
        })
    }

    /// Returns the parent of a node.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Returns an attribute value.
    #[inline]
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id].attrs.get(key).map(String::as_str)
    }

    /// Returns a required attribute value.
    pub fn expect_attr(&self, id: NodeId, key: &'static str) -> Result<&str, AstError> {
        self.attr(id, key).ok_or(AstError::MissingAttr { kind: self.kind(id), attr: key })
    }

    /// Returns a boolean attribute, defaulting to `false` when absent.
    pub fn flag(&self, id: NodeId, key: &'static str) -> Result<bool, AstError> {
        match self.attr(id, key) {
            None => Ok(false),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(value) => Err(AstError::InvalidAttr {
                kind: self.kind(id),
                attr: key,
                value: value.to_string(),
            }),
        }
    }

    /// Returns the `name` attribute.
    pub fn name(&self, id: NodeId) -> Result<&str, AstError> {
        self.expect_attr(id, "name")
    }

    /// Parses the `op` attribute.
    pub fn op<T: std::str::FromStr>(&self, id: NodeId) -> Result<T, AstError> {
        let op = self.expect_attr(id, "op")?;
        op.parse().map_err(|_| AstError::InvalidAttr {
            kind: self.kind(id),
            attr: "op",
            value: op.to_string(),
        })
    }

    /// Returns the constant held by a literal node.
    pub fn literal(&self, id: NodeId) -> Result<Option<Literal>, AstError> {
        let kind = self.kind(id);
        let parse_err =
            |value: &str| AstError::InvalidAttr { kind, attr: "value", value: value.into() };
        match kind {
            NodeKind::IntLiteral => {
                let value = self.expect_attr(id, "value")?;
                value.parse().map(|v| Some(Literal::Int(v))).map_err(|_| parse_err(value))
            }
            NodeKind::BoolLiteral => {
                let value = self.expect_attr(id, "value")?;
                value.parse().map(|v| Some(Literal::Bool(v))).map_err(|_| parse_err(value))
            }
            _ => Ok(None),
        }
    }

    /// Skips any number of enclosing parentheses.
    pub fn unwrap_parens(&self, mut id: NodeId) -> NodeId {
        while self.kind(id) == NodeKind::ParenExpr {
            match self.child(id, 0) {
                Some(inner) => id = inner,
                None => break,
            }
        }
        id
    }

    /// Returns the nearest proper ancestor of the given kind.
    pub fn ancestor(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut cur = self.parent(id);
        while let Some(node) = cur {
            if self.kind(node) == kind {
                return Some(node);
            }
            cur = self.parent(node);
        }
        None
    }

    /// Returns `id` and all of its descendants in preorder.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants { ast: self, stack: vec![id] }
    }

    /// Returns `id` and all of its descendants in postorder.
    pub fn postorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                out.push(node);
            } else {
                stack.push((node, true));
                stack.extend(self.children(node).iter().rev().map(|&c| (c, false)));
            }
        }
        out
    }

    /// Returns the children of `id` with the given kind.
    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: NodeKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(move |&c| self.kind(c) == kind)
    }

    /// Returns the class declaration of the program.
    pub fn class_decl(&self) -> Result<NodeId, AstError> {
        self.children_of_kind(self.root, NodeKind::ClassDecl).next().ok_or(AstError::MissingClass)
    }

    /// Returns the method declarations of the class.
    pub fn methods(&self) -> Result<Vec<NodeId>, AstError> {
        Ok(self.children_of_kind(self.class_decl()?, NodeKind::MethodDecl).collect())
    }

    /// Returns the statements of a method or block.
    pub fn stmts(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|&c| self.kind(c).is_stmt()).collect()
    }
}

/// Preorder iterator returned by [`Ast::descendants`].
pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.ast.children(id).iter().rev());
        Some(id)
    }
}
