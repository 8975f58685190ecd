//! The JSON tree form produced by the front-end.
//!
//! ```json
//! { "kind": "AssignStmt", "attrs": { "name": "x" }, "children": [
//!     { "kind": "IntLiteral", "attrs": { "value": 5 } }
//! ] }
//! ```
//!
//! Attribute values may be strings, numbers or booleans; they are stored as strings.

use crate::{Ast, AstError, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An owned, unvalidated tree node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
}

impl RawNode {
    /// Creates a node without attributes or children.
    pub fn new(kind: NodeKind) -> Self {
        Self { kind: kind.to_str().to_string(), attrs: BTreeMap::new(), children: Vec::new() }
    }

    /// Sets an attribute.
    pub fn attr(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Appends a child.
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends children.
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

impl Ast {
    /// Parses an AST from its JSON tree form.
    pub fn from_json(s: &str) -> Result<Self, AstError> {
        let raw: RawNode = serde_json::from_str(s)?;
        Self::from_raw(&raw)
    }

    /// Builds an AST from an owned tree, checking node kinds, required attributes and child
    /// counts.
    pub fn from_raw(raw: &RawNode) -> Result<Self, AstError> {
        let mut ast = Self::new(parse_kind(&raw.kind)?);
        let root = ast.root();
        ast.fill(root, raw)?;
        debug!(nodes = ast.len(), "loaded AST");
        Ok(ast)
    }

    fn fill(&mut self, id: NodeId, raw: &RawNode) -> Result<(), AstError> {
        for (key, value) in &raw.attrs {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return Err(AstError::NonScalarAttr(key.clone())),
            };
            self.set_attr(id, key.clone(), value);
        }

        let kind = self.kind(id);
        if let Some(&attr) = kind.required_attrs().iter().find(|a| self.attr(id, a).is_none()) {
            return Err(AstError::MissingAttr { kind, attr });
        }
        // Literal values must parse.
        self.literal(id)?;
        let (min, max, expected) = kind.arity();
        if !(min..=max).contains(&raw.children.len()) {
            return Err(AstError::Arity { kind, expected, found: raw.children.len() });
        }

        for child in &raw.children {
            let child_id = self.alloc(parse_kind(&child.kind)?);
            self.push_child(id, child_id)?;
            self.fill(child_id, child)?;
        }
        Ok(())
    }

    /// Converts the subtree rooted at `id` back to its owned tree form.
    pub fn to_raw(&self, id: NodeId) -> RawNode {
        let node = &self[id];
        RawNode {
            kind: node.kind.to_str().to_string(),
            attrs: node
                .attrs
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
            children: node.children().iter().map(|&c| self.to_raw(c)).collect(),
        }
    }

    /// Serializes the whole tree to JSON.
    pub fn to_json(&self) -> Result<String, AstError> {
        Ok(serde_json::to_string_pretty(&self.to_raw(self.root()))?)
    }
}

fn parse_kind(s: &str) -> Result<NodeKind, AstError> {
    s.parse().map_err(|_| AstError::UnknownKind(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Literal;

    #[test]
    fn scalar_attrs_become_strings() {
        let ast = Ast::from_json(
            r#"{ "kind": "ReturnStmt", "children": [
                { "kind": "IntLiteral", "attrs": { "value": 40000 } }
            ] }"#,
        )
        .unwrap();
        let lit = ast.child(ast.root(), 0).unwrap();
        assert_eq!(ast.attr(lit, "value"), Some("40000"));
        assert_eq!(ast.literal(lit).unwrap(), Some(Literal::Int(40000)));
    }

    #[test]
    fn rejects_malformed_trees() {
        let err = Ast::from_json(r#"{ "kind": "Lambda" }"#).unwrap_err();
        assert!(matches!(err, AstError::UnknownKind(k) if k == "Lambda"));

        let err = Ast::from_json(r#"{ "kind": "VarRef" }"#).unwrap_err();
        assert_eq!(err.to_string(), "`VarRef` node is missing attribute `name`");

        let err = Ast::from_json(r#"{ "kind": "ParenExpr" }"#).unwrap_err();
        assert!(matches!(err, AstError::Arity { found: 0, .. }));

        let err = Ast::from_json(r#"{ "kind": "IntLiteral", "attrs": { "value": "x" } }"#)
            .unwrap_err();
        assert!(matches!(err, AstError::InvalidAttr { attr: "value", .. }));
    }

    #[test]
    fn raw_form_survives_reload() {
        let src = r#"{ "kind": "AssignStmt", "attrs": { "name": "x" }, "children": [
            { "kind": "BinaryExpr", "attrs": { "op": "+" }, "children": [
                { "kind": "IntLiteral", "attrs": { "value": "2" } },
                { "kind": "VarRef", "attrs": { "name": "y" } }
            ] }
        ] }"#;
        let ast = Ast::from_json(src).unwrap();
        let again = Ast::from_json(&ast.to_json().unwrap()).unwrap();
        assert_eq!(ast.to_raw(ast.root()), again.to_raw(again.root()));
    }
}
