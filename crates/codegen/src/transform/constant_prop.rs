//! Flow-sensitive constant propagation with dead-store removal.
//!
//! Statements are walked in program order while tracking, for every method local and parameter,
//! the literal it was last assigned and how often that binding has been read. Reads are replaced
//! by the literal. An assignment whose binding is overwritten or reaches the end of the method
//! without being read is deleted.
//!
//! Branches and loops are not merged: every variable assigned anywhere inside an `if` or `while`
//! loses its binding before the construct is entered and again when it is left. Losing a binding
//! never deletes its assignment.

use crate::CodegenError;
use jmmc_ast::{Ast, Literal, NodeId, NodeKind};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Clone, Copy, Debug)]
struct Binding {
    /// The `AssignStmt` that created the binding.
    assign: NodeId,
    value: Literal,
    uses: u32,
}

/// Propagates literal assignments into later reads.
pub struct ConstantPropagator<'a> {
    ast: &'a mut Ast,
    /// Locals and parameters of the current method. Fields are never tracked.
    tracked: FxHashSet<String>,
    bindings: FxHashMap<String, Binding>,
    replaced: usize,
    removed: usize,
}

impl<'a> ConstantPropagator<'a> {
    pub fn new(ast: &'a mut Ast) -> Self {
        Self {
            ast,
            tracked: FxHashSet::default(),
            bindings: FxHashMap::default(),
            replaced: 0,
            removed: 0,
        }
    }

    /// Returns the number of reads replaced by literals.
    #[must_use]
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    /// Returns the number of dead assignments deleted.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed
    }

    /// Runs one pass over every method. Returns `true` if the tree changed.
    pub fn run(&mut self) -> Result<bool, CodegenError> {
        let before = self.replaced + self.removed;
        for method in self.ast.methods()? {
            self.run_method(method)?;
        }
        Ok(self.replaced + self.removed > before)
    }

    fn run_method(&mut self, method: NodeId) -> Result<(), CodegenError> {
        self.bindings.clear();
        self.tracked = self
            .ast
            .children(method)
            .iter()
            .filter(|&&c| matches!(self.ast.kind(c), NodeKind::Param | NodeKind::VarDecl))
            .map(|&c| self.ast.name(c).map(str::to_string))
            .collect::<Result<_, _>>()?;

        for stmt in self.ast.stmts(method) {
            self.visit_stmt(stmt)?;
        }

        let mut dead: Vec<_> = self
            .bindings
            .drain()
            .filter(|(_, binding)| binding.uses == 0)
            .map(|(_, binding)| binding.assign)
            .collect();
        dead.sort_unstable();
        for assign in dead {
            self.delete(assign)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, id: NodeId) -> Result<(), CodegenError> {
        match self.ast.kind(id) {
            NodeKind::BlockStmt => {
                for stmt in self.ast.stmts(id) {
                    self.visit_stmt(stmt)?;
                }
            }
            NodeKind::AssignStmt => {
                let rhs = self.ast.expect_child(id, 0)?;
                self.visit_expr(rhs)?;
                let name = self.ast.name(id)?.to_string();
                if !self.tracked.contains(&name) {
                    return Ok(());
                }
                if let Some(old) = self.bindings.remove(&name)
                    && old.uses == 0
                {
                    self.delete(old.assign)?;
                }
                if let Some(value) = self.ast.literal(self.ast.unwrap_parens(rhs))? {
                    self.bindings.insert(name, Binding { assign: id, value, uses: 0 });
                }
            }
            NodeKind::ArrayAssignStmt | NodeKind::ExprStmt | NodeKind::ReturnStmt => {
                for child in self.ast.children(id).to_vec() {
                    self.visit_expr(child)?;
                }
            }
            NodeKind::IfStmt => {
                self.visit_expr(self.ast.expect_child(id, 0)?)?;
                let assigned = self.assigned_in(id)?;
                self.forget(&assigned);
                self.visit_stmt(self.ast.expect_child(id, 1)?)?;
                self.forget(&assigned);
                if let Some(else_) = self.ast.child(id, 2) {
                    self.visit_stmt(else_)?;
                    self.forget(&assigned);
                }
            }
            NodeKind::WhileStmt => {
                let assigned = self.assigned_in(id)?;
                self.forget(&assigned);
                self.visit_expr(self.ast.expect_child(id, 0)?)?;
                self.visit_stmt(self.ast.expect_child(id, 1)?)?;
                self.forget(&assigned);
            }
            _ => {}
        }
        Ok(())
    }

    /// Replaces every bound variable read in `expr` with its literal.
    fn visit_expr(&mut self, expr: NodeId) -> Result<(), CodegenError> {
        let reads: Vec<_> =
            self.ast.descendants(expr).filter(|&n| self.ast.kind(n) == NodeKind::VarRef).collect();
        for read in reads {
            let Some(binding) = self.bindings.get_mut(self.ast.name(read)?) else { continue };
            binding.uses += 1;
            let value = binding.value;
            let new = self.ast.alloc_literal(value);
            self.ast.replace(read, new)?;
            self.replaced += 1;
        }
        Ok(())
    }

    /// Returns the variables assigned anywhere inside `stmt`.
    fn assigned_in(&self, stmt: NodeId) -> Result<FxHashSet<String>, CodegenError> {
        let mut names = FxHashSet::default();
        for node in self.ast.descendants(stmt) {
            if self.ast.kind(node) == NodeKind::AssignStmt {
                names.insert(self.ast.name(node)?.to_string());
            }
        }
        Ok(names)
    }

    fn forget(&mut self, names: &FxHashSet<String>) {
        for name in names {
            self.bindings.remove(name);
        }
    }

    fn delete(&mut self, assign: NodeId) -> Result<(), CodegenError> {
        trace!(node = ?assign, "removing dead store");
        self.ast.delete_stmt(assign)?;
        self.removed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmmc_ast::{RawNode, build::*};
    use snapbox::{assert_data_eq, str};

    fn method(stmts: impl IntoIterator<Item = RawNode>) -> Ast {
        AstBuilder::new()
            .class(
                ClassBuilder::new("A").field("f", ty("int")).method(
                    MethodBuilder::new("m", ty("int"))
                        .param("c", ty("boolean"))
                        .local("x", ty("int"))
                        .local("y", ty("int"))
                        .stmts(stmts),
                ),
            )
            .build()
            .unwrap()
    }

    fn body(ast: &Ast) -> String {
        let method = ast.methods().unwrap()[0];
        ast.stmts(method).iter().map(|&s| ast.to_tree_string(s)).collect()
    }

    #[test]
    fn test_straight_line() {
        let mut ast = method([assign("x", int(5)), assign("y", var("x")), ret(var("y"))]);
        let mut prop = ConstantPropagator::new(&mut ast);
        assert!(prop.run().unwrap());
        assert_eq!(prop.replaced(), 2);
        assert_eq!(prop.removed(), 0);

        // The second pass sees no reads left and removes both stores.
        let mut prop = ConstantPropagator::new(&mut ast);
        assert!(prop.run().unwrap());
        assert_eq!(prop.removed(), 2);
        assert_data_eq!(
            body(&ast).trim_end(),
            str![[r#"
ReturnStmt
  IntLiteral value=5"#]]
        );
    }

    #[test]
    fn test_overwritten_store() {
        let mut ast = method([assign("x", int(1)), assign("x", int(2)), ret(var("x"))]);
        ConstantPropagator::new(&mut ast).run().unwrap();
        assert_data_eq!(
            body(&ast).trim_end(),
            str![[r#"
AssignStmt name=x
  IntLiteral value=2
ReturnStmt
  IntLiteral value=2"#]]
        );
    }

    #[test]
    fn test_if_join_invalidates() {
        let mut ast = method([
            if_(var("c"), block([assign("x", int(1))]), block([assign("x", int(2))])),
            ret(var("x")),
        ]);
        assert!(!ConstantPropagator::new(&mut ast).run().unwrap());
        let method = ast.methods().unwrap()[0];
        let ret = *ast.stmts(method).last().unwrap();
        assert_eq!(ast.kind(ast.child(ret, 0).unwrap()), NodeKind::VarRef);
    }

    #[test]
    fn test_binding_survives_unrelated_branch() {
        let mut ast = method([
            assign("x", int(3)),
            if_(var("c"), assign("y", var("x")), assign("y", int(0))),
            ret(var("y")),
        ]);
        let mut prop = ConstantPropagator::new(&mut ast);
        prop.run().unwrap();
        assert_eq!(prop.replaced(), 1);
        assert_eq!(prop.removed(), 0);
    }

    #[test]
    fn test_loop_invalidates_before_condition() {
        let mut ast = method([
            assign("x", int(0)),
            while_(cmp("<", var("x"), int(10)), assign("x", bin("+", var("x"), int(1)))),
            ret(var("x")),
        ]);
        let mut prop = ConstantPropagator::new(&mut ast);
        assert!(!prop.run().unwrap());
        assert_eq!(prop.removed(), 0);
    }

    #[test]
    fn test_fields_are_not_tracked() {
        let mut ast = method([assign("f", int(1)), ret(var("f"))]);
        assert!(!ConstantPropagator::new(&mut ast).run().unwrap());
    }

    #[test]
    fn test_dead_store_in_loop_body_keeps_shape() {
        let mut ast = method([
            while_(var("c"), block([assign("y", int(1)), assign("y", int(2))])),
            ret(int(0)),
        ]);
        let mut prop = ConstantPropagator::new(&mut ast);
        prop.run().unwrap();
        assert_eq!(prop.removed(), 1);
        assert_data_eq!(
            body(&ast).trim_end(),
            str![[r#"
WhileStmt
  VarRef name=c
  BlockStmt
    AssignStmt name=y
      IntLiteral value=2
ReturnStmt
  IntLiteral value=0"#]]
        );
    }
}
