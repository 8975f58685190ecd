//! Constant folding.
//!
//! Replaces operator nodes whose operands are literals with the literal they evaluate to.
//! Integer arithmetic wraps at 32 bits, as it does on the JVM.

use crate::CodegenError;
use jmmc_ast::{
    Ast, Literal, NodeId, NodeKind,
    ast::{BinOpKind, BoolOpKind, CmpOpKind},
};

/// Folds constant expressions in place.
pub struct ConstantFolder<'a> {
    ast: &'a mut Ast,
    folded: usize,
}

impl<'a> ConstantFolder<'a> {
    /// Creates a new constant folder.
    pub fn new(ast: &'a mut Ast) -> Self {
        Self { ast, folded: 0 }
    }

    /// Returns the number of nodes folded so far.
    #[must_use]
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Runs one postorder pass over the whole tree. Returns `true` if anything was folded.
    ///
    /// Children are folded before their parents, so nested constant expressions collapse in a
    /// single pass.
    pub fn run(&mut self) -> Result<bool, CodegenError> {
        let before = self.folded;
        for id in self.ast.postorder(self.ast.root()) {
            if let Some(lit) = Self::try_fold(self.ast, id)? {
                let new = self.ast.alloc_literal(lit);
                self.ast.replace(id, new)?;
                self.folded += 1;
                trace!(node = ?id, %lit, "folded");
            }
        }
        Ok(self.folded > before)
    }

    /// Evaluates a single operator node whose operands are already literals.
    ///
    /// Returns `None` for any other shape.
    pub fn try_fold(ast: &Ast, id: NodeId) -> Result<Option<Literal>, CodegenError> {
        let kind = ast.kind(id);
        let operand = |i: usize| -> Result<Option<Literal>, CodegenError> {
            Ok(ast.literal(ast.unwrap_parens(ast.expect_child(id, i)?))?)
        };
        Ok(match kind {
            NodeKind::BinaryExpr => match (operand(0)?, operand(1)?) {
                (Some(Literal::Int(lhs)), Some(Literal::Int(rhs))) => {
                    let op = ast.op::<BinOpKind>(id)?;
                    let value = op.eval(lhs, rhs).ok_or(CodegenError::DivisionByZero { lhs })?;
                    Some(Literal::Int(value))
                }
                _ => None,
            },
            NodeKind::ComparisonExpr => {
                let op = ast.op::<CmpOpKind>(id)?;
                match (operand(0)?, operand(1)?) {
                    (Some(Literal::Int(lhs)), Some(Literal::Int(rhs))) => {
                        Some(Literal::Bool(op.eval(lhs, rhs)))
                    }
                    (Some(Literal::Bool(lhs)), Some(Literal::Bool(rhs))) => match op {
                        CmpOpKind::Eq => Some(Literal::Bool(lhs == rhs)),
                        CmpOpKind::Ne => Some(Literal::Bool(lhs != rhs)),
                        _ => None,
                    },
                    _ => None,
                }
            }
            NodeKind::BooleanExpr => match (operand(0)?, operand(1)?) {
                (Some(Literal::Bool(lhs)), Some(Literal::Bool(rhs))) => {
                    Some(Literal::Bool(ast.op::<BoolOpKind>(id)?.eval(lhs, rhs)))
                }
                _ => None,
            },
            NodeKind::UnaryExpr => {
                operand(0)?.and_then(Literal::as_bool).map(|b| Literal::Bool(!b))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmmc_ast::build::*;

    fn method_with(stmt: jmmc_ast::RawNode) -> Ast {
        AstBuilder::new()
            .class(ClassBuilder::new("A").method(
                MethodBuilder::new("f", ty("int")).local("x", ty("int")).stmt(stmt),
            ))
            .build()
            .unwrap()
    }

    fn returned(ast: &Ast) -> NodeId {
        let method = ast.methods().unwrap()[0];
        let ret = *ast.stmts(method).last().unwrap();
        ast.child(ret, 0).unwrap()
    }

    #[test]
    fn test_nested_arithmetic() {
        let mut ast = method_with(ret(bin("+", int(2), bin("*", int(3), int(4)))));
        let mut folder = ConstantFolder::new(&mut ast);
        assert!(folder.run().unwrap());
        assert_eq!(folder.folded(), 2);
        assert_eq!(ast.literal(returned(&ast)).unwrap(), Some(Literal::Int(14)));
    }

    #[test]
    fn test_parenthesized_operands() {
        let mut ast = method_with(ret(bin("-", paren(int(1)), paren(paren(int(5))))));
        ConstantFolder::new(&mut ast).run().unwrap();
        assert_eq!(ast.literal(returned(&ast)).unwrap(), Some(Literal::Int(-4)));
    }

    #[test]
    fn test_comparisons_and_logic() {
        let mut ast = method_with(ret(and(
            cmp("<", int(1), int(2)),
            not(cmp("==", bool_lit(true), bool_lit(false))),
        )));
        ConstantFolder::new(&mut ast).run().unwrap();
        assert_eq!(ast.literal(returned(&ast)).unwrap(), Some(Literal::Bool(true)));

        let mut ast = method_with(ret(or(cmp(">=", int(-1), int(0)), bool_lit(false))));
        ConstantFolder::new(&mut ast).run().unwrap();
        assert_eq!(ast.literal(returned(&ast)).unwrap(), Some(Literal::Bool(false)));
    }

    #[test]
    fn test_wrapping_overflow() {
        let mut ast = method_with(ret(bin("*", int(65536), int(65536))));
        ConstantFolder::new(&mut ast).run().unwrap();
        assert_eq!(ast.literal(returned(&ast)).unwrap(), Some(Literal::Int(0)));
    }

    #[test]
    fn test_division_by_zero() {
        let mut ast = method_with(ret(bin("/", int(7), int(0))));
        let err = ConstantFolder::new(&mut ast).run().unwrap_err();
        assert!(matches!(err, CodegenError::DivisionByZero { lhs: 7 }));
    }

    #[test]
    fn test_leaves_variables_alone() {
        let mut ast = method_with(ret(bin("+", var("x"), int(1))));
        assert!(!ConstantFolder::new(&mut ast).run().unwrap());
        assert_eq!(ast.kind(returned(&ast)), NodeKind::BinaryExpr);
    }

    #[test]
    fn test_idempotent() {
        let mut ast = method_with(ret(bin("+", bin("/", int(9), int(2)), var("x"))));
        assert!(ConstantFolder::new(&mut ast).run().unwrap());
        let once = ast.to_tree_string(ast.root());
        assert!(!ConstantFolder::new(&mut ast).run().unwrap());
        assert_eq!(ast.to_tree_string(ast.root()), once);
    }
}
