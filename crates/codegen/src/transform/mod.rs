//! AST optimization passes.

pub mod constant_fold;
pub mod constant_prop;

pub use constant_fold::ConstantFolder;
pub use constant_prop::ConstantPropagator;

use crate::CodegenError;
use jmmc_ast::Ast;

/// Statistics from [`optimize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Number of fold/propagate rounds, including the final one that changed nothing.
    pub rounds: usize,
    /// Operator nodes replaced by literals.
    pub folded: usize,
    /// Variable reads replaced by literals.
    pub propagated: usize,
    /// Dead assignments deleted.
    pub removed: usize,
}

/// Alternates constant folding and constant propagation until neither changes the tree.
#[instrument(name = "optimize", level = "debug", skip_all)]
pub fn optimize(ast: &mut Ast) -> Result<OptStats, CodegenError> {
    let mut stats = OptStats::default();
    loop {
        stats.rounds += 1;

        let mut folder = ConstantFolder::new(ast);
        let folded = folder.run()?;
        stats.folded += folder.folded();

        let mut propagator = ConstantPropagator::new(ast);
        let propagated = propagator.run()?;
        stats.propagated += propagator.replaced();
        stats.removed += propagator.removed();

        if !folded && !propagated {
            break;
        }
    }
    debug!(?stats, "reached fixed point");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmmc_ast::{Literal, build::*};

    #[test]
    fn test_fold_and_propagate_interleave() {
        let mut ast = AstBuilder::new()
            .class(
                ClassBuilder::new("A").method(
                    MethodBuilder::new("f", ty("int"))
                        .local("a", ty("int"))
                        .local("b", ty("int"))
                        .stmt(assign("a", bin("+", int(2), bin("*", int(3), int(4)))))
                        .stmt(assign("b", bin("-", var("a"), int(4))))
                        .stmt(ret(bin("/", var("b"), int(2)))),
                ),
            )
            .build()
            .unwrap();

        let stats = optimize(&mut ast).unwrap();
        let method = ast.methods().unwrap()[0];
        let stmts = ast.stmts(method);
        assert_eq!(stmts.len(), 1);
        let value = ast.child(stmts[0], 0).unwrap();
        assert_eq!(ast.literal(value).unwrap(), Some(Literal::Int(5)));
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.folded, 4);

        // Already at the fixed point: one round, no changes.
        let again = optimize(&mut ast).unwrap();
        assert_eq!(again, OptStats { rounds: 1, ..Default::default() });
    }

    #[test]
    fn test_chain_settles_in_few_rounds() {
        let mut ast = AstBuilder::new()
            .class(
                ClassBuilder::new("A").method(
                    MethodBuilder::new("f", ty("int"))
                        .public()
                        .local("a", ty("int"))
                        .local("b", ty("int"))
                        .local("c", ty("int"))
                        .stmt(assign("a", int(1)))
                        .stmt(assign("b", bin("+", var("a"), int(1))))
                        .stmt(assign("c", bin("+", var("b"), int(1))))
                        .stmt(ret(var("c"))),
                ),
            )
            .build()
            .unwrap();

        let stats = optimize(&mut ast).unwrap();
        // One round per link of the chain plus the round that finds nothing.
        assert!(stats.rounds <= 4, "{stats:?}");
        let method = ast.methods().unwrap()[0];
        let ret = *ast.stmts(method).last().unwrap();
        let value = ast.child(ret, 0).unwrap();
        assert_eq!(ast.literal(value).unwrap(), Some(Literal::Int(3)));
    }
}
