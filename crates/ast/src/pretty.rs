use crate::{Ast, NodeId};
use std::fmt::Write;

impl Ast {
    /// Renders the subtree rooted at `id` as an indented tree, one node per line.
    ///
    /// ```text
    /// AssignStmt name=x
    ///   IntLiteral value=14
    /// ```
    pub fn to_tree_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, id, 0);
        out
    }

    fn write_tree(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = &self[id];
        let _ = write!(out, "{:indent$}{}", "", node.kind, indent = depth * 2);
        for (key, value) in &node.attrs {
            let _ = write!(out, " {key}={value}");
        }
        out.push('\n');
        for &child in node.children() {
            self.write_tree(out, child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::build::*;
    use snapbox::{assert_data_eq, str};

    #[test]
    fn method_tree() {
        let ast = AstBuilder::new()
            .import("io")
            .class(
                ClassBuilder::new("Foo").method(
                    MethodBuilder::new("bar", ty("int"))
                        .public()
                        .param("a", ty("int"))
                        .stmt(ret(bin("*", var("a"), int(2)))),
                ),
            )
            .build()
            .unwrap();
        assert_data_eq!(
            ast.to_tree_string(ast.root()).trim_end(),
            str![[r#"
Program
  ImportDecl name=io
  ClassDecl name=Foo
    MethodDecl isPublic=true isStatic=false name=bar
      Type isArray=false isVararg=false name=int
      Param name=a
        Type isArray=false isVararg=false name=int
      ReturnStmt
        BinaryExpr op=*
          VarRef name=a
          IntLiteral value=2"#]]
        );
    }
}
