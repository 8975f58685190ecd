//! Declarations collected from a type-checked AST.

use crate::{Ast, AstError, NodeId, NodeKind, Symbol, Type};
use jmmc_data_structures::map::FxIndexMap;

/// A method signature plus its local declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Symbol>,
    pub locals: Vec<Symbol>,
    pub is_static: bool,
    pub is_public: bool,
}

impl MethodSig {
    /// Returns the vararg parameter, which is always last.
    pub fn vararg(&self) -> Option<&Symbol> {
        self.params.last().filter(|p| p.ty.is_vararg)
    }

    /// Returns the number of parameters before the vararg parameter, if any.
    pub fn fixed_arity(&self) -> usize {
        self.params.len() - usize::from(self.vararg().is_some())
    }
}

/// Where a variable name resolves to inside a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarOrigin {
    Local,
    Param,
    Field,
}

/// The symbol table of one compilation unit.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    imports: Vec<String>,
    class_name: String,
    super_name: Option<String>,
    fields: Vec<Symbol>,
    methods: FxIndexMap<String, MethodSig>,
}

impl SymbolTable {
    /// Collects declarations from `ast`. No type checking is performed.
    pub fn build(ast: &Ast) -> Result<Self, AstError> {
        let root = ast.root();
        let imports = ast
            .children_of_kind(root, NodeKind::ImportDecl)
            .map(|id| ast.name(id).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        let class = ast.class_decl()?;
        let mut table = Self {
            imports,
            class_name: ast.name(class)?.to_string(),
            super_name: ast.attr(class, "superName").map(str::to_string),
            ..Default::default()
        };

        for &child in ast.children(class) {
            match ast.kind(child) {
                NodeKind::VarDecl => table.fields.push(Symbol::from_node(ast, child)?),
                NodeKind::MethodDecl => {
                    let sig = method_sig(ast, child)?;
                    table.methods.insert(sig.name.clone(), sig);
                }
                _ => {}
            }
        }
        debug!(
            class = %table.class_name,
            fields = table.fields.len(),
            methods = table.methods.len(),
            "built symbol table"
        );
        Ok(table)
    }

    /// Returns the import paths, dotted.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Returns the full dotted path of the import whose last segment is `simple_name`.
    pub fn import_path(&self, simple_name: &str) -> Option<&str> {
        self.imports
            .iter()
            .map(String::as_str)
            .find(|path| path.rsplit('.').next() == Some(simple_name))
    }

    /// Returns `true` if `simple_name` names an imported class.
    pub fn is_imported(&self, simple_name: &str) -> bool {
        self.import_path(simple_name).is_some()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSig> {
        self.methods.values()
    }

    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.get(name)
    }

    /// Resolves `name` inside `method`: locals first, then parameters, then fields.
    ///
    /// Fields are not visible from static methods.
    pub fn resolve_var(&self, method: &str, name: &str) -> Option<(VarOrigin, &Symbol)> {
        let sig = self.method(method)?;
        if let Some(local) = sig.locals.iter().find(|s| s.name == name) {
            return Some((VarOrigin::Local, local));
        }
        if let Some(param) = sig.params.iter().find(|s| s.name == name) {
            return Some((VarOrigin::Param, param));
        }
        if sig.is_static {
            return None;
        }
        self.field(name).map(|f| (VarOrigin::Field, f))
    }

    /// Returns the static type of an expression, or `None` if it cannot be known locally, such as
    /// the result of a call into an imported class.
    pub fn expr_type(
        &self,
        ast: &Ast,
        method: &str,
        expr: NodeId,
    ) -> Result<Option<Type>, AstError> {
        Ok(Some(match ast.kind(expr) {
            NodeKind::IntLiteral
            | NodeKind::BinaryExpr
            | NodeKind::ArrayAccess
            | NodeKind::ArrayLength => Type::int(),
            NodeKind::BoolLiteral
            | NodeKind::ComparisonExpr
            | NodeKind::BooleanExpr
            | NodeKind::UnaryExpr => Type::boolean(),
            NodeKind::NewArray | NodeKind::ArrayInit => Type::int_array(),
            NodeKind::This => Type::new(&self.class_name),
            NodeKind::NewObject => Type::new(ast.name(expr)?),
            NodeKind::ParenExpr => return self.expr_type(ast, method, ast.expect_child(expr, 0)?),
            NodeKind::VarRef => {
                let name = ast.name(expr)?;
                match self.resolve_var(method, name) {
                    Some((_, sym)) => sym.ty.clone(),
                    None if self.is_imported(name) || name == self.class_name => Type::new(name),
                    None => return Ok(None),
                }
            }
            NodeKind::FieldAccess => {
                let receiver = ast.expect_child(expr, 0)?;
                if ast.kind(ast.unwrap_parens(receiver)) != NodeKind::This {
                    return Ok(None);
                }
                match self.field(ast.name(expr)?) {
                    Some(field) => field.ty.clone(),
                    None => return Ok(None),
                }
            }
            NodeKind::MethodCall => {
                let receiver = ast.expect_child(expr, 0)?;
                let receiver_ty = self.expr_type(ast, method, receiver)?;
                let own_class =
                    receiver_ty.is_some_and(|ty| !ty.is_array && ty.name == self.class_name);
                match self.method(ast.name(expr)?) {
                    Some(sig) if own_class => sig.return_type.clone(),
                    _ => return Ok(None),
                }
            }
            _ => return Ok(None),
        }))
    }
}

fn method_sig(ast: &Ast, id: NodeId) -> Result<MethodSig, AstError> {
    let return_type = Type::from_node(ast, ast.expect_child(id, 0)?)?;
    let params = ast
        .children_of_kind(id, NodeKind::Param)
        .map(|p| Symbol::from_node(ast, p))
        .collect::<Result<Vec<_>, _>>()?;
    let locals = ast
        .children_of_kind(id, NodeKind::VarDecl)
        .map(|v| Symbol::from_node(ast, v))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MethodSig {
        name: ast.name(id)?.to_string(),
        return_type,
        params,
        locals,
        is_static: ast.flag(id, "isStatic")?,
        is_public: ast.flag(id, "isPublic")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;

    fn program() -> Ast {
        AstBuilder::new()
            .import("io")
            .import("java.util.ArrayList")
            .class(
                ClassBuilder::new("Calc")
                    .extends("Base")
                    .field("total", ty("int"))
                    .field("flags", array_ty("boolean"))
                    .method(
                        MethodBuilder::new("sum", ty("int"))
                            .public()
                            .param("xs", vararg_ty("int"))
                            .local("i", ty("int"))
                            .local("total", ty("boolean"))
                            .stmt(ret(var("i"))),
                    )
                    .method(
                        MethodBuilder::new("main", ty("void"))
                            .public()
                            .static_()
                            .param("args", array_ty("String")),
                    ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn collects_declarations() {
        let table = SymbolTable::build(&program()).unwrap();
        assert_eq!(table.class_name(), "Calc");
        assert_eq!(table.super_name(), Some("Base"));
        assert_eq!(table.import_path("ArrayList"), Some("java.util.ArrayList"));
        assert!(table.is_imported("io"));
        assert!(!table.is_imported("util"));
        assert_eq!(table.fields().len(), 2);

        let sum = table.method("sum").unwrap();
        assert_eq!(sum.return_type, Type::int());
        assert_eq!(sum.vararg().map(|p| p.name.as_str()), Some("xs"));
        assert_eq!(sum.fixed_arity(), 0);
        assert!(!sum.is_static);
        assert!(table.method("main").unwrap().is_static);
    }

    #[test]
    fn resolution_order() {
        let table = SymbolTable::build(&program()).unwrap();
        let (origin, sym) = table.resolve_var("sum", "total").unwrap();
        assert_eq!(origin, VarOrigin::Local);
        assert_eq!(sym.ty, Type::boolean());
        assert_eq!(table.resolve_var("sum", "xs").unwrap().0, VarOrigin::Param);
        assert_eq!(table.resolve_var("sum", "flags").unwrap().0, VarOrigin::Field);
        assert_eq!(table.resolve_var("main", "flags"), None);
        assert_eq!(table.resolve_var("nope", "flags"), None);
    }

    #[test]
    fn expression_types() {
        let ast = AstBuilder::new()
            .import("io")
            .class(
                ClassBuilder::new("A").method(
                    MethodBuilder::new("f", ty("int"))
                        .local("a", array_ty("int"))
                        .stmt(expr_stmt(call(this(), "f", [])))
                        .stmt(expr_stmt(call(var("io"), "read", [])))
                        .stmt(expr_stmt(paren(cmp("<", int(1), var("a"))))),
                ),
            )
            .build()
            .unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        let method = ast.methods().unwrap()[0];
        let exprs: Vec<_> = ast.stmts(method).iter().map(|&s| ast.child(s, 0).unwrap()).collect();
        assert_eq!(table.expr_type(&ast, "f", exprs[0]).unwrap(), Some(Type::int()));
        assert_eq!(table.expr_type(&ast, "f", exprs[1]).unwrap(), None);
        assert_eq!(table.expr_type(&ast, "f", exprs[2]).unwrap(), Some(Type::boolean()));
        let io = ast.child(exprs[1], 0).unwrap();
        assert_eq!(table.expr_type(&ast, "f", io).unwrap(), Some(Type::new("io")));
    }
}
