//! Lowering from the AST to the three-address IR.
//!
//! Expressions lower to an [`Instruction`] producing their value; whenever a value must be used
//! as an operand and is not already a literal or variable, it is first stored in a fresh
//! temporary. Conditions and `&&`/`||` lower to branches.

use crate::{
    CodegenError,
    ir::{Access, ClassUnit, Field, IrBuilder, IrType, Method},
};
use jmmc_ast::{Ast, MethodSig, NodeId, NodeKind, SymbolTable, Type};

mod context;
pub use context::GenContext;

mod expr;
mod stmt;

/// Lowers one compilation unit.
pub struct Lowerer<'a> {
    ast: &'a Ast,
    table: &'a SymbolTable,
    cx: GenContext,
}

impl<'a> Lowerer<'a> {
    pub fn new(ast: &'a Ast, table: &'a SymbolTable) -> Self {
        Self { ast, table, cx: GenContext::new(table) }
    }

    /// Lowers the class and all of its methods.
    #[instrument(name = "lower", level = "debug", skip_all)]
    pub fn lower(mut self) -> Result<ClassUnit, CodegenError> {
        let class = self.ast.class_decl()?;
        let fields = self
            .ast
            .children_of_kind(class, NodeKind::VarDecl)
            .map(|id| self.field(id))
            .collect::<Result<_, _>>()?;
        let methods = self
            .ast
            .methods()?
            .into_iter()
            .map(|id| self.method(id))
            .collect::<Result<_, _>>()?;
        Ok(ClassUnit {
            name: self.table.class_name().to_string(),
            super_name: self.table.super_name().map(str::to_string),
            imports: self.table.imports().to_vec(),
            fields,
            methods,
        })
    }

    fn field(&self, id: NodeId) -> Result<Field, CodegenError> {
        let ty = Type::from_node(self.ast, self.ast.expect_child(id, 0)?)?;
        let access = if self.ast.flag(id, "isPrivate")? { Access::Private } else { Access::Public };
        Ok(Field {
            name: self.ast.name(id)?.to_string(),
            ty: IrType::from_ast(&ty),
            access,
            is_static: self.ast.flag(id, "isStatic")?,
            is_final: self.ast.flag(id, "isFinal")?,
        })
    }

    fn method(&mut self, id: NodeId) -> Result<Method, CodegenError> {
        let name = self.ast.name(id)?;
        let sig = self
            .table
            .method(name)
            .ok_or_else(|| CodegenError::UnknownMethod(name.to_string()))?;

        let mut builder =
            IrBuilder::new(self.table.class_name(), name, IrType::from_ast(&sig.return_type));
        if sig.is_public {
            builder.public();
        }
        if sig.is_static {
            builder.static_();
        }
        for param in &sig.params {
            builder.param(&param.name, IrType::from_ast(&param.ty));
        }

        let mut lowerer = MethodLowerer {
            ast: self.ast,
            table: self.table,
            sig,
            cx: &mut self.cx,
            b: builder,
        };
        for stmt in self.ast.stmts(id) {
            lowerer.stmt(stmt)?;
        }
        lowerer.b.finish()
    }
}

/// Per-method lowering state.
struct MethodLowerer<'a, 'cx> {
    ast: &'a Ast,
    table: &'a SymbolTable,
    sig: &'a MethodSig,
    cx: &'cx mut GenContext,
    b: IrBuilder,
}

impl MethodLowerer<'_, '_> {
    fn class_name(&self) -> &str {
        self.table.class_name()
    }

    fn unsupported(&self, id: NodeId) -> CodegenError {
        CodegenError::UnsupportedNode { kind: self.ast.kind(id), method: self.sig.name.clone() }
    }

    fn unknown_var(&self, name: &str) -> CodegenError {
        CodegenError::UnknownVar { name: name.to_string(), method: self.sig.name.clone() }
    }
}
