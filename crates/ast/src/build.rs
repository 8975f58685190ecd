//! Helpers for assembling ASTs in code, mostly for tests.
//!
//! ```
//! use jmmc_ast::build::*;
//!
//! let ast = AstBuilder::new()
//!     .class(ClassBuilder::new("Main").method(
//!         MethodBuilder::new("answer", ty("int")).public().stmt(ret(bin("*", int(6), int(7)))),
//!     ))
//!     .build()
//!     .unwrap();
//! assert_eq!(ast.methods().unwrap().len(), 1);
//! ```

use crate::{Ast, AstError, NodeKind, RawNode};

/// Assembles a `Program` node.
#[derive(Clone, Debug, Default)]
pub struct AstBuilder {
    imports: Vec<RawNode>,
    class: Option<RawNode>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an import; `path` is dotted.
    pub fn import(mut self, path: &str) -> Self {
        self.imports.push(RawNode::new(NodeKind::ImportDecl).attr("name", path));
        self
    }

    pub fn class(mut self, class: ClassBuilder) -> Self {
        self.class = Some(class.finish());
        self
    }

    /// Returns the unvalidated tree.
    pub fn raw(self) -> RawNode {
        RawNode::new(NodeKind::Program).children(self.imports).children(self.class)
    }

    /// Validates and allocates the tree.
    pub fn build(self) -> Result<Ast, AstError> {
        Ast::from_raw(&self.raw())
    }
}

/// Assembles a `ClassDecl` node.
#[derive(Clone, Debug)]
pub struct ClassBuilder {
    node: RawNode,
    fields: Vec<RawNode>,
    methods: Vec<RawNode>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            node: RawNode::new(NodeKind::ClassDecl).attr("name", name),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, super_name: &str) -> Self {
        self.node = self.node.attr("superName", super_name);
        self
    }

    pub fn field(mut self, name: &str, ty: RawNode) -> Self {
        self.fields.push(var_decl(name, ty));
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method.finish());
        self
    }

    pub fn finish(self) -> RawNode {
        self.node.children(self.fields).children(self.methods)
    }
}

/// Assembles a `MethodDecl` node.
#[derive(Clone, Debug)]
pub struct MethodBuilder {
    name: String,
    return_type: RawNode,
    is_public: bool,
    is_static: bool,
    params: Vec<RawNode>,
    locals: Vec<RawNode>,
    stmts: Vec<RawNode>,
}

impl MethodBuilder {
    pub fn new(name: &str, return_type: RawNode) -> Self {
        Self {
            name: name.to_string(),
            return_type,
            is_public: false,
            is_static: false,
            params: Vec::new(),
            locals: Vec::new(),
            stmts: Vec::new(),
        }
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn param(mut self, name: &str, ty: RawNode) -> Self {
        self.params.push(RawNode::new(NodeKind::Param).attr("name", name).child(ty));
        self
    }

    pub fn local(mut self, name: &str, ty: RawNode) -> Self {
        self.locals.push(var_decl(name, ty));
        self
    }

    pub fn stmt(mut self, stmt: RawNode) -> Self {
        self.stmts.push(stmt);
        self
    }

    pub fn stmts(mut self, stmts: impl IntoIterator<Item = RawNode>) -> Self {
        self.stmts.extend(stmts);
        self
    }

    pub fn finish(self) -> RawNode {
        RawNode::new(NodeKind::MethodDecl)
            .attr("name", self.name)
            .attr("isPublic", self.is_public)
            .attr("isStatic", self.is_static)
            .child(self.return_type)
            .children(self.params)
            .children(self.locals)
            .children(self.stmts)
    }
}

fn var_decl(name: &str, ty: RawNode) -> RawNode {
    RawNode::new(NodeKind::VarDecl).attr("name", name).child(ty)
}

fn type_node(name: &str, is_array: bool, is_vararg: bool) -> RawNode {
    RawNode::new(NodeKind::Type)
        .attr("name", name)
        .attr("isArray", is_array)
        .attr("isVararg", is_vararg)
}

pub fn ty(name: &str) -> RawNode {
    type_node(name, false, false)
}

pub fn array_ty(name: &str) -> RawNode {
    type_node(name, true, false)
}

pub fn vararg_ty(name: &str) -> RawNode {
    type_node(name, true, true)
}

// Statements.

pub fn block(stmts: impl IntoIterator<Item = RawNode>) -> RawNode {
    RawNode::new(NodeKind::BlockStmt).children(stmts)
}

pub fn if_(cond: RawNode, then: RawNode, else_: RawNode) -> RawNode {
    RawNode::new(NodeKind::IfStmt).child(cond).child(then).child(else_)
}

pub fn while_(cond: RawNode, body: RawNode) -> RawNode {
    RawNode::new(NodeKind::WhileStmt).child(cond).child(body)
}

pub fn expr_stmt(expr: RawNode) -> RawNode {
    RawNode::new(NodeKind::ExprStmt).child(expr)
}

pub fn assign(name: &str, rhs: RawNode) -> RawNode {
    RawNode::new(NodeKind::AssignStmt).attr("name", name).child(rhs)
}

pub fn array_assign(name: &str, index: RawNode, rhs: RawNode) -> RawNode {
    RawNode::new(NodeKind::ArrayAssignStmt).attr("name", name).child(index).child(rhs)
}

pub fn ret(expr: RawNode) -> RawNode {
    RawNode::new(NodeKind::ReturnStmt).child(expr)
}

pub fn ret_void() -> RawNode {
    RawNode::new(NodeKind::ReturnStmt)
}

// Expressions.

pub fn int(value: i32) -> RawNode {
    RawNode::new(NodeKind::IntLiteral).attr("value", value)
}

pub fn bool_lit(value: bool) -> RawNode {
    RawNode::new(NodeKind::BoolLiteral).attr("value", value)
}

pub fn var(name: &str) -> RawNode {
    RawNode::new(NodeKind::VarRef).attr("name", name)
}

pub fn this() -> RawNode {
    RawNode::new(NodeKind::This)
}

pub fn paren(expr: RawNode) -> RawNode {
    RawNode::new(NodeKind::ParenExpr).child(expr)
}

/// Integer arithmetic: `op` is one of `+ - * /`.
pub fn bin(op: &str, lhs: RawNode, rhs: RawNode) -> RawNode {
    RawNode::new(NodeKind::BinaryExpr).attr("op", op).child(lhs).child(rhs)
}

/// Integer comparison: `op` is one of `< > <= >= == !=`.
pub fn cmp(op: &str, lhs: RawNode, rhs: RawNode) -> RawNode {
    RawNode::new(NodeKind::ComparisonExpr).attr("op", op).child(lhs).child(rhs)
}

pub fn and(lhs: RawNode, rhs: RawNode) -> RawNode {
    RawNode::new(NodeKind::BooleanExpr).attr("op", "&&").child(lhs).child(rhs)
}

pub fn or(lhs: RawNode, rhs: RawNode) -> RawNode {
    RawNode::new(NodeKind::BooleanExpr).attr("op", "||").child(lhs).child(rhs)
}

pub fn not(expr: RawNode) -> RawNode {
    RawNode::new(NodeKind::UnaryExpr).attr("op", "!").child(expr)
}

pub fn new_object(class: &str) -> RawNode {
    RawNode::new(NodeKind::NewObject).attr("name", class)
}

pub fn new_array(size: RawNode) -> RawNode {
    RawNode::new(NodeKind::NewArray).child(size)
}

pub fn array_init(elems: impl IntoIterator<Item = RawNode>) -> RawNode {
    RawNode::new(NodeKind::ArrayInit).children(elems)
}

pub fn index(array: RawNode, index: RawNode) -> RawNode {
    RawNode::new(NodeKind::ArrayAccess).child(array).child(index)
}

pub fn length(array: RawNode) -> RawNode {
    RawNode::new(NodeKind::ArrayLength).child(array)
}

pub fn call(receiver: RawNode, method: &str, args: impl IntoIterator<Item = RawNode>) -> RawNode {
    RawNode::new(NodeKind::MethodCall).attr("name", method).child(receiver).children(args)
}

pub fn field(receiver: RawNode, name: &str) -> RawNode {
    RawNode::new(NodeKind::FieldAccess).attr("name", name).child(receiver)
}
