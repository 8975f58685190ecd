//! Statement lowering.

use super::MethodLowerer;
use crate::{
    CodegenError,
    ir::{Instruction, IrType, Label, LabelKind, Operand},
};
use jmmc_ast::{NodeId, NodeKind, VarOrigin};

impl MethodLowerer<'_, '_> {
    /// Lowers a statement.
    pub(super) fn stmt(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::BlockStmt => {
                for &stmt in ast.children(id) {
                    self.stmt(stmt)?;
                }
            }
            NodeKind::IfStmt => self.if_stmt(id)?,
            NodeKind::WhileStmt => self.while_stmt(id)?,
            NodeKind::ExprStmt => self.expr_stmt(ast.expect_child(id, 0)?)?,
            NodeKind::AssignStmt => self.assign(id)?,
            NodeKind::ArrayAssignStmt => self.array_assign(id)?,
            NodeKind::ReturnStmt => {
                let value = match ast.child(id, 0) {
                    Some(expr) => {
                        let ty = IrType::from_ast(&self.sig.return_type);
                        Some(self.operand(expr, Some(&ty))?)
                    }
                    None => None,
                };
                self.b.ret(value);
            }
            _ => return Err(self.unsupported(id)),
        }
        Ok(())
    }

    /// ```text
    ///     if (cond) goto if0;
    ///     <else>
    ///     goto endif0;
    ///   if0:
    ///     <then>
    ///   endif0:
    /// ```
    ///
    /// The jump over the then-branch and the end label are left out when the else-branch cannot
    /// complete normally.
    fn if_stmt(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let cond = self.ast.expect_child(id, 0)?;
        let then = self.ast.expect_child(id, 1)?;
        let else_ = self.ast.expect_child(id, 2)?;
        let n = self.cx.label_id();
        let (then_label, end) = (Label::new(LabelKind::Then, n), Label::new(LabelKind::EndIf, n));

        let cond = self.condition(cond)?;
        self.b.branch(cond, then_label);
        self.stmt(else_)?;
        let joins = self.b.falls_through();
        if joins {
            self.b.goto(end);
        }
        self.b.label(then_label);
        self.stmt(then)?;
        if joins {
            self.b.label(end);
        }
        Ok(())
    }

    /// ```text
    ///   whileCond0:
    ///     if (cond) goto whileLoop0;
    ///     goto whileEnd0;
    ///   whileLoop0:
    ///     <body>
    ///     goto whileCond0;
    ///   whileEnd0:
    /// ```
    fn while_stmt(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let (cond, body) = (self.ast.expect_child(id, 0)?, self.ast.expect_child(id, 1)?);
        let n = self.cx.label_id();
        let top = Label::new(LabelKind::WhileCond, n);
        let body_label = Label::new(LabelKind::WhileLoop, n);
        let end = Label::new(LabelKind::WhileEnd, n);

        self.b.label(top);
        let cond = self.condition(cond)?;
        self.b.branch(cond, body_label);
        self.b.goto(end);
        self.b.label(body_label);
        self.stmt(body)?;
        self.b.goto(top);
        self.b.label(end);
        Ok(())
    }

    /// Calls are emitted on their own; other expressions are evaluated for their side effects.
    fn expr_stmt(&mut self, expr: NodeId) -> Result<(), CodegenError> {
        let expr = self.ast.unwrap_parens(expr);
        if self.ast.kind(expr) == NodeKind::MethodCall {
            let call = self.call(expr, None)?;
            self.b.emit(Instruction::Call(call));
            return Ok(());
        }
        match self.value(expr, None)? {
            Instruction::SingleOp(operand) if operand.is_simple() => {}
            value => {
                self.materialize(value);
            }
        }
        Ok(())
    }

    fn assign(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let name = self.ast.name(id)?;
        let rhs = self.ast.expect_child(id, 0)?;
        match self.table.resolve_var(&self.sig.name, name) {
            Some((VarOrigin::Local | VarOrigin::Param, symbol)) => {
                let dest = Operand::var(name, IrType::from_ast(&symbol.ty));
                let value = self.value(rhs, Some(&dest.ty()))?;
                self.b.assign(dest, value);
            }
            Some((VarOrigin::Field, symbol)) => {
                let value = self.operand(rhs, Some(&IrType::from_ast(&symbol.ty)))?;
                self.b.emit(Instruction::PutField {
                    object: Operand::This(self.class_name().to_string()),
                    field: name.to_string(),
                    value,
                });
            }
            None => return Err(self.unknown_var(name)),
        }
        Ok(())
    }

    /// `a[i] = v`. Arrays held in fields are first loaded into a temporary.
    fn array_assign(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let name = self.ast.name(id)?;
        let (array, ty) = match self.table.resolve_var(&self.sig.name, name) {
            Some((VarOrigin::Local | VarOrigin::Param, symbol)) => {
                (name.to_string(), IrType::from_ast(&symbol.ty))
            }
            Some((VarOrigin::Field, symbol)) => {
                let ty = IrType::from_ast(&symbol.ty);
                let tmp = self.materialize(Instruction::GetField {
                    object: Operand::This(self.class_name().to_string()),
                    field: name.to_string(),
                    ty: ty.clone(),
                });
                match tmp {
                    Operand::Var { name, .. } => (name, ty),
                    _ => return Err(self.unsupported(id)),
                }
            }
            None => return Err(self.unknown_var(name)),
        };
        let elem = ty.element().cloned().unwrap_or(IrType::Int);
        let index = self.operand(self.ast.expect_child(id, 0)?, Some(&IrType::Int))?;
        let value = self.operand(self.ast.expect_child(id, 1)?, Some(&elem))?;
        let dest = Operand::ArrayElement { array, index: Box::new(index), ty: elem };
        self.b.assign(dest, Instruction::SingleOp(value));
        Ok(())
    }
}
