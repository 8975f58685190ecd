//! Expression lowering.

use super::MethodLowerer;
use crate::{
    CodegenError,
    ir::{BinOp, Call, CallKind, Condition, Instruction, IrType, Label, LabelKind, Operand, UnOp},
};
use jmmc_ast::{
    Literal, MethodSig, NodeId, NodeKind, Type, VarOrigin,
    ast::{BinOpKind, BoolOpKind, CmpOpKind},
};

impl MethodLowerer<'_, '_> {
    /// Lowers an expression whose value is used as an operand.
    ///
    /// `expected` is the type the context requires, if known. It decides the return type of calls
    /// into code outside this class; a call in operand position without context is assumed to
    /// return `int`.
    pub(super) fn operand(
        &mut self,
        id: NodeId,
        expected: Option<&IrType>,
    ) -> Result<Operand, CodegenError> {
        let expected = match expected {
            None if self.ast.kind(self.ast.unwrap_parens(id)) == NodeKind::MethodCall => {
                Some(&IrType::Int)
            }
            expected => expected,
        };
        Ok(match self.value(id, expected)? {
            Instruction::SingleOp(operand) if operand.is_simple() => operand,
            value => self.materialize(value),
        })
    }

    /// Stores `value` in a fresh temporary.
    pub(super) fn materialize(&mut self, value: Instruction) -> Operand {
        let tmp = self.cx.temp(value.result_type());
        self.b.assign(tmp.clone(), value);
        tmp
    }

    /// Lowers an expression to an instruction producing its value, emitting whatever has to be
    /// computed first.
    pub(super) fn value(
        &mut self,
        id: NodeId,
        expected: Option<&IrType>,
    ) -> Result<Instruction, CodegenError> {
        let ast = self.ast;
        Ok(match ast.kind(id) {
            NodeKind::IntLiteral | NodeKind::BoolLiteral => {
                Instruction::SingleOp(match ast.literal(id)? {
                    Some(Literal::Int(v)) => Operand::Int(v),
                    Some(Literal::Bool(v)) => Operand::Bool(v),
                    None => return Err(self.unsupported(id)),
                })
            }
            NodeKind::ParenExpr => return self.value(ast.expect_child(id, 0)?, expected),
            NodeKind::This => Instruction::SingleOp(Operand::This(self.class_name().to_string())),
            NodeKind::VarRef => self.var_ref(ast.name(id)?),
            NodeKind::BinaryExpr => {
                let op = ast.op::<BinOpKind>(id)?;
                let lhs = self.operand(ast.expect_child(id, 0)?, Some(&IrType::Int))?;
                let rhs = self.operand(ast.expect_child(id, 1)?, Some(&IrType::Int))?;
                Instruction::BinaryOp { op: op.into(), lhs, rhs }
            }
            NodeKind::ComparisonExpr => {
                let (op, lhs, rhs) = self.comparison(id)?;
                Instruction::BinaryOp { op, lhs, rhs }
            }
            NodeKind::BooleanExpr => Instruction::SingleOp(self.short_circuit(id)?),
            NodeKind::UnaryExpr => {
                let operand = self.operand(ast.expect_child(id, 0)?, Some(&IrType::Bool))?;
                Instruction::UnaryOp { op: UnOp::Not, operand }
            }
            NodeKind::NewObject => {
                let class = ast.name(id)?;
                let object = self.materialize(Instruction::Call(Call::new_object(class)));
                self.b.emit(Instruction::Call(Call::invoke(
                    CallKind::Special,
                    object.clone(),
                    "<init>",
                    Vec::new(),
                    IrType::Void,
                )));
                Instruction::SingleOp(object)
            }
            NodeKind::NewArray => {
                let size = self.operand(ast.expect_child(id, 0)?, Some(&IrType::Int))?;
                Instruction::Call(Call::new_int_array(size))
            }
            NodeKind::ArrayInit => Instruction::SingleOp(self.array_init(ast.children(id))?),
            NodeKind::ArrayAccess => {
                let (array, ty) = self.array(ast.expect_child(id, 0)?)?;
                let index = self.operand(ast.expect_child(id, 1)?, Some(&IrType::Int))?;
                let ty = ty.element().cloned().unwrap_or(IrType::Int);
                Instruction::SingleOp(Operand::ArrayElement { array, index: Box::new(index), ty })
            }
            NodeKind::ArrayLength => {
                let array = self.operand(ast.expect_child(id, 0)?, Some(&IrType::int_array()))?;
                Instruction::Call(Call::array_length(array))
            }
            NodeKind::FieldAccess => {
                let object = self.operand(ast.expect_child(id, 0)?, None)?;
                let field = ast.name(id)?;
                let ty = match self.table.field(field) {
                    Some(symbol) => IrType::from_ast(&symbol.ty),
                    None => return Err(self.unknown_var(field)),
                };
                Instruction::GetField { object, field: field.to_string(), ty }
            }
            NodeKind::MethodCall => Instruction::Call(self.call(id, expected)?),
            _ => return Err(self.unsupported(id)),
        })
    }

    /// Reads a variable: locals and parameters directly, fields through `getfield`.
    ///
    /// Names that resolve to nothing are class names, used as static call targets.
    fn var_ref(&self, name: &str) -> Instruction {
        match self.table.resolve_var(&self.sig.name, name) {
            Some((VarOrigin::Local | VarOrigin::Param, symbol)) => {
                Instruction::SingleOp(Operand::var(name, IrType::from_ast(&symbol.ty)))
            }
            Some((VarOrigin::Field, symbol)) => Instruction::GetField {
                object: Operand::This(self.class_name().to_string()),
                field: name.to_string(),
                ty: IrType::from_ast(&symbol.ty),
            },
            None => Instruction::SingleOp(Operand::Class(name.to_string())),
        }
    }

    /// Lowers an array-valued expression to a named variable.
    fn array(&mut self, id: NodeId) -> Result<(String, IrType), CodegenError> {
        match self.operand(id, Some(&IrType::int_array()))? {
            Operand::Var { name, ty } => Ok((name, ty)),
            _ => Err(self.unsupported(id)),
        }
    }

    /// Operands of a comparison. `==` and `!=` also compare booleans.
    pub(super) fn comparison(
        &mut self,
        id: NodeId,
    ) -> Result<(BinOp, Operand, Operand), CodegenError> {
        let ast = self.ast;
        let op = ast.op::<CmpOpKind>(id)?;
        let (lhs, rhs) = (ast.expect_child(id, 0)?, ast.expect_child(id, 1)?);
        let boolean = self.is_boolean(lhs)? || self.is_boolean(rhs)?;
        let operand_ty = if boolean { IrType::Bool } else { IrType::Int };
        let lhs = self.operand(lhs, Some(&operand_ty))?;
        let rhs = self.operand(rhs, Some(&operand_ty))?;
        Ok((op.into(), lhs, rhs))
    }

    fn static_type(&self, id: NodeId) -> Result<Option<Type>, CodegenError> {
        Ok(self.table.expr_type(self.ast, &self.sig.name, id)?)
    }

    fn is_boolean(&self, id: NodeId) -> Result<bool, CodegenError> {
        Ok(self.static_type(id)?.is_some_and(|ty| ty.is_boolean()))
    }

    /// Lowers a branch condition. Comparisons branch directly on their operands.
    pub(super) fn condition(&mut self, id: NodeId) -> Result<Condition, CodegenError> {
        let inner = self.ast.unwrap_parens(id);
        if self.ast.kind(inner) == NodeKind::ComparisonExpr {
            let (op, lhs, rhs) = self.comparison(inner)?;
            return Ok(Condition::Compare { op, lhs, rhs });
        }
        Ok(Condition::Operand(self.operand(inner, Some(&IrType::Bool))?))
    }

    /// Lowers `&&` and `||` without evaluating the right operand when the left one decides.
    fn short_circuit(&mut self, id: NodeId) -> Result<Operand, CodegenError> {
        let op = self.ast.op::<BoolOpKind>(id)?;
        let (lhs, rhs) = (self.ast.expect_child(id, 0)?, self.ast.expect_child(id, 1)?);
        let n = self.cx.label_id();
        let result = self.cx.temp(IrType::Bool);

        let lhs = self.operand(lhs, Some(&IrType::Bool))?;
        let (taken, end) = match op {
            BoolOpKind::And => (LabelKind::AndTrue, LabelKind::AndEnd),
            BoolOpKind::Or => (LabelKind::OrTrue, LabelKind::OrEnd),
        };
        let (taken, end) = (Label::new(taken, n), Label::new(end, n));
        self.b.branch(Condition::Operand(lhs), taken);
        match op {
            BoolOpKind::And => {
                self.b.assign(result.clone(), Instruction::SingleOp(Operand::Bool(false)));
                self.b.goto(end);
                self.b.label(taken);
                let rhs = self.operand(rhs, Some(&IrType::Bool))?;
                self.b.assign(result.clone(), Instruction::SingleOp(rhs));
            }
            BoolOpKind::Or => {
                let rhs = self.operand(rhs, Some(&IrType::Bool))?;
                self.b.assign(result.clone(), Instruction::SingleOp(rhs));
                self.b.goto(end);
                self.b.label(taken);
                self.b.assign(result.clone(), Instruction::SingleOp(Operand::Bool(true)));
            }
        }
        self.b.label(end);
        Ok(result)
    }

    /// Allocates an `int` array and stores each element in order.
    fn array_init(&mut self, elems: &[NodeId]) -> Result<Operand, CodegenError> {
        let len = i32::try_from(elems.len()).map_err(|_| CodegenError::ArrayTooLong {
            len: elems.len(),
            method: self.sig.name.clone(),
        })?;
        let name = self.cx.temp_name();
        let array = Operand::var(name.clone(), IrType::int_array());
        self.b.assign(array.clone(), Instruction::Call(Call::new_int_array(Operand::Int(len))));
        for (index, &elem) in (0..len).zip(elems) {
            let value = self.operand(elem, Some(&IrType::Int))?;
            let dest = Operand::ArrayElement {
                array: name.clone(),
                index: Box::new(Operand::Int(index)),
                ty: IrType::Int,
            };
            self.b.assign(dest, Instruction::SingleOp(value));
        }
        Ok(array)
    }

    /// Lowers a method call.
    ///
    /// Calls on `this` or on a variable are virtual; calls on a class name are static. The
    /// return type comes from the symbol table for methods of this class, and from `expected`
    /// otherwise, defaulting to `void`.
    pub(super) fn call(
        &mut self,
        id: NodeId,
        expected: Option<&IrType>,
    ) -> Result<Call, CodegenError> {
        let ast = self.ast;
        let name = ast.name(id)?;
        let receiver = ast.unwrap_parens(ast.expect_child(id, 0)?);
        let receiver_ty = match self.static_type(receiver)? {
            Some(ty) => Some(IrType::from_ast(&ty)),
            None if ast.kind(receiver) == NodeKind::MethodCall => {
                Some(self.chained_receiver_type(receiver)?)
            }
            None => None,
        };
        let receiver = self.operand(receiver, receiver_ty.as_ref())?;

        let own_class = match &receiver {
            Operand::This(_) => true,
            Operand::Class(class) | Operand::Var { ty: IrType::Class(class), .. } => {
                class == self.class_name()
            }
            _ => false,
        };
        let callee = if own_class { self.table.method(name) } else { None };
        let kind = match receiver {
            Operand::Class(_) => CallKind::Static,
            _ => CallKind::Virtual,
        };

        let args = self.args(&ast.children(id)[1..], callee)?;
        let ret = match callee {
            Some(sig) => IrType::from_ast(&sig.return_type),
            None => expected.cloned().unwrap_or(IrType::Void),
        };
        Ok(Call::invoke(kind, receiver, name, args, ret))
    }

    /// Type of an unresolved call used as the receiver of another call.
    ///
    /// The result is taken to be an instance of the class the inner call was made on, or
    /// `Object` when that class is not known either.
    fn chained_receiver_type(&self, call: NodeId) -> Result<IrType, CodegenError> {
        let inner = self.ast.unwrap_parens(self.ast.expect_child(call, 0)?);
        if let Some(ty) = self.static_type(inner)? {
            return Ok(match IrType::from_ast(&ty) {
                class @ IrType::Class(_) => class,
                _ => IrType::Class("Object".to_string()),
            });
        }
        Ok(match self.ast.kind(inner) {
            NodeKind::VarRef => match self.var_ref(self.ast.name(inner)?) {
                Instruction::SingleOp(Operand::Class(name)) => IrType::Class(name),
                _ => IrType::Class("Object".to_string()),
            },
            NodeKind::MethodCall => self.chained_receiver_type(inner)?,
            _ => IrType::Class("Object".to_string()),
        })
    }

    /// Lowers call arguments, typed by the callee's parameters when it is known.
    ///
    /// Actuals in the position of a vararg parameter are packed into a new array, unless there is
    /// exactly one and it already is an `int[]`.
    fn args(
        &mut self,
        actuals: &[NodeId],
        callee: Option<&MethodSig>,
    ) -> Result<Vec<Operand>, CodegenError> {
        let Some(sig) = callee else {
            return actuals.iter().map(|&arg| self.operand(arg, None)).collect();
        };

        let fixed = sig.fixed_arity().min(actuals.len());
        let mut args = Vec::with_capacity(fixed + 1);
        for (&arg, param) in actuals[..fixed].iter().zip(&sig.params) {
            args.push(self.operand(arg, Some(&IrType::from_ast(&param.ty)))?);
        }

        let rest = &actuals[fixed..];
        if sig.vararg().is_none() {
            for &arg in rest {
                args.push(self.operand(arg, None)?);
            }
            return Ok(args);
        }
        if let [single] = *rest
            && self.static_type(single)?.is_some_and(|ty| ty.is_int_array())
        {
            args.push(self.operand(single, Some(&IrType::int_array()))?);
            return Ok(args);
        }
        args.push(self.array_init(rest)?);
        Ok(args)
    }
}
