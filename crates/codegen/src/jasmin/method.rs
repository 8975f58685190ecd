//! Instruction selection for one method.

use super::{
    assembler::{Assembler, FieldOp, InvokeKind, JasminInst, JumpKind, Opcode, SlotKind},
    descriptor::{class_path, method_descriptor, type_descriptor},
};
use crate::{
    CodegenError,
    ir::{
        BinOp, Call, CallKind, ClassUnit, Condition, Instruction, IrType, Label, LabelKind,
        Method, Operand, UnOp,
    },
};

/// Selected code for a method body.
pub(super) struct MethodCode {
    pub(super) insts: Vec<JasminInst>,
    pub(super) max_stack: u32,
    pub(super) max_locals: u32,
}

pub(super) struct MethodEmitter<'a> {
    unit: &'a ClassUnit,
    method: &'a Method,
    asm: Assembler,
    /// Id of the next `cmpTrue`/`cmpEnd` label pair.
    next_cmp: u32,
}

impl<'a> MethodEmitter<'a> {
    pub(super) fn new(unit: &'a ClassUnit, method: &'a Method) -> Self {
        Self { unit, method, asm: Assembler::new(), next_cmp: 0 }
    }

    pub(super) fn emit(mut self) -> Result<MethodCode, CodegenError> {
        for (id, inst) in self.method.insts.iter_enumerated() {
            for label in self.method.labels_at(id) {
                self.asm.label(label);
            }
            self.inst(inst)?;
        }
        let max_locals = self.method.var_table.max_reg().map_or(0, |reg| reg + 1);
        let (insts, max_stack) = self.asm.finish();
        Ok(MethodCode { insts, max_stack, max_locals })
    }

    fn unsupported(&self, inst: &Instruction) -> CodegenError {
        CodegenError::UnsupportedInst { inst: inst.to_string(), method: self.method.name.clone() }
    }

    fn inst(&mut self, inst: &Instruction) -> Result<(), CodegenError> {
        match inst {
            Instruction::Assign { dest, rhs, .. } => self.assign(inst, dest, rhs)?,
            Instruction::Call(call) => {
                self.call(inst, call)?;
                if !call.ret.is_void() {
                    self.asm.op(Opcode::Pop);
                }
            }
            Instruction::PutField { object, field, value } => {
                self.load(inst, object)?;
                self.load(inst, value)?;
                self.field(inst, FieldOp::Putfield, object, field, &value.ty())?;
            }
            Instruction::Branch { cond: Condition::Operand(operand), target } => {
                self.load(inst, operand)?;
                self.asm.jump(JumpKind::Ifne, *target);
            }
            Instruction::Branch { cond: Condition::Compare { op, lhs, rhs }, target } => {
                let kind = self.compare(inst, *op, lhs, rhs)?;
                self.asm.jump(kind, *target);
            }
            Instruction::Goto(target) => self.asm.jump(JumpKind::Goto, *target),
            Instruction::Return(None) => self.asm.op(Opcode::Return),
            Instruction::Return(Some(value)) => {
                self.load(inst, value)?;
                let op = if value.ty().is_reference() { Opcode::Areturn } else { Opcode::Ireturn };
                self.asm.op(op);
            }
            Instruction::BinaryOp { .. }
            | Instruction::UnaryOp { .. }
            | Instruction::SingleOp(_)
            | Instruction::GetField { .. } => return Err(self.unsupported(inst)),
        }
        Ok(())
    }

    fn assign(
        &mut self,
        inst: &Instruction,
        dest: &Operand,
        rhs: &Instruction,
    ) -> Result<(), CodegenError> {
        match dest {
            Operand::Var { name, ty } => {
                let reg = self.reg(inst, name)?;
                if let Some(delta) = increment(name, rhs) {
                    self.asm.emit(JasminInst::Iinc { reg, delta });
                    return Ok(());
                }
                self.value(inst, rhs)?;
                self.asm.emit(JasminInst::Store(slot_kind(ty), reg));
            }
            Operand::ArrayElement { array, index, .. } => {
                let reg = self.reg(inst, array)?;
                self.asm.emit(JasminInst::Load(SlotKind::Ref, reg));
                self.load(inst, index)?;
                self.value(inst, rhs)?;
                self.asm.op(Opcode::Iastore);
            }
            _ => return Err(self.unsupported(inst)),
        }
        Ok(())
    }

    /// Pushes the value `rhs` produces.
    fn value(&mut self, inst: &Instruction, rhs: &Instruction) -> Result<(), CodegenError> {
        match rhs {
            Instruction::SingleOp(operand) => self.load(inst, operand)?,
            Instruction::BinaryOp { op, lhs, rhs } if op.is_comparison() => {
                let kind = self.compare(inst, *op, lhs, rhs)?;
                let n = self.next_cmp;
                self.next_cmp += 1;
                let (on_true, end) =
                    (Label::new(LabelKind::CmpTrue, n), Label::new(LabelKind::CmpEnd, n));
                self.asm.jump(kind, on_true);
                self.asm.emit(JasminInst::Const(0));
                self.asm.jump(JumpKind::Goto, end);
                self.asm.label(on_true);
                self.asm.emit(JasminInst::Const(1));
                self.asm.label(end);
            }
            Instruction::BinaryOp { op, lhs, rhs } => {
                self.load(inst, lhs)?;
                self.load(inst, rhs)?;
                self.asm.op(match op {
                    BinOp::Add => Opcode::Iadd,
                    BinOp::Sub => Opcode::Isub,
                    BinOp::Mul => Opcode::Imul,
                    BinOp::Div => Opcode::Idiv,
                    _ => return Err(self.unsupported(inst)),
                });
            }
            Instruction::UnaryOp { op: UnOp::Not, operand } => {
                self.load(inst, operand)?;
                self.asm.emit(JasminInst::Const(1));
                self.asm.op(Opcode::Ixor);
            }
            Instruction::Call(call) => self.call(inst, call)?,
            Instruction::GetField { object, field, ty } => {
                self.load(inst, object)?;
                self.field(inst, FieldOp::Getfield, object, field, ty)?;
            }
            _ => return Err(self.unsupported(inst)),
        }
        Ok(())
    }

    /// Pushes `lhs - rhs` and returns the jump that is taken when the comparison holds.
    fn compare(
        &mut self,
        inst: &Instruction,
        op: BinOp,
        lhs: &Operand,
        rhs: &Operand,
    ) -> Result<JumpKind, CodegenError> {
        let kind = match op {
            BinOp::Lt => JumpKind::Iflt,
            BinOp::Gt => JumpKind::Ifgt,
            BinOp::Le => JumpKind::Ifle,
            BinOp::Ge => JumpKind::Ifge,
            BinOp::Eq => JumpKind::Ifeq,
            BinOp::Ne => JumpKind::Ifne,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                return Err(self.unsupported(inst));
            }
        };
        self.load(inst, lhs)?;
        self.load(inst, rhs)?;
        self.asm.op(Opcode::Isub);
        Ok(kind)
    }

    fn load(&mut self, inst: &Instruction, operand: &Operand) -> Result<(), CodegenError> {
        match operand {
            Operand::Int(v) => self.asm.emit(JasminInst::Const(*v)),
            Operand::Bool(v) => self.asm.emit(JasminInst::Const(i32::from(*v))),
            Operand::Var { name, ty } => {
                let reg = self.reg(inst, name)?;
                self.asm.emit(JasminInst::Load(slot_kind(ty), reg));
            }
            Operand::This(_) => self.asm.emit(JasminInst::Load(SlotKind::Ref, 0)),
            Operand::ArrayElement { array, index, .. } => {
                let reg = self.reg(inst, array)?;
                self.asm.emit(JasminInst::Load(SlotKind::Ref, reg));
                self.load(inst, index)?;
                self.asm.op(Opcode::Iaload);
            }
            Operand::Class(_) => return Err(self.unsupported(inst)),
        }
        Ok(())
    }

    /// Pushes the result of `call`, if it has one.
    fn call(&mut self, inst: &Instruction, call: &Call) -> Result<(), CodegenError> {
        let Some(receiver) = &call.receiver else {
            // `new(array, n)`.
            let [size] = call.args.as_slice() else { return Err(self.unsupported(inst)) };
            self.load(inst, size)?;
            self.asm.emit(JasminInst::NewIntArray);
            return Ok(());
        };
        match call.kind {
            CallKind::New => {
                let class = self.owner(inst, receiver)?;
                self.asm.emit(JasminInst::New(class));
                return Ok(());
            }
            CallKind::NewArray => return Err(self.unsupported(inst)),
            CallKind::ArrayLength => {
                self.load(inst, receiver)?;
                self.asm.op(Opcode::Arraylength);
                return Ok(());
            }
            CallKind::Virtual | CallKind::Special => self.load(inst, receiver)?,
            CallKind::Static => {}
        }
        for arg in &call.args {
            self.load(inst, arg)?;
        }

        let Some(name) = &call.method else { return Err(self.unsupported(inst)) };
        let owner = self.owner(inst, receiver)?;
        let param_types: Vec<IrType> = call.args.iter().map(Operand::ty).collect();
        let descriptor = method_descriptor(self.unit, &param_types, &call.ret);
        let (kind, receivers) = match call.kind {
            CallKind::Static => (InvokeKind::Invokestatic, 0),
            CallKind::Special => (InvokeKind::Invokespecial, 1),
            _ => (InvokeKind::Invokevirtual, 1),
        };
        self.asm.emit(JasminInst::Invoke {
            kind,
            target: format!("{owner}/{name}{descriptor}"),
            args: receivers + call.args.len() as u32,
            returns_value: !call.ret.is_void(),
        });
        Ok(())
    }

    fn field(
        &mut self,
        inst: &Instruction,
        op: FieldOp,
        object: &Operand,
        name: &str,
        ty: &IrType,
    ) -> Result<(), CodegenError> {
        let owner = self.owner(inst, object)?;
        self.asm.emit(JasminInst::Field {
            op,
            owner,
            name: name.to_string(),
            descriptor: type_descriptor(self.unit, ty),
        });
        Ok(())
    }

    /// Internal name of the class a receiver belongs to.
    fn owner(&self, inst: &Instruction, receiver: &Operand) -> Result<String, CodegenError> {
        match receiver {
            Operand::This(_) => Ok(self.unit.name.clone()),
            Operand::Class(name) | Operand::Var { ty: IrType::Class(name), .. } => {
                Ok(class_path(self.unit, name))
            }
            _ => Err(self.unsupported(inst)),
        }
    }

    fn reg(&self, inst: &Instruction, name: &str) -> Result<u32, CodegenError> {
        match self.method.var_table.get(name) {
            Some(desc) => Ok(desc.reg),
            None => Err(self.unsupported(inst)),
        }
    }
}

fn slot_kind(ty: &IrType) -> SlotKind {
    if ty.is_reference() { SlotKind::Ref } else { SlotKind::Int }
}

/// Recognizes `x := x + c`, `x := c + x` and `x := x - c` with the increment in byte range.
fn increment(dest: &str, rhs: &Instruction) -> Option<i8> {
    let Instruction::BinaryOp { op, lhs, rhs } = rhs else { return None };
    let is_dest = |operand: &Operand| operand.as_var() == Some(dest);
    let delta = match (op, lhs, rhs) {
        (BinOp::Add, x, Operand::Int(c)) | (BinOp::Add, Operand::Int(c), x) if is_dest(x) => {
            i64::from(*c)
        }
        (BinOp::Sub, x, Operand::Int(c)) if is_dest(x) => -i64::from(*c),
        _ => return None,
    };
    i8::try_from(delta).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_patterns() {
        let x = Operand::var("x", IrType::Int);
        let add = |lhs: Operand, rhs: Operand| Instruction::BinaryOp { op: BinOp::Add, lhs, rhs };
        let sub = |lhs: Operand, rhs: Operand| Instruction::BinaryOp { op: BinOp::Sub, lhs, rhs };
        assert_eq!(increment("x", &add(x.clone(), Operand::Int(1))), Some(1));
        assert_eq!(increment("x", &add(Operand::Int(-3), x.clone())), Some(-3));
        assert_eq!(increment("x", &sub(x.clone(), Operand::Int(128))), Some(-128));
        assert_eq!(increment("x", &add(x.clone(), Operand::Int(128))), None);
        assert_eq!(increment("x", &sub(Operand::Int(1), x.clone())), None);
        assert_eq!(increment("y", &add(x, Operand::Int(1))), None);
    }
}
