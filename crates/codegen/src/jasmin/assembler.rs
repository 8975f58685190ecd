//! Jasmin instructions and a stack-tracking instruction buffer.

use super::stack::StackModel;
use crate::ir::Label;
use std::fmt;

/// Instructions without operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
    Iadd,
    Isub,
    Imul,
    Idiv,
    Ixor,
    Iaload,
    Iastore,
    Arraylength,
    Dup,
    Pop,
    Ireturn,
    Areturn,
    Return,
}

impl Opcode {
    /// `(pops, pushes)`.
    pub const fn stack_effect(self) -> (u32, u32) {
        match self {
            Self::Iadd | Self::Isub | Self::Imul | Self::Idiv | Self::Ixor | Self::Iaload => (2, 1),
            Self::Iastore => (3, 0),
            Self::Arraylength => (1, 1),
            Self::Dup => (1, 2),
            Self::Pop | Self::Ireturn | Self::Areturn => (1, 0),
            Self::Return => (0, 0),
        }
    }

    /// Returns `true` if control never continues to the next instruction.
    pub const fn is_terminator(self) -> bool {
        matches!(self, Self::Ireturn | Self::Areturn | Self::Return)
    }
}

/// Jumps. All conditional forms compare the popped `int` against zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum JumpKind {
    Goto,
    Ifeq,
    Ifne,
    Iflt,
    Ifgt,
    Ifle,
    Ifge,
}

/// Whether a local slot holds an `int`-like value or a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Int,
    Ref,
}

impl SlotKind {
    const fn prefix(self) -> char {
        match self {
            Self::Int => 'i',
            Self::Ref => 'a',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum InvokeKind {
    Invokevirtual,
    Invokestatic,
    Invokespecial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FieldOp {
    Getfield,
    Putfield,
}

/// A Jasmin instruction or label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JasminInst {
    Op(Opcode),
    /// Pushes an `int` constant with the shortest encoding.
    Const(i32),
    Load(SlotKind, u32),
    Store(SlotKind, u32),
    Iinc { reg: u32, delta: i8 },
    Jump(JumpKind, Label),
    Invoke {
        kind: InvokeKind,
        /// `owner/name(params)ret`.
        target: String,
        /// Values consumed, receiver included.
        args: u32,
        returns_value: bool,
    },
    Field {
        op: FieldOp,
        owner: String,
        name: String,
        descriptor: String,
    },
    New(String),
    NewIntArray,
    Label(Label),
}

impl JasminInst {
    /// `(pops, pushes)`.
    pub fn stack_effect(&self) -> (u32, u32) {
        match *self {
            Self::Op(op) => op.stack_effect(),
            Self::Const(_) | Self::Load(..) | Self::New(_) => (0, 1),
            Self::Store(..) => (1, 0),
            Self::Iinc { .. } | Self::Label(_) | Self::Jump(JumpKind::Goto, _) => (0, 0),
            Self::Jump(..) => (1, 0),
            Self::Invoke { args, returns_value, .. } => (args, u32::from(returns_value)),
            Self::Field { op: FieldOp::Getfield, .. } => (1, 1),
            Self::Field { op: FieldOp::Putfield, .. } => (2, 0),
            Self::NewIntArray => (1, 1),
        }
    }
}

impl fmt::Display for JasminInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(op) => write!(f, "{op}"),
            Self::Const(v @ -1..=5) => match v {
                -1 => f.write_str("iconst_m1"),
                v => write!(f, "iconst_{v}"),
            },
            Self::Const(v @ -128..=127) => write!(f, "bipush {v}"),
            Self::Const(v @ -32768..=32767) => write!(f, "sipush {v}"),
            Self::Const(v) => write!(f, "ldc {v}"),
            Self::Load(kind, reg) => write_slot(f, kind.prefix(), "load", *reg),
            Self::Store(kind, reg) => write_slot(f, kind.prefix(), "store", *reg),
            Self::Iinc { reg, delta } => write!(f, "iinc {reg} {delta}"),
            Self::Jump(kind, label) => write!(f, "{kind} {label}"),
            Self::Invoke { kind, target, .. } => write!(f, "{kind} {target}"),
            Self::Field { op, owner, name, descriptor } => {
                write!(f, "{op} {owner}/{name} {descriptor}")
            }
            Self::New(class) => write!(f, "new {class}"),
            Self::NewIntArray => f.write_str("newarray int"),
            Self::Label(label) => write!(f, "{label}:"),
        }
    }
}

fn write_slot(f: &mut fmt::Formatter<'_>, prefix: char, op: &str, reg: u32) -> fmt::Result {
    if reg <= 3 { write!(f, "{prefix}{op}_{reg}") } else { write!(f, "{prefix}{op} {reg}") }
}

/// An instruction buffer that keeps the operand stack model up to date.
#[derive(Debug)]
pub struct Assembler {
    insts: Vec<JasminInst>,
    stack: StackModel,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self { insts: Vec::new(), stack: StackModel::new() }
    }

    /// Appends an instruction.
    pub fn emit(&mut self, inst: JasminInst) {
        match inst {
            JasminInst::Label(label) => self.stack.enter(label),
            JasminInst::Jump(kind, target) => {
                let (pops, pushes) = inst.stack_effect();
                self.stack.apply(pops, pushes);
                self.stack.jump(target);
                if kind == JumpKind::Goto {
                    self.stack.terminate();
                }
            }
            JasminInst::Op(op) if op.is_terminator() => {
                let (pops, pushes) = op.stack_effect();
                self.stack.apply(pops, pushes);
                self.stack.terminate();
            }
            _ => {
                let (pops, pushes) = inst.stack_effect();
                self.stack.apply(pops, pushes);
            }
        }
        self.insts.push(inst);
    }

    pub fn op(&mut self, op: Opcode) {
        self.emit(JasminInst::Op(op));
    }

    pub fn label(&mut self, label: Label) {
        self.emit(JasminInst::Label(label));
    }

    pub fn jump(&mut self, kind: JumpKind, target: Label) {
        self.emit(JasminInst::Jump(kind, target));
    }

    /// Current operand stack height.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.stack.depth()
    }

    /// Returns the instructions and the maximum stack height.
    pub fn finish(self) -> (Vec<JasminInst>, u32) {
        (self.insts, self.stack.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::LabelKind;

    #[test]
    fn test_constant_encodings() {
        let text = |v| JasminInst::Const(v).to_string();
        assert_eq!(text(-1), "iconst_m1");
        assert_eq!(text(5), "iconst_5");
        assert_eq!(text(6), "bipush 6");
        assert_eq!(text(-128), "bipush -128");
        assert_eq!(text(128), "sipush 128");
        assert_eq!(text(-32768), "sipush -32768");
        assert_eq!(text(32768), "ldc 32768");
        assert_eq!(text(i32::MIN), "ldc -2147483648");
    }

    #[test]
    fn test_slot_forms() {
        assert_eq!(JasminInst::Load(SlotKind::Int, 3).to_string(), "iload_3");
        assert_eq!(JasminInst::Load(SlotKind::Int, 4).to_string(), "iload 4");
        assert_eq!(JasminInst::Store(SlotKind::Ref, 0).to_string(), "astore_0");
        assert_eq!(JasminInst::Store(SlotKind::Ref, 12).to_string(), "astore 12");
        assert_eq!(JasminInst::Iinc { reg: 2, delta: -1 }.to_string(), "iinc 2 -1");
    }

    #[test]
    fn test_max_stack() {
        let mut asm = Assembler::new();
        let end = Label::new(LabelKind::WhileEnd, 0);
        asm.emit(JasminInst::Const(1));
        asm.emit(JasminInst::Const(2));
        asm.op(Opcode::Iadd);
        asm.jump(JumpKind::Ifeq, end);
        asm.emit(JasminInst::Load(SlotKind::Ref, 0));
        asm.emit(JasminInst::Invoke {
            kind: InvokeKind::Invokevirtual,
            target: "A/f()I".into(),
            args: 1,
            returns_value: true,
        });
        asm.op(Opcode::Pop);
        asm.label(end);
        asm.op(Opcode::Return);
        assert_eq!(asm.depth(), 0);
        let (insts, max) = asm.finish();
        assert_eq!(insts.len(), 9);
        assert_eq!(max, 2);
    }
}
