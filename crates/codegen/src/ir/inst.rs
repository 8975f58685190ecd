use super::{IrType, Operand};
use jmmc_ast::ast::{BinOpKind, CmpOpKind};

/// Binary operators. Comparisons produce `bool`, the rest `i32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum BinOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        !matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }

    pub fn result_type(self) -> IrType {
        if self.is_comparison() { IrType::Bool } else { IrType::Int }
    }
}

impl From<BinOpKind> for BinOp {
    fn from(op: BinOpKind) -> Self {
        match op {
            BinOpKind::Add => Self::Add,
            BinOpKind::Sub => Self::Sub,
            BinOpKind::Mul => Self::Mul,
            BinOpKind::Div => Self::Div,
        }
    }
}

impl From<CmpOpKind> for BinOp {
    fn from(op: CmpOpKind) -> Self {
        match op {
            CmpOpKind::Lt => Self::Lt,
            CmpOpKind::Gt => Self::Gt,
            CmpOpKind::Le => Self::Le,
            CmpOpKind::Ge => Self::Ge,
            CmpOpKind::Eq => Self::Eq,
            CmpOpKind::Ne => Self::Ne,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum UnOp {
    #[strum(serialize = "!")]
    Not,
}

/// How a [`Call`] dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum CallKind {
    #[strum(serialize = "invokevirtual")]
    Virtual,
    #[strum(serialize = "invokestatic")]
    Static,
    #[strum(serialize = "invokespecial")]
    Special,
    New,
    #[strum(serialize = "new")]
    NewArray,
    ArrayLength,
}

/// A method invocation or one of the allocating pseudo-calls.
///
/// | kind          | receiver             | method     | args      |
/// |---------------|----------------------|------------|-----------|
/// | `Virtual`     | object               | name       | arguments |
/// | `Static`      | [`Operand::Class`]   | name       | arguments |
/// | `Special`     | object               | `<init>`   | arguments |
/// | `New`         | [`Operand::Class`]   | -          | -         |
/// | `NewArray`    | -                    | -          | size      |
/// | `ArrayLength` | array                | -          | -         |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub receiver: Option<Operand>,
    pub method: Option<String>,
    pub args: Vec<Operand>,
    pub ret: IrType,
}

impl Call {
    pub fn invoke(
        kind: CallKind,
        receiver: Operand,
        method: impl Into<String>,
        args: Vec<Operand>,
        ret: IrType,
    ) -> Self {
        Self { kind, receiver: Some(receiver), method: Some(method.into()), args, ret }
    }

    pub fn new_object(class: &str) -> Self {
        Self {
            kind: CallKind::New,
            receiver: Some(Operand::Class(class.to_string())),
            method: None,
            args: Vec::new(),
            ret: IrType::Class(class.to_string()),
        }
    }

    pub fn new_int_array(size: Operand) -> Self {
        Self {
            kind: CallKind::NewArray,
            receiver: None,
            method: None,
            args: vec![size],
            ret: IrType::int_array(),
        }
    }

    pub fn array_length(array: Operand) -> Self {
        Self {
            kind: CallKind::ArrayLength,
            receiver: Some(array),
            method: None,
            args: Vec::new(),
            ret: IrType::Int,
        }
    }
}

/// Branch condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Taken when the boolean operand is true.
    Operand(Operand),
    /// Taken when the comparison holds.
    Compare { op: BinOp, lhs: Operand, rhs: Operand },
}

/// Label families; the printed name is the family followed by a numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum LabelKind {
    #[strum(serialize = "if")]
    Then,
    #[strum(serialize = "endif")]
    EndIf,
    WhileCond,
    WhileLoop,
    WhileEnd,
    AndTrue,
    AndEnd,
    OrTrue,
    OrEnd,
    /// Used by the Jasmin emitter to materialize comparison results.
    CmpTrue,
    CmpEnd,
}

/// A jump target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{kind}{id}")]
pub struct Label {
    pub kind: LabelKind,
    pub id: u32,
}

impl Label {
    pub const fn new(kind: LabelKind, id: u32) -> Self {
        Self { kind, id }
    }
}

/// An IR instruction.
///
/// `BinaryOp`, `UnaryOp`, `SingleOp`, `Call` and `GetField` produce a value; they appear as the
/// right-hand side of an `Assign` or, for calls, on their own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `dest := rhs`. `dest` is a variable or an array element.
    Assign { dest: Operand, ty: IrType, rhs: Box<Instruction> },
    BinaryOp { op: BinOp, lhs: Operand, rhs: Operand },
    UnaryOp { op: UnOp, operand: Operand },
    SingleOp(Operand),
    Call(Call),
    GetField { object: Operand, field: String, ty: IrType },
    PutField { object: Operand, field: String, value: Operand },
    Branch { cond: Condition, target: Label },
    Goto(Label),
    Return(Option<Operand>),
}

impl Instruction {
    /// Returns the type of the value this instruction produces.
    pub fn result_type(&self) -> IrType {
        match self {
            Self::BinaryOp { op, .. } => op.result_type(),
            Self::UnaryOp { .. } => IrType::Bool,
            Self::SingleOp(operand) => operand.ty(),
            Self::Call(call) => call.ret.clone(),
            Self::GetField { ty, .. } => ty.clone(),
            Self::Assign { .. }
            | Self::PutField { .. }
            | Self::Branch { .. }
            | Self::Goto(_)
            | Self::Return(_) => IrType::Void,
        }
    }

    /// Returns `true` if control never falls through to the next instruction.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Goto(_) | Self::Return(_))
    }

    /// Returns the label this instruction may jump to.
    pub fn jump_target(&self) -> Option<Label> {
        match *self {
            Self::Branch { target, .. } | Self::Goto(target) => Some(target),
            _ => None,
        }
    }

    /// Returns the variable this instruction overwrites.
    pub fn def(&self) -> Option<&str> {
        match self {
            Self::Assign { dest, .. } => dest.as_var(),
            _ => None,
        }
    }

    /// Calls `f` with every variable read by this instruction.
    ///
    /// The array and index of an array-element destination are reads.
    pub fn for_each_use<'a>(&'a self, f: &mut impl FnMut(&'a str, IrType)) {
        match self {
            Self::Assign { dest, rhs, .. } => {
                if let Operand::ArrayElement { .. } = dest {
                    dest.for_each_var(f);
                }
                rhs.for_each_use(f);
            }
            Self::BinaryOp { lhs, rhs, .. } => {
                lhs.for_each_var(f);
                rhs.for_each_var(f);
            }
            Self::UnaryOp { operand, .. } | Self::SingleOp(operand) => operand.for_each_var(f),
            Self::Call(call) => {
                if let Some(receiver) = &call.receiver {
                    receiver.for_each_var(f);
                }
                call.args.iter().for_each(|arg| arg.for_each_var(f));
            }
            Self::GetField { object, .. } => object.for_each_var(f),
            Self::PutField { object, value, .. } => {
                object.for_each_var(f);
                value.for_each_var(f);
            }
            Self::Branch { cond: Condition::Operand(operand), .. } => operand.for_each_var(f),
            Self::Branch { cond: Condition::Compare { lhs, rhs, .. }, .. } => {
                lhs.for_each_var(f);
                rhs.for_each_var(f);
            }
            Self::Return(value) => {
                if let Some(value) = value {
                    value.for_each_var(f);
                }
            }
            Self::Goto(_) => {}
        }
    }

    /// Calls `f` with every variable mentioned by this instruction, in textual order.
    pub(crate) fn for_each_var<'a>(&'a self, f: &mut impl FnMut(&'a str, IrType)) {
        if let Self::Assign { dest, rhs, .. } = self {
            dest.for_each_var(f);
            rhs.for_each_use(f);
        } else {
            self.for_each_use(f);
        }
    }
}
