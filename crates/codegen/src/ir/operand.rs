use super::IrType;
use std::fmt;

/// An instruction operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Int(i32),
    Bool(bool),
    /// A local variable, parameter or temporary.
    Var { name: String, ty: IrType },
    /// The receiver of an instance method; holds the enclosing class name.
    This(String),
    /// A class name used as the target of a static call or `new`.
    Class(String),
    /// `array[index]`; `ty` is the element type.
    ArrayElement { array: String, index: Box<Operand>, ty: IrType },
}

impl Operand {
    pub fn var(name: impl Into<String>, ty: IrType) -> Self {
        Self::Var { name: name.into(), ty }
    }

    /// Returns the type of the value this operand denotes.
    pub fn ty(&self) -> IrType {
        match self {
            Self::Int(_) => IrType::Int,
            Self::Bool(_) => IrType::Bool,
            Self::Var { ty, .. } | Self::ArrayElement { ty, .. } => ty.clone(),
            Self::This(class) | Self::Class(class) => IrType::Class(class.clone()),
        }
    }

    /// Returns the variable name if this is a plain variable.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Self::Var { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns `true` for operands that can be used without computing anything first.
    pub fn is_simple(&self) -> bool {
        !matches!(self, Self::ArrayElement { .. })
    }

    /// Calls `f` with every variable this operand reads, together with its type.
    pub fn for_each_var<'a>(&'a self, f: &mut impl FnMut(&'a str, IrType)) {
        match self {
            Self::Var { name, ty } => f(name, ty.clone()),
            Self::ArrayElement { array, index, ty } => {
                f(array, IrType::Array(Box::new(ty.clone())));
                index.for_each_var(f);
            }
            Self::Int(_) | Self::Bool(_) | Self::This(_) | Self::Class(_) => {}
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}.i32"),
            Self::Bool(v) => write!(f, "{}.bool", u8::from(*v)),
            Self::Var { name, ty } => write!(f, "{name}.{ty}"),
            Self::This(class) => write!(f, "this.{class}"),
            Self::Class(class) => f.write_str(class),
            Self::ArrayElement { array, index, ty } => write!(f, "{array}[{index}].{ty}"),
        }
    }
}
