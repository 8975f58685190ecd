use jmmc_ast::Type;
use std::fmt;

/// The type annotation carried by IR operands and instructions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Int,
    Bool,
    Void,
    String,
    Array(Box<IrType>),
    /// An object of the named class.
    Class(String),
}

impl IrType {
    /// Converts a declared jmm type.
    pub fn from_ast(ty: &Type) -> Self {
        let base = match ty.name.as_str() {
            Type::INT => Self::Int,
            Type::BOOLEAN => Self::Bool,
            Type::VOID => Self::Void,
            Type::STRING => Self::String,
            name => Self::Class(name.to_string()),
        };
        if ty.is_array { Self::Array(Box::new(base)) } else { base }
    }

    pub fn int_array() -> Self {
        Self::Array(Box::new(Self::Int))
    }

    /// Returns the element type of an array type.
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Returns `true` for types stored in reference slots.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::String | Self::Array(_) | Self::Class(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("i32"),
            Self::Bool => f.write_str("bool"),
            Self::Void => f.write_str("V"),
            Self::String => f.write_str("String"),
            Self::Array(elem) => write!(f, "array.{elem}"),
            Self::Class(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_declared_types() {
        assert_eq!(IrType::from_ast(&Type::int()), IrType::Int);
        assert_eq!(IrType::from_ast(&Type::array("String")).to_string(), "array.String");
        let vararg = Type { name: "int".into(), is_array: true, is_vararg: true };
        assert_eq!(IrType::from_ast(&vararg), IrType::int_array());
        assert_eq!(IrType::from_ast(&Type::new("Foo")), IrType::Class("Foo".into()));
        assert!(IrType::from_ast(&Type::new("Foo")).is_reference());
        assert!(!IrType::Bool.is_reference());
    }
}
