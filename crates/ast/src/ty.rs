use crate::{Ast, AstError, NodeId, NodeKind, SymbolTable};
use std::{fmt, hash::Hash};

/// A jmm type: a base name plus array and vararg markers.
///
/// Equality and hashing only look at the base name and the array flag: `int...` and `int[]`
/// are the same type.
#[derive(Clone, Debug, Eq)]
pub struct Type {
    pub name: String,
    pub is_array: bool,
    pub is_vararg: bool,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.is_array == other.is_array
    }
}

impl Hash for Type {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.is_array.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.is_vararg {
            f.write_str("...")
        } else if self.is_array {
            f.write_str("[]")
        } else {
            Ok(())
        }
    }
}

impl Type {
    pub const INT: &'static str = "int";
    pub const BOOLEAN: &'static str = "boolean";
    pub const VOID: &'static str = "void";
    pub const STRING: &'static str = "String";

    /// Creates a non-array type.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_array: false, is_vararg: false }
    }

    /// Creates an array type.
    pub fn array(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_array: true, is_vararg: false }
    }

    pub fn int() -> Self {
        Self::new(Self::INT)
    }

    pub fn boolean() -> Self {
        Self::new(Self::BOOLEAN)
    }

    pub fn void() -> Self {
        Self::new(Self::VOID)
    }

    pub fn int_array() -> Self {
        Self::array(Self::INT)
    }

    /// Reads a `Type` node.
    pub fn from_node(ast: &Ast, id: NodeId) -> Result<Self, AstError> {
        debug_assert_eq!(ast.kind(id), NodeKind::Type);
        let is_vararg = ast.flag(id, "isVararg")?;
        Ok(Self {
            name: ast.name(id)?.to_string(),
            is_array: is_vararg || ast.flag(id, "isArray")?,
            is_vararg,
        })
    }

    pub fn is_int(&self) -> bool {
        !self.is_array && self.name == Self::INT
    }

    pub fn is_boolean(&self) -> bool {
        !self.is_array && self.name == Self::BOOLEAN
    }

    pub fn is_void(&self) -> bool {
        !self.is_array && self.name == Self::VOID
    }

    pub fn is_int_array(&self) -> bool {
        self.is_array && self.name == Self::INT
    }

    /// Returns `true` for `int` and `boolean`.
    pub fn is_primitive(&self) -> bool {
        self.is_int() || self.is_boolean()
    }

    /// Returns the element type of an array type.
    pub fn element(&self) -> Option<Self> {
        self.is_array.then(|| Self::new(self.name.clone()))
    }

    /// Returns `true` if a value of type `self` may be stored where `dst` is expected.
    ///
    /// This is the one place cross-class compatibility is decided:
    /// - identical types are compatible;
    /// - the declared class is compatible with its declared superclass;
    /// - any class type is compatible with, and from, an imported class, whose hierarchy is
    ///   unknown to this compilation unit.
    pub fn is_assignable_to(&self, dst: &Self, table: &SymbolTable) -> bool {
        if self == dst {
            return true;
        }
        if self.is_array || dst.is_array || self.is_primitive() || dst.is_primitive() {
            return false;
        }
        if self.name == table.class_name() && table.super_name() == Some(dst.name.as_str()) {
            return true;
        }
        table.is_imported(&self.name) || table.is_imported(&dst.name)
    }
}

/// A named, typed declaration: a field, parameter or local.
#[derive(Clone, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{ty} {name}")]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty }
    }

    /// Reads a `VarDecl` or `Param` node.
    pub fn from_node(ast: &Ast, id: NodeId) -> Result<Self, AstError> {
        let ty = Type::from_node(ast, ast.expect_child(id, 0)?)?;
        Ok(Self::new(ast.name(id)?, ty))
    }
}
