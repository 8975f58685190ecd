/// The closed set of node kinds.
///
/// The string form of each variant is the `kind` tag used by the JSON tree form.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::Display,
    strum::EnumIter,
)]
pub enum NodeKind {
    Program,
    /// `import a.b.C;`, attribute `name` holds the dotted path.
    ImportDecl,
    /// Attributes `name` and optional `superName`.
    ClassDecl,
    /// Field or local declaration, attribute `name`, child: `Type`.
    VarDecl,
    /// Attributes `name`, `isPublic`, `isStatic`.
    /// Children: return `Type`, `Param`s, `VarDecl`s, statements.
    MethodDecl,
    /// Attribute `name`, child: `Type`.
    Param,
    /// Attributes `name`, `isArray`, `isVararg`.
    Type,

    BlockStmt,
    /// Children: condition, then, optional else.
    IfStmt,
    /// Children: condition, body.
    WhileStmt,
    ExprStmt,
    /// `name = rhs;`
    AssignStmt,
    /// `name[index] = rhs;`
    ArrayAssignStmt,
    /// Optional child: returned expression.
    ReturnStmt,

    IntLiteral,
    BoolLiteral,
    VarRef,
    This,
    ParenExpr,
    /// Integer arithmetic: `+ - * /`.
    BinaryExpr,
    /// Integer comparison: `< > <= >= == !=`.
    ComparisonExpr,
    /// Boolean connective: `&& ||`.
    BooleanExpr,
    /// `!`
    UnaryExpr,
    /// `new C()`
    NewObject,
    /// `new int[size]`
    NewArray,
    /// `[a, b, c]`
    ArrayInit,
    ArrayAccess,
    ArrayLength,
    /// Children: receiver, arguments.
    MethodCall,
    /// Child: receiver.
    FieldAccess,
}

impl NodeKind {
    /// Returns the string form of the kind.
    pub fn to_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for statement kinds.
    pub fn is_stmt(self) -> bool {
        matches!(
            self,
            Self::BlockStmt
                | Self::IfStmt
                | Self::WhileStmt
                | Self::ExprStmt
                | Self::AssignStmt
                | Self::ArrayAssignStmt
                | Self::ReturnStmt
        )
    }

    /// Returns `true` for expression kinds.
    pub fn is_expr(self) -> bool {
        matches!(
            self,
            Self::IntLiteral
                | Self::BoolLiteral
                | Self::VarRef
                | Self::This
                | Self::ParenExpr
                | Self::BinaryExpr
                | Self::ComparisonExpr
                | Self::BooleanExpr
                | Self::UnaryExpr
                | Self::NewObject
                | Self::NewArray
                | Self::ArrayInit
                | Self::ArrayAccess
                | Self::ArrayLength
                | Self::MethodCall
                | Self::FieldAccess
        )
    }

    /// Returns `true` for literal kinds.
    pub fn is_literal(self) -> bool {
        matches!(self, Self::IntLiteral | Self::BoolLiteral)
    }

    /// Returns `true` if nodes of this kind hold an ordered statement list.
    pub fn is_stmt_list(self) -> bool {
        matches!(self, Self::BlockStmt | Self::MethodDecl)
    }

    /// Attributes every node of this kind must carry.
    pub(crate) fn required_attrs(self) -> &'static [&'static str] {
        match self {
            Self::ImportDecl
            | Self::ClassDecl
            | Self::VarDecl
            | Self::MethodDecl
            | Self::Param
            | Self::Type
            | Self::AssignStmt
            | Self::ArrayAssignStmt
            | Self::VarRef
            | Self::NewObject
            | Self::MethodCall
            | Self::FieldAccess => &["name"],
            Self::IntLiteral | Self::BoolLiteral => &["value"],
            Self::BinaryExpr | Self::ComparisonExpr | Self::BooleanExpr | Self::UnaryExpr => {
                &["op"]
            }
            _ => &[],
        }
    }

    /// The accepted child counts, as an inclusive range and its description.
    pub(crate) fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::IntLiteral
            | Self::BoolLiteral
            | Self::VarRef
            | Self::This
            | Self::NewObject
            | Self::ImportDecl
            | Self::Type => (0, 0, "0"),
            Self::VarDecl
            | Self::Param
            | Self::ParenExpr
            | Self::UnaryExpr
            | Self::NewArray
            | Self::ArrayLength
            | Self::FieldAccess
            | Self::ExprStmt
            | Self::AssignStmt => (1, 1, "1"),
            Self::ReturnStmt => (0, 1, "0 or 1"),
            Self::BinaryExpr
            | Self::ComparisonExpr
            | Self::BooleanExpr
            | Self::ArrayAccess
            | Self::WhileStmt
            | Self::ArrayAssignStmt => (2, 2, "2"),
            Self::IfStmt => (2, 3, "2 or 3"),
            Self::MethodCall | Self::MethodDecl => (1, usize::MAX, "at least 1"),
            Self::Program | Self::ClassDecl | Self::BlockStmt | Self::ArrayInit => {
                (0, usize::MAX, "any number of")
            }
        }
    }
}

macro_rules! op_enum {
    ($(#[$attr:meta])* $vis:vis enum $name:ident { $($(#[$var_attr:meta])* $var:ident = $s:literal),* $(,)? }) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr, strum::Display, strum::EnumIter)]
        $vis enum $name {
            $(
                $(#[$var_attr])*
                #[strum(serialize = $s)]
                $var
            ),*
        }

        impl $name {
            /// Returns the operator's source spelling.
            pub fn to_str(self) -> &'static str {
                self.into()
            }
        }
    };
}

op_enum! {
    /// Integer arithmetic operator.
    pub enum BinOpKind {
        Add = "+",
        Sub = "-",
        Mul = "*",
        Div = "/",
    }
}

op_enum! {
    /// Integer comparison operator.
    pub enum CmpOpKind {
        Lt = "<",
        Gt = ">",
        Le = "<=",
        Ge = ">=",
        Eq = "==",
        Ne = "!=",
    }
}

op_enum! {
    /// Short-circuit boolean operator.
    pub enum BoolOpKind {
        And = "&&",
        Or = "||",
    }
}

op_enum! {
    /// Unary operator.
    pub enum UnOpKind {
        Not = "!",
    }
}

impl BinOpKind {
    /// Evaluates the operator with 32-bit wrapping arithmetic.
    ///
    /// Returns `None` on division by zero.
    pub fn eval(self, lhs: i32, rhs: i32) -> Option<i32> {
        Some(match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::Mul => lhs.wrapping_mul(rhs),
            Self::Div if rhs == 0 => return None,
            Self::Div => lhs.wrapping_div(rhs),
        })
    }
}

impl CmpOpKind {
    /// Evaluates the comparison.
    pub fn eval(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

impl BoolOpKind {
    /// Evaluates the operator.
    pub fn eval(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Self::And => lhs && rhs,
            Self::Or => lhs || rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_arithmetic() {
        assert_eq!(BinOpKind::Add.eval(i32::MAX, 1), Some(i32::MIN));
        assert_eq!(BinOpKind::Mul.eval(3, 4), Some(12));
        assert_eq!(BinOpKind::Div.eval(7, 2), Some(3));
        assert_eq!(BinOpKind::Div.eval(-7, 2), Some(-3));
        assert_eq!(BinOpKind::Div.eval(i32::MIN, -1), Some(i32::MIN));
        assert_eq!(BinOpKind::Div.eval(1, 0), None);
    }

    #[test]
    fn operator_spellings() {
        assert_eq!("<=".parse::<CmpOpKind>().unwrap(), CmpOpKind::Le);
        assert_eq!(BoolOpKind::Or.to_str(), "||");
        assert!("%".parse::<BinOpKind>().is_err());
    }

    #[test]
    fn kind_classes() {
        assert!(NodeKind::AssignStmt.is_stmt());
        assert!(!NodeKind::AssignStmt.is_expr());
        assert!(NodeKind::MethodCall.is_expr());
        assert!(NodeKind::MethodDecl.is_stmt_list());
        assert_eq!("ArrayInit".parse::<NodeKind>().unwrap(), NodeKind::ArrayInit);
    }
}
