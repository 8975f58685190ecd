//! Three-address intermediate representation.
//!
//! Each method is a flat list of [`Instruction`]s. Control flow goes through [`Label`]s, which
//! attach to the instruction that follows them. Operands are never nested calls: every
//! intermediate result is stored in a temporary first.

use jmmc_data_structures::newtype_index;

mod types;
pub use types::IrType;

mod operand;
pub use operand::Operand;

mod inst;
pub use inst::{BinOp, Call, CallKind, Condition, Instruction, Label, LabelKind, UnOp};

mod method;
pub use method::{Descriptor, Method, VarScope, VarTable};

mod class;
pub use class::{Access, ClassUnit, Field};

mod builder;
pub use builder::IrBuilder;

mod display;

newtype_index! {
    /// Position of an instruction in its method.
    pub struct InstId;
}

newtype_index! {
    /// Position of a variable in its method's [`VarTable`].
    pub struct VarId;
}
