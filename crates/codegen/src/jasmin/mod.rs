//! Jasmin assembly output.
//!
//! Each IR instruction is translated on its own, with operands loaded from their registers and
//! results stored back. The operand stack height is simulated along the way to compute
//! `.limit stack`.

mod assembler;
pub use assembler::{Assembler, FieldOp, InvokeKind, JasminInst, JumpKind, Opcode, SlotKind};

pub mod descriptor;

mod method;
use method::{MethodCode, MethodEmitter};

mod stack;
pub use stack::StackModel;

use crate::{
    CodegenError,
    ir::{ClassUnit, IrType, Method},
};
use descriptor::{method_descriptor, super_path, type_descriptor};
use std::fmt;

/// Indentation of instructions inside a method.
const INDENT: &str = "   ";

/// Renders a lowered class as Jasmin assembly.
pub struct JasminEmitter<'a> {
    unit: &'a ClassUnit,
}

impl<'a> JasminEmitter<'a> {
    pub fn new(unit: &'a ClassUnit) -> Self {
        Self { unit }
    }

    /// Emits the whole class.
    #[instrument(name = "jasmin", level = "debug", skip_all, fields(class = %self.unit.name))]
    pub fn emit(&self) -> Result<String, CodegenError> {
        let mut methods = Vec::with_capacity(self.unit.methods.len());
        for method in &self.unit.methods {
            let code = MethodEmitter::new(self.unit, method).emit()?;
            trace!(
                method = %method.name,
                stack = code.max_stack,
                locals = code.max_locals,
                "emitted"
            );
            methods.push((method, code));
        }
        Ok(ClassText { unit: self.unit, methods }.to_string())
    }
}

/// A class whose methods have been translated, ready to print.
struct ClassText<'a> {
    unit: &'a ClassUnit,
    methods: Vec<(&'a Method, MethodCode)>,
}

impl ClassText<'_> {
    fn fmt_method(
        &self,
        f: &mut fmt::Formatter<'_>,
        method: &Method,
        code: &MethodCode,
    ) -> fmt::Result {
        f.write_str(".method ")?;
        if method.is_public {
            f.write_str("public ")?;
        }
        if method.is_static {
            f.write_str("static ")?;
        }
        let params: Vec<&IrType> = method.params.iter().map(|(_, ty)| ty).collect();
        let descriptor = method_descriptor(self.unit, params, &method.return_type);
        writeln!(f, "{}{descriptor}", method.name)?;
        writeln!(f, "{INDENT}.limit stack {}", code.max_stack)?;
        writeln!(f, "{INDENT}.limit locals {}", code.max_locals)?;
        for inst in &code.insts {
            match inst {
                JasminInst::Label(_) => writeln!(f, "{inst}")?,
                _ => writeln!(f, "{INDENT}{inst}")?,
            }
        }
        f.write_str(".end method\n")
    }
}

impl fmt::Display for ClassText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit;
        writeln!(f, ".class public {}", unit.name)?;
        writeln!(f, ".super {}", super_path(unit))?;
        if !unit.fields.is_empty() {
            f.write_str("\n")?;
        }
        for field in &unit.fields {
            write!(f, ".field {}", field.access)?;
            if field.is_static {
                f.write_str(" static")?;
            }
            if field.is_final {
                f.write_str(" final")?;
            }
            writeln!(f, " '{}' {}", field.name, type_descriptor(unit, &field.ty))?;
        }

        f.write_str("\n.method public <init>()V\n")?;
        writeln!(f, "{INDENT}aload_0")?;
        writeln!(f, "{INDENT}invokespecial {}/<init>()V", super_path(unit))?;
        writeln!(f, "{INDENT}return")?;
        f.write_str(".end method\n")?;

        for (method, code) in &self.methods {
            f.write_str("\n")?;
            self.fmt_method(f, method, code)?;
        }
        Ok(())
    }
}
