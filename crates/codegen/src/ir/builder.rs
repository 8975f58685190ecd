//! Method builder.

use super::{Condition, InstId, Instruction, IrType, Label, Method, Operand, VarTable};
use crate::CodegenError;
use jmmc_data_structures::{index::IndexVec, map::FxIndexMap};
use smallvec::SmallVec;

/// A builder for lowered methods.
///
/// Labels defined with [`label`](Self::label) attach to the next emitted instruction.
pub struct IrBuilder {
    /// The method being built.
    method: Method,
    /// Labels waiting for an instruction.
    pending: SmallVec<[Label; 2]>,
}

impl IrBuilder {
    /// Creates a builder for an instance method of `class`.
    pub fn new(class: &str, name: &str, return_type: IrType) -> Self {
        Self {
            method: Method {
                name: name.to_string(),
                class: class.to_string(),
                is_public: false,
                is_static: false,
                params: Vec::new(),
                return_type,
                insts: IndexVec::new(),
                labels: FxIndexMap::default(),
                var_table: VarTable::new(),
            },
            pending: SmallVec::new(),
        }
    }

    pub fn public(&mut self) -> &mut Self {
        self.method.is_public = true;
        self
    }

    pub fn static_(&mut self) -> &mut Self {
        self.method.is_static = true;
        self
    }

    /// Appends a formal parameter.
    pub fn param(&mut self, name: &str, ty: IrType) -> &mut Self {
        self.method.params.push((name.to_string(), ty));
        self
    }

    /// Returns the method being built.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Appends an instruction, attaching any pending labels to it.
    pub fn emit(&mut self, inst: Instruction) -> InstId {
        let id = self.method.insts.push(inst);
        for label in self.pending.drain(..) {
            self.method.labels.insert(label, id);
        }
        id
    }

    /// Defines `label` at the next instruction.
    pub fn label(&mut self, label: Label) {
        self.pending.push(label);
    }

    /// Emits `dest := rhs`, typed by the destination.
    pub fn assign(&mut self, dest: Operand, rhs: Instruction) -> InstId {
        let ty = dest.ty();
        self.emit(Instruction::Assign { dest, ty, rhs: Box::new(rhs) })
    }

    pub fn branch(&mut self, cond: Condition, target: Label) -> InstId {
        self.emit(Instruction::Branch { cond, target })
    }

    pub fn goto(&mut self, target: Label) -> InstId {
        self.emit(Instruction::Goto(target))
    }

    pub fn ret(&mut self, value: Option<Operand>) -> InstId {
        self.emit(Instruction::Return(value))
    }

    /// Returns `true` if control can reach the next emitted instruction.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        !self.pending.is_empty()
            || !self.method.insts.last().is_some_and(Instruction::is_terminator)
    }

    /// Finishes the method and numbers its variables.
    ///
    /// Void methods that can fall off the end get a trailing `ret.V`.
    pub fn finish(mut self) -> Result<Method, CodegenError> {
        if self.falls_through() && self.method.return_type.is_void() {
            self.ret(None);
        }
        if let Some(&label) = self.pending.first() {
            return Err(CodegenError::DanglingLabel { label, method: self.method.name });
        }

        self.method.var_table = VarTable::build(&self.method);
        debug!(
            method = %self.method.name,
            insts = self.method.insts.len(),
            vars = self.method.var_table.len(),
            "lowered method"
        );
        Ok(self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::LabelKind;

    #[test]
    fn labels_attach_to_next_instruction() {
        let mut b = IrBuilder::new("A", "f", IrType::Void);
        let top = Label::new(LabelKind::WhileCond, 0);
        let end = Label::new(LabelKind::WhileEnd, 0);
        b.label(top);
        b.branch(Condition::Operand(Operand::Bool(false)), end);
        b.goto(top);
        b.label(end);
        let method = b.finish().unwrap();

        assert_eq!(method.insts.len(), 3);
        assert_eq!(method.target(top), Some(InstId::new(0)));
        assert_eq!(method.target(end), Some(InstId::new(2)));
        assert_eq!(method.insts[InstId::new(2)], Instruction::Return(None));
    }

    #[test]
    fn dangling_label_in_non_void_method() {
        let mut b = IrBuilder::new("A", "f", IrType::Int);
        b.ret(Some(Operand::Int(1)));
        b.label(Label::new(LabelKind::EndIf, 4));
        let err = b.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "label `endif4` in method `f` is not followed by an instruction"
        );
    }

    #[test]
    fn no_duplicate_return() {
        let mut b = IrBuilder::new("A", "f", IrType::Void);
        b.ret(None);
        assert_eq!(b.finish().unwrap().insts.len(), 1);
    }
}
