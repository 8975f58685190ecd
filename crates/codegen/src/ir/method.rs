use super::{InstId, Instruction, IrType, Label, VarId};
use jmmc_data_structures::{index::IndexVec, map::FxIndexMap};

/// Where a variable comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum VarScope {
    This,
    Parameter,
    /// Locals and temporaries. Only these are register-allocated.
    Local,
}

/// A [`VarTable`] entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub ty: IrType,
    pub scope: VarScope,
    /// JVM local variable slot.
    pub reg: u32,
}

/// Per-method map from variable name to type, scope and register, in numbering order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VarTable {
    vars: FxIndexMap<String, Descriptor>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers the variables of `method`: `this` first for instance methods, then the
    /// parameters, then every other variable in order of first appearance.
    pub fn build(method: &Method) -> Self {
        let mut table = Self::new();
        if !method.is_static {
            table.insert("this", IrType::Class(method.class.clone()), VarScope::This);
        }
        for (name, ty) in &method.params {
            table.insert(name, ty.clone(), VarScope::Parameter);
        }
        for inst in &method.insts {
            inst.for_each_var(&mut |name, ty| {
                table.insert(name, ty, VarScope::Local);
            });
        }
        table
    }

    /// Adds a variable with the next free register. Existing entries are kept.
    pub fn insert(&mut self, name: &str, ty: IrType, scope: VarScope) -> VarId {
        let next = self.next_reg();
        let entry = self.vars.entry(name.to_string());
        let index = entry.index();
        entry.or_insert(Descriptor { ty, scope, reg: next });
        VarId::from_usize(index)
    }

    fn next_reg(&self) -> u32 {
        self.max_reg().map_or(0, |reg| reg + 1)
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.vars.get(name)
    }

    pub fn id(&self, name: &str) -> Option<VarId> {
        self.vars.get_index_of(name).map(VarId::from_usize)
    }

    /// Returns the name and descriptor of `id`.
    pub fn var(&self, id: VarId) -> Option<(&str, &Descriptor)> {
        self.vars.get_index(id.index()).map(|(name, desc)| (name.as_str(), desc))
    }

    pub fn set_reg(&mut self, id: VarId, reg: u32) {
        if let Some((_, desc)) = self.vars.get_index_mut(id.index()) {
            desc.reg = reg;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &str, &Descriptor)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, (name, desc))| (VarId::from_usize(i), name.as_str(), desc))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Returns the highest register in use.
    pub fn max_reg(&self) -> Option<u32> {
        self.vars.values().map(|desc| desc.reg).max()
    }
}

/// A lowered method.
#[derive(Clone, Debug)]
pub struct Method {
    pub name: String,
    /// The enclosing class.
    pub class: String,
    pub is_public: bool,
    pub is_static: bool,
    pub params: Vec<(String, IrType)>,
    pub return_type: IrType,
    pub insts: IndexVec<InstId, Instruction>,
    /// Each label and the instruction it precedes.
    pub labels: FxIndexMap<Label, InstId>,
    pub var_table: VarTable,
}

impl Method {
    /// Returns the instruction `label` precedes.
    pub fn target(&self, label: Label) -> Option<InstId> {
        self.labels.get(&label).copied()
    }

    /// Returns the labels attached to `inst`, in definition order.
    pub fn labels_at(&self, inst: InstId) -> impl Iterator<Item = Label> + '_ {
        self.labels.iter().filter(move |&(_, &at)| at == inst).map(|(&label, _)| label)
    }

    /// Returns the register offset of the first allocatable variable.
    pub fn first_local_reg(&self) -> u32 {
        u32::from(!self.is_static) + self.params.len() as u32
    }
}
