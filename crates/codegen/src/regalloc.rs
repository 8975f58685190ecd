//! Register allocation.
//!
//! Locals and temporaries are mapped onto as few JVM slots as possible by coloring their
//! interference graph. The receiver and the parameters keep the slots the calling convention
//! gives them; colors are offset past them.

use crate::{
    CodegenError,
    analysis::{InterferenceGraph, Liveness, lowest_free},
    ir::{ClassUnit, Method, VarId, VarScope},
};
use jmmc_config::{RegisterAllocation, Stage};
use jmmc_data_structures::map::FxIndexMap;
use jmmc_interface::{diagnostics::DiagCtxt, pluralize};

/// The outcome of allocating one method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationReport {
    pub method: String,
    /// Number of local registers the coloring needs.
    pub colors: u32,
    /// The cap in effect, if any.
    pub budget: Option<u32>,
    /// Whether the variable table was renumbered.
    pub applied: bool,
}

/// Allocates registers for every method of a unit according to a [`RegisterAllocation`] mode.
pub struct RegisterAllocator<'a> {
    dcx: &'a DiagCtxt,
    mode: RegisterAllocation,
}

impl<'a> RegisterAllocator<'a> {
    pub fn new(dcx: &'a DiagCtxt, mode: RegisterAllocation) -> Self {
        Self { dcx, mode }
    }

    /// Allocates every method of `unit`. Does nothing when allocation is disabled.
    ///
    /// A method that does not fit in the budget is reported and keeps its numbering; the other
    /// methods are still allocated.
    #[instrument(name = "regalloc", level = "debug", skip_all, fields(mode = %self.mode))]
    pub fn run(&self, unit: &mut ClassUnit) -> Result<Vec<AllocationReport>, CodegenError> {
        if !self.mode.is_enabled() {
            return Ok(Vec::new());
        }
        unit.methods.iter_mut().map(|method| self.allocate(method)).collect()
    }

    /// Allocates one method.
    pub fn allocate(&self, method: &mut Method) -> Result<AllocationReport, CodegenError> {
        let liveness = Liveness::compute(method)?;
        let mut graph = InterferenceGraph::build(method, &liveness);
        let budget = self.mode.budget();
        graph.color(budget);

        let mut colors: FxIndexMap<VarId, u32> =
            graph.nodes().filter_map(|var| Some((var, graph.color_of(var)?))).collect();

        // Locals that are never live after any instruction: dead definitions.
        let dead: Vec<VarId> = method
            .var_table
            .iter()
            .filter(|&(id, _, desc)| desc.scope == VarScope::Local && !colors.contains_key(&id))
            .map(|(id, ..)| id)
            .collect();
        for var in dead {
            let taken: Vec<u32> = liveness
                .insts()
                .filter(|&inst| liveness.def(inst) == Some(var))
                .flat_map(|inst| liveness.live_out(inst).iter())
                .filter_map(|live| colors.get(&live).copied())
                .collect();
            colors.insert(var, lowest_free(taken));
        }

        let used = colors.values().max().map_or(0, |&c| c + 1);
        let mut report =
            AllocationReport { method: method.name.clone(), colors: used, budget, applied: false };

        if let Some(k) = budget
            && used > k
        {
            self.dcx
                .err(format!(
                    "method `{}` needs {used} register{} but only {k} {} available",
                    method.name,
                    pluralize!(used),
                    pluralize!("is", k),
                ))
                .stage(Stage::Allocation)
                .note("no variables were renumbered")
                .emit();
            return Ok(report);
        }

        let offset = method.first_local_reg();
        for (&var, &color) in &colors {
            method.var_table.set_reg(var, offset + color);
        }
        report.applied = true;
        debug!(method = %method.name, colors = used, vars = colors.len(), "allocated registers");

        if budget.is_none() {
            let msg = format!(
                "method `{}` uses {used} local register{}",
                method.name,
                pluralize!(used)
            );
            self.dcx.note(msg).stage(Stage::Allocation).emit();
        }
        Ok(report)
    }
}
