//! Liveness analysis over lowered methods.
//!
//! A variable is live at a point if some path from that point reaches a use of the variable
//! without passing through a definition of it. Liveness is computed per instruction with the
//! usual backward dataflow equations, iterated with a worklist until nothing changes:
//!
//! ```text
//! out[i] = ∪ in[s] for every successor s of i
//! in[i]  = use[i] ∪ (out[i] − def[i])
//! ```

use crate::{
    CodegenError,
    ir::{InstId, Instruction, Method, VarId},
};
use jmmc_data_structures::index::IndexVec;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// A dense bitset of variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveSet {
    bits: Vec<u64>,
}

impl LiveSet {
    /// Creates an empty set sized for `n` variables.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self { bits: vec![0; n.div_ceil(64)] }
    }

    #[must_use]
    pub fn contains(&self, var: VarId) -> bool {
        let (word, mask) = Self::slot(var);
        self.bits.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Adds `var`, returning `true` if it was not already present.
    pub fn insert(&mut self, var: VarId) -> bool {
        let (word, mask) = Self::slot(var);
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let absent = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        absent
    }

    pub fn remove(&mut self, var: VarId) {
        let (word, mask) = Self::slot(var);
        if let Some(w) = self.bits.get_mut(word) {
            *w &= !mask;
        }
    }

    /// Unions `other` into `self`, returning `true` if `self` changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if self.bits.len() < other.bits.len() {
            self.bits.resize(other.bits.len(), 0);
        }
        let mut changed = false;
        for (dst, &src) in self.bits.iter_mut().zip(&other.bits) {
            changed |= *dst | src != *dst;
            *dst |= src;
        }
        changed
    }

    /// Returns `true` if every variable of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits
            .iter()
            .enumerate()
            .all(|(i, &w)| w & !other.bits.get(i).copied().unwrap_or(0) == 0)
    }

    /// Iterates over the variables in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        self.bits.iter().enumerate().flat_map(|(word, &bits)| {
            (0..64)
                .filter(move |bit| bits & (1 << bit) != 0)
                .map(move |bit| VarId::from_usize(word * 64 + bit))
        })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    fn slot(var: VarId) -> (usize, u64) {
        let idx = var.index();
        (idx / 64, 1 << (idx % 64))
    }
}

/// Liveness results for one method.
#[derive(Debug)]
pub struct Liveness {
    defs: IndexVec<InstId, Option<VarId>>,
    uses: IndexVec<InstId, LiveSet>,
    succs: IndexVec<InstId, SmallVec<[InstId; 2]>>,
    live_in: IndexVec<InstId, LiveSet>,
    live_out: IndexVec<InstId, LiveSet>,
}

impl Liveness {
    /// Computes liveness for `method`.
    ///
    /// Fails if a jump names a label that is not defined in the method.
    #[instrument(name = "liveness", level = "debug", skip_all, fields(method = %method.name))]
    pub fn compute(method: &Method) -> Result<Self, CodegenError> {
        let n_vars = method.var_table.len();
        let n_insts = method.insts.len();
        let empty = LiveSet::with_capacity(n_vars);

        let mut defs = IndexVec::with_capacity(n_insts);
        let mut uses = IndexVec::with_capacity(n_insts);
        let mut succs = IndexVec::with_capacity(n_insts);
        for (id, inst) in method.insts.iter_enumerated() {
            defs.push(inst.def().and_then(|name| method.var_table.id(name)));
            let mut used = empty.clone();
            inst.for_each_use(&mut |name, _| {
                if let Some(var) = method.var_table.id(name) {
                    used.insert(var);
                }
            });
            uses.push(used);
            succs.push(successors(method, id, inst)?);
        }

        let mut preds: IndexVec<InstId, SmallVec<[InstId; 2]>> =
            IndexVec::from_vec(vec![SmallVec::new(); n_insts]);
        for (id, targets) in succs.iter_enumerated() {
            for &succ in targets {
                preds[succ].push(id);
            }
        }

        let mut live_in = IndexVec::from_vec(vec![empty.clone(); n_insts]);
        let mut live_out = IndexVec::from_vec(vec![empty; n_insts]);
        let mut worklist: VecDeque<InstId> = method.insts.indices().rev().collect();
        let mut queued = vec![true; n_insts];
        let mut iterations = 0usize;
        while let Some(id) = worklist.pop_front() {
            queued[id.index()] = false;
            iterations += 1;

            let mut out = LiveSet::with_capacity(n_vars);
            for &succ in &succs[id] {
                out.union_with(&live_in[succ]);
            }
            let mut in_ = out.clone();
            if let Some(def) = defs[id] {
                in_.remove(def);
            }
            in_.union_with(&uses[id]);
            live_out[id] = out;

            if in_ != live_in[id] {
                live_in[id] = in_;
                for &pred in &preds[id] {
                    if !std::mem::replace(&mut queued[pred.index()], true) {
                        worklist.push_back(pred);
                    }
                }
            }
        }
        trace!(iterations, "liveness converged");

        Ok(Self { defs, uses, succs, live_in, live_out })
    }

    /// Variables live on entry to `inst`.
    #[must_use]
    pub fn live_in(&self, inst: InstId) -> &LiveSet {
        &self.live_in[inst]
    }

    /// Variables live on exit from `inst`.
    #[must_use]
    pub fn live_out(&self, inst: InstId) -> &LiveSet {
        &self.live_out[inst]
    }

    /// The variable `inst` defines, if any.
    #[must_use]
    pub fn def(&self, inst: InstId) -> Option<VarId> {
        self.defs[inst]
    }

    /// The variables `inst` reads.
    #[must_use]
    pub fn uses(&self, inst: InstId) -> &LiveSet {
        &self.uses[inst]
    }

    #[must_use]
    pub fn successors(&self, inst: InstId) -> &[InstId] {
        &self.succs[inst]
    }

    /// Iterates over the analysed instructions.
    pub fn insts(&self) -> impl Iterator<Item = InstId> + '_ {
        self.defs.indices()
    }
}

/// Control-flow successors of `inst`: the jump target, plus the next instruction unless control
/// never falls through.
fn successors(
    method: &Method,
    id: InstId,
    inst: &Instruction,
) -> Result<SmallVec<[InstId; 2]>, CodegenError> {
    let mut succs = SmallVec::new();
    if !inst.is_terminator() && id.index() + 1 < method.insts.len() {
        succs.push(InstId::from_usize(id.index() + 1));
    }
    if let Some(label) = inst.jump_target() {
        let target = method
            .target(label)
            .ok_or_else(|| CodegenError::UndefinedLabel { label, method: method.name.clone() })?;
        if !succs.contains(&target) {
            succs.push(target);
        }
    }
    Ok(succs)
}
