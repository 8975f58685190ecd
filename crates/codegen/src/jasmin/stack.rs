//! Operand stack height tracking.
//!
//! The JVM needs `.limit stack`, the largest number of values the operand stack ever holds in a
//! method. Instructions are fed to the model in emission order; jumps record the height they leave
//! at their target, so code that is only reachable through a jump starts from that height.

use crate::ir::Label;
use jmmc_data_structures::map::FxHashMap;

#[derive(Clone, Debug, Default)]
pub struct StackModel {
    depth: u32,
    max: u32,
    /// False after an unconditional transfer, until the next label.
    reachable: bool,
    /// Height on arrival at each label, as recorded by the jumps to it.
    at_label: FxHashMap<Label, u32>,
}

impl StackModel {
    #[must_use]
    pub fn new() -> Self {
        Self { reachable: true, ..Default::default() }
    }

    /// Current height.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Largest height seen so far.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Applies an instruction that pops `pops` values and then pushes `pushes`.
    pub fn apply(&mut self, pops: u32, pushes: u32) {
        debug_assert!(pops <= self.depth, "operand stack underflow: {pops} > {}", self.depth);
        self.depth = self.depth.saturating_sub(pops) + pushes;
        self.max = self.max.max(self.depth);
    }

    /// Records a jump to `target` taken at the current height.
    pub fn jump(&mut self, target: Label) {
        self.at_label.entry(target).or_insert(self.depth);
    }

    /// Marks the code after the current instruction as unreachable by fallthrough.
    pub fn terminate(&mut self) {
        self.reachable = false;
    }

    /// Enters `label`. Code reached only through jumps takes the height recorded by the first
    /// one; code also reached by fallthrough keeps the current height.
    pub fn enter(&mut self, label: Label) {
        if !self.reachable {
            self.depth = self.at_label.get(&label).copied().unwrap_or(0);
        } else {
            self.at_label.entry(label).or_insert(self.depth);
        }
        self.reachable = true;
    }

    /// Height recorded for `label`, if any jump or fallthrough reached it yet.
    #[must_use]
    pub fn height_at(&self, label: Label) -> Option<u32> {
        self.at_label.get(&label).copied()
    }
}
