//! Interference graph and graph coloring.

use super::Liveness;
use crate::ir::{Method, VarId, VarScope};
use jmmc_data_structures::map::{FxHashMap, FxIndexMap, FxIndexSet};

/// Undirected interference graph over the allocatable variables of a method.
///
/// Nodes are the locals that appear in some live-out set; two nodes interfere if they are live
/// out of the same instruction, or if one is defined by an instruction the other is live out of.
#[derive(Clone, Debug, Default)]
pub struct InterferenceGraph {
    adj: FxIndexMap<VarId, FxIndexSet<VarId>>,
    colors: FxHashMap<VarId, u32>,
}

impl InterferenceGraph {
    /// Builds the graph from the live-out sets of `method`.
    pub fn build(method: &Method, liveness: &Liveness) -> Self {
        let allocatable = |var: &VarId| {
            method.var_table.var(*var).is_some_and(|(_, desc)| desc.scope == VarScope::Local)
        };
        let mut graph = Self::default();
        let mut live = Vec::new();
        for inst in liveness.insts() {
            live.clear();
            live.extend(liveness.live_out(inst).iter().filter(allocatable));
            for (i, &a) in live.iter().enumerate() {
                graph.add_node(a);
                for &b in &live[i + 1..] {
                    graph.add_edge(a, b);
                }
            }
        }
        // A definition that is dead at one point still overwrites its slot there.
        for inst in liveness.insts() {
            let Some(def) = liveness.def(inst).filter(|def| graph.contains(*def)) else { continue };
            for live in liveness.live_out(inst).iter().filter(allocatable) {
                graph.add_edge(def, live);
            }
        }
        graph
    }

    pub fn add_node(&mut self, var: VarId) {
        self.adj.entry(var).or_default();
    }

    /// Adds an edge, creating both nodes if needed. Self-edges are ignored.
    pub fn add_edge(&mut self, a: VarId, b: VarId) {
        if a == b {
            self.add_node(a);
            return;
        }
        self.adj.entry(a).or_default().insert(b);
        self.adj.entry(b).or_default().insert(a);
    }

    /// Iterates over the nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = VarId> + '_ {
        self.adj.keys().copied()
    }

    #[must_use]
    pub fn contains(&self, var: VarId) -> bool {
        self.adj.contains_key(&var)
    }

    pub fn neighbors(&self, var: VarId) -> impl Iterator<Item = VarId> + '_ {
        self.adj.get(&var).into_iter().flatten().copied()
    }

    #[must_use]
    pub fn interferes(&self, a: VarId, b: VarId) -> bool {
        self.adj.get(&a).is_some_and(|n| n.contains(&b))
    }

    #[must_use]
    pub fn degree(&self, var: VarId) -> usize {
        self.adj.get(&var).map_or(0, FxIndexSet::len)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adj.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Returns the color assigned to `var` by [`color`](Self::color).
    #[must_use]
    pub fn color_of(&self, var: VarId) -> Option<u32> {
        self.colors.get(&var).copied()
    }

    /// Colors the graph by simplification and selection, returning the number of colors used.
    ///
    /// Nodes with fewer than `k` neighbors left are removed first; when none remains, the node
    /// with the most neighbors is removed anyway and may still find a color. Nodes are then
    /// colored in reverse removal order with the lowest color no colored neighbor holds. Without
    /// `k`, any node can be removed and the result only depends on the removal order.
    ///
    /// The coloring is always proper. It may use more than `k` colors; the caller decides what to
    /// do about that.
    pub fn color(&mut self, k: Option<u32>) -> u32 {
        let k = k.map_or(usize::MAX, |k| k as usize);
        let mut degree: FxIndexMap<VarId, usize> =
            self.adj.iter().map(|(&var, n)| (var, n.len())).collect();
        let mut stack = Vec::with_capacity(self.adj.len());

        while !degree.is_empty() {
            let next = degree
                .iter()
                .find(|&(_, &d)| d < k)
                .or_else(|| degree.iter().max_by_key(|&(_, &d)| d))
                .map(|(&var, _)| var);
            let Some(var) = next else { break };
            if degree[&var] >= k {
                trace!(?var, "optimistically pushing high-degree node");
            }
            degree.shift_remove(&var);
            for n in &self.adj[&var] {
                if let Some(d) = degree.get_mut(n) {
                    *d -= 1;
                }
            }
            stack.push(var);
        }

        self.colors.clear();
        while let Some(var) = stack.pop() {
            let taken = self.neighbors(var).filter_map(|n| self.colors.get(&n).copied());
            let color = lowest_free(taken);
            self.colors.insert(var, color);
        }
        self.colors_used()
    }

    /// Returns one more than the highest assigned color.
    #[must_use]
    pub fn colors_used(&self) -> u32 {
        self.colors.values().max().map_or(0, |&c| c + 1)
    }

    /// Returns `true` if every node is colored and no edge joins two equal colors.
    #[must_use]
    pub fn is_properly_colored(&self) -> bool {
        self.adj.iter().all(|(var, neighbors)| {
            self.colors.get(var).is_some_and(|c| {
                neighbors.iter().all(|n| self.colors.get(n) != Some(c))
            })
        })
    }
}

/// Returns the lowest color not in `taken`.
pub(crate) fn lowest_free(taken: impl IntoIterator<Item = u32>) -> u32 {
    let taken: FxIndexSet<u32> = taken.into_iter().collect();
    (0..).find(|c| !taken.contains(c)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VarId {
        VarId::from_usize(i)
    }

    /// A 4-cycle plus a chord: 0-1, 1-2, 2-3, 3-0, 0-2.
    fn diamond() -> InterferenceGraph {
        let mut g = InterferenceGraph::default();
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)] {
            g.add_edge(v(a), v(b));
        }
        g
    }

    #[test]
    fn test_edges_are_symmetric() {
        let g = diamond();
        assert_eq!(g.len(), 4);
        assert!(g.interferes(v(1), v(0)));
        assert!(g.interferes(v(0), v(1)));
        assert!(!g.interferes(v(1), v(3)));
        assert_eq!(g.degree(v(0)), 3);
        assert_eq!(g.degree(v(9)), 0);
    }

    #[test]
    fn test_three_colors_suffice() {
        let mut g = diamond();
        assert_eq!(g.color(Some(3)), 3);
        assert!(g.is_properly_colored());
        assert_eq!(g.color_of(v(1)), g.color_of(v(3)));
    }

    #[test]
    fn test_budget_too_small_still_proper() {
        let mut g = diamond();
        let used = g.color(Some(2));
        assert!(used > 2);
        assert!(g.is_properly_colored());
    }

    #[test]
    fn test_unbounded() {
        let mut g = diamond();
        g.add_node(v(7));
        assert_eq!(g.color(None), 3);
        assert_eq!(g.color_of(v(7)), Some(0));
        assert!(g.is_properly_colored());
    }

    #[test]
    fn test_lowest_free() {
        assert_eq!(lowest_free([]), 0);
        assert_eq!(lowest_free([0, 2, 1, 4]), 3);
    }
}
