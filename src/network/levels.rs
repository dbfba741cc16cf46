use std::collections::{HashMap, HashSet, VecDeque};

use super::trim::TrimGraph;

/// Vertical placement of the shown classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelAssignment {
    min_levels: HashMap<String, i64>,
    max_levels: HashMap<String, i64>,
    levels: HashMap<String, usize>,
    ceiling: i64,
}

impl LevelAssignment {
    pub fn level(&self, id: &str) -> Option<usize> {
        self.levels.get(id).copied()
    }

    /// Longest chain of shown classes below `id`.
    pub fn min_level(&self, id: &str) -> Option<i64> {
        self.min_levels.get(id).copied()
    }

    /// Lowest level `id` can sit at without crowding anything above it.
    pub fn max_level(&self, id: &str) -> Option<i64> {
        self.max_levels.get(id).copied()
    }

    pub fn ceiling(&self) -> i64 {
        self.ceiling
    }

    pub fn highest_level(&self) -> usize {
        self.levels.values().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Places every node halfway between the lowest and highest level its edges allow. The highest
/// level on offer is one less than the number of nodes that received a lower bound.
///
/// Propagation never pushes a level past the node count, which keeps it finite even if the
/// trimmed graph carries a cycle.
pub fn assign_levels(graph: &TrimGraph, nodes: &[String]) -> LevelAssignment {
    if nodes.is_empty() {
        return LevelAssignment::default();
    }

    let shown = nodes.iter().map(String::as_str).collect::<HashSet<_>>();
    let bound = nodes.len() as i64;

    let leaves = nodes
        .iter()
        .filter(|id| !graph.trim_contains(id).iter().any(|below| shown.contains(below.as_str())))
        .map(|id| (id.clone(), 0));
    let min_levels = relax(leaves, bound, |id| graph.trim_within(id).iter(), &shown, 1);

    let ceiling = min_levels.len().saturating_sub(1) as i64;

    let tops = nodes
        .iter()
        .filter(|id| !graph.trim_within(id).iter().any(|above| shown.contains(above.as_str())))
        .map(|id| (id.clone(), ceiling));
    let max_levels = relax(tops, bound, |id| graph.trim_contains(id).iter(), &shown, -1);

    let levels = nodes
        .iter()
        .map(|id| {
            let min = min_levels.get(id).copied().unwrap_or(0);
            let max = max_levels.get(id).copied().unwrap_or(0);
            let level = (min + max + 1).div_euclid(2).max(0) as usize;
            (id.clone(), level)
        })
        .collect();

    LevelAssignment {
        min_levels,
        max_levels,
        levels,
        ceiling,
    }
}

/// Breadth-first longest-path relaxation from `seeds`, stepping by `delta` along `next`.
fn relax<'a, I>(
    seeds: impl Iterator<Item = (String, i64)>,
    bound: i64,
    next: impl Fn(&str) -> I,
    shown: &HashSet<&str>,
    delta: i64,
) -> HashMap<String, i64>
where
    I: Iterator<Item = &'a String>,
{
    let mut levels = HashMap::new();
    let mut queue = VecDeque::new();
    for (id, level) in seeds {
        levels.insert(id.clone(), level);
        queue.push_back(id);
    }

    let origin = levels.values().copied().next().unwrap_or(0);
    while let Some(current) = queue.pop_front() {
        let level = levels.get(&current).copied().unwrap_or(origin);
        let candidate = level + delta;
        if (candidate - origin).abs() > bound {
            continue;
        }

        for neighbor in next(&current) {
            if !shown.contains(neighbor.as_str()) {
                continue;
            }
            let improves = levels
                .get(neighbor)
                .is_none_or(|&existing| (candidate - existing) * delta > 0);
            if improves {
                levels.insert(neighbor.clone(), candidate);
                queue.push_back(neighbor.clone());
            }
        }
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn graph(edges: &[(&str, &str)]) -> TrimGraph {
        let mut graph = TrimGraph::default();
        for (smaller, larger) in edges {
            graph.link(smaller, larger);
        }
        graph
    }

    #[test]
    fn chain_levels_count_upwards() {
        let graph = graph(&[("P", "NP"), ("NP", "PSPACE")]);
        let levels = assign_levels(&graph, &ids(&["P", "NP", "PSPACE"]));

        assert_eq!(levels.level("P"), Some(0));
        assert_eq!(levels.level("NP"), Some(1));
        assert_eq!(levels.level("PSPACE"), Some(2));
        assert_eq!(levels.ceiling(), 2);
        assert_eq!(levels.highest_level(), 2);
    }

    #[test]
    fn short_branch_floats_between_bounds() {
        // A ⊂ B ⊂ C ⊂ D and A ⊂ X ⊂ D: five leveled nodes put the ceiling at 4.
        let graph = graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("A", "X"), ("X", "D")]);
        let levels = assign_levels(&graph, &ids(&["A", "B", "C", "D", "X"]));

        assert_eq!(levels.ceiling(), 4);
        assert_eq!(levels.min_level("X"), Some(1));
        assert_eq!(levels.max_level("X"), Some(3));
        assert_eq!(levels.level("A"), Some(1));
        assert_eq!(levels.level("X"), Some(2));
        assert_eq!(levels.level("D"), Some(4));
        for (smaller, larger) in [("A", "B"), ("B", "C"), ("C", "D"), ("A", "X"), ("X", "D")] {
            assert!(levels.min_level(larger) > levels.min_level(smaller));
            assert!(levels.level(larger) > levels.level(smaller));
        }
    }

    #[test]
    fn shared_parent_lifts_its_children() {
        let graph = graph(&[("A", "C"), ("B", "C")]);
        let levels = assign_levels(&graph, &ids(&["A", "B", "C"]));

        assert_eq!(levels.ceiling(), 2);
        assert_eq!(levels.level("A"), Some(1));
        assert_eq!(levels.level("B"), Some(1));
        assert_eq!(levels.level("C"), Some(2));
        assert_eq!(levels.highest_level(), 2);
    }

    #[test]
    fn isolated_nodes_share_one_row() {
        let graph = TrimGraph::default();
        let levels = assign_levels(&graph, &ids(&["A", "B"]));
        assert_eq!(levels.ceiling(), 1);
        assert_eq!(levels.level("A"), Some(1));
        assert_eq!(levels.level("B"), Some(1));
    }

    #[test]
    fn cycle_terminates() {
        let graph = graph(&[("A", "B"), ("B", "A")]);
        let levels = assign_levels(&graph, &ids(&["A", "B"]));
        assert!(levels.level("A").is_some());
        assert!(levels.level("B").is_some());
    }

    #[test]
    fn empty_input_is_empty() {
        let levels = assign_levels(&TrimGraph::default(), &[]);
        assert!(levels.is_empty());
        assert_eq!(levels.highest_level(), 0);
    }
}
