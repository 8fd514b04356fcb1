// Copyright 2025 Cowboy AI, LLC.

//! Hierarchy engine - parent/child relations over canonical codes
//!
//! A parent does not have one list of children. It has any number of
//! alternative child-sets, each of which is one valid way to decompose the
//! parent. The relation is therefore a multimap from parent code to a list
//! of sets, and a category may appear under several parents.
//!
//! ```mermaid
//! graph TD
//!     0 -->|set 1| 1
//!     0 -->|set 1| 2
//!     0 -->|set 2| M.AG
//!     0 -->|set 2| M.0.EL
//!     M.0.EL --> 1
//! ```

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CategorizationError, CategorizationResult};

/// One alternative decomposition of a parent, as canonical codes
pub type ChildSet = BTreeSet<String>;

/// Hierarchy input as supplied by a loader.
///
/// Codes may use any spelling known to the categorization; they are resolved
/// to canonical codes when the categorization is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HierarchyDef {
    /// Parent code with one child-set each; repeat a parent for alternatives
    #[serde(default)]
    pub children: Vec<(String, Vec<String>)>,
    /// Root used for level computation
    #[serde(default)]
    pub canonical_top_level_category: Option<String>,
    /// Whether child-sets are expected to sum to their parent
    #[serde(default)]
    pub total_sum: bool,
}

impl HierarchyDef {
    /// Create an empty hierarchy definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one child-set for `parent`
    pub fn children<I, S>(mut self, parent: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children
            .push((parent.into(), children.into_iter().map(Into::into).collect()));
        self
    }

    /// Designate the top-level category
    pub fn top_level_category(mut self, code: impl Into<String>) -> Self {
        self.canonical_top_level_category = Some(code.into());
        self
    }

    /// Set the total-sum flag
    pub fn total_sum(mut self, total_sum: bool) -> Self {
        self.total_sum = total_sum;
        self
    }
}

/// Validated parent/child relation of a hierarchical categorization
#[derive(Debug, Clone)]
pub struct Hierarchy {
    children: IndexMap<String, Vec<ChildSet>>,
    parents: IndexMap<String, Vec<String>>,
    levels: HashMap<String, usize>,
    canonical_top_level_category: Option<String>,
    total_sum: bool,
}

impl Hierarchy {
    /// Build from canonical edges; every code must already be known to exist.
    pub(crate) fn build(
        categorization: &str,
        edges: Vec<(String, ChildSet)>,
        canonical_top_level_category: Option<String>,
        total_sum: bool,
    ) -> CategorizationResult<Self> {
        let mut children: IndexMap<String, Vec<ChildSet>> = IndexMap::new();
        for (parent, set) in edges {
            if set.is_empty() {
                return Err(CategorizationError::invalid_hierarchy(
                    categorization,
                    format!("empty child-set for {parent}"),
                ));
            }
            if set.contains(&parent) {
                return Err(CategorizationError::invalid_hierarchy(
                    categorization,
                    format!("{parent} is listed as its own child"),
                ));
            }
            let sets = children.entry(parent).or_default();
            if !sets.contains(&set) {
                sets.push(set);
            }
        }

        let mut parents: IndexMap<String, Vec<String>> = IndexMap::new();
        for (parent, sets) in &children {
            for child in sets.iter().flatten() {
                let entry = parents.entry(child.clone()).or_default();
                if !entry.contains(parent) {
                    entry.push(parent.clone());
                }
            }
        }

        let mut hierarchy = Self {
            children,
            parents,
            levels: HashMap::new(),
            canonical_top_level_category,
            total_sum,
        };

        if let Some(code) = hierarchy.find_cycle() {
            return Err(CategorizationError::invalid_hierarchy(
                categorization,
                format!("cycle through {code}"),
            ));
        }

        hierarchy.levels = hierarchy.compute_levels();
        debug!(
            categorization,
            parents = hierarchy.children.len(),
            reachable = hierarchy.levels.len(),
            "built hierarchy"
        );
        Ok(hierarchy)
    }

    /// All alternative child-sets of `code`; empty for leaves
    pub fn children_of(&self, code: &str) -> &[ChildSet] {
        self.children.get(code).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every category listing `code` in one of its child-sets
    pub fn parents_of(&self, code: &str) -> &[String] {
        self.parents.get(code).map(Vec::as_slice).unwrap_or_default()
    }

    /// Minimum number of parent hops from `code` up to the top-level category.
    ///
    /// `None` if no top-level category is designated or no path exists.
    pub fn level_of(&self, code: &str) -> Option<usize> {
        self.levels.get(code).copied()
    }

    /// True if `code` has no child-sets
    pub fn is_leaf(&self, code: &str) -> bool {
        !self.children.contains_key(code)
    }

    /// Canonical code of the designated top-level category
    pub fn top_level_category(&self) -> Option<&str> {
        self.canonical_top_level_category.as_deref()
    }

    /// Whether child-sets are expected to sum to their parent
    pub fn total_sum(&self) -> bool {
        self.total_sum
    }

    /// Parent codes with their child-sets, in definition order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &[ChildSet])> {
        self.children
            .iter()
            .map(|(parent, sets)| (parent.as_str(), sets.as_slice()))
    }

    /// All codes below `code` in any decomposition, breadth first
    pub fn descendants_of(&self, code: &str) -> Vec<String> {
        self.walk(code, |current| {
            self.children_of(current).iter().flatten().cloned().collect()
        })
    }

    /// All codes above `code`, breadth first
    pub fn ancestors_of(&self, code: &str) -> Vec<String> {
        self.walk(code, |current| self.parents_of(current).to_vec())
    }

    /// Flatten into one `(parent, child-set)` pair per decomposition
    pub(crate) fn edge_list(&self) -> Vec<(String, ChildSet)> {
        self.children
            .iter()
            .flat_map(|(parent, sets)| sets.iter().map(move |set| (parent.clone(), set.clone())))
            .collect()
    }

    fn walk<F>(&self, start: &str, next: F) -> Vec<String>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<String> = next(start).into();

        while let Some(code) = queue.pop_front() {
            if code == start || !seen.insert(code.clone()) {
                continue;
            }
            queue.extend(next(&code));
            order.push(code);
        }
        order
    }

    fn compute_levels(&self) -> HashMap<String, usize> {
        let mut levels = HashMap::new();
        let Some(top) = self.canonical_top_level_category.as_ref() else {
            return levels;
        };

        levels.insert(top.clone(), 0);
        let mut queue = VecDeque::from([top.clone()]);
        while let Some(parent) = queue.pop_front() {
            let level = levels[&parent] + 1;
            for child in self.children_of(&parent).iter().flatten() {
                if !levels.contains_key(child) {
                    levels.insert(child.clone(), level);
                    queue.push_back(child.clone());
                }
            }
        }
        levels
    }

    /// Depth-first search with three colors; returns a code on a cycle
    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for root in self.children.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            let mut stack: Vec<(&str, Vec<&str>)> = vec![(root.as_str(), self.child_codes(root))];
            marks.insert(root.as_str(), Mark::Active);

            while let Some((code, pending)) = stack.last_mut() {
                let code = *code;
                match pending.pop() {
                    Some(child) => match marks.get(child) {
                        Some(Mark::Active) => return Some(child.to_string()),
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::Active);
                            let grandchildren = self.child_codes(child);
                            stack.push((child, grandchildren));
                        }
                    },
                    None => {
                        marks.insert(code, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }
        None
    }

    fn child_codes(&self, code: &str) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .children_of(code)
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

impl PartialEq for Hierarchy {
    // parents and levels are derived from the edges
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children
            && self.canonical_top_level_category == other.canonical_top_level_category
            && self.total_sum == other.total_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[&str]) -> ChildSet {
        codes.iter().map(|code| code.to_string()).collect()
    }

    fn edge(parent: &str, children: &[&str]) -> (String, ChildSet) {
        (parent.to_string(), set(children))
    }

    fn sample() -> Hierarchy {
        Hierarchy::build(
            "sample",
            vec![
                edge("0", &["1", "2"]),
                edge("0", &["M.AG", "M.0.EL"]),
                edge("M.0.EL", &["1"]),
                edge("1", &["1.A", "1.B"]),
                edge("M.AG", &["2"]),
            ],
            Some("0".to_string()),
            true,
        )
        .unwrap()
    }

    #[test]
    fn children_keep_every_alternative() {
        let hierarchy = sample();
        assert_eq!(
            hierarchy.children_of("0"),
            [set(&["1", "2"]), set(&["M.0.EL", "M.AG"])]
        );
        assert!(hierarchy.children_of("1.A").is_empty());
    }

    #[test]
    fn parents_are_collected_across_sets() {
        let hierarchy = sample();
        assert_eq!(hierarchy.parents_of("1"), ["0".to_string(), "M.0.EL".to_string()]);
        assert!(hierarchy.parents_of("0").is_empty());
    }

    #[test]
    fn levels_follow_the_shortest_path() {
        let hierarchy = sample();
        assert_eq!(hierarchy.level_of("0"), Some(0));
        assert_eq!(hierarchy.level_of("1"), Some(1));
        assert_eq!(hierarchy.level_of("M.0.EL"), Some(1));
        assert_eq!(hierarchy.level_of("1.A"), Some(2));
        assert_eq!(hierarchy.level_of("unlisted"), None);
    }

    #[test]
    fn duplicate_child_sets_are_stored_once() {
        let hierarchy = Hierarchy::build(
            "dup",
            vec![edge("0", &["1", "2"]), edge("0", &["2", "1"])],
            None,
            false,
        )
        .unwrap();
        assert_eq!(hierarchy.children_of("0").len(), 1);
        assert_eq!(hierarchy.level_of("0"), None);
    }

    #[test]
    fn rejects_cycles() {
        let err = Hierarchy::build(
            "cyclic",
            vec![edge("A", &["B"]), edge("B", &["C"]), edge("C", &["A"])],
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CategorizationError::InvalidHierarchy { .. }));
    }

    #[test]
    fn rejects_self_loops_and_empty_sets() {
        let err = Hierarchy::build("loop", vec![edge("A", &["A", "B"])], None, false).unwrap_err();
        assert!(err.is_validation_error());

        let err = Hierarchy::build("empty", vec![edge("A", &[])], None, false).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn transitive_closures() {
        let hierarchy = sample();
        let descendants: BTreeSet<String> = hierarchy.descendants_of("M.0.EL").into_iter().collect();
        assert_eq!(descendants, set(&["1", "1.A", "1.B"]));

        let ancestors: BTreeSet<String> = hierarchy.ancestors_of("1.A").into_iter().collect();
        assert_eq!(ancestors, set(&["0", "1", "M.0.EL"]));
    }

    #[test]
    fn edge_list_round_trips() {
        let hierarchy = sample();
        let rebuilt = Hierarchy::build("sample", hierarchy.edge_list(), Some("0".to_string()), true)
            .unwrap();
        assert_eq!(rebuilt, hierarchy);
    }
}
