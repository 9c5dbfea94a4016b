//! core::graph
//!
//! Dependency graph representation and operations.
//!
//! # Architecture
//!
//! The dependency graph is a DAG where:
//! - Nodes are unit names present in the resolution universe
//! - Edges point from a unit to its upstream dependencies
//!
//! # Invariants
//!
//! - The graph is expected to be acyclic by construction, but every
//!   traversal is still visited-set guarded so an accidental cycle can
//!   never cause unbounded recursion
//! - Closure sets are self-inclusive
//! - Topological order is deterministic (ties broken by normalized name)

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::core::types::UnitName;

/// The dependency graph over a resolution universe.
///
/// This is an in-memory representation computed from effective dependency
/// sets. A node with no edges in a direction simply has an empty
/// neighborhood; that is a valid, silent state.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: BTreeSet<UnitName>,
    upstreams: HashMap<UnitName, BTreeSet<UnitName>>,
    downstreams: HashMap<UnitName, BTreeSet<UnitName>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without any edges.
    pub fn add_node(&mut self, unit: UnitName) {
        self.nodes.insert(unit);
    }

    /// Add a dependency edge from `unit` to one of its upstreams.
    ///
    /// Both endpoints become nodes of the graph.
    pub fn add_edge(&mut self, unit: UnitName, upstream: UnitName) {
        self.nodes.insert(unit.clone());
        self.nodes.insert(upstream.clone());
        self.downstreams
            .entry(upstream.clone())
            .or_default()
            .insert(unit.clone());
        self.upstreams.entry(unit).or_default().insert(upstream);
    }

    /// All nodes in the graph, in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &UnitName> {
        self.nodes.iter()
    }

    /// Whether the graph contains a node.
    pub fn contains(&self, unit: &UnitName) -> bool {
        self.nodes.contains(unit)
    }

    /// The immediate upstream dependencies of a unit.
    pub fn upstreams(&self, unit: &UnitName) -> Option<&BTreeSet<UnitName>> {
        self.upstreams.get(unit)
    }

    /// The immediate downstream consumers of a unit.
    pub fn downstreams(&self, unit: &UnitName) -> Option<&BTreeSet<UnitName>> {
        self.downstreams.get(unit)
    }

    /// All ancestors of a unit (upstreams, their upstreams, and so on),
    /// including the unit itself.
    ///
    /// # Example
    ///
    /// ```
    /// use meshwork::core::graph::DependencyGraph;
    /// use meshwork::core::types::UnitName;
    ///
    /// let raw = UnitName::from_segments(vec!["raw".into()]).unwrap();
    /// let staged = UnitName::from_segments(vec!["staged".into()]).unwrap();
    /// let mart = UnitName::from_segments(vec!["mart".into()]).unwrap();
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_edge(staged.clone(), raw.clone());
    /// graph.add_edge(mart.clone(), staged.clone());
    ///
    /// let ancestors = graph.ancestors(&mart);
    /// assert!(ancestors.contains(&mart));
    /// assert!(ancestors.contains(&staged));
    /// assert!(ancestors.contains(&raw));
    /// ```
    pub fn ancestors(&self, unit: &UnitName) -> BTreeSet<UnitName> {
        self.closure(unit, &self.upstreams)
    }

    /// All descendants of a unit (downstreams, their downstreams, and so
    /// on), including the unit itself.
    pub fn descendants(&self, unit: &UnitName) -> BTreeSet<UnitName> {
        self.closure(unit, &self.downstreams)
    }

    fn closure(
        &self,
        seed: &UnitName,
        edges: &HashMap<UnitName, BTreeSet<UnitName>>,
    ) -> BTreeSet<UnitName> {
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(seed.clone());

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                if let Some(neighbors) = edges.get(&current) {
                    queue.extend(neighbors.iter().cloned());
                }
            }
        }

        result
    }

    /// Compute a topological ordering of the graph (upstreams before
    /// downstreams).
    ///
    /// Uses Kahn's algorithm with a name-ordered ready set, so the result
    /// is deterministic for a given graph. Any nodes left over by an
    /// accidental cycle are appended in name order rather than dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use meshwork::core::graph::DependencyGraph;
    /// use meshwork::core::types::UnitName;
    ///
    /// let a = UnitName::from_segments(vec!["a".into()]).unwrap();
    /// let b = UnitName::from_segments(vec!["b".into()]).unwrap();
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_edge(b.clone(), a.clone());
    ///
    /// assert_eq!(graph.topological_order(), vec![a, b]);
    /// ```
    pub fn topological_order(&self) -> Vec<UnitName> {
        let mut indegree: HashMap<&UnitName, usize> = HashMap::new();
        for node in &self.nodes {
            let degree = self.upstreams.get(node).map_or(0, |ups| ups.len());
            indegree.insert(node, degree);
        }

        let mut ready: BTreeSet<&UnitName> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = ready.iter().next().copied() {
            ready.remove(node);
            order.push(node.clone());

            if let Some(downs) = self.downstreams.get(node) {
                for down in downs {
                    if let Some(degree) = indegree.get_mut(down) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(down);
                        }
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            let placed: BTreeSet<_> = order.iter().cloned().collect();
            for node in &self.nodes {
                if !placed.contains(node) {
                    order.push(node.clone());
                }
            }
        }

        order
    }
}
