//! selector::universe
//!
//! The resolution unit of work: a merge of the local registry with the
//! remote (previously-deployed) registry into one addressable namespace
//! plus a dependency graph.
//!
//! # Invariants
//!
//! - A name present in both registries uses the **local** recipe's metadata
//!   for matching purposes (tags, source paths, dependency edges); local
//!   always shadows remote, never the reverse
//! - Graph edges are added only between names present in the universe, so
//!   closure never escapes into external (never-registered) parents
//! - Built fresh per resolution call and discarded after

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::core::graph::DependencyGraph;
use crate::core::recipe::{Recipe, Registry};
use crate::core::types::UnitName;

/// Merged local + remote namespace for one resolution.
#[derive(Debug)]
pub(crate) struct Universe {
    local: BTreeMap<UnitName, Recipe>,
    remote: BTreeMap<UnitName, Recipe>,
    names: BTreeSet<UnitName>,
    graph: DependencyGraph,
}

impl Universe {
    /// Merge the local registry with a remote registry.
    pub(crate) fn build(local: &Registry, remote: BTreeMap<UnitName, Recipe>) -> Self {
        let local: BTreeMap<UnitName, Recipe> = local
            .iter()
            .map(|(name, recipe)| (name.clone(), recipe.clone()))
            .collect();

        let names: BTreeSet<UnitName> =
            local.keys().chain(remote.keys()).cloned().collect();

        let mut graph = DependencyGraph::new();
        for name in &names {
            graph.add_node(name.clone());
            // Effective dependencies: local shadows remote.
            let recipe = local.get(name).or_else(|| remote.get(name));
            if let Some(recipe) = recipe {
                for upstream in &recipe.depends_on {
                    if names.contains(upstream) {
                        graph.add_edge(name.clone(), upstream.clone());
                    }
                }
            }
        }

        Self {
            local,
            remote,
            names,
            graph,
        }
    }

    /// All names in the universe, in name order.
    pub(crate) fn names(&self) -> impl Iterator<Item = &UnitName> {
        self.names.iter()
    }

    /// The local recipe for a name, if one exists.
    pub(crate) fn local(&self, name: &UnitName) -> Option<&Recipe> {
        self.local.get(name)
    }

    /// The remote (deployed) recipe for a name, if one exists.
    pub(crate) fn remote(&self, name: &UnitName) -> Option<&Recipe> {
        self.remote.get(name)
    }

    /// The local-preferred recipe for a name.
    pub(crate) fn effective(&self, name: &UnitName) -> Option<&Recipe> {
        self.local.get(name).or_else(|| self.remote.get(name))
    }

    /// The shadowed (local-preferred) tag set for a name.
    pub(crate) fn tags(&self, name: &UnitName) -> Option<&BTreeSet<String>> {
        self.effective(name).map(|recipe| &recipe.tags)
    }

    /// The local source location for a name.
    ///
    /// Only local recipes have one; deployed-only units never match `git:`
    /// selections.
    pub(crate) fn source_path(&self, name: &UnitName) -> Option<&Path> {
        self.local.get(name).and_then(|recipe| recipe.source_path())
    }

    /// The dependency graph over effective edges.
    pub(crate) fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::{normalize, Dialect};

    fn name(raw: &str) -> UnitName {
        normalize(raw, None, Dialect::Ansi).unwrap()
    }

    fn registry(recipes: Vec<Recipe>) -> Registry {
        let mut registry = Registry::new();
        for recipe in recipes {
            registry.insert(recipe).unwrap();
        }
        registry
    }

    #[test]
    fn union_of_names() {
        let local = registry(vec![Recipe::new(name("db.a"), "SELECT 1")]);
        let remote = BTreeMap::from([(name("db.b"), Recipe::new(name("db.b"), "SELECT 2"))]);

        let universe = Universe::build(&local, remote);
        let names: Vec<_> = universe.names().cloned().collect();
        assert_eq!(names, vec![name("db.a"), name("db.b")]);
    }

    #[test]
    fn local_shadows_remote_metadata() {
        let local = registry(vec![
            Recipe::new(name("db.a"), "SELECT 1").with_tags(["local_tag"])
        ]);
        let remote = BTreeMap::from([(
            name("db.a"),
            Recipe::new(name("db.a"), "SELECT 1").with_tags(["remote_tag"]),
        )]);

        let universe = Universe::build(&local, remote);
        let tags = universe.tags(&name("db.a")).unwrap();
        assert!(tags.contains("local_tag"));
        assert!(!tags.contains("remote_tag"));
    }

    #[test]
    fn local_dependencies_shadow_remote() {
        let local = registry(vec![
            Recipe::new(name("db.a"), "SELECT 1"),
            Recipe::new(name("db.c"), "SELECT 3"),
            Recipe::new(name("db.b"), "SELECT * FROM db.c")
                .with_dependencies([name("db.c")]),
        ]);
        // Remote b depended on a, but the local definition wins.
        let remote = BTreeMap::from([(
            name("db.b"),
            Recipe::new(name("db.b"), "SELECT * FROM db.a")
                .with_dependencies([name("db.a")]),
        )]);

        let universe = Universe::build(&local, remote);
        let ups = universe.graph().upstreams(&name("db.b")).unwrap();
        assert!(ups.contains(&name("db.c")));
        assert!(!ups.contains(&name("db.a")));
    }

    #[test]
    fn external_parents_get_no_edges() {
        let local = registry(vec![Recipe::new(name("db.a"), "SELECT * FROM external")
            .with_dependencies([name("external")])]);

        let universe = Universe::build(&local, BTreeMap::new());
        assert!(universe.graph().upstreams(&name("db.a")).is_none());
        assert_eq!(
            universe.graph().ancestors(&name("db.a")),
            BTreeSet::from([name("db.a")])
        );
    }

    #[test]
    fn remote_only_units_have_no_source_path() {
        let local = registry(vec![]);
        let remote = BTreeMap::from([(
            name("db.a"),
            Recipe::new(name("db.a"), "SELECT 1").with_source_path("/models/a.sql"),
        )]);

        let universe = Universe::build(&local, remote);
        assert!(universe.source_path(&name("db.a")).is_none());
    }
}
