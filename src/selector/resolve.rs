//! selector::resolve
//!
//! Recipe choice and the schema cascade.
//!
//! # Algorithm
//!
//! 1. For every universe name: selected names take their local recipe
//!    (or contribute nothing if none exists; a unit cannot be materialized
//!    from a deployed-only definition); unselected names fall back to their
//!    deployed recipe (or contribute nothing if never deployed).
//! 2. Survivors are topologically ordered by the chosen recipes' declared
//!    dependencies restricted to the surviving set.
//! 3. In that order, each survivor's mapping schema is rebuilt from the
//!    output shapes of the upstreams actually present in the result. The
//!    fingerprint is derived from (payload, rebuilt schema), so two runs
//!    that resolve to the same choices always fingerprint identically, and
//!    a downstream fingerprint changes exactly when its own payload or an
//!    upstream's resolved shape changed.

use std::collections::{BTreeMap, BTreeSet};

use super::universe::Universe;
use crate::core::graph::DependencyGraph;
use crate::core::recipe::{MappingSchema, Recipe};
use crate::core::types::UnitName;

/// Choose a recipe per unit and cascade structural schemas downstream.
pub(crate) fn resolve(
    universe: &Universe,
    selected: &BTreeSet<UnitName>,
) -> BTreeMap<UnitName, Recipe> {
    let mut chosen: BTreeMap<UnitName, Recipe> = BTreeMap::new();
    for name in universe.names() {
        let recipe = if selected.contains(name) {
            universe.local(name)
        } else {
            universe.remote(name)
        };
        if let Some(recipe) = recipe {
            chosen.insert(name.clone(), recipe.clone());
        }
    }

    let mut graph = DependencyGraph::new();
    for (name, recipe) in &chosen {
        graph.add_node(name.clone());
        for upstream in &recipe.depends_on {
            if chosen.contains_key(upstream) {
                graph.add_edge(name.clone(), upstream.clone());
            }
        }
    }

    let mut result: BTreeMap<UnitName, Recipe> = BTreeMap::new();
    for name in graph.topological_order() {
        if let Some(mut recipe) = chosen.remove(&name) {
            let mut schema = MappingSchema::new();
            for upstream in &recipe.depends_on {
                // Upstreams already finalized: the order puts them first.
                if let Some(upstream_recipe) = result.get(upstream) {
                    schema.insert(upstream.clone(), upstream_recipe.columns.clone());
                }
            }
            recipe.mapping_schema = schema;
            result.insert(name, recipe);
        }
    }

    result
}
