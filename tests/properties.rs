//! Property-based tests for the selection engine.
//!
//! These tests use proptest to verify the set-algebra laws of expression
//! evaluation across randomly generated registries.

use std::collections::BTreeSet;

use proptest::prelude::*;

use meshwork::core::naming::{normalize, Dialect};
use meshwork::core::recipe::{Recipe, Registry};
use meshwork::core::types::UnitName;
use meshwork::git::MockGitClient;
use meshwork::selector::{Selector, SelectorOptions};
use meshwork::state::MemoryStateReader;

fn name(raw: &str) -> UnitName {
    normalize(raw, None, Dialect::Ansi).unwrap()
}

/// One generated unit: which earlier units it depends on, and its tags.
#[derive(Debug, Clone)]
struct UnitSeed {
    deps: Vec<bool>,
    tag0: bool,
    tag1: bool,
}

fn arb_unit() -> impl Strategy<Value = UnitSeed> {
    (
        prop::collection::vec(any::<bool>(), 0..8),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(deps, tag0, tag1)| UnitSeed { deps, tag0, tag1 })
}

/// Strategy for a registry of up to eight units named `db.u0..db.u7`,
/// with edges only toward lower indices so the graph is always acyclic.
fn arb_registry() -> impl Strategy<Value = Registry> {
    prop::collection::vec(arb_unit(), 1..8).prop_map(|units| {
        let mut registry = Registry::new();
        for (i, unit) in units.iter().enumerate() {
            let deps: Vec<UnitName> = unit
                .deps
                .iter()
                .take(i)
                .enumerate()
                .filter(|(_, keep)| **keep)
                .map(|(j, _)| name(&format!("db.u{j}")))
                .collect();
            let mut tags = Vec::new();
            if unit.tag0 {
                tags.push("t0");
            }
            if unit.tag1 {
                tags.push("t1");
            }
            let recipe = Recipe::new(name(&format!("db.u{i}")), format!("SELECT {i}"))
                .with_dependencies(deps)
                .with_tags(tags);
            registry.insert(recipe).unwrap();
        }
        registry
    })
}

/// Strategy for expressions that are always well-formed over the generated
/// registries.
fn arb_expression() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("*".to_string()),
        Just("db.u*".to_string()),
        Just("*1".to_string()),
        Just("db.u0".to_string()),
        Just("tag:t0".to_string()),
        Just("tag:t*".to_string()),
        Just("tag:t0 & tag:t1".to_string()),
        Just("^tag:t0".to_string()),
    ]
}

fn expand(registry: &Registry, selections: &[String]) -> BTreeSet<UnitName> {
    let state = MemoryStateReader::new();
    let git = MockGitClient::new();
    let selector = Selector::new(&state, registry, &git, SelectorOptions::default());
    selector.expand_unit_selections(selections).unwrap()
}

fn all_names(registry: &Registry) -> BTreeSet<UnitName> {
    registry.names().cloned().collect()
}

proptest! {
    /// Expansion never invents names: the result is a subset of the
    /// registry.
    #[test]
    fn expansion_is_subset_of_registry(
        registry in arb_registry(),
        expr in arb_expression(),
    ) {
        let expanded = expand(&registry, &[expr]);
        prop_assert!(expanded.is_subset(&all_names(&registry)));
    }

    /// An expression and its complement partition the universe.
    #[test]
    fn complement_partitions_the_universe(
        registry in arb_registry(),
        expr in arb_expression(),
    ) {
        let matched = expand(&registry, &[expr.clone()]);
        let complement = expand(&registry, &[format!("^({expr})")]);

        prop_assert!(matched.is_disjoint(&complement));
        let union: BTreeSet<UnitName> =
            matched.union(&complement).cloned().collect();
        prop_assert_eq!(union, all_names(&registry));
    }

    /// Closure only ever grows the match, and stays inside the registry.
    #[test]
    fn closure_contains_its_base(
        registry in arb_registry(),
        expr in arb_expression(),
    ) {
        let base = expand(&registry, &[format!("({expr})")]);
        let up = expand(&registry, &[format!("+({expr})")]);
        let down = expand(&registry, &[format!("({expr})+")]);
        let both = expand(&registry, &[format!("+({expr})+")]);

        prop_assert!(base.is_subset(&up));
        prop_assert!(base.is_subset(&down));
        prop_assert!(up.is_subset(&both));
        prop_assert!(down.is_subset(&both));
        prop_assert!(both.is_subset(&all_names(&registry)));
    }

    /// Multiple selections union exactly like the `|` operator.
    #[test]
    fn selection_list_is_union(
        registry in arb_registry(),
        a in arb_expression(),
        b in arb_expression(),
    ) {
        let as_list = expand(&registry, &[a.clone(), b.clone()]);
        let as_or = expand(&registry, &[format!("({a}) | ({b})")]);
        prop_assert_eq!(as_list, as_or);
    }

    /// Intersection commutes.
    #[test]
    fn intersection_commutes(
        registry in arb_registry(),
        a in arb_expression(),
        b in arb_expression(),
    ) {
        let ab = expand(&registry, &[format!("({a}) & ({b})")]);
        let ba = expand(&registry, &[format!("({b}) & ({a})")]);
        prop_assert_eq!(ab, ba);
    }

    /// Resolving everything twice yields identical fingerprints: the
    /// schema cascade is a pure function of the chosen recipes.
    #[test]
    fn resolution_fingerprints_are_stable(registry in arb_registry()) {
        let state = MemoryStateReader::new();
        let git = MockGitClient::new();
        let selector =
            Selector::new(&state, &registry, &git, SelectorOptions::default());

        let first = selector
            .select_units(&["*".to_string()], "dev", None)
            .unwrap();
        let second = selector
            .select_units(&["*".to_string()], "dev", None)
            .unwrap();

        prop_assert_eq!(first.len(), second.len());
        for (unit, recipe) in &first {
            prop_assert_eq!(recipe.fingerprint(), second[unit].fingerprint());
        }
    }
}
