//! Meshwork - selection and resolution engine for dependency-linked
//! transformation units.
//!
//! Meshwork decides, for every unit reachable in the combined local/deployed
//! universe, whether an operation should use the freshly-edited local
//! definition or fall back to the last-deployed one, and propagates
//! structural (schema) changes through downstream consumers so that content
//! fingerprints stay consistent with what will actually execute.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`selector`] - Selection expression language and the resolution pipeline
//! - [`core`] - Domain types: unit names, recipes, snapshots, environments,
//!   the dependency graph
//! - [`git`] - Single interface for all Git operations (change oracle)
//! - [`state`] - Read-only interface to the environment/snapshot store
//!
//! # Correctness Invariants
//!
//! 1. Selection sets never contain names outside the resolution universe
//! 2. Local definitions shadow deployed ones for matching, never the reverse
//! 3. A unit is never materialized from a deployed-only definition
//! 4. Fingerprints are derived from (payload, resolved schema) and can never
//!    go stale
//!
//! # Example
//!
//! ```
//! use meshwork::core::naming::{self, Dialect};
//! use meshwork::core::recipe::{Recipe, Registry};
//! use meshwork::git::MockGitClient;
//! use meshwork::selector::{Selector, SelectorOptions};
//! use meshwork::state::MemoryStateReader;
//!
//! let name = naming::normalize("db.orders", None, Dialect::Ansi).unwrap();
//! let mut registry = Registry::new();
//! registry.insert(Recipe::new(name.clone(), "SELECT 1 AS a")).unwrap();
//!
//! let state = MemoryStateReader::new();
//! let git = MockGitClient::new();
//! let selector = Selector::new(&state, &registry, &git, SelectorOptions::default());
//!
//! let selected = selector.expand_unit_selections(&["db.orders".to_string()]).unwrap();
//! assert!(selected.contains(&name));
//! ```

pub mod core;
pub mod git;
pub mod selector;
pub mod state;
