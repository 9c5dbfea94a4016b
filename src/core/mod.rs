//! core
//!
//! Core domain types and operations for Meshwork.
//!
//! # Modules
//!
//! - [`types`] - Strong types: UnitName, Fingerprint, UtcTimestamp
//! - [`naming`] - Name normalization: quoting dialects, default namespaces
//! - [`graph`] - Dependency graph: closure and topological ordering
//! - [`recipe`] - Unit definitions and the local registry
//! - [`snapshot`] - Deployed state: snapshots and environments
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Identity is exact on normalized forms; matching is a separate,
//!   case-insensitive operation
//! - All derived values (orderings, fingerprints) are deterministic

pub mod graph;
pub mod naming;
pub mod recipe;
pub mod snapshot;
pub mod types;
