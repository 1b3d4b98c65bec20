//! # Tamhid — Annotation-Driven Definition Core for Rust DI
//!
//! The bootstrap-time half of a dependency-injection container: a registry
//! of component definitions plus the rules that turn declarative annotations
//! (lazy, primary, depends-on, scope, role, description) into normalized,
//! conflict-free definitions before anything is instantiated.

pub use tamhid_registry::*;
pub use tamhid_support::*;
