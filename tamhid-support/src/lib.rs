//! # Tamhid Support
//!
//! Shared utilities for the Tamhid definition core.
//!
//! This crate provides:
//! - Text rendering for error messages and `Display` output
//! - Common helpers shared between tamhid crates

pub mod rendering;
