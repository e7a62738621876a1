//! CLI infrastructure for leakwatch.
//!
//! Provides diff acquisition for the local host.

pub mod diff;
