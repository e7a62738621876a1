//! Application layer (use-cases, policies).
//!
//! Orchestrates the scan pipeline over the domain model and the
//! infrastructure capabilities (inspectors, review hosts).

pub mod review;
