//! Infrastructure layer (adapters/implementations).
//!
//! This module contains the IO-heavy integrations: git and `gh` processes,
//! remote inspection services, config files.

pub mod cli;
pub mod config;
pub mod diff;
pub mod interval;
pub mod scan;
pub mod shell;
pub mod vcs;
