//! Domain types for leakwatch
//! Defines the diff model, findings and review output shared by every pipeline stage.

pub mod comment;
pub mod diff;
pub mod error;
pub mod finding;

pub use comment::*;
pub use diff::*;
pub use error::*;
pub use finding::*;
