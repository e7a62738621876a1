pub mod github;
pub mod local;
pub mod registry;
pub mod traits;

pub use registry::HostRegistry;
pub use traits::{CheckRuns, ReviewHost};
