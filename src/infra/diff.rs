pub mod filter;
pub mod parser;

pub use filter::retain_added_lines;
pub use parser::{normalize_repo_path, parse_diff};
