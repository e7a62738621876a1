//! Scanning infrastructure: segmentation, batching and inspector backends.

pub mod batch;
pub mod dlp;
pub mod regex_inspector;
pub mod segment;
pub mod traits;

pub use batch::{BatchScanner, ScannedUnit};
pub use segment::{segment_files, segment_line};
pub use traits::Inspector;

use crate::infra::config::Config;
use anyhow::{Context, Result};

/// Builds the inspector named by `id`.
pub fn inspector_for(id: &str, config: &Config) -> Result<Box<dyn Inspector>> {
    match id {
        "regex" => Ok(Box::new(regex_inspector::RegexInspector::new())),
        "dlp" => {
            let settings = config
                .dlp
                .clone()
                .context("The dlp inspector needs a [dlp] section in the config")?;
            Ok(Box::new(dlp::DlpInspector::new(settings)))
        }
        other => Err(anyhow::anyhow!(
            "Unknown inspector '{other}'. Expected 'regex' or 'dlp'."
        )),
    }
}
