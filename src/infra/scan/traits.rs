use crate::domain::{DetectorId, Finding};
use anyhow::Result;
use async_trait::async_trait;

/// A content-classification backend.
#[async_trait]
pub trait Inspector: Send + Sync {
    fn id(&self) -> &str;

    /// Inspects `items` for the given detectors.
    ///
    /// Must return exactly one findings list per item, in item order. Byte
    /// ranges in the returned findings are relative to their own item.
    async fn inspect(
        &self,
        detectors: &[DetectorId],
        items: &[String],
    ) -> Result<Vec<Vec<Finding>>>;
}
