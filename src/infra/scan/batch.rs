//! Quota-bounded dispatch of scan units to an [`Inspector`].

use super::traits::Inspector;
use crate::domain::{DetectorId, Finding, ScanError, ScanUnit};
use futures::StreamExt;

/// Default per-request item cap of the classification service.
pub const DEFAULT_BATCH_SIZE: usize = 479;

/// A scan unit paired with the findings reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedUnit {
    pub unit: ScanUnit,
    pub findings: Vec<Finding>,
}

pub struct BatchScanner<'a> {
    inspector: &'a dyn Inspector,
    batch_size: usize,
    concurrency: usize,
}

impl<'a> BatchScanner<'a> {
    pub fn new(inspector: &'a dyn Inspector) -> Self {
        Self {
            inspector,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Maximum number of requests in flight; 1 dispatches sequentially.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn batch_count(&self, units: usize) -> usize {
        if self.batch_size == 0 {
            return 0;
        }
        units.div_ceil(self.batch_size)
    }

    /// Scans all units and returns them with their findings in input order.
    ///
    /// The first failed batch aborts the scan; batches still queued are never
    /// sent and in-flight ones are dropped.
    pub async fn scan(
        &self,
        detectors: &[DetectorId],
        units: Vec<ScanUnit>,
    ) -> Result<Vec<ScannedUnit>, ScanError> {
        if self.batch_size == 0 {
            return Err(ScanError::ZeroBatchSize);
        }
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<Vec<String>> = units
            .chunks(self.batch_size)
            .map(|chunk| chunk.iter().map(|u| u.content.clone()).collect())
            .collect();
        log::debug!(
            "Dispatching {} scan units in {} batches via {} (concurrency {})",
            units.len(),
            batches.len(),
            self.inspector.id(),
            self.concurrency
        );

        let mut slots: Vec<Option<Vec<Vec<Finding>>>> = vec![None; batches.len()];
        let requests = batches.iter().enumerate().map(|(batch, items)| async move {
            let findings = self
                .inspector
                .inspect(detectors, items)
                .await
                .map_err(|source| ScanError::Remote { batch, source })?;
            if findings.len() != items.len() {
                return Err(ScanError::CardinalityMismatch {
                    batch,
                    expected: items.len(),
                    actual: findings.len(),
                });
            }
            Ok((batch, findings))
        });
        let mut responses = futures::stream::iter(requests).buffer_unordered(self.concurrency);

        while let Some(response) = responses.next().await {
            let (batch, findings) = response?;
            log::debug!("Batch {batch} returned {} items", findings.len());
            slots[batch] = Some(findings);
        }

        let findings = slots.into_iter().flatten().flatten();
        Ok(units
            .into_iter()
            .zip(findings)
            .map(|(unit, findings)| ScannedUnit { unit, findings })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Likelihood;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes each item back as a finding. Earlier batches answer slower.
    struct EchoInspector {
        calls: Mutex<Vec<usize>>,
        fail_on: Option<String>,
        short_by_one: bool,
    }

    impl EchoInspector {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
                short_by_one: false,
            }
        }
    }

    #[async_trait]
    impl Inspector for EchoInspector {
        fn id(&self) -> &str {
            "echo"
        }

        async fn inspect(
            &self,
            _detectors: &[DetectorId],
            items: &[String],
        ) -> Result<Vec<Vec<Finding>>> {
            self.calls.lock().unwrap().push(items.len());
            let first: usize = items[0].trim_start_matches('u').parse()?;
            tokio::time::sleep(Duration::from_millis(50u64.saturating_sub(first as u64))).await;

            if let Some(bad) = &self.fail_on
                && items.contains(bad)
            {
                anyhow::bail!("quota exceeded");
            }

            let mut out: Vec<Vec<Finding>> = items
                .iter()
                .map(|item| {
                    vec![Finding {
                        detector: "ECHO".into(),
                        quote: item.clone(),
                        likelihood: Likelihood::Likely,
                        byte_range: None,
                    }]
                })
                .collect();
            if self.short_by_one {
                out.pop();
            }
            Ok(out)
        }
    }

    fn units(n: usize) -> Vec<ScanUnit> {
        (0..n)
            .map(|i| ScanUnit {
                content: format!("u{i}"),
                path: "f.txt".into(),
                line: i as u32 + 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_issues_ceil_n_over_cap_calls_in_order() {
        let inspector = EchoInspector::new();
        let scanner = BatchScanner::new(&inspector)
            .with_batch_size(7)
            .with_concurrency(4);
        assert_eq!(scanner.batch_count(30), 5);

        let scanned = scanner.scan(&[], units(30)).await.unwrap();

        let mut sizes = inspector.calls.lock().unwrap().clone();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 7, 7, 7, 7]);

        assert_eq!(scanned.len(), 30);
        for (i, scanned_unit) in scanned.iter().enumerate() {
            assert_eq!(scanned_unit.unit.content, format!("u{i}"));
            assert_eq!(scanned_unit.findings[0].quote, format!("u{i}"));
        }
    }

    #[tokio::test]
    async fn test_sequential_dispatch_respects_cap() {
        let inspector = EchoInspector::new();
        let scanner = BatchScanner::new(&inspector).with_batch_size(479);
        let scanned = scanner.scan(&[], units(1000)).await.unwrap();
        assert_eq!(*inspector.calls.lock().unwrap(), vec![479, 479, 42]);
        assert_eq!(scanned.last().unwrap().unit.content, "u999");
    }

    #[tokio::test]
    async fn test_any_failed_batch_aborts_scan() {
        let mut inspector = EchoInspector::new();
        inspector.fail_on = Some("u12".into());
        let scanner = BatchScanner::new(&inspector)
            .with_batch_size(5)
            .with_concurrency(2);

        let err = scanner.scan(&[], units(20)).await.unwrap_err();
        assert!(matches!(err, ScanError::Remote { batch: 2, .. }));
    }

    #[tokio::test]
    async fn test_short_response_is_rejected() {
        let mut inspector = EchoInspector::new();
        inspector.short_by_one = true;
        let scanner = BatchScanner::new(&inspector).with_batch_size(3);

        let err = scanner.scan(&[], units(3)).await.unwrap_err();
        assert!(matches!(
            err,
            ScanError::CardinalityMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_input_and_zero_cap() {
        let inspector = EchoInspector::new();
        let scanner = BatchScanner::new(&inspector);
        assert!(scanner.scan(&[], Vec::new()).await.unwrap().is_empty());
        assert!(inspector.calls.lock().unwrap().is_empty());

        let scanner = BatchScanner::new(&inspector).with_batch_size(0);
        assert!(matches!(
            scanner.scan(&[], units(1)).await,
            Err(ScanError::ZeroBatchSize)
        ));
    }
}
