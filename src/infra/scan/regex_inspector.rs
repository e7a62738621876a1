//! Offline inspector backed by built-in regular expressions.

use super::traits::Inspector;
use crate::domain::{DetectorId, Finding, Likelihood};
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

struct Detector {
    id: &'static str,
    pattern: Regex,
    score: fn(&str) -> Likelihood,
}

lazy_static! {
    static ref DETECTORS: Vec<Detector> = vec![
        Detector {
            id: "CREDIT_CARD_NUMBER",
            pattern: Regex::new(r"\b(?:\d[ -]?){12,18}\d\b").expect("credit card regex"),
            score: score_card_number,
        },
        Detector {
            id: "EMAIL_ADDRESS",
            pattern: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("email regex"),
            score: |_| Likelihood::Likely,
        },
        Detector {
            id: "AWS_ACCESS_KEY_ID",
            pattern: Regex::new(r"\b(?:A3T|AKIA|ASIA)[A-Z0-9]{16}\b").expect("aws key regex"),
            score: |_| Likelihood::VeryLikely,
        },
        Detector {
            id: "GITHUB_TOKEN",
            pattern: Regex::new(r"\bgh[oprsu]_[A-Za-z0-9_]{36,}\b").expect("github token regex"),
            score: |_| Likelihood::VeryLikely,
        },
        Detector {
            id: "PRIVATE_KEY",
            pattern: Regex::new(r"-----BEGIN (?:[A-Z]+ )?PRIVATE KEY-----")
                .expect("private key regex"),
            score: |_| Likelihood::VeryLikely,
        },
        Detector {
            id: "US_SOCIAL_SECURITY_NUMBER",
            pattern: Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn regex"),
            score: |_| Likelihood::Possible,
        },
    ];
}

/// Card-shaped numbers that fail the Luhn checksum are probably not cards.
fn score_card_number(candidate: &str) -> Likelihood {
    if luhn_valid(candidate) {
        Likelihood::VeryLikely
    } else {
        Likelihood::Unlikely
    }
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[derive(Debug, Default)]
pub struct RegexInspector;

impl RegexInspector {
    pub fn new() -> Self {
        Self
    }

    /// Findings for one item. An empty detector set runs every built-in detector.
    pub fn inspect_item(&self, detectors: &[DetectorId], item: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for detector in DETECTORS.iter() {
            if !detectors.is_empty() && !detectors.iter().any(|id| id == detector.id) {
                continue;
            }
            for m in detector.pattern.find_iter(item) {
                findings.push(Finding {
                    detector: detector.id.to_string(),
                    quote: m.as_str().to_string(),
                    likelihood: (detector.score)(m.as_str()),
                    byte_range: Some(m.range()),
                });
            }
        }
        findings.sort_by_key(|f| f.byte_range.as_ref().map(|r| r.start));
        findings
    }
}

#[async_trait]
impl Inspector for RegexInspector {
    fn id(&self) -> &str {
        "regex"
    }

    async fn inspect(
        &self,
        detectors: &[DetectorId],
        items: &[String],
    ) -> Result<Vec<Vec<Finding>>> {
        Ok(items
            .iter()
            .map(|item| self.inspect_item(detectors, item))
            .collect())
    }
}
