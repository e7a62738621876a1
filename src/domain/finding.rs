use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Identifier of a detector in the classification service, e.g. `CREDIT_CARD_NUMBER`.
pub type DetectorId = String;

/// Ordinal likelihood attached to a finding.
///
/// Variants are declared in ascending order so the derived `Ord` is the
/// confidence ordering used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    pub const ALL: [Likelihood; 5] = [
        Likelihood::VeryUnlikely,
        Likelihood::Unlikely,
        Likelihood::Possible,
        Likelihood::Likely,
        Likelihood::VeryLikely,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Likelihood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Likelihood::ALL
            .into_iter()
            .find(|l| l.as_str() == normalized)
            .ok_or_else(|| format!("Invalid likelihood: {s}"))
    }
}

/// A bounded fragment of added-line content submitted as one item for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanUnit {
    pub content: String,
    pub path: String,
    pub line: u32,
}

/// A raw result reported by the classification service for one scan unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub detector: DetectorId,
    /// The matched text. Sensitive: never render it verbatim.
    pub quote: String,
    pub likelihood: Likelihood,
    /// Byte range of the match within the scan unit content, when known.
    pub byte_range: Option<Range<usize>>,
}

/// A finding that passed the detector policy and exclusion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedFinding {
    pub finding: Finding,
    pub path: String,
    pub line: u32,
}

/// Detector id to minimum likelihood a finding needs to be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectorPolicy(BTreeMap<DetectorId, Likelihood>);

impl DetectorPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, detector: impl Into<DetectorId>, minimum: Likelihood) -> Self {
        self.0.insert(detector.into(), minimum);
        self
    }

    pub fn minimum(&self, detector: &str) -> Option<Likelihood> {
        self.0.get(detector).copied()
    }

    /// The detector set requested from the classification service.
    pub fn detectors(&self) -> Vec<DetectorId> {
        self.0.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(DetectorId, Likelihood)> for DetectorPolicy {
    fn from_iter<T: IntoIterator<Item = (DetectorId, Likelihood)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A configured pattern whose matches are never reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionRule {
    /// Suppresses a finding whose matched text equals this value.
    Exact(String),
    /// Suppresses a finding whose matched text matches this regular expression.
    Regex(String),
}
