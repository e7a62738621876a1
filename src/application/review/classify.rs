use crate::domain::{ConfirmedFinding, DetectorPolicy, ExclusionRule, Finding};
use crate::infra::scan::ScannedUnit;
use regex::Regex;
use std::collections::HashSet;

/// Compiled exclusion rules.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    exact: HashSet<String>,
    patterns: Vec<Regex>,
}

impl ExclusionSet {
    pub fn compile(rules: &[ExclusionRule]) -> Result<Self, regex::Error> {
        let mut set = Self::default();
        for rule in rules {
            match rule {
                ExclusionRule::Exact(value) => {
                    set.exact.insert(value.clone());
                }
                ExclusionRule::Regex(pattern) => set.patterns.push(Regex::new(pattern)?),
            }
        }
        Ok(set)
    }

    pub fn is_excluded(&self, quote: &str) -> bool {
        self.exact.contains(quote) || self.patterns.iter().any(|re| re.is_match(quote))
    }
}

/// Applies the detector policy and exclusion list to raw findings.
pub struct FindingClassifier<'a> {
    policy: &'a DetectorPolicy,
    exclusions: &'a ExclusionSet,
}

impl<'a> FindingClassifier<'a> {
    pub fn new(policy: &'a DetectorPolicy, exclusions: &'a ExclusionSet) -> Self {
        Self { policy, exclusions }
    }

    pub fn is_confirmed(&self, finding: &Finding) -> bool {
        let Some(minimum) = self.policy.minimum(&finding.detector) else {
            log::debug!(
                "Dropping finding for unconfigured detector {}",
                finding.detector
            );
            return false;
        };
        if finding.likelihood < minimum {
            log::debug!(
                "Dropping {} finding at {} (minimum {})",
                finding.detector,
                finding.likelihood,
                minimum
            );
            return false;
        }
        if self.exclusions.is_excluded(&finding.quote) {
            log::debug!("Dropping excluded {} finding", finding.detector);
            return false;
        }
        true
    }

    /// Confirmed findings in scan-unit order, addressed by file and line.
    pub fn classify(&self, scanned: Vec<ScannedUnit>) -> Vec<ConfirmedFinding> {
        let mut confirmed = Vec::new();
        for ScannedUnit { unit, findings } in scanned {
            for finding in findings {
                if self.is_confirmed(&finding) {
                    confirmed.push(ConfirmedFinding {
                        finding,
                        path: unit.path.clone(),
                        line: unit.line,
                    });
                }
            }
        }
        confirmed
    }
}
