// Copyright 2025 Cowboy AI, LLC.

//! Total-sum consistency checks
//!
//! In a scheme that declares the total-sum contract, the value of a parent
//! equals the sum of the values of any one of its child-sets. The library
//! does not enforce this on data it never sees; this module lets callers
//! check a set of values against the contract.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::categorization::Categorization;
use crate::errors::{CategorizationError, CategorizationResult};

/// Tolerances used when comparing a parent with the sum of its children
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalSumConfig {
    /// Allowed absolute difference
    pub absolute_tolerance: f64,
    /// Allowed difference relative to the larger magnitude
    pub relative_tolerance: f64,
    /// Skip child-sets with missing values instead of treating them as zero
    pub skip_incomplete: bool,
}

impl Default for TotalSumConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-9,
            relative_tolerance: 1e-6,
            skip_incomplete: true,
        }
    }
}

impl TotalSumConfig {
    fn agrees(&self, parent: f64, sum: f64) -> bool {
        let allowed = self.absolute_tolerance + self.relative_tolerance * parent.abs().max(sum.abs());
        (parent - sum).abs() <= allowed
    }
}

/// A child-set whose sum differs from its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSumViolation {
    /// Canonical code of the parent
    pub parent: String,
    /// Canonical codes of the child-set
    pub children: BTreeSet<String>,
    /// Value given for the parent
    pub parent_value: f64,
    /// Sum of the values given for the children
    pub children_sum: f64,
}

/// Result of checking values against the total-sum contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSumReport {
    /// Child-sets that were compared
    pub checked: usize,
    /// Child-sets skipped for missing values
    pub skipped: usize,
    /// Child-sets that disagree with their parent
    pub violations: Vec<TotalSumViolation>,
    /// Timestamp of the check
    pub checked_at: DateTime<Utc>,
}

impl TotalSumReport {
    /// True if no child-set disagrees with its parent
    pub fn is_satisfied(&self) -> bool {
        self.violations.is_empty()
    }
}

impl Categorization {
    /// Check values, keyed by any code spelling, against the total-sum contract
    pub fn check_total_sum<I, K>(
        &self,
        values: I,
        config: &TotalSumConfig,
    ) -> CategorizationResult<TotalSumReport>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let hierarchy = self
            .hierarchy()
            .ok_or_else(|| CategorizationError::NotHierarchical(self.name().to_string()))?;
        if !hierarchy.total_sum() {
            return Err(CategorizationError::TotalSumNotDeclared(self.name().to_string()));
        }

        let mut by_code: HashMap<&str, f64> = HashMap::new();
        for (code, value) in values {
            let category = self.lookup(code.as_ref())?;
            by_code.insert(category.canonical_code(), value);
        }

        let mut report = TotalSumReport {
            checked: 0,
            skipped: 0,
            violations: Vec::new(),
            checked_at: Utc::now(),
        };

        for (parent, sets) in hierarchy.edges() {
            let Some(&parent_value) = by_code.get(parent) else {
                report.skipped += sets.len();
                continue;
            };

            for set in sets {
                let complete = set.iter().all(|child| by_code.contains_key(child.as_str()));
                if !complete && config.skip_incomplete {
                    report.skipped += 1;
                    continue;
                }

                let children_sum: f64 = set
                    .iter()
                    .filter_map(|child| by_code.get(child.as_str()))
                    .sum();
                report.checked += 1;

                if !config.agrees(parent_value, children_sum) {
                    warn!(
                        categorization = %self.name(),
                        parent,
                        parent_value,
                        children_sum,
                        "child-set does not sum to its parent"
                    );
                    report.violations.push(TotalSumViolation {
                        parent: parent.to_string(),
                        children: set.clone(),
                        parent_value,
                        children_sum,
                    });
                }
            }
        }

        debug!(
            categorization = %self.name(),
            checked = report.checked,
            skipped = report.skipped,
            violations = report.violations.len(),
            "total-sum check finished"
        );
        Ok(report)
    }
}
