// 🏠 FHTC Coverage Tracker - Jal Jeevan Mission
// One status per panchayat (latest report wins) plus per-capita supply checks.

use crate::config::SupplyStandards;
use crate::round_dp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// COVERAGE STATUS
// ============================================================================

/// Functional Household Tap Connection status for one panchayat.
///
/// `connections_provided <= total_households` and
/// `connections_functional <= connections_provided` are expected, not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageStatus {
    pub panchayat_id: String,
    pub panchayat_name: String,
    pub total_households: u64,
    pub connections_provided: u64,
    pub connections_functional: u64,
    pub target_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
}

impl CoverageStatus {
    pub fn new(
        panchayat_id: impl Into<String>,
        total_households: u64,
        connections_provided: u64,
        connections_functional: u64,
    ) -> Self {
        CoverageStatus {
            panchayat_id: panchayat_id.into(),
            panchayat_name: String::new(),
            total_households,
            connections_provided,
            connections_functional,
            target_date: None,
            report_date: None,
        }
    }

    /// Households with a tap connection, percent of all households.
    pub fn coverage_pct(&self) -> f64 {
        if self.total_households == 0 {
            return 0.0;
        }
        round_dp(
            self.connections_provided as f64 / self.total_households as f64 * 100.0,
            1,
        )
    }

    /// Working connections, percent of connections provided.
    pub fn functional_pct(&self) -> f64 {
        if self.connections_provided == 0 {
            return 0.0;
        }
        round_dp(
            self.connections_functional as f64 / self.connections_provided as f64 * 100.0,
            1,
        )
    }

    pub fn gap(&self) -> u64 {
        self.total_households.saturating_sub(self.connections_provided)
    }
}

// ============================================================================
// RESULT SHAPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub avg_coverage_pct: f64,
    pub avg_functional_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LpcdCheck {
    pub actual_lpcd: f64,
    pub required_lpcd: f64,
    /// Litres/day still needed to reach the standard; never negative
    pub gap_lpd: f64,
}

impl LpcdCheck {
    pub fn meets_standard(&self) -> bool {
        self.gap_lpd == 0.0
    }
}

// ============================================================================
// COVERAGE TRACKER
// ============================================================================

#[derive(Debug, Default)]
pub struct CoverageTracker {
    records: BTreeMap<String, CoverageStatus>,
    standards: SupplyStandards,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standards(standards: SupplyStandards) -> Self {
        CoverageTracker {
            records: BTreeMap::new(),
            standards,
        }
    }

    /// Insert or replace the status for its panchayat.
    pub fn update(&mut self, status: CoverageStatus) {
        debug!(panchayat = %status.panchayat_id, "updating FHTC status");
        self.records.insert(status.panchayat_id.clone(), status);
    }

    pub fn get(&self, panchayat_id: &str) -> Option<&CoverageStatus> {
        self.records.get(panchayat_id)
    }

    /// All tracked statuses, ordered by panchayat id.
    pub fn all(&self) -> Vec<&CoverageStatus> {
        self.records.values().collect()
    }

    /// Households still without a connection. Zero for an untracked panchayat.
    pub fn gap(&self, panchayat_id: &str) -> u64 {
        self.get(panchayat_id).map(CoverageStatus::gap).unwrap_or(0)
    }

    pub fn below_target(&self, target_pct: f64) -> Vec<&CoverageStatus> {
        self.records
            .values()
            .filter(|s| s.coverage_pct() < target_pct)
            .collect()
    }

    /// Panchayats below the configured coverage target (100% by default).
    pub fn below_default_target(&self) -> Vec<&CoverageStatus> {
        self.below_target(self.standards.coverage_target_pct)
    }

    /// Unweighted mean of both percentages across every tracked panchayat.
    ///
    /// A panchayat with no connections provided counts as 0% functional and
    /// pulls the functional average down; it is not skipped.
    pub fn summary(&self) -> CoverageSummary {
        if self.records.is_empty() {
            return CoverageSummary {
                avg_coverage_pct: 0.0,
                avg_functional_pct: 0.0,
            };
        }

        let n = self.records.len() as f64;
        let coverage: f64 = self.records.values().map(|s| s.coverage_pct()).sum();
        let functional: f64 = self.records.values().map(|s| s.functional_pct()).sum();

        CoverageSummary {
            avg_coverage_pct: round_dp(coverage / n, 1),
            avg_functional_pct: round_dp(functional / n, 1),
        }
    }

    /// Compare delivered supply against the per-capita standard.
    pub fn lpcd_check(
        &self,
        panchayat_id: &str,
        population: u64,
        total_supply_lpd: f64,
    ) -> LpcdCheck {
        let required = self.standards.lpcd_required;

        if population == 0 {
            return LpcdCheck {
                actual_lpcd: 0.0,
                required_lpcd: required,
                gap_lpd: 0.0,
            };
        }

        let actual = total_supply_lpd / population as f64;
        let gap = (required * population as f64 - total_supply_lpd).max(0.0);
        debug!(panchayat = %panchayat_id, actual_lpcd = actual, "LPCD check");

        LpcdCheck {
            actual_lpcd: round_dp(actual, 1),
            required_lpcd: required,
            gap_lpd: round_dp(gap, 0),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_and_functional_percentages() {
        let status = CoverageStatus::new("GP001", 620, 480, 430);
        assert_eq!(status.coverage_pct(), 77.4);
        assert_eq!(status.functional_pct(), 89.6);
        assert_eq!(status.gap(), 140);
    }

    #[test]
    fn test_zero_denominators_give_zero() {
        let status = CoverageStatus::new("GP000", 0, 0, 0);
        assert_eq!(status.coverage_pct(), 0.0);
        assert_eq!(status.functional_pct(), 0.0);
        assert_eq!(status.gap(), 0);
    }

    #[test]
    fn test_gap_clamps_when_provided_exceeds_total() {
        let status = CoverageStatus::new("GP009", 100, 120, 110);
        assert_eq!(status.gap(), 0);
    }

    #[test]
    fn test_update_replaces_previous_status() {
        let mut tracker = CoverageTracker::new();
        tracker.update(CoverageStatus::new("GP001", 500, 400, 350));
        tracker.update(CoverageStatus::new("GP001", 500, 450, 420));

        assert_eq!(tracker.all().len(), 1);
        assert_eq!(tracker.gap("GP001"), 50);
        assert_eq!(tracker.gap("GP404"), 0);
    }

    #[test]
    fn test_below_target() {
        let mut tracker = CoverageTracker::new();
        tracker.update(CoverageStatus::new("GP001", 500, 400, 350));
        tracker.update(CoverageStatus::new("GP002", 300, 300, 290));

        let below = tracker.below_default_target();
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].panchayat_id, "GP001");

        assert!(tracker.below_target(75.0).is_empty());
    }

    #[test]
    fn test_summary_is_unweighted_mean() {
        let mut tracker = CoverageTracker::new();
        tracker.update(CoverageStatus::new("GP001", 100, 50, 50)); // 50.0, 100.0
        tracker.update(CoverageStatus::new("GP002", 1000, 1000, 800)); // 100.0, 80.0

        let summary = tracker.summary();
        assert_eq!(summary.avg_coverage_pct, 75.0);
        assert_eq!(summary.avg_functional_pct, 90.0);
    }

    #[test]
    fn test_summary_counts_unconnected_panchayat_as_zero_functional() {
        let mut tracker = CoverageTracker::new();
        tracker.update(CoverageStatus::new("GP001", 100, 100, 90));
        tracker.update(CoverageStatus::new("GP002", 100, 0, 0));

        let summary = tracker.summary();
        assert_eq!(summary.avg_coverage_pct, 50.0);
        assert_eq!(summary.avg_functional_pct, 45.0);
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        let summary = CoverageTracker::new().summary();
        assert_eq!(summary.avg_coverage_pct, 0.0);
        assert_eq!(summary.avg_functional_pct, 0.0);
    }

    #[test]
    fn test_lpcd_check() {
        let tracker = CoverageTracker::new();

        let short = tracker.lpcd_check("GP001", 1000, 40_000.0);
        assert_eq!(short.actual_lpcd, 40.0);
        assert_eq!(short.required_lpcd, 55.0);
        assert_eq!(short.gap_lpd, 15_000.0);
        assert!(!short.meets_standard());

        let enough = tracker.lpcd_check("GP001", 1000, 60_000.0);
        assert_eq!(enough.gap_lpd, 0.0);
        assert!(enough.meets_standard());
    }

    #[test]
    fn test_lpcd_check_zero_population() {
        let check = CoverageTracker::new().lpcd_check("GP001", 0, 10_000.0);
        assert_eq!(check.actual_lpcd, 0.0);
        assert_eq!(check.gap_lpd, 0.0);
    }
}
