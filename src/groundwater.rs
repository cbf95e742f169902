// 🌊 Groundwater Monitor - CGWB depth categories
// Seasonal depth-to-water-table readings accumulate per panchayat; trend and
// recharge are derived at query time. Larger depth = deeper = worse.

use crate::config::GroundwaterBands;
use crate::round_dp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// SEASON
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    PreMonsoon,
    Monsoon,
    PostMonsoon,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::PreMonsoon,
        Season::Monsoon,
        Season::PostMonsoon,
        Season::Winter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::PreMonsoon => "pre_monsoon",
            Season::Monsoon => "monsoon",
            Season::PostMonsoon => "post_monsoon",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::ALL
            .iter()
            .find(|season| season.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown season: {}", s))
    }
}

// ============================================================================
// READING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundwaterReading {
    pub panchayat_id: String,
    pub season: Season,
    pub year: i32,
    /// Metres below ground level
    pub depth_m: f64,
    /// Same season last year; 0.0 means unknown
    pub previous_year_depth_m: f64,
}

impl GroundwaterReading {
    pub fn new(panchayat_id: impl Into<String>, season: Season, year: i32, depth_m: f64) -> Self {
        GroundwaterReading {
            panchayat_id: panchayat_id.into(),
            season,
            year,
            depth_m,
            previous_year_depth_m: 0.0,
        }
    }

    pub fn with_previous(mut self, previous_year_depth_m: f64) -> Self {
        self.previous_year_depth_m = previous_year_depth_m;
        self
    }

    /// Positive when the water table dropped since last year.
    pub fn change_m(&self) -> f64 {
        round_dp(self.depth_m - self.previous_year_depth_m, 2)
    }

    pub fn is_declining(&self) -> bool {
        self.depth_m > self.previous_year_depth_m
    }
}

// ============================================================================
// CLASSIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthCategory {
    VeryShallow,
    Shallow,
    Moderate,
    Deep,
    VeryDeep,
}

impl DepthCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepthCategory::VeryShallow => "very_shallow",
            DepthCategory::Shallow => "shallow",
            DepthCategory::Moderate => "moderate",
            DepthCategory::Deep => "deep",
            DepthCategory::VeryDeep => "very_deep",
        }
    }
}

impl fmt::Display for DepthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RechargePotential {
    High,
    Moderate,
    Low,
    Negligible,
    InsufficientData,
}

impl RechargePotential {
    pub fn as_str(&self) -> &'static str {
        match self {
            RechargePotential::High => "high",
            RechargePotential::Moderate => "moderate",
            RechargePotential::Low => "low",
            RechargePotential::Negligible => "negligible",
            RechargePotential::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for RechargePotential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MONITOR
// ============================================================================

#[derive(Debug, Default)]
pub struct GroundwaterMonitor {
    readings: HashMap<String, Vec<GroundwaterReading>>,
    bands: GroundwaterBands,
}

impl GroundwaterMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bands(bands: GroundwaterBands) -> Self {
        GroundwaterMonitor {
            readings: HashMap::new(),
            bands,
        }
    }

    /// Append to the panchayat's history. Nothing is overwritten.
    pub fn add(&mut self, reading: GroundwaterReading) {
        debug!(
            panchayat = %reading.panchayat_id,
            season = %reading.season,
            year = reading.year,
            "recording groundwater level"
        );
        self.readings
            .entry(reading.panchayat_id.clone())
            .or_default()
            .push(reading);
    }

    fn history(&self, panchayat_id: &str) -> &[GroundwaterReading] {
        self.readings
            .get(panchayat_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// History sorted by year, then by season *label* (alphabetical:
    /// monsoon < post_monsoon < pre_monsoon < winter), not calendar order.
    pub fn by_panchayat(&self, panchayat_id: &str) -> Vec<&GroundwaterReading> {
        let mut records: Vec<&GroundwaterReading> = self.history(panchayat_id).iter().collect();
        records.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| a.season.as_str().cmp(b.season.as_str()))
        });
        records
    }

    /// Last element of `by_panchayat`.
    pub fn latest(&self, panchayat_id: &str) -> Option<&GroundwaterReading> {
        self.by_panchayat(panchayat_id).pop()
    }

    /// True when the most recent `years` pre-monsoon depths strictly increase.
    /// Needs at least two pre-monsoon readings.
    pub fn declining_trend(&self, panchayat_id: &str, years: usize) -> bool {
        let mut pre: Vec<&GroundwaterReading> = self
            .history(panchayat_id)
            .iter()
            .filter(|r| r.season == Season::PreMonsoon)
            .collect();
        pre.sort_by_key(|r| r.year);

        let recent = &pre[pre.len().saturating_sub(years)..];
        if recent.len() < 2 {
            return false;
        }

        recent.windows(2).all(|w| w[1].depth_m > w[0].depth_m)
    }

    /// `declining_trend` over the configured window (3 years by default).
    pub fn declining_trend_default(&self, panchayat_id: &str) -> bool {
        self.declining_trend(panchayat_id, self.bands.trend_years)
    }

    pub fn categorize(&self, depth_m: f64) -> DepthCategory {
        let b = &self.bands;
        if depth_m < b.very_shallow_below_m {
            DepthCategory::VeryShallow
        } else if depth_m < b.shallow_below_m {
            DepthCategory::Shallow
        } else if depth_m < b.moderate_below_m {
            DepthCategory::Moderate
        } else if depth_m < b.deep_below_m {
            DepthCategory::Deep
        } else {
            DepthCategory::VeryDeep
        }
    }

    /// Monsoon recovery (pre- minus post-monsoon depth) for the most recent
    /// year that has both readings.
    pub fn recharge_potential(&self, panchayat_id: &str) -> RechargePotential {
        let history = self.history(panchayat_id);

        let first_of = |season: Season, year: i32| {
            history
                .iter()
                .find(|r| r.season == season && r.year == year)
        };

        let paired_year = history
            .iter()
            .filter(|r| r.season == Season::PreMonsoon)
            .map(|r| r.year)
            .filter(|&year| first_of(Season::PostMonsoon, year).is_some())
            .max();

        let Some(year) = paired_year else {
            return RechargePotential::InsufficientData;
        };
        let (Some(pre), Some(post)) = (
            first_of(Season::PreMonsoon, year),
            first_of(Season::PostMonsoon, year),
        ) else {
            return RechargePotential::InsufficientData;
        };

        let recovery = pre.depth_m - post.depth_m;
        let b = &self.bands;
        if recovery > b.recharge_high_above_m {
            RechargePotential::High
        } else if recovery > b.recharge_moderate_above_m {
            RechargePotential::Moderate
        } else if recovery > 0.0 {
            RechargePotential::Low
        } else {
            RechargePotential::Negligible
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pre(year: i32, depth: f64) -> GroundwaterReading {
        GroundwaterReading::new("GP001", Season::PreMonsoon, year, depth)
    }

    fn post(year: i32, depth: f64) -> GroundwaterReading {
        GroundwaterReading::new("GP001", Season::PostMonsoon, year, depth)
    }

    #[test]
    fn test_declining_trend_three_years() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(pre(2022, 11.5));
        monitor.add(pre(2023, 13.8));
        monitor.add(pre(2024, 16.1));

        assert!(monitor.declining_trend("GP001", 3));
        assert!(monitor.declining_trend_default("GP001"));
    }

    #[test]
    fn test_declining_trend_uses_year_order_not_insertion_order() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(pre(2024, 16.1));
        monitor.add(pre(2022, 11.5));
        monitor.add(pre(2023, 13.8));

        assert!(monitor.declining_trend("GP001", 3));
    }

    #[test]
    fn test_recovering_water_table_is_not_declining() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(pre(2022, 11.5));
        monitor.add(pre(2023, 10.0));
        monitor.add(pre(2024, 16.1));

        assert!(!monitor.declining_trend("GP001", 3));
        // Only the last two count with a 2-year window
        assert!(monitor.declining_trend("GP001", 2));
    }

    #[test]
    fn test_equal_depths_are_not_strictly_declining() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(pre(2023, 12.0));
        monitor.add(pre(2024, 12.0));
        assert!(!monitor.declining_trend("GP001", 3));
    }

    #[test]
    fn test_declining_trend_needs_two_pre_monsoon_readings() {
        let mut monitor = GroundwaterMonitor::new();
        assert!(!monitor.declining_trend("GP001", 3));

        monitor.add(pre(2024, 16.1));
        monitor.add(post(2024, 5.0));
        monitor.add(GroundwaterReading::new("GP001", Season::Winter, 2024, 30.0));
        assert!(!monitor.declining_trend("GP001", 3));
    }

    #[test]
    fn test_by_panchayat_sorts_seasons_alphabetically() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(GroundwaterReading::new("GP001", Season::Winter, 2024, 9.0));
        monitor.add(pre(2024, 12.0));
        monitor.add(post(2024, 6.0));
        monitor.add(GroundwaterReading::new("GP001", Season::Monsoon, 2024, 4.0));
        monitor.add(pre(2023, 11.0));

        let seasons: Vec<(i32, Season)> = monitor
            .by_panchayat("GP001")
            .iter()
            .map(|r| (r.year, r.season))
            .collect();
        assert_eq!(
            seasons,
            vec![
                (2023, Season::PreMonsoon),
                (2024, Season::Monsoon),
                (2024, Season::PostMonsoon),
                (2024, Season::PreMonsoon),
                (2024, Season::Winter),
            ]
        );
        assert_eq!(monitor.latest("GP001").unwrap().season, Season::Winter);
    }

    #[test]
    fn test_latest_of_unknown_panchayat_is_none() {
        assert!(GroundwaterMonitor::new().latest("GP404").is_none());
    }

    #[test]
    fn test_categorize_bands() {
        let monitor = GroundwaterMonitor::new();
        assert_eq!(monitor.categorize(1.9), DepthCategory::VeryShallow);
        assert_eq!(monitor.categorize(2.0), DepthCategory::Shallow);
        assert_eq!(monitor.categorize(7.99), DepthCategory::Shallow);
        assert_eq!(monitor.categorize(8.0), DepthCategory::Moderate);
        assert_eq!(monitor.categorize(20.0), DepthCategory::Deep);
        assert_eq!(monitor.categorize(39.9), DepthCategory::Deep);
        assert_eq!(monitor.categorize(40.0), DepthCategory::VeryDeep);
    }

    #[test]
    fn test_recharge_potential_bands() {
        let cases = [
            (12.0, 6.0, RechargePotential::High),
            (12.0, 9.0, RechargePotential::Moderate),
            (12.0, 10.0, RechargePotential::Low),
            (12.0, 12.0, RechargePotential::Negligible),
            (12.0, 13.0, RechargePotential::Negligible),
        ];
        for (pre_depth, post_depth, expected) in cases {
            let mut monitor = GroundwaterMonitor::new();
            monitor.add(pre(2024, pre_depth));
            monitor.add(post(2024, post_depth));
            assert_eq!(
                monitor.recharge_potential("GP001"),
                expected,
                "pre {} post {}",
                pre_depth,
                post_depth
            );
        }
    }

    #[test]
    fn test_recharge_uses_most_recent_paired_year() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(pre(2023, 12.0));
        monitor.add(post(2023, 5.0));
        monitor.add(pre(2024, 14.0)); // no post-monsoon yet

        assert_eq!(monitor.recharge_potential("GP001"), RechargePotential::High);
    }

    #[test]
    fn test_recharge_without_pair_is_insufficient() {
        let mut monitor = GroundwaterMonitor::new();
        assert_eq!(monitor.recharge_potential("GP001"), RechargePotential::InsufficientData);

        monitor.add(pre(2023, 12.0));
        monitor.add(post(2024, 5.0));
        assert_eq!(monitor.recharge_potential("GP001"), RechargePotential::InsufficientData);
    }

    #[test]
    fn test_change_and_declining() {
        let reading = pre(2024, 16.1).with_previous(13.8);
        assert_eq!(reading.change_m(), 2.3);
        assert!(reading.is_declining());

        let rising = pre(2024, 10.0).with_previous(12.5);
        assert_eq!(rising.change_m(), -2.5);
        assert!(!rising.is_declining());
    }

    #[test]
    fn test_histories_are_kept_per_panchayat() {
        let mut monitor = GroundwaterMonitor::new();
        monitor.add(pre(2023, 10.0));
        monitor.add(GroundwaterReading::new("GP002", Season::PreMonsoon, 2024, 20.0));

        assert_eq!(monitor.by_panchayat("GP001").len(), 1);
        assert_eq!(monitor.by_panchayat("GP002").len(), 1);
        assert!(!monitor.declining_trend("GP001", 3));
    }
}
