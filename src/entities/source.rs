// 🚰 Water Source Registry
// One record per source id, last write wins. Aggregates are computed on
// demand from whatever is currently registered.

use crate::round_dp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// SOURCE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Borewell,
    Handpump,
    OpenWell,
    River,
    Pond,
    Spring,
    Reservoir,
    /// Rooftop or surface rainwater harvesting structure
    Rainwater,
    /// Piped scheme fed from outside the panchayat
    Pipeline,
}

impl SourceType {
    pub const ALL: [SourceType; 9] = [
        SourceType::Borewell,
        SourceType::Handpump,
        SourceType::OpenWell,
        SourceType::River,
        SourceType::Pond,
        SourceType::Spring,
        SourceType::Reservoir,
        SourceType::Rainwater,
        SourceType::Pipeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Borewell => "borewell",
            SourceType::Handpump => "handpump",
            SourceType::OpenWell => "open_well",
            SourceType::River => "river",
            SourceType::Pond => "pond",
            SourceType::Spring => "spring",
            SourceType::Reservoir => "reservoir",
            SourceType::Rainwater => "rainwater",
            SourceType::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown source type: {}", s))
    }
}

// ============================================================================
// WATER SOURCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSource {
    pub id: String,
    pub panchayat_id: String,
    pub name: String,
    pub source_type: SourceType,

    pub latitude: f64,
    pub longitude: f64,

    /// Design capacity, litres/day
    pub capacity_lpd: f64,

    /// Measured yield, litres/day. May exceed capacity; not rejected.
    pub yield_lpd: f64,

    pub depth_m: f64,
    pub functional: bool,
    pub last_tested: Option<NaiveDate>,
}

impl WaterSource {
    pub fn new(
        id: impl Into<String>,
        panchayat_id: impl Into<String>,
        source_type: SourceType,
        capacity_lpd: f64,
        yield_lpd: f64,
    ) -> Self {
        WaterSource {
            id: id.into(),
            panchayat_id: panchayat_id.into(),
            name: String::new(),
            source_type,
            latitude: 0.0,
            longitude: 0.0,
            capacity_lpd,
            yield_lpd,
            depth_m: 0.0,
            functional: true,
            last_tested: None,
        }
    }

    /// Yield as a percentage of capacity, one decimal. Zero when capacity is zero.
    pub fn yield_pct(&self) -> f64 {
        if self.capacity_lpd == 0.0 {
            return 0.0;
        }
        round_dp(self.yield_lpd / self.capacity_lpd * 100.0, 1)
    }
}

// ============================================================================
// SOURCE REGISTRY
// ============================================================================

#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, WaterSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by source id.
    pub fn register(&mut self, source: WaterSource) {
        debug!(source = %source.id, panchayat = %source.panchayat_id, "registering water source");
        self.sources.insert(source.id.clone(), source);
    }

    pub fn get(&self, id: &str) -> Option<&WaterSource> {
        self.sources.get(id)
    }

    pub fn all(&self) -> Vec<&WaterSource> {
        self.sources.values().collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn by_panchayat(&self, panchayat_id: &str) -> Vec<&WaterSource> {
        self.sources
            .values()
            .filter(|s| s.panchayat_id == panchayat_id)
            .collect()
    }

    pub fn by_type(&self, source_type: SourceType) -> Vec<&WaterSource> {
        self.sources
            .values()
            .filter(|s| s.source_type == source_type)
            .collect()
    }

    pub fn functional(&self, panchayat_id: &str) -> Vec<&WaterSource> {
        self.by_panchayat(panchayat_id)
            .into_iter()
            .filter(|s| s.functional)
            .collect()
    }

    pub fn non_functional(&self, panchayat_id: &str) -> Vec<&WaterSource> {
        self.by_panchayat(panchayat_id)
            .into_iter()
            .filter(|s| !s.functional)
            .collect()
    }

    /// Sum of current yield over functional sources only, litres/day.
    pub fn total_supply(&self, panchayat_id: &str) -> f64 {
        self.functional(panchayat_id).iter().map(|s| s.yield_lpd).sum()
    }

    /// Functional sources yielding below `threshold_pct` of capacity.
    pub fn low_yield(&self, panchayat_id: &str, threshold_pct: f64) -> Vec<&WaterSource> {
        self.functional(panchayat_id)
            .into_iter()
            .filter(|s| s.yield_pct() < threshold_pct)
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
