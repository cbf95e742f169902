// 🌧️ Rainfall Analyzer - IMD deviation classes
// Monthly records accumulate (duplicates for the same month are summed);
// every figure is recomputed from the raw records on each query.

use crate::config::RainfallBands;
use crate::round_dp;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// READING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallReading {
    pub panchayat_id: String,
    /// 1..=12
    pub month: u32,
    pub year: i32,
    pub actual_mm: f64,
    /// Long-period average; 0.0 means no baseline
    pub normal_mm: f64,
}

impl RainfallReading {
    pub fn new(
        panchayat_id: impl Into<String>,
        month: u32,
        year: i32,
        actual_mm: f64,
        normal_mm: f64,
    ) -> Self {
        RainfallReading {
            panchayat_id: panchayat_id.into(),
            month,
            year,
            actual_mm,
            normal_mm,
        }
    }

    pub fn deviation_pct(&self) -> f64 {
        deviation_pct(self.actual_mm, self.normal_mm)
    }
}

/// Percent departure from normal, one decimal. Zero when there is no baseline.
pub fn deviation_pct(actual_mm: f64, normal_mm: f64) -> f64 {
    if normal_mm == 0.0 {
        return 0.0;
    }
    round_dp((actual_mm - normal_mm) / normal_mm * 100.0, 1)
}

// ============================================================================
// CLASSIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroughtRisk {
    SevereDrought,
    ModerateDrought,
    MildDrought,
    Normal,
}

impl DroughtRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroughtRisk::SevereDrought => "severe_drought",
            DroughtRisk::ModerateDrought => "moderate_drought",
            DroughtRisk::MildDrought => "mild_drought",
            DroughtRisk::Normal => "normal",
        }
    }
}

impl fmt::Display for DroughtRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloodRisk {
    #[serde(rename = "high_flood_risk")]
    High,
    #[serde(rename = "moderate_flood_risk")]
    Moderate,
    Normal,
}

impl FloodRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodRisk::High => "high_flood_risk",
            FloodRisk::Moderate => "moderate_flood_risk",
            FloodRisk::Normal => "normal",
        }
    }
}

impl fmt::Display for FloodRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// June-September totals against normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonsoonPerformance {
    pub actual_mm: f64,
    pub normal_mm: f64,
    pub deviation_pct: f64,
}

// ============================================================================
// ANALYZER
// ============================================================================

#[derive(Debug, Default)]
pub struct RainfallAnalyzer {
    records: Vec<RainfallReading>,
    bands: RainfallBands,
}

impl RainfallAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bands(bands: RainfallBands) -> Self {
        RainfallAnalyzer {
            records: Vec::new(),
            bands,
        }
    }

    pub fn add(&mut self, reading: RainfallReading) {
        debug!(
            panchayat = %reading.panchayat_id,
            month = reading.month,
            year = reading.year,
            "recording rainfall"
        );
        self.records.push(reading);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn for_year<'a>(
        &'a self,
        panchayat_id: &'a str,
        year: i32,
    ) -> impl Iterator<Item = &'a RainfallReading> + 'a {
        self.records
            .iter()
            .filter(move |r| r.panchayat_id == panchayat_id && r.year == year)
    }

    pub fn annual_total(&self, panchayat_id: &str, year: i32) -> f64 {
        self.for_year(panchayat_id, year).map(|r| r.actual_mm).sum()
    }

    pub fn annual_normal(&self, panchayat_id: &str, year: i32) -> f64 {
        self.for_year(panchayat_id, year).map(|r| r.normal_mm).sum()
    }

    pub fn annual_deviation_pct(&self, panchayat_id: &str, year: i32) -> f64 {
        deviation_pct(
            self.annual_total(panchayat_id, year),
            self.annual_normal(panchayat_id, year),
        )
    }

    pub fn classify_drought(&self, deviation_pct: f64) -> DroughtRisk {
        let b = &self.bands;
        if deviation_pct <= b.severe_drought_at_pct {
            DroughtRisk::SevereDrought
        } else if deviation_pct <= b.moderate_drought_at_pct {
            DroughtRisk::ModerateDrought
        } else if deviation_pct <= b.mild_drought_at_pct {
            DroughtRisk::MildDrought
        } else {
            DroughtRisk::Normal
        }
    }

    pub fn classify_flood(&self, deviation_pct: f64) -> FloodRisk {
        let b = &self.bands;
        if deviation_pct >= b.high_flood_at_pct {
            FloodRisk::High
        } else if deviation_pct >= b.moderate_flood_at_pct {
            FloodRisk::Moderate
        } else {
            FloodRisk::Normal
        }
    }

    pub fn drought_risk(&self, panchayat_id: &str, year: i32) -> DroughtRisk {
        self.classify_drought(self.annual_deviation_pct(panchayat_id, year))
    }

    pub fn flood_risk(&self, panchayat_id: &str, year: i32) -> FloodRisk {
        self.classify_flood(self.annual_deviation_pct(panchayat_id, year))
    }

    pub fn monsoon_performance(&self, panchayat_id: &str, year: i32) -> MonsoonPerformance {
        let months = self.bands.monsoon_first_month..=self.bands.monsoon_last_month;
        let (actual, normal) = self
            .for_year(panchayat_id, year)
            .filter(|r| months.contains(&r.month))
            .fold((0.0, 0.0), |(a, n), r| (a + r.actual_mm, n + r.normal_mm));

        MonsoonPerformance {
            actual_mm: round_dp(actual, 1),
            normal_mm: round_dp(normal, 1),
            deviation_pct: deviation_pct(actual, normal),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
