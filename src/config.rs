// ⚙️ Thresholds as Data
// Every cut-off the engine compares against lives here, so a jurisdiction
// can retune limits from a JSON file without touching classification logic.

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// BIS 10500:2012 DRINKING WATER LIMITS
// ============================================================================

/// Acceptable and permissible limits per parameter.
///
/// Breaching an acceptable limit alone is tolerated (grade ACCEPTABLE);
/// breaching a permissible limit marks the sample CONTAMINATED or HAZARDOUS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisLimits {
    pub ph_min: f64,
    pub ph_max: f64,
    /// Outside [ph_hazard_min, ph_hazard_max] the sample is hazardous.
    pub ph_hazard_min: f64,
    pub ph_hazard_max: f64,

    pub tds_acceptable: f64,
    pub tds_permissible: f64,

    pub turbidity_acceptable: f64,
    pub turbidity_permissible: f64,

    pub chloride_acceptable: f64,
    pub chloride_permissible: f64,

    pub fluoride_acceptable: f64,
    pub fluoride_permissible: f64,

    /// ppb, single-tier
    pub arsenic_max_ppb: f64,

    pub iron_acceptable: f64,
    pub iron_permissible: f64,

    /// ppm, single-tier
    pub nitrate_max: f64,
}

impl Default for BisLimits {
    fn default() -> Self {
        BisLimits {
            ph_min: 6.5,
            ph_max: 8.5,
            ph_hazard_min: 5.0,
            ph_hazard_max: 9.5,
            tds_acceptable: 500.0,
            tds_permissible: 2000.0,
            turbidity_acceptable: 1.0,
            turbidity_permissible: 5.0,
            chloride_acceptable: 250.0,
            chloride_permissible: 1000.0,
            fluoride_acceptable: 1.0,
            fluoride_permissible: 1.5,
            arsenic_max_ppb: 10.0,
            iron_acceptable: 0.3,
            iron_permissible: 1.0,
            nitrate_max: 45.0,
        }
    }
}

// ============================================================================
// SUPPLY & DEMAND STANDARDS (Jal Jeevan Mission)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyStandards {
    /// Litres per capita per day a household connection must deliver
    pub lpcd_required: f64,

    /// Litres per day per large-animal equivalent
    pub livestock_lpd: f64,

    /// Average seasonal irrigation depth
    pub irrigation_mm_per_hectare: f64,

    /// Spreads the seasonal irrigation volume over a daily figure
    pub days_per_year: f64,

    /// Functional sources yielding below this share of capacity are "low yield"
    pub low_yield_pct: f64,

    /// FHTC coverage target used by `below_target`
    pub coverage_target_pct: f64,
}

impl Default for SupplyStandards {
    fn default() -> Self {
        SupplyStandards {
            lpcd_required: 55.0,
            livestock_lpd: 30.0,
            irrigation_mm_per_hectare: 500.0,
            days_per_year: 365.0,
            low_yield_pct: 40.0,
            coverage_target_pct: 100.0,
        }
    }
}

// ============================================================================
// CGWB GROUNDWATER DEPTH BANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundwaterBands {
    pub very_shallow_below_m: f64,
    pub shallow_below_m: f64,
    pub moderate_below_m: f64,
    pub deep_below_m: f64,

    /// Pre- minus post-monsoon recovery (m) above which recharge is "high"
    pub recharge_high_above_m: f64,
    pub recharge_moderate_above_m: f64,

    /// Window used by `declining_trend` when the caller does not pass one
    pub trend_years: usize,
}

impl Default for GroundwaterBands {
    fn default() -> Self {
        GroundwaterBands {
            very_shallow_below_m: 2.0,
            shallow_below_m: 8.0,
            moderate_below_m: 20.0,
            deep_below_m: 40.0,
            recharge_high_above_m: 5.0,
            recharge_moderate_above_m: 2.0,
            trend_years: 3,
        }
    }
}

// ============================================================================
// IMD RAINFALL DEVIATION BANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainfallBands {
    pub severe_drought_at_pct: f64,
    pub moderate_drought_at_pct: f64,
    pub mild_drought_at_pct: f64,

    pub high_flood_at_pct: f64,
    pub moderate_flood_at_pct: f64,

    /// Inclusive calendar-month range of the south-west monsoon
    pub monsoon_first_month: u32,
    pub monsoon_last_month: u32,
}

impl Default for RainfallBands {
    fn default() -> Self {
        RainfallBands {
            severe_drought_at_pct: -60.0,
            moderate_drought_at_pct: -40.0,
            mild_drought_at_pct: -20.0,
            high_flood_at_pct: 60.0,
            moderate_flood_at_pct: 30.0,
            monsoon_first_month: 6,
            monsoon_last_month: 9,
        }
    }
}

// ============================================================================
// ALERT CUT-OFFS
// ============================================================================

/// Alerting is coarser than classification: a "mild_drought" year never
/// raises an alert, a "moderate_drought" one does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertCutoffs {
    /// Half the JJM standard
    pub lpcd_emergency_below: f64,
    pub lpcd_warning_below: f64,

    pub depth_critical_above_m: f64,
    pub depth_warning_from_m: f64,

    /// Year-on-year drop that raises a groundwater_trend warning
    pub depth_drop_warning_above_m: f64,

    pub drought_at_pct: f64,
    pub flood_at_pct: f64,
}

impl Default for AlertCutoffs {
    fn default() -> Self {
        AlertCutoffs {
            lpcd_emergency_below: 27.0,
            lpcd_warning_below: 55.0,
            depth_critical_above_m: 40.0,
            depth_warning_from_m: 20.0,
            depth_drop_warning_above_m: 2.0,
            drought_at_pct: -40.0,
            flood_at_pct: 60.0,
        }
    }
}

// ============================================================================
// THRESHOLDS (all tables together)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub bis: BisLimits,
    pub supply: SupplyStandards,
    pub groundwater: GroundwaterBands,
    pub rainfall: RainfallBands,
    pub alerts: AlertCutoffs,
}

impl Thresholds {
    /// Load overrides from a JSON file. Keys left out keep their published
    /// default, so `{"bis": {"fluoride_permissible": 1.2}}` is a valid file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read thresholds file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse thresholds file: {:?}", path.as_ref()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let thresholds: Thresholds =
            serde_json::from_str(content).context("Failed to parse thresholds JSON")?;
        Ok(thresholds)
    }
}

// ============================================================================
// TESTS
// ============================================================================
