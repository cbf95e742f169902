// 🚨 Alert Engine
// Maps graded samples, readings and supply figures onto severity-ranked alerts.
// The only state is the id counter: ids are ALERT-0001, ALERT-0002, ... per
// engine instance and are never reused.

use crate::config::{AlertCutoffs, BisLimits};
use crate::groundwater::GroundwaterReading;
use crate::quality::{Grade, QualityGrader, QualitySample};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

// ============================================================================
// ALERT LEVEL & CATEGORY
// ============================================================================

/// Four-level ordinal: Info < Warning < Critical < Emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
            AlertLevel::Emergency => "emergency",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    WaterQuality,
    Groundwater,
    GroundwaterTrend,
    Supply,
    Drought,
    Flood,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::WaterQuality => "water_quality",
            AlertCategory::Groundwater => "groundwater",
            AlertCategory::GroundwaterTrend => "groundwater_trend",
            AlertCategory::Supply => "supply",
            AlertCategory::Drought => "drought",
            AlertCategory::Flood => "flood",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ALERT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    /// Empty when the triggering input carries no panchayat (quality, supply)
    pub panchayat_id: String,
    pub level: AlertLevel,
    pub category: AlertCategory,
    pub message: String,
    pub source_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub active: bool,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.id,
            self.level.as_str().to_uppercase(),
            self.category,
            self.message
        )
    }
}

/// Most severe first. Alerts of equal level keep their emission order.
pub fn prioritize(mut alerts: Vec<Alert>) -> Vec<Alert> {
    alerts.sort_by(|a, b| b.level.cmp(&a.level));
    alerts
}

// ============================================================================
// ALERT ENGINE
// ============================================================================

pub struct AlertEngine {
    issued: u32,
    cutoffs: AlertCutoffs,
    grader: QualityGrader,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::with_config(AlertCutoffs::default(), BisLimits::default())
    }

    pub fn with_config(cutoffs: AlertCutoffs, limits: BisLimits) -> Self {
        AlertEngine {
            issued: 0,
            cutoffs,
            grader: QualityGrader::with_limits(limits),
        }
    }

    /// Number of alerts created so far by this engine.
    pub fn issued(&self) -> u32 {
        self.issued
    }

    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("ALERT-{:04}", self.issued)
    }

    fn raise(
        &mut self,
        panchayat_id: &str,
        level: AlertLevel,
        category: AlertCategory,
        message: String,
    ) -> Alert {
        let alert = Alert {
            id: self.next_id(),
            panchayat_id: panchayat_id.to_string(),
            level,
            category,
            message,
            source_id: None,
            date: None,
            active: true,
        };

        if alert.level >= AlertLevel::Warning {
            info!(
                id = %alert.id,
                level = %alert.level,
                category = %alert.category,
                "{}",
                alert.message
            );
        } else {
            debug!(id = %alert.id, category = %alert.category, "{}", alert.message);
        }
        alert
    }

    // ========================================================================
    // CHECKS
    // ========================================================================

    /// HAZARDOUS -> emergency, CONTAMINATED -> warning, otherwise nothing.
    pub fn check_quality(&mut self, sample: &QualitySample) -> Vec<Alert> {
        self.check_quality_for("", sample)
    }

    /// `check_quality` with the owning panchayat filled in.
    pub fn check_quality_for(&mut self, panchayat_id: &str, sample: &QualitySample) -> Vec<Alert> {
        let (level, message) = match self.grader.grade(sample) {
            Grade::Hazardous => (
                AlertLevel::Emergency,
                format!(
                    "HAZARDOUS water quality at source {}. Do NOT consume.",
                    sample.source_id
                ),
            ),
            Grade::Contaminated => (
                AlertLevel::Warning,
                format!(
                    "Contaminated water at source {}. Treatment required.",
                    sample.source_id
                ),
            ),
            Grade::Safe | Grade::Acceptable => return Vec::new(),
        };

        let mut alert = self.raise(panchayat_id, level, AlertCategory::WaterQuality, message);
        alert.source_id = Some(sample.source_id.clone());
        alert.date = Some(sample.date);
        vec![alert]
    }

    /// Up to two alerts: one for absolute depth, one for the year-on-year drop.
    pub fn check_groundwater(&mut self, reading: &GroundwaterReading) -> Vec<Alert> {
        let c = self.cutoffs.clone();
        let mut alerts = Vec::new();
        let pid = reading.panchayat_id.as_str();

        if reading.depth_m > c.depth_critical_above_m {
            alerts.push(self.raise(
                pid,
                AlertLevel::Critical,
                AlertCategory::Groundwater,
                format!(
                    "Groundwater critically deep: {}m. Immediate conservation needed.",
                    reading.depth_m
                ),
            ));
        } else if reading.depth_m >= c.depth_warning_from_m {
            alerts.push(self.raise(
                pid,
                AlertLevel::Warning,
                AlertCategory::Groundwater,
                format!("Groundwater declining: {}m depth.", reading.depth_m),
            ));
        }

        if reading.is_declining() && reading.change_m() > c.depth_drop_warning_above_m {
            alerts.push(self.raise(
                pid,
                AlertLevel::Warning,
                AlertCategory::GroundwaterTrend,
                format!("Groundwater dropped {}m from last year.", reading.change_m()),
            ));
        }

        alerts
    }

    /// Per-capita supply check. No population means LPCD is undefined: no alert.
    pub fn check_supply(&mut self, population: u64, total_supply_lpd: f64) -> Vec<Alert> {
        self.check_supply_for("", population, total_supply_lpd)
    }

    pub fn check_supply_for(
        &mut self,
        panchayat_id: &str,
        population: u64,
        total_supply_lpd: f64,
    ) -> Vec<Alert> {
        if population == 0 {
            return Vec::new();
        }

        let lpcd = total_supply_lpd / population as f64;
        let standard = self.cutoffs.lpcd_warning_below;

        let alert = if lpcd < self.cutoffs.lpcd_emergency_below {
            self.raise(
                panchayat_id,
                AlertLevel::Emergency,
                AlertCategory::Supply,
                format!(
                    "Severe water scarcity: only {:.0} LPCD (need {:.0}).",
                    lpcd, standard
                ),
            )
        } else if lpcd < standard {
            self.raise(
                panchayat_id,
                AlertLevel::Warning,
                AlertCategory::Supply,
                format!(
                    "Water supply below JJM standard: {:.0} LPCD (need {:.0}).",
                    lpcd, standard
                ),
            )
        } else {
            return Vec::new();
        };

        vec![alert]
    }

    /// Coarser than the IMD classification: only moderate drought or worse
    /// and high flood risk raise an alert.
    pub fn check_rainfall(&mut self, panchayat_id: &str, deviation_pct: f64) -> Vec<Alert> {
        if deviation_pct <= self.cutoffs.drought_at_pct {
            vec![self.raise(
                panchayat_id,
                AlertLevel::Critical,
                AlertCategory::Drought,
                format!(
                    "Drought conditions: rainfall {:.0}% below normal.",
                    deviation_pct.abs()
                ),
            )]
        } else if deviation_pct >= self.cutoffs.flood_at_pct {
            vec![self.raise(
                panchayat_id,
                AlertLevel::Critical,
                AlertCategory::Flood,
                format!("Flood risk: rainfall {:.0}% above normal.", deviation_pct),
            )]
        } else {
            Vec::new()
        }
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
