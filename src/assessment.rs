// 🧭 Panchayat Assessment
// One pass over every unit for a single panchayat: supply, coverage, quality,
// groundwater and rainfall, with all alerts collected and prioritized.

use crate::alerts::{prioritize, Alert, AlertEngine};
use crate::config::Thresholds;
use crate::entities::{CoverageTracker, LpcdCheck, SourceRegistry};
use crate::groundwater::{DepthCategory, GroundwaterMonitor, RechargePotential};
use crate::quality::{Grade, QualityGrader, QualitySample};
use crate::rainfall::{DroughtRisk, FloodRisk, RainfallAnalyzer};
use serde::Serialize;
use tracing::info;

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleGrade {
    pub source_id: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub panchayat_id: String,
    pub year: i32,

    // Supply
    pub total_supply_lpd: f64,
    pub functional_sources: usize,
    pub non_functional_sources: usize,
    pub low_yield_sources: Vec<String>,
    pub lpcd: LpcdCheck,

    // Coverage (None when the panchayat is not tracked)
    pub coverage_pct: Option<f64>,
    pub functional_pct: Option<f64>,
    pub households_without_tap: u64,

    // Quality
    pub sample_grades: Vec<SampleGrade>,
    pub worst_grade: Option<Grade>,

    // Groundwater
    pub latest_depth_m: Option<f64>,
    pub depth_category: Option<DepthCategory>,
    pub declining_trend: bool,
    pub recharge_potential: RechargePotential,

    // Rainfall
    pub rainfall_deviation_pct: f64,
    pub drought_risk: DroughtRisk,
    pub flood_risk: FloodRisk,

    /// Most severe first
    pub alerts: Vec<Alert>,
}

impl AssessmentReport {
    pub fn has_emergency(&self) -> bool {
        self.alerts
            .iter()
            .any(|a| a.level == crate::alerts::AlertLevel::Emergency)
    }
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// Read-only view over the registries plus the engines that score them.
/// The alert engine lives here, so alert ids keep counting across runs.
pub struct Assessment<'a> {
    sources: &'a SourceRegistry,
    coverage: &'a CoverageTracker,
    groundwater: &'a GroundwaterMonitor,
    rainfall: &'a RainfallAnalyzer,
    grader: QualityGrader,
    engine: AlertEngine,
    low_yield_pct: f64,
}

impl<'a> Assessment<'a> {
    pub fn new(
        sources: &'a SourceRegistry,
        coverage: &'a CoverageTracker,
        groundwater: &'a GroundwaterMonitor,
        rainfall: &'a RainfallAnalyzer,
    ) -> Self {
        Self::with_thresholds(sources, coverage, groundwater, rainfall, &Thresholds::default())
    }

    pub fn with_thresholds(
        sources: &'a SourceRegistry,
        coverage: &'a CoverageTracker,
        groundwater: &'a GroundwaterMonitor,
        rainfall: &'a RainfallAnalyzer,
        thresholds: &Thresholds,
    ) -> Self {
        Assessment {
            sources,
            coverage,
            groundwater,
            rainfall,
            grader: QualityGrader::with_limits(thresholds.bis.clone()),
            engine: AlertEngine::with_config(thresholds.alerts.clone(), thresholds.bis.clone()),
            low_yield_pct: thresholds.supply.low_yield_pct,
        }
    }

    /// Assess one panchayat. `samples` are taken to belong to it; alerts for
    /// them carry `panchayat_id`.
    pub fn run(
        &mut self,
        panchayat_id: &str,
        population: u64,
        year: i32,
        samples: &[QualitySample],
    ) -> AssessmentReport {
        let mut alerts = Vec::new();

        // Supply
        let total_supply_lpd = self.sources.total_supply(panchayat_id);
        let lpcd = self.coverage.lpcd_check(panchayat_id, population, total_supply_lpd);
        alerts.extend(self.engine.check_supply_for(panchayat_id, population, total_supply_lpd));

        let low_yield_sources = self
            .sources
            .low_yield(panchayat_id, self.low_yield_pct)
            .into_iter()
            .map(|s| s.id.clone())
            .collect();

        // Coverage
        let status = self.coverage.get(panchayat_id);

        // Quality
        let sample_grades: Vec<SampleGrade> = samples
            .iter()
            .map(|s| SampleGrade {
                source_id: s.source_id.clone(),
                grade: self.grader.grade(s),
            })
            .collect();
        let worst_grade = sample_grades.iter().map(|g| g.grade).max();
        for sample in samples {
            alerts.extend(self.engine.check_quality_for(panchayat_id, sample));
        }

        // Groundwater
        let latest = self.groundwater.latest(panchayat_id);
        if let Some(reading) = latest {
            alerts.extend(self.engine.check_groundwater(reading));
        }

        // Rainfall
        let rainfall_deviation_pct = self.rainfall.annual_deviation_pct(panchayat_id, year);
        alerts.extend(self.engine.check_rainfall(panchayat_id, rainfall_deviation_pct));

        let alerts = prioritize(alerts);
        info!(
            panchayat = %panchayat_id,
            year,
            alerts = alerts.len(),
            "assessment complete"
        );

        AssessmentReport {
            panchayat_id: panchayat_id.to_string(),
            year,
            total_supply_lpd,
            functional_sources: self.sources.functional(panchayat_id).len(),
            non_functional_sources: self.sources.non_functional(panchayat_id).len(),
            low_yield_sources,
            lpcd,
            coverage_pct: status.map(|s| s.coverage_pct()),
            functional_pct: status.map(|s| s.functional_pct()),
            households_without_tap: self.coverage.gap(panchayat_id),
            sample_grades,
            worst_grade,
            latest_depth_m: latest.map(|r| r.depth_m),
            depth_category: latest.map(|r| self.groundwater.categorize(r.depth_m)),
            declining_trend: self.groundwater.declining_trend_default(panchayat_id),
            recharge_potential: self.groundwater.recharge_potential(panchayat_id),
            rainfall_deviation_pct,
            drought_risk: self.rainfall.classify_drought(rainfall_deviation_pct),
            flood_risk: self.rainfall.classify_flood(rainfall_deviation_pct),
            alerts,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertCategory, AlertLevel};
    use crate::entities::{CoverageStatus, SourceType, WaterSource};
    use crate::groundwater::{GroundwaterReading, Season};
    use crate::rainfall::RainfallReading;
    use chrono::NaiveDate;

    struct Fixture {
        sources: SourceRegistry,
        coverage: CoverageTracker,
        groundwater: GroundwaterMonitor,
        rainfall: RainfallAnalyzer,
    }

    fn fixture() -> Fixture {
        let mut sources = SourceRegistry::new();
        sources.register(WaterSource::new(
            "SRC001",
            "GP001",
            SourceType::Borewell,
            10_000.0,
            7_000.0,
        ));
        sources.register(WaterSource::new("SRC002", "GP001", SourceType::Handpump, 2_000.0, 500.0));
        let mut broken = WaterSource::new(
            "SRC003",
            "GP001",
            SourceType::OpenWell,
            5_000.0,
            4_000.0,
        );
        broken.functional = false;
        sources.register(broken);

        let mut coverage = CoverageTracker::new();
        coverage.update(CoverageStatus::new("GP001", 620, 480, 430));

        let mut groundwater = GroundwaterMonitor::new();
        groundwater.add(
            GroundwaterReading::new("GP001", Season::PreMonsoon, 2024, 14.0).with_previous(12.0),
        );
        groundwater.add(GroundwaterReading::new("GP001", Season::PostMonsoon, 2024, 8.0));

        let mut rainfall = RainfallAnalyzer::new();
        rainfall.add(RainfallReading::new("GP001", 7, 2024, 120.0, 250.0));
        rainfall.add(RainfallReading::new("GP001", 8, 2024, 150.0, 300.0));

        Fixture {
            sources,
            coverage,
            groundwater,
            rainfall,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_assessment_collects_metrics() {
        let f = fixture();
        let mut assessment = Assessment::new(&f.sources, &f.coverage, &f.groundwater, &f.rainfall);
        let report = assessment.run("GP001", 200, 2024, &[]);

        assert_eq!(report.total_supply_lpd, 7_500.0);
        assert_eq!(report.functional_sources, 2);
        assert_eq!(report.non_functional_sources, 1);
        assert_eq!(report.low_yield_sources, vec!["SRC002".to_string()]);
        assert_eq!(report.lpcd.actual_lpcd, 37.5);
        assert_eq!(report.coverage_pct, Some(77.4));
        assert_eq!(report.households_without_tap, 140);
        // Same-year ties break on the season label, so pre_monsoon sorts last
        assert_eq!(report.latest_depth_m, Some(14.0));
        assert_eq!(report.depth_category, Some(DepthCategory::Moderate));
        assert_eq!(report.recharge_potential, RechargePotential::High);
        // 270 / 550 = -50.9%
        assert_eq!(report.rainfall_deviation_pct, -50.9);
        assert_eq!(report.drought_risk, DroughtRisk::ModerateDrought);
        assert_eq!(report.worst_grade, None);
    }

    #[test]
    fn test_alerts_are_prioritized() {
        let f = fixture();
        let mut assessment = Assessment::new(&f.sources, &f.coverage, &f.groundwater, &f.rainfall);
        let hazardous = QualitySample {
            arsenic_ppb: 25.0,
            ..QualitySample::new("SRC001", date(), 7.0, 300.0, 0.5)
        };
        let report = assessment.run("GP001", 200, 2024, &[hazardous]);

        let levels: Vec<AlertLevel> = report.alerts.iter().map(|a| a.level).collect();
        let mut sorted = levels.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(levels, sorted, "alerts must be most severe first");

        assert_eq!(report.alerts[0].level, AlertLevel::Emergency);
        assert!(report.has_emergency());
        assert_eq!(report.worst_grade, Some(Grade::Hazardous));
        assert!(report
            .alerts
            .iter()
            .any(|a| a.category == AlertCategory::Drought && a.level == AlertLevel::Critical));
        assert!(report
            .alerts
            .iter()
            .any(|a| a.category == AlertCategory::Supply && a.level == AlertLevel::Warning));
        assert!(report.alerts.iter().all(|a| a.panchayat_id == "GP001"));
    }

    #[test]
    fn test_alert_ids_continue_across_runs() {
        let f = fixture();
        let mut assessment = Assessment::new(&f.sources, &f.coverage, &f.groundwater, &f.rainfall);
        let first = assessment.run("GP001", 200, 2024, &[]);
        let second = assessment.run("GP001", 200, 2024, &[]);

        let mut ids: Vec<&str> = first
            .alerts
            .iter()
            .chain(second.alerts.iter())
            .map(|a| a.id.as_str())
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total, "alert ids must be unique");
    }

    #[test]
    fn test_untracked_panchayat_is_empty_not_an_error() {
        let f = fixture();
        let mut assessment = Assessment::new(&f.sources, &f.coverage, &f.groundwater, &f.rainfall);
        let report = assessment.run("GP999", 0, 2024, &[]);

        assert_eq!(report.total_supply_lpd, 0.0);
        assert_eq!(report.coverage_pct, None);
        assert_eq!(report.depth_category, None);
        assert_eq!(report.recharge_potential, RechargePotential::InsufficientData);
        assert_eq!(report.drought_risk, DroughtRisk::Normal);
        assert!(report.alerts.is_empty());
    }
}
