// 💧 Water Quality Grading - BIS 10500:2012
// Two-tier flag system: a sample is flagged hazardous and/or contaminated by
// scanning every parameter, then the worst flag decides the grade.

use crate::config::BisLimits;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// GRADE
// ============================================================================

/// Totally ordered: Safe < Acceptable < Contaminated < Hazardous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// Every parameter within the acceptable band
    Safe,
    /// Within permissible limits, outside at least one acceptable limit
    Acceptable,
    Contaminated,
    Hazardous,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Safe => "safe",
            Grade::Acceptable => "acceptable",
            Grade::Contaminated => "contaminated",
            Grade::Hazardous => "hazardous",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Tds,
    Turbidity,
    Chloride,
    Fluoride,
    Arsenic,
    Iron,
    Nitrate,
    Coliform,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Tds => "TDS",
            Parameter::Turbidity => "Turbidity",
            Parameter::Chloride => "Chloride",
            Parameter::Fluoride => "Fluoride",
            Parameter::Arsenic => "Arsenic",
            Parameter::Iron => "Iron",
            Parameter::Nitrate => "Nitrate",
            Parameter::Coliform => "Coliform",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Ph | Parameter::Coliform => "",
            Parameter::Turbidity => "NTU",
            Parameter::Arsenic => "ppb",
            _ => "ppm",
        }
    }
}

// ============================================================================
// SAMPLE
// ============================================================================

/// One laboratory or field-kit test of a water source.
///
/// Optional parameters (chloride through nitrate) default to zero, which is
/// indistinguishable from "measured zero": an untested parameter never flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub report_id: String,
    pub source_id: String,
    pub date: NaiveDate,

    pub ph: f64,
    pub tds_ppm: f64,
    pub turbidity_ntu: f64,
    pub chloride_ppm: f64,
    pub fluoride_ppm: f64,
    pub arsenic_ppb: f64,
    pub iron_ppm: f64,
    pub nitrate_ppm: f64,
    pub coliform_present: bool,

    /// Grade written by whoever filed the report. Advisory only; the grader
    /// always recomputes.
    pub reported_grade: Option<Grade>,
}

impl QualitySample {
    /// Sample with the three mandatory field measurements; everything else zero.
    pub fn new(
        source_id: impl Into<String>,
        date: NaiveDate,
        ph: f64,
        tds_ppm: f64,
        turbidity_ntu: f64,
    ) -> Self {
        QualitySample {
            report_id: String::new(),
            source_id: source_id.into(),
            date,
            ph,
            tds_ppm,
            turbidity_ntu,
            chloride_ppm: 0.0,
            fluoride_ppm: 0.0,
            arsenic_ppb: 0.0,
            iron_ppm: 0.0,
            nitrate_ppm: 0.0,
            coliform_present: false,
            reported_grade: None,
        }
    }
}

// ============================================================================
// TIER BREACHES
// ============================================================================

/// Parameters that tripped each flag. Both lists are always fully
/// evaluated, so a sample can appear in both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierBreaches {
    pub hazardous: Vec<Parameter>,
    pub contaminated: Vec<Parameter>,
}

impl TierBreaches {
    pub fn is_hazardous(&self) -> bool {
        !self.hazardous.is_empty()
    }

    pub fn is_contaminated(&self) -> bool {
        !self.contaminated.is_empty()
    }
}

// ============================================================================
// GRADER
// ============================================================================

pub struct QualityGrader {
    limits: BisLimits,
}

impl QualityGrader {
    pub fn new() -> Self {
        Self::with_limits(BisLimits::default())
    }

    pub fn with_limits(limits: BisLimits) -> Self {
        QualityGrader { limits }
    }

    pub fn limits(&self) -> &BisLimits {
        &self.limits
    }

    /// Evaluate both flags over every parameter.
    pub fn breaches(&self, s: &QualitySample) -> TierBreaches {
        let l = &self.limits;
        let mut out = TierBreaches::default();

        // Permissible tier exceeded -> hazardous
        if s.ph < l.ph_hazard_min || s.ph > l.ph_hazard_max {
            out.hazardous.push(Parameter::Ph);
        }
        if s.tds_ppm > l.tds_permissible {
            out.hazardous.push(Parameter::Tds);
        }
        if s.fluoride_ppm > l.fluoride_permissible {
            out.hazardous.push(Parameter::Fluoride);
        }
        if s.arsenic_ppb > l.arsenic_max_ppb {
            out.hazardous.push(Parameter::Arsenic);
        }
        if s.nitrate_ppm > l.nitrate_max {
            out.hazardous.push(Parameter::Nitrate);
        }
        if s.coliform_present {
            out.hazardous.push(Parameter::Coliform);
        }

        // Between acceptable and permissible -> contaminated
        if s.ph < l.ph_min || s.ph > l.ph_max {
            out.contaminated.push(Parameter::Ph);
        }
        if s.tds_ppm > l.tds_acceptable && s.tds_ppm <= l.tds_permissible {
            out.contaminated.push(Parameter::Tds);
        }
        if s.turbidity_ntu > l.turbidity_permissible {
            out.contaminated.push(Parameter::Turbidity);
        }
        if s.fluoride_ppm > l.fluoride_acceptable && s.fluoride_ppm <= l.fluoride_permissible {
            out.contaminated.push(Parameter::Fluoride);
        }
        if s.iron_ppm > l.iron_permissible {
            out.contaminated.push(Parameter::Iron);
        }

        out
    }

    /// Authoritative grade for a sample. Hazardous overrides contaminated.
    pub fn grade(&self, sample: &QualitySample) -> Grade {
        let breaches = self.breaches(sample);

        let grade = if breaches.is_hazardous() {
            Grade::Hazardous
        } else if breaches.is_contaminated() {
            Grade::Contaminated
        } else if self.within_acceptable(sample) {
            Grade::Safe
        } else {
            Grade::Acceptable
        };

        debug!(source = %sample.source_id, %grade, "graded quality sample");
        grade
    }

    fn within_acceptable(&self, s: &QualitySample) -> bool {
        let l = &self.limits;
        s.ph >= l.ph_min
            && s.ph <= l.ph_max
            && s.tds_ppm <= l.tds_acceptable
            && s.turbidity_ntu <= l.turbidity_acceptable
            && s.fluoride_ppm <= l.fluoride_acceptable
            && s.iron_ppm <= l.iron_acceptable
    }

    /// One line per parameter above its acceptable limit, in fixed order.
    pub fn identify_contaminants(&self, s: &QualitySample) -> Vec<String> {
        let l = &self.limits;
        let mut issues = Vec::new();

        if s.ph < l.ph_min {
            issues.push(format!("pH too low: {} (min {})", s.ph, l.ph_min));
        }
        if s.ph > l.ph_max {
            issues.push(format!("pH too high: {} (max {})", s.ph, l.ph_max));
        }

        let measured = [
            (Parameter::Tds, s.tds_ppm, l.tds_acceptable),
            (Parameter::Turbidity, s.turbidity_ntu, l.turbidity_acceptable),
            (Parameter::Fluoride, s.fluoride_ppm, l.fluoride_acceptable),
            (Parameter::Arsenic, s.arsenic_ppb, l.arsenic_max_ppb),
            (Parameter::Iron, s.iron_ppm, l.iron_acceptable),
            (Parameter::Nitrate, s.nitrate_ppm, l.nitrate_max),
            (Parameter::Chloride, s.chloride_ppm, l.chloride_acceptable),
        ];
        for (param, value, limit) in measured {
            if value > limit {
                issues.push(format!(
                    "{}: {} {} (limit {})",
                    param.name(),
                    value,
                    param.unit(),
                    limit
                ));
            }
        }

        if s.coliform_present {
            issues.push("Coliform bacteria detected".to_string());
        }

        issues
    }

    /// Treatment per contaminant present. Priority order:
    /// coliform, TDS, fluoride, arsenic, iron, turbidity, nitrate, pH low, pH high.
    pub fn recommend_treatment(&self, s: &QualitySample) -> Vec<String> {
        let l = &self.limits;

        let rules: [(bool, &str); 9] = [
            (
                s.coliform_present,
                "Chlorination or UV disinfection for bacterial contamination",
            ),
            (s.tds_ppm > l.tds_acceptable, "Reverse osmosis (RO) for high TDS"),
            (
                s.fluoride_ppm > l.fluoride_acceptable,
                "Activated alumina or bone char defluoridation",
            ),
            (
                s.arsenic_ppb > l.arsenic_max_ppb,
                "Arsenic removal plant (oxidation + adsorption)",
            ),
            (
                s.iron_ppm > l.iron_acceptable,
                "Aeration and filtration for iron removal",
            ),
            (
                s.turbidity_ntu > l.turbidity_acceptable,
                "Slow sand filtration or coagulation-flocculation",
            ),
            (
                s.nitrate_ppm > l.nitrate_max,
                "Ion exchange or biological denitrification",
            ),
            (s.ph < l.ph_min, "Lime dosing to raise pH"),
            (s.ph > l.ph_max, "Acid dosing or CO2 injection to lower pH"),
        ];

        rules
            .iter()
            .filter(|(applies, _)| *applies)
            .map(|(_, treatment)| treatment.to_string())
            .collect()
    }
}

impl Default for QualityGrader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn clean_sample() -> QualitySample {
        QualitySample {
            chloride_ppm: 100.0,
            fluoride_ppm: 0.5,
            arsenic_ppb: 2.0,
            iron_ppm: 0.1,
            nitrate_ppm: 20.0,
            ..QualitySample::new("SRC001", date(), 7.0, 300.0, 0.5)
        }
    }

    #[test]
    fn test_grade_total_order() {
        assert!(Grade::Safe < Grade::Acceptable);
        assert!(Grade::Acceptable < Grade::Contaminated);
        assert!(Grade::Contaminated < Grade::Hazardous);
    }

    #[test]
    fn test_clean_sample_is_safe() {
        let grader = QualityGrader::new();
        assert_eq!(grader.grade(&clean_sample()), Grade::Safe);
        assert!(grader.identify_contaminants(&clean_sample()).is_empty());
        assert!(grader.recommend_treatment(&clean_sample()).is_empty());
    }

    #[test]
    fn test_fluoride_above_permissible_is_hazardous() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            fluoride_ppm: 1.6,
            arsenic_ppb: 2.0,
            iron_ppm: 0.1,
            nitrate_ppm: 30.0,
            ..QualitySample::new("SRC002", date(), 7.2, 420.0, 0.8)
        };

        assert_eq!(grader.grade(&sample), Grade::Hazardous);

        let contaminants = grader.identify_contaminants(&sample);
        assert!(contaminants.iter().any(|c| c.starts_with("Fluoride")));

        let treatments = grader.recommend_treatment(&sample);
        assert!(treatments.iter().any(|t| t.contains("defluoridation")));
    }

    #[test]
    fn test_low_ph_high_tds_turbid_is_contaminated() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            fluoride_ppm: 0.8,
            iron_ppm: 0.2,
            nitrate_ppm: 20.0,
            ..QualitySample::new("SRC003", date(), 6.1, 650.0, 3.0)
        };

        assert_eq!(grader.grade(&sample), Grade::Contaminated);

        let contaminants = grader.identify_contaminants(&sample);
        assert_eq!(contaminants.len(), 3, "got {:?}", contaminants);
        assert!(contaminants[0].starts_with("pH too low"));
        assert!(contaminants[1].starts_with("TDS"));
        assert!(contaminants[2].starts_with("Turbidity"));
    }

    #[test]
    fn test_contaminant_line_format() {
        let grader = QualityGrader::new();
        let sample = QualitySample::new("SRC004", date(), 7.0, 650.0, 0.5);

        assert_eq!(
            grader.identify_contaminants(&sample),
            vec!["TDS: 650 ppm (limit 500)".to_string()]
        );
    }

    #[test]
    fn test_hazardous_wins_when_both_flags_set() {
        let grader = QualityGrader::new();
        // Iron contaminates, coliform is hazardous
        let sample = QualitySample {
            iron_ppm: 2.0,
            coliform_present: true,
            ..QualitySample::new("SRC005", date(), 7.0, 300.0, 0.5)
        };

        let breaches = grader.breaches(&sample);
        assert!(breaches.is_hazardous());
        assert!(breaches.is_contaminated());
        assert_eq!(breaches.hazardous, vec![Parameter::Coliform]);
        assert_eq!(breaches.contaminated, vec![Parameter::Iron]);
        assert_eq!(grader.grade(&sample), Grade::Hazardous);
    }

    #[test]
    fn test_iron_between_tiers_is_acceptable() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            iron_ppm: 0.5,
            ..QualitySample::new("SRC006", date(), 7.0, 300.0, 0.5)
        };
        assert_eq!(grader.grade(&sample), Grade::Acceptable);
    }

    #[test]
    fn test_turbidity_between_tiers_is_acceptable() {
        let grader = QualityGrader::new();
        let sample = QualitySample::new("SRC007", date(), 7.0, 300.0, 3.0);
        assert_eq!(grader.grade(&sample), Grade::Acceptable);
    }

    #[test]
    fn test_extreme_ph_is_hazardous() {
        let grader = QualityGrader::new();
        assert_eq!(
            grader.grade(&QualitySample::new("S", date(), 4.9, 100.0, 0.1)),
            Grade::Hazardous
        );
        assert_eq!(
            grader.grade(&QualitySample::new("S", date(), 9.6, 100.0, 0.1)),
            Grade::Hazardous
        );
        // Boundaries themselves are only contaminated
        assert_eq!(
            grader.grade(&QualitySample::new("S", date(), 5.0, 100.0, 0.1)),
            Grade::Contaminated
        );
    }

    #[test]
    fn test_limit_values_are_inclusive() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            fluoride_ppm: 1.0,
            iron_ppm: 0.3,
            ..QualitySample::new("S", date(), 8.5, 500.0, 1.0)
        };
        assert_eq!(grader.grade(&sample), Grade::Safe);
    }

    #[test]
    fn test_untested_parameters_never_flag() {
        let grader = QualityGrader::new();
        let sample = QualitySample::new("S", date(), 7.0, 100.0, 0.2);
        assert_eq!(grader.breaches(&sample), TierBreaches::default());
        assert_eq!(grader.grade(&sample), Grade::Safe);
    }

    #[test]
    fn test_reported_grade_is_ignored() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            coliform_present: true,
            reported_grade: Some(Grade::Safe),
            ..QualitySample::new("S", date(), 7.0, 100.0, 0.2)
        };
        assert_eq!(grader.grade(&sample), Grade::Hazardous);
    }

    #[test]
    fn test_treatments_follow_priority_order() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            fluoride_ppm: 2.0,
            arsenic_ppb: 20.0,
            iron_ppm: 1.5,
            nitrate_ppm: 60.0,
            coliform_present: true,
            ..QualitySample::new("S", date(), 9.0, 900.0, 6.0)
        };

        let treatments = grader.recommend_treatment(&sample);
        let expected_keywords = [
            "Chlorination",
            "Reverse osmosis",
            "defluoridation",
            "Arsenic removal",
            "iron removal",
            "Slow sand",
            "denitrification",
            "lower pH",
        ];
        assert_eq!(treatments.len(), expected_keywords.len());
        for (treatment, keyword) in treatments.iter().zip(expected_keywords) {
            assert!(treatment.contains(keyword), "{} should mention {}", treatment, keyword);
        }
    }

    #[test]
    fn test_low_ph_recommends_lime() {
        let grader = QualityGrader::new();
        let sample = QualitySample::new("S", date(), 6.0, 100.0, 0.2);
        assert_eq!(grader.recommend_treatment(&sample), vec!["Lime dosing to raise pH"]);
    }

    #[test]
    fn test_chloride_is_reported_but_does_not_grade() {
        let grader = QualityGrader::new();
        let sample = QualitySample {
            chloride_ppm: 400.0,
            ..QualitySample::new("S", date(), 7.0, 100.0, 0.2)
        };
        assert_eq!(grader.grade(&sample), Grade::Safe);
        assert_eq!(
            grader.identify_contaminants(&sample),
            vec!["Chloride: 400 ppm (limit 250)".to_string()]
        );
    }

    #[test]
    fn test_custom_limits_change_grade() {
        let limits = BisLimits {
            fluoride_permissible: 1.2,
            ..BisLimits::default()
        };
        let grader = QualityGrader::with_limits(limits);
        let sample = QualitySample {
            fluoride_ppm: 1.3,
            ..QualitySample::new("S", date(), 7.0, 100.0, 0.2)
        };
        assert_eq!(grader.grade(&sample), Grade::Hazardous);
        assert_eq!(QualityGrader::new().grade(&sample), Grade::Contaminated);
    }
}
