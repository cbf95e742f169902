// Jal Drishti - Panchayat Water Monitoring Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod quality;
pub mod entities;
pub mod groundwater;
pub mod rainfall;
pub mod budget;
pub mod alerts;
pub mod assessment;
pub mod ingest;

// Re-export commonly used types
pub use config::{
    AlertCutoffs, BisLimits, GroundwaterBands, RainfallBands, SupplyStandards, Thresholds,
};
pub use quality::{Grade, Parameter, QualityGrader, QualitySample, TierBreaches};
pub use entities::{
    CoverageStatus, CoverageSummary, CoverageTracker, LpcdCheck,
    SourceRegistry, SourceType, WaterSource,
};
pub use groundwater::{
    DepthCategory, GroundwaterMonitor, GroundwaterReading, RechargePotential, Season,
};
pub use rainfall::{
    deviation_pct, DroughtRisk, FloodRisk, MonsoonPerformance, RainfallAnalyzer, RainfallReading,
};
pub use budget::{Budget, BudgetPlanner};
pub use alerts::{prioritize, Alert, AlertCategory, AlertEngine, AlertLevel};
pub use assessment::{Assessment, AssessmentReport, SampleGrade};
pub use ingest::{
    load_csv, load_json, load_records, IngestError, Validate,
    RawFhtcStatus, RawGroundwaterLevel, RawQualityReport, RawRainfallRecord, RawWaterSource,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Half-away-from-zero rounding to `places` decimals, used for every
/// reported percentage and litre figure.
pub(crate) fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
