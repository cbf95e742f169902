// 📥 Ingestion - raw records in, validated records out
// Field names follow the published JSON/CSV exchange format. Range and enum
// checks happen here, once; the engine trusts whatever this module hands it.

use crate::entities::{CoverageStatus, SourceType, WaterSource};
use crate::groundwater::{GroundwaterReading, Season};
use crate::quality::{Grade, QualitySample};
use crate::rainfall::RainfallReading;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid {record} record: {field} {message}")]
    Validation {
        record: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("record {index} in {path}: {source}")]
    Record {
        path: String,
        index: usize,
        #[source]
        source: Box<IngestError>,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl IngestError {
    fn invalid(record: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        IngestError::Validation {
            record,
            field,
            message: message.into(),
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

// ============================================================================
// VALIDATE TRAIT
// ============================================================================

/// A raw, just-deserialized record that can be turned into its typed form.
pub trait Validate {
    type Output;

    /// Record kind used in error messages ("water source", "rainfall", ...)
    const RECORD: &'static str;

    fn validate(self) -> IngestResult<Self::Output>;
}

// ============================================================================
// FIELD CHECKS
// ============================================================================

fn required(record: &'static str, field: &'static str, value: String) -> IngestResult<String> {
    if value.trim().is_empty() {
        return Err(IngestError::invalid(record, field, "is required"));
    }
    Ok(value)
}

fn non_negative(record: &'static str, field: &'static str, value: f64) -> IngestResult<f64> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(IngestError::invalid(
            record,
            field,
            format!("must be a non-negative number, got {}", value),
        ));
    }
    Ok(value)
}

fn in_range(
    record: &'static str,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> IngestResult<f64> {
    if !(min..=max).contains(&value) {
        return Err(IngestError::invalid(
            record,
            field,
            format!("must be within {}..={}, got {}", min, max, value),
        ));
    }
    Ok(value)
}

fn count(record: &'static str, field: &'static str, value: i64) -> IngestResult<u64> {
    u64::try_from(value).map_err(|_| {
        IngestError::invalid(record, field, format!("must not be negative, got {}", value))
    })
}

fn date(record: &'static str, field: &'static str, value: &str) -> IngestResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        IngestError::invalid(record, field, format!("must be YYYY-MM-DD, got '{}'", value))
    })
}

/// Empty string means "not recorded".
fn optional_date(
    record: &'static str,
    field: &'static str,
    value: &str,
) -> IngestResult<Option<NaiveDate>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    date(record, field, value).map(Some)
}

// ============================================================================
// RAW RECORDS
// ============================================================================
// Optional measurements are `Option`: a missing key, a JSON null and an empty
// CSV cell all read as "not recorded" and take the field's default.

#[derive(Debug, Clone, Deserialize)]
pub struct RawWaterSource {
    pub source_id: String,
    pub panchayat_id: String,
    #[serde(default)]
    pub name: String,
    pub source_type: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub capacity_liters_per_day: f64,
    pub current_yield_lpd: f64,
    #[serde(default)]
    pub depth_meters: Option<f64>,
    /// Defaults to functional
    #[serde(default)]
    pub is_functional: Option<bool>,
    #[serde(default)]
    pub last_tested_date: String,
}

impl Validate for RawWaterSource {
    type Output = WaterSource;
    const RECORD: &'static str = "water source";

    fn validate(self) -> IngestResult<WaterSource> {
        let r = Self::RECORD;
        let source_type: SourceType = self
            .source_type
            .parse()
            .map_err(|e: String| IngestError::invalid(r, "source_type", e))?;

        Ok(WaterSource {
            id: required(r, "source_id", self.source_id)?,
            panchayat_id: required(r, "panchayat_id", self.panchayat_id)?,
            name: self.name,
            source_type,
            latitude: in_range(r, "latitude", self.latitude.unwrap_or(0.0), -90.0, 90.0)?,
            longitude: in_range(r, "longitude", self.longitude.unwrap_or(0.0), -180.0, 180.0)?,
            capacity_lpd: non_negative(r, "capacity_liters_per_day", self.capacity_liters_per_day)?,
            yield_lpd: non_negative(r, "current_yield_lpd", self.current_yield_lpd)?,
            depth_m: non_negative(r, "depth_meters", self.depth_meters.unwrap_or(0.0))?,
            functional: self.is_functional.unwrap_or(true),
            last_tested: optional_date(r, "last_tested_date", &self.last_tested_date)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQualityReport {
    #[serde(default)]
    pub report_id: String,
    pub source_id: String,
    pub test_date: String,
    pub ph: f64,
    pub tds_ppm: f64,
    pub turbidity_ntu: f64,
    #[serde(default)]
    pub chloride_ppm: Option<f64>,
    #[serde(default)]
    pub fluoride_ppm: Option<f64>,
    #[serde(default)]
    pub arsenic_ppb: Option<f64>,
    #[serde(default)]
    pub iron_ppm: Option<f64>,
    #[serde(default)]
    pub nitrate_ppm: Option<f64>,
    #[serde(default)]
    pub coliform_present: Option<bool>,
    #[serde(default)]
    pub grade: Option<Grade>,
}

impl Validate for RawQualityReport {
    type Output = QualitySample;
    const RECORD: &'static str = "water quality";

    fn validate(self) -> IngestResult<QualitySample> {
        let r = Self::RECORD;
        Ok(QualitySample {
            report_id: self.report_id,
            source_id: required(r, "source_id", self.source_id)?,
            date: date(r, "test_date", &self.test_date)?,
            ph: in_range(r, "ph", self.ph, 0.0, 14.0)?,
            tds_ppm: non_negative(r, "tds_ppm", self.tds_ppm)?,
            turbidity_ntu: non_negative(r, "turbidity_ntu", self.turbidity_ntu)?,
            chloride_ppm: non_negative(r, "chloride_ppm", self.chloride_ppm.unwrap_or(0.0))?,
            fluoride_ppm: non_negative(r, "fluoride_ppm", self.fluoride_ppm.unwrap_or(0.0))?,
            arsenic_ppb: non_negative(r, "arsenic_ppb", self.arsenic_ppb.unwrap_or(0.0))?,
            iron_ppm: non_negative(r, "iron_ppm", self.iron_ppm.unwrap_or(0.0))?,
            nitrate_ppm: non_negative(r, "nitrate_ppm", self.nitrate_ppm.unwrap_or(0.0))?,
            coliform_present: self.coliform_present.unwrap_or(false),
            reported_grade: self.grade,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFhtcStatus {
    pub panchayat_id: String,
    #[serde(default)]
    pub panchayat_name: String,
    pub total_households: i64,
    pub fhtc_provided: i64,
    pub fhtc_functional: i64,
    #[serde(default)]
    pub target_date: String,
    #[serde(default)]
    pub report_date: String,
}

impl Validate for RawFhtcStatus {
    type Output = CoverageStatus;
    const RECORD: &'static str = "FHTC status";

    fn validate(self) -> IngestResult<CoverageStatus> {
        let r = Self::RECORD;
        Ok(CoverageStatus {
            panchayat_id: required(r, "panchayat_id", self.panchayat_id)?,
            panchayat_name: self.panchayat_name,
            total_households: count(r, "total_households", self.total_households)?,
            connections_provided: count(r, "fhtc_provided", self.fhtc_provided)?,
            connections_functional: count(r, "fhtc_functional", self.fhtc_functional)?,
            target_date: optional_date(r, "target_date", &self.target_date)?,
            report_date: optional_date(r, "report_date", &self.report_date)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGroundwaterLevel {
    pub panchayat_id: String,
    pub season: String,
    pub year: i32,
    pub depth_meters: f64,
    /// Zero means the previous year is unknown
    #[serde(default)]
    pub previous_year_depth: Option<f64>,
}

impl Validate for RawGroundwaterLevel {
    type Output = GroundwaterReading;
    const RECORD: &'static str = "groundwater";

    fn validate(self) -> IngestResult<GroundwaterReading> {
        let r = Self::RECORD;
        let season: Season = self
            .season
            .parse()
            .map_err(|e: String| IngestError::invalid(r, "season", e))?;

        Ok(GroundwaterReading {
            panchayat_id: required(r, "panchayat_id", self.panchayat_id)?,
            season,
            year: self.year,
            depth_m: non_negative(r, "depth_meters", self.depth_meters)?,
            previous_year_depth_m: non_negative(
                r,
                "previous_year_depth",
                self.previous_year_depth.unwrap_or(0.0),
            )?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRainfallRecord {
    pub panchayat_id: String,
    pub month: i64,
    pub year: i32,
    pub rainfall_mm: f64,
    pub normal_mm: f64,
}

impl Validate for RawRainfallRecord {
    type Output = RainfallReading;
    const RECORD: &'static str = "rainfall";

    fn validate(self) -> IngestResult<RainfallReading> {
        let r = Self::RECORD;
        let month = u32::try_from(self.month)
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| {
                IngestError::invalid(
                    r,
                    "month",
                    format!("must be within 1..=12, got {}", self.month),
                )
            })?;

        Ok(RainfallReading {
            panchayat_id: required(r, "panchayat_id", self.panchayat_id)?,
            month,
            year: self.year,
            actual_mm: non_negative(r, "rainfall_mm", self.rainfall_mm)?,
            normal_mm: non_negative(r, "normal_mm", self.normal_mm)?,
        })
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Tag a failure with the position of the record that caused it.
fn at_record<R: Validate>(path: &Path, index: usize, err: IngestError) -> IngestError {
    warn!(path = %path.display(), index, "rejected {} record: {}", R::RECORD, err);
    IngestError::Record {
        path: path.display().to_string(),
        index,
        source: Box::new(err),
    }
}

/// Parse a JSON document holding one record or an array of records. A document
/// that is not JSON at all is a bare `Json` error; a record of the wrong shape
/// or with out-of-range values is wrapped in `Record` with its index.
pub fn parse_json<R>(path: &Path, content: &str) -> IngestResult<Vec<R::Output>>
where
    R: Validate + DeserializeOwned,
{
    let json_err = |source| IngestError::Json {
        path: path.display().to_string(),
        source,
    };

    let value: serde_json::Value = serde_json::from_str(content).map_err(json_err)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        single => vec![single],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<R>(item)
                .map_err(json_err)
                .and_then(Validate::validate)
                .map_err(|e| at_record::<R>(path, index, e))
        })
        .collect()
}

pub fn load_json<R>(path: &Path) -> IngestResult<Vec<R::Output>>
where
    R: Validate + DeserializeOwned,
{
    let content = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let records = parse_json::<R>(path, &content)?;
    info!(path = %path.display(), count = records.len(), "loaded {} records", R::RECORD);
    Ok(records)
}

/// Headered CSV, one record per row; column names match the JSON fields.
pub fn load_csv<R>(path: &Path) -> IngestResult<Vec<R::Output>>
where
    R: Validate + DeserializeOwned,
{
    let csv_err = |source| IngestError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut records = Vec::new();

    for (index, result) in rdr.deserialize::<R>().enumerate() {
        let record = result
            .map_err(csv_err)
            .and_then(Validate::validate)
            .map_err(|e| at_record::<R>(path, index, e))?;
        records.push(record);
    }

    info!(path = %path.display(), count = records.len(), "loaded {} records", R::RECORD);
    Ok(records)
}

/// Dispatch on extension: `.csv` goes through the CSV reader, anything else is JSON.
pub fn load_records<R>(path: &Path) -> IngestResult<Vec<R::Output>>
where
    R: Validate + DeserializeOwned,
{
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        load_csv::<R>(path)
    } else {
        load_json::<R>(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
