// Entity Models
// Keyed registries for the records a panchayat is tracked by:
// - Water sources (keyed by source id)
// - Tap-connection coverage (keyed by panchayat id)
//
// Both registries are plain owned maps mutated through `&mut self`; lookups of
// unknown ids return `None` or an empty list, never an error.

pub mod source;
pub mod coverage;

pub use source::{SourceType, WaterSource, SourceRegistry};
pub use coverage::{CoverageStatus, CoverageSummary, CoverageTracker, LpcdCheck};
