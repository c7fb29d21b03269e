pub mod aggregate;
pub mod entities;
pub mod fields;
pub mod sections;

use crate::model::PathwayRecord;
use aggregate::ExtractionResult;
use sections::SplitMode;

/// Three-stage pipeline: record text → sections → entities → aggregated result.
pub fn extract_record(record: &PathwayRecord, mode: SplitMode) -> ExtractionResult {
    let sections = sections::split_sections(&record.text, mode);
    aggregate::aggregate(&sections)
}

// ── Tests ──
