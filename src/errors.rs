// errors.rs
use std::fmt;

use crate::db::conform::ConformanceError;
use crate::db::gateway::StoreError;
use crate::schema::ValidationError;
use crate::scrape::ExtractionError;

/// Errors from any stage of the ingest pipeline. Each stage keeps its own
/// typed error; this wrapper exists so the write/read paths compose with `?`.
#[derive(Debug)]
pub enum IngestError {
    Extraction(ExtractionError),
    Validation(ValidationError),
    Conformance(ConformanceError),
    Store(StoreError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Extraction(e) => write!(f, "Extraction error: {e}"),
            IngestError::Validation(e) => write!(f, "Validation error: {e}"),
            IngestError::Conformance(e) => write!(f, "Conformance error: {e}"),
            IngestError::Store(e) => write!(f, "Store error: {e}"),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<ExtractionError> for IngestError {
    fn from(e: ExtractionError) -> Self {
        IngestError::Extraction(e)
    }
}

impl From<ValidationError> for IngestError {
    fn from(e: ValidationError) -> Self {
        IngestError::Validation(e)
    }
}

impl From<ConformanceError> for IngestError {
    fn from(e: ConformanceError) -> Self {
        IngestError::Conformance(e)
    }
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        IngestError::Store(e)
    }
}
