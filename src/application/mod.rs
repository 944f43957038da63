pub mod use_cases;

pub use use_cases::ingest_pipeline::{IngestPipeline, IngestReport};
pub use use_cases::reconciliation::ReconciliationEngine;
