pub mod chunking;
pub mod correctness;
pub mod draft_builder;
pub mod ingest_pipeline;
pub mod reconciliation;
pub mod text_normalizer;
