pub mod error;
pub mod ingest_config;
pub mod question;
pub mod store;

// Exam-dump CSV rows
pub mod csv;
