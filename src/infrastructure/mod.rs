pub mod artifact_store;
pub mod config;
pub mod csv;
pub mod db;
