// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV reading with encoding detection, day-file writing and discovery

mod csv_parser;
mod day_files;

pub use csv_parser::CsvParser;
pub use day_files::{day_label, DayFileWriter};
