// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Row and table types for exported exam dumps
// No I/O, no async, no external dependencies

mod csv_row;
mod row_shape;

pub use csv_row::{CsvField, CsvRow, CsvTable};
pub use row_shape::RowShape;
