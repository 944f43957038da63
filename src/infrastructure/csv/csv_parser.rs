// ============================================================
// CSV PARSER
// ============================================================
// Parse CSV files with encoding detection and error handling

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::domain::csv::{CsvField, CsvRow, CsvTable};
use crate::domain::error::AppError;

/// CSV parser with encoding detection
pub struct CsvParser {
    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { trim: false }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to trim whitespace
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Parse a CSV file into headers and rows
    pub fn parse_file(&self, path: &Path) -> Result<CsvTable, AppError> {
        let content = Self::read_with_encoding_detection(path)?;

        self.parse_content(&content).map_err(|e| match e {
            AppError::ParseError(msg) => {
                AppError::ParseError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<CsvTable, AppError> {
        let mut reader = ReaderBuilder::new()
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Exported dumps are ragged
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            rows.push(Self::parse_row(index, &headers, &record));
        }

        Ok(CsvTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows,
        ))
    }

    /// Read file as UTF-8 (BOM stripped), falling back to Windows-1252
    fn read_with_encoding_detection(path: &Path) -> Result<String, AppError> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Ok(Self::decode(&bytes))
    }

    fn decode(bytes: &[u8]) -> String {
        let (text, _, had_errors) = UTF_8.decode(bytes);
        if !had_errors {
            return text.into_owned();
        }

        tracing::warn!("Input is not valid UTF-8, decoding as Windows-1252");
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        text.into_owned()
    }

    fn parse_row(index: usize, headers: &StringRecord, record: &StringRecord) -> CsvRow {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| CsvField::new(header, record.get(idx).unwrap_or("")))
            .collect();

        CsvRow::new(index, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_csv() {
        let content = "No,Content,A,B,C,D,Answered\n2,\"Which one?\",x,y,,,\"# Answer\n- **Correct option:** B\"";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.headers.len(), 7);
        assert_eq!(table.rows[0].get("Content"), Some("Which one?"));
        assert_eq!(table.rows[0].get("C"), Some(""));
        assert!(table.rows[0].get("Answered").unwrap().contains('\n'));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let content = "ID,Question,Chose_A,Chose_B\n1,Q,a";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.rows[0].get("Chose_A"), Some("a"));
        assert_eq!(table.rows[0].get("Chose_B"), Some(""));
    }

    #[test]
    fn test_values_are_not_trimmed_by_default() {
        let content = "ID,Question\n1,  spaced  ";
        let table = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(table.rows[0].get("Question"), Some("  spaced  "));

        let trimmed = CsvParser::new().with_trim(true).parse_content(content).unwrap();
        assert_eq!(trimmed.rows[0].get("Question"), Some("spaced"));
    }

    #[test]
    fn test_parse_file_strips_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBFID,Question\n1,Hello\n").unwrap();

        let table = CsvParser::new().parse_file(file.path()).unwrap();
        assert_eq!(table.headers[0], "ID");
        assert_eq!(table.rows[0].get("Question"), Some("Hello"));
    }

    #[test]
    fn test_parse_file_falls_back_to_windows_1252() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ID,Question\n1,caf\xE9\n").unwrap();

        let table = CsvParser::new().parse_file(file.path()).unwrap();
        assert_eq!(table.rows[0].get("Question"), Some("café"));
    }
}
