// ============================================================
// DAY FILES
// ============================================================
// Numbered CSV slices of a larger export: `<prefix><n>.csv`, n from 1

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::domain::csv::CsvRow;
use crate::domain::error::{AppError, Result};

/// Writes and discovers numbered day files in one directory
pub struct DayFileWriter {
    output_dir: PathBuf,
    prefix: String,
}

impl DayFileWriter {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the day file with 1-based sequence number `day`
    pub fn path_for(&self, day: usize) -> PathBuf {
        self.output_dir.join(format!("{}{}.csv", self.prefix, day))
    }

    /// Write each group to its own file, reproducing the input headers.
    ///
    /// Day files numbered past the new group count are removed so a later
    /// `discover` sees only this split.
    pub fn write_groups(&self, headers: &[String], groups: &[Vec<CsvRow>]) -> Result<Vec<PathBuf>> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir)?;
        }

        for (day, path) in self.numbered_files()? {
            if day > groups.len() as u64 {
                fs::remove_file(&path)?;
                tracing::info!(file = %path.display(), "Removed stale day file");
            }
        }

        let mut written = Vec::with_capacity(groups.len());
        for (idx, rows) in groups.iter().enumerate() {
            let path = self.path_for(idx + 1);
            self.write_file(&path, headers, rows)?;

            tracing::info!(
                file = %path.display(),
                rows = rows.len(),
                "Created day file"
            );
            written.push(path);
        }

        Ok(written)
    }

    fn write_file(&self, path: &Path, headers: &[String], rows: &[CsvRow]) -> Result<()> {
        let mut writer = Writer::from_path(path).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", path.display(), e))
        })?;

        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row.values_for(headers))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Day files in the directory, ordered by sequence number
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.output_dir.is_dir() {
            return Err(AppError::NotFound(format!(
                "Day-file directory {} does not exist",
                self.output_dir.display()
            )));
        }

        let mut numbered = self.numbered_files()?;
        numbered.sort_by_key(|(day, _)| *day);
        Ok(numbered.into_iter().map(|(_, path)| path).collect())
    }

    fn numbered_files(&self) -> Result<Vec<(u64, PathBuf)>> {
        let mut numbered = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let path = entry?.path();
            if let Some(day) = self.sequence_number(&path) {
                numbered.push((day, path));
            }
        }
        Ok(numbered)
    }

    /// Sequence number encoded in a day-file name, `None` for other files
    fn sequence_number(&self, path: &Path) -> Option<u64> {
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        stem.strip_prefix(self.prefix.as_str())?.trim().parse().ok()
    }
}

/// File stem of a day file, used as its question-set label
pub fn day_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::csv::CsvParser;

    fn rows(n: usize) -> Vec<CsvRow> {
        (0..n)
            .map(|i| {
                let id = (i + 1).to_string();
                CsvRow::from_pairs(i, &[("ID", id.as_str()), ("Question", "Q, with comma")])
            })
            .collect()
    }

    #[test]
    fn test_write_groups_names_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayFileWriter::new(dir.path(), "DVA-C02_Day_");
        let headers = vec!["ID".to_string(), "Question".to_string()];
        let all = rows(3);
        let groups = vec![all[..2].to_vec(), all[2..].to_vec()];

        let written = writer.write_groups(&headers, &groups).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("DVA-C02_Day_1.csv"));
        assert!(written[1].ends_with("DVA-C02_Day_2.csv"));

        let table = CsvParser::new().parse_file(&written[1]).unwrap();
        assert_eq!(table.headers, headers);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("ID"), Some("3"));
        assert_eq!(table.rows[0].get("Question"), Some("Q, with comma"));
    }

    #[test]
    fn test_discover_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayFileWriter::new(dir.path(), "Day ");
        let headers = vec!["ID".to_string()];
        let groups: Vec<Vec<CsvRow>> = (0..11)
            .map(|i| vec![CsvRow::from_pairs(i, &[("ID", "1")])])
            .collect();
        writer.write_groups(&headers, &groups).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.path().join("Other_1.csv"), "ID\n1\n").unwrap();

        let found = writer.discover().unwrap();
        let labels: Vec<String> = found.iter().map(|p| day_label(p)).collect();
        assert_eq!(labels.len(), 11);
        assert_eq!(labels[0], "Day 1");
        assert_eq!(labels[1], "Day 2");
        assert_eq!(labels[10], "Day 11");
    }

    #[test]
    fn test_resplit_removes_stale_day_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayFileWriter::new(dir.path(), "Day_");
        let headers = vec!["ID".to_string(), "Question".to_string()];
        let all = rows(4);

        let groups: Vec<Vec<CsvRow>> = all.chunks(1).map(|g| g.to_vec()).collect();
        writer.write_groups(&headers, &groups).unwrap();
        assert_eq!(writer.discover().unwrap().len(), 4);

        let groups: Vec<Vec<CsvRow>> = all.chunks(2).map(|g| g.to_vec()).collect();
        writer.write_groups(&headers, &groups).unwrap();

        let found = writer.discover().unwrap();
        assert_eq!(found.len(), 2);
        assert!(!dir.path().join("Day_3.csv").exists());
        assert!(!dir.path().join("Day_4.csv").exists());
        let table = CsvParser::new().parse_file(&found[1]).unwrap();
        assert_eq!(table.rows[1].get("ID"), Some("4"));
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayFileWriter::new(dir.path().join("absent"), "Day_");
        assert!(matches!(writer.discover(), Err(AppError::NotFound(_))));
    }
}
