// ============================================================
// CSV ROW TYPES
// ============================================================
// Data structures representing parsed CSV content

/// A single field in a CSV row
#[derive(Debug, Clone)]
pub struct CsvField {
    /// Header name, trimmed
    pub name: String,

    /// Raw field value, untouched
    pub value: String,
}

impl CsvField {
    /// Create a new CSV field
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            value: value.into(),
        }
    }
}

/// A single row in a CSV file
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// Row index (0-based, header excluded)
    pub index: usize,

    /// All fields in header order
    pub fields: Vec<CsvField>,
}

impl CsvRow {
    /// Create a new CSV row
    pub fn new(index: usize, fields: Vec<CsvField>) -> Self {
        Self { index, fields }
    }

    /// Build a row from `(header, value)` pairs
    pub fn from_pairs(index: usize, pairs: &[(&str, &str)]) -> Self {
        let fields = pairs
            .iter()
            .map(|(name, value)| CsvField::new(*name, *value))
            .collect();
        Self::new(index, fields)
    }

    /// Raw value of a column, `None` when the column is absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Value of the first column in `names` that exists in this row.
    ///
    /// A present-but-empty column still wins over a later alias.
    pub fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Values in the order of `headers`, missing columns as empty strings
    pub fn values_for(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.get(h.trim()).unwrap_or("").to_string())
            .collect()
    }

    /// 1-based row number as shown to users (header is line 1)
    pub fn line_number(&self) -> usize {
        self.index + 2
    }
}

/// A parsed CSV file: raw headers plus rows
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    /// Headers exactly as read
    pub headers: Vec<String>,

    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    pub fn new(headers: Vec<String>, rows: Vec<CsvRow>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Trimmed header names, used for shape detection
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.trim()).collect()
    }
}
