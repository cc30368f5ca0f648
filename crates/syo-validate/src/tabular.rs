//! # Tabular Schemas
//!
//! Reads just enough of a table to compare it: ordered column names plus a
//! coarse value type per column. Delimited files are sampled row by row;
//! Parquet files are never decoded past the footer, so their physical types
//! stand in for value types.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

use parquet::file::reader::{FileReader, SerializedFileReader};

/// Coarse value type inferred for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    /// No non-empty values were sampled.
    Unknown,
    /// Parquet physical type, compared verbatim.
    Physical(String),
}

impl ColumnType {
    fn classify(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.parse::<i64>().is_ok() {
            Self::Integer
        } else if cell.parse::<f64>().is_ok() {
            Self::Float
        } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
            Self::Boolean
        } else {
            Self::Text
        }
    }

    /// Widen two observations of the same column.
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unknown, t) | (t, Self::Unknown) => t,
            (a, b) if a == b => a,
            (Self::Integer, Self::Float) | (Self::Float, Self::Integer) => Self::Float,
            _ => Self::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Text => f.write_str("text"),
            Self::Unknown => f.write_str("unknown"),
            Self::Physical(name) => f.write_str(name),
        }
    }
}

/// Column names in file order, with their inferred types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<(String, ColumnType)>,
}

impl TableSchema {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Map from column name to type. Later duplicates win.
    pub fn types(&self) -> BTreeMap<&str, &ColumnType> {
        self.columns.iter().map(|(n, t)| (n.as_str(), t)).collect()
    }
}

/// Read a delimited table's header and sample up to `sample_rows` records.
///
/// # Errors
///
/// Returns a short reason if the file is empty, has no header, or is not
/// well-formed delimited text.
pub fn read_delimited(
    path: &Path,
    delimiter: u8,
    sample_rows: usize,
) -> Result<TableSchema, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("cannot be read: {e}"))?;

    let headers = reader
        .headers()
        .map_err(|e| format!("is not valid delimited text: {e}"))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err("is empty".to_string());
    }

    let mut types = vec![ColumnType::Unknown; headers.len()];
    for record in reader.records().take(sample_rows) {
        let record = record.map_err(|e| format!("is not valid delimited text: {e}"))?;
        for (slot, cell) in types.iter_mut().zip(record.iter()) {
            if cell.trim().is_empty() {
                continue;
            }
            let observed = ColumnType::classify(cell);
            *slot = std::mem::replace(slot, ColumnType::Unknown).merge(observed);
        }
    }

    Ok(TableSchema {
        columns: headers.iter().map(str::to_string).zip(types).collect(),
    })
}

/// Read the top-level field names and physical types from a Parquet footer.
///
/// # Errors
///
/// Returns a short reason if the file is empty or has no valid footer.
pub fn read_parquet(path: &Path) -> Result<TableSchema, String> {
    let file = File::open(path).map_err(|e| format!("cannot be read: {e}"))?;
    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        return Err("is empty".to_string());
    }
    let reader =
        SerializedFileReader::new(file).map_err(|e| format!("is not valid Parquet: {e}"))?;
    let root = reader.metadata().file_metadata().schema_descr().root_schema();
    let columns: Vec<(String, ColumnType)> = root
        .get_fields()
        .iter()
        .map(|field| {
            let ty = if field.is_primitive() {
                ColumnType::Physical(format!("{:?}", field.get_physical_type()))
            } else {
                ColumnType::Physical("GROUP".to_string())
            };
            (field.name().to_string(), ty)
        })
        .collect();
    if columns.is_empty() {
        return Err("has no columns".to_string());
    }
    Ok(TableSchema { columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_infers_column_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "id,score,flag,label\n1,1.5,true,a\n2,2,false,b\n").unwrap();
        let schema = read_delimited(&path, b',', 100).unwrap();
        let types = schema.types();
        assert_eq!(types["id"], &ColumnType::Integer);
        assert_eq!(types["score"], &ColumnType::Float);
        assert_eq!(types["flag"], &ColumnType::Boolean);
        assert_eq!(types["label"], &ColumnType::Text);
    }

    #[test]
    fn test_header_only_has_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "a,b\n").unwrap();
        let schema = read_delimited(&path, b',', 100).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(schema.columns.iter().all(|(_, t)| *t == ColumnType::Unknown));
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "").unwrap();
        assert_eq!(read_delimited(&path, b',', 100).unwrap_err(), "is empty");
    }

    #[test]
    fn test_tab_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tsv");
        fs::write(&path, "x\ty\n1\t2\n").unwrap();
        let schema = read_delimited(&path, b'\t', 100).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_merge_widens() {
        assert_eq!(ColumnType::Integer.merge(ColumnType::Float), ColumnType::Float);
        assert_eq!(ColumnType::Integer.merge(ColumnType::Text), ColumnType::Text);
        assert_eq!(ColumnType::Unknown.merge(ColumnType::Boolean), ColumnType::Boolean);
    }

    #[test]
    fn test_garbage_parquet_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        fs::write(&path, "definitely not parquet").unwrap();
        assert!(read_parquet(&path).is_err());
    }
}
