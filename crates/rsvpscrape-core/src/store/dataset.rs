use std::path::Path;

use anyhow::{Context, Result};

use crate::models::GuestRecord;

/// A header row plus string rows; the on-disk shape of every output dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_records(headers: Vec<String>, records: &[GuestRecord]) -> Self {
        Self {
            headers,
            rows: records.iter().map(GuestRecord::to_row).collect(),
        }
    }

    /// Read a CSV dataset. Short rows are padded to the header width.
    pub fn read(path: &Path) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of a named column in one row
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column(name).and_then(|idx| row.get(idx)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("rsvpscrape-dataset-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_write_then_read_quoted_cells() {
        let path = temp_path("quoted.csv");
        let dataset = Dataset {
            headers: vec!["Household_Index".to_string(), "Events_Invited".to_string()],
            rows: vec![vec!["0".to_string(), "Wedding, Reception".to_string()]],
        };
        dataset.write(&path).unwrap();

        let loaded = Dataset::read(&path).unwrap();
        assert_eq!(loaded, dataset);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_read_pads_short_rows() {
        let path = temp_path("short.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "a,b,c\n1,2\n").unwrap();

        let loaded = Dataset::read(&path).unwrap();
        assert_eq!(loaded.rows[0], vec!["1", "2", ""]);
        assert_eq!(loaded.cell(&loaded.rows[0], "b"), Some("2"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_read_missing_file_errors() {
        assert!(Dataset::read(&temp_path("does-not-exist.csv")).is_err());
    }
}
