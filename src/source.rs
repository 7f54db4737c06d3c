//! CSV source store access.
//!
//! The loader consumes each source table as an ordered sequence of rows with
//! named columns. Column names are normalized once at read time (trimmed,
//! case-folded) so every later stage can match on them verbatim. Cell values
//! are parsed into a small typed enum instead of being kept as raw text:
//! numeric and boolean columns must round-trip into JSON payloads as numbers
//! and booleans, and non-finite floats must stay representable long enough
//! for the property serializer to reject them loudly.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

/// One source row: normalized column name -> parsed value, in file order.
pub type SourceRow = IndexMap<String, CellValue>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open `{path}`: {source}")]
    Open {
        path: String,
        source: csv::Error,
    },
    #[error("failed to read record {index} of `{path}`: {source}")]
    Read {
        path: String,
        index: usize,
        source: csv::Error,
    },
}

/// A parsed CSV cell.
///
/// `Float` deliberately admits NaN and the infinities: the property
/// serializer is the component responsible for failing on them, and it can
/// only do that if the parse stage does not paper over them as text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Parse a raw CSV field. Empty fields become `Null`; `true`/`false`
    /// (any case) become booleans; integer and float literals (including
    /// `nan`/`inf` spellings) become numbers; everything else stays text.
    pub fn parse(raw: &str) -> CellValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
        CellValue::Text(trimmed.to_string())
    }

    /// Truthiness used when coercing `is`-prefixed flag columns.
    pub fn as_flag(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Int(i) => *i != 0,
            CellValue::Float(f) => *f != 0.0,
            CellValue::Text(s) => !s.is_empty() && s != "0",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Normalize a column name the way the transforms expect it: trimmed and
/// case-folded to lowercase.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reads source tables from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvSource {
    data_dir: PathBuf,
}

impl CsvSource {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Read one table into memory, header-normalized and cell-parsed.
    pub fn read_table(&self, file: &str) -> Result<Vec<SourceRow>, SourceError> {
        let path = self.data_dir.join(file);
        let display_path = path.display().to_string();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|source| SourceError::Open {
                path: display_path.clone(),
                source,
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| SourceError::Read {
                path: display_path.clone(),
                index: 0,
                source,
            })?
            .iter()
            .map(normalize_column)
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|source| SourceError::Read {
                path: display_path.clone(),
                index: index + 1,
                source,
            })?;

            let mut row = SourceRow::with_capacity(headers.len());
            for (column, field) in headers.iter().zip(record.iter()) {
                row.insert(column.clone(), CellValue::parse(field));
            }
            rows.push(row);
        }

        log::info!("read {} rows from {}", rows.len(), file);
        Ok(rows)
    }
}
