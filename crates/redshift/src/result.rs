use std::fmt;

use serde::{Deserialize, Serialize};

use redshift_data_core::StatementHandle;

/// Column definition of a statement result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name as declared in the result set.
    pub name: String,
    /// Redshift type name (e.g. "int4", "varchar", "timestamp").
    pub type_name: String,
    /// Column label, when it differs from the name.
    pub label: Option<String>,
    pub nullable: bool,
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
}

impl Field {
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Field::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => write!(f, "NULL"),
            Field::Boolean(b) => write!(f, "{b}"),
            Field::Long(v) => write!(f, "{v}"),
            Field::Double(v) => write!(f, "{v}"),
            Field::String(s) => f.write_str(s),
            Field::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// One row, ordered like the result's columns.
pub type Record = Vec<Field>;

/// One page of GetStatementResult.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultPage {
    pub columns: Vec<ColumnMetadata>,
    pub records: Vec<Record>,
    /// Total rows across all pages.
    pub total_num_rows: i64,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Fully collected result of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub statement_id: StatementHandle,
    pub columns: Vec<ColumnMetadata>,
    pub records: Vec<Record>,
    pub total_num_rows: i64,
}

impl StatementResult {
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Zero-based index of a column by name (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value at `row` in column `col`; `None` if either is out of range.
    pub fn get_value(&self, row: usize, col: &str) -> Option<&Field> {
        let idx = self.column_index(col)?;
        self.records.get(row)?.get(idx)
    }
}

impl fmt::Display for StatementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "(no result set)");
        }

        let cells: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.name.len()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() && cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{:<width$}", col.name, width = widths[i])?;
        }
        writeln!(f)?;

        for (i, w) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "-+-")?;
            }
            write!(f, "{}", "-".repeat(*w))?;
        }
        writeln!(f)?;

        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                let width = widths.get(i).copied().unwrap_or(0);
                write!(f, "{:<width$}", cell, width = width)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        write!(
            f,
            "Statement {} | {} of {} rows",
            self.statement_id,
            self.records.len(),
            self.total_num_rows,
        )
    }
}
