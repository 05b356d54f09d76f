#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV-backed table storage for placemark.
//!
//! The enrichment pipeline consumes an abstract table of rows and
//! produces cell writes; this crate is the boundary to the container
//! format. Row 0 is the header; data rows start at row 1. Rows may have
//! ragged lengths on disk — [`Sheet::set_cell`] grows rows as needed.
//!
//! Also provides the column-header heuristics for locating the
//! coordinate/address/district/province columns (see [`columns`]).

pub mod columns;

use std::path::Path;

use thiserror::Error;

/// Errors from table storage operations.
#[derive(Debug, Error)]
pub enum TableError {
    /// Reading or writing the CSV container failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file parsed but contains no rows at all.
    #[error("table is empty")]
    Empty,

    /// No usable coordinate column could be located.
    #[error(
        "could not find a coordinate column; expected a header containing \
         'latlg', 'lat', 'coordinate' or 'coord', or a data column in \
         'lat,lng' format (e.g. '13.536964,105.927722')"
    )]
    NoCoordinateColumn,
}

/// An in-memory table of string cells, loaded from and saved to CSV.
#[derive(Debug, Clone)]
pub struct Sheet {
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Loads a sheet from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Csv`] if the file cannot be read or parsed
    /// and [`TableError::Empty`] if it contains no rows.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        if rows.is_empty() {
            return Err(TableError::Empty);
        }

        Ok(Self { rows })
    }

    /// Builds a sheet directly from rows. The first row is the header.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Empty`] if `rows` is empty.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        if rows.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self { rows })
    }

    /// All rows, header included.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    #[must_use]
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Sets a cell, growing the row (and the row list) with empty
    /// cells as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, String::new);
        }
        cells[col] = value.into();
    }

    /// Returns a cell's contents, or `None` when the row or column does
    /// not exist.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Writes the full sheet to `path` as CSV (a complete snapshot, not
    /// an incremental diff).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Csv`] or [`TableError::Io`] on write
    /// failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
