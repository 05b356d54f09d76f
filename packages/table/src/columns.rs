//! Column-header heuristics.
//!
//! Locates the coordinate column by case-insensitive header substring
//! match, falling back to scanning the first data row for a
//! `"lat,lng"`-shaped cell, and locates (or creates) the three result
//! columns.

use crate::{Sheet, TableError};

/// Located source and (possibly absent) destination columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Column holding the raw `"lat,lng"` text.
    pub coordinates: usize,
    /// Existing address column, if any.
    pub address: Option<usize>,
    /// Existing district column, if any.
    pub district: Option<usize>,
    /// Existing province column, if any.
    pub province: Option<usize>,
}

/// The three destination columns, guaranteed to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultColumns {
    /// Full-address column.
    pub address: usize,
    /// District column.
    pub district: usize,
    /// Province column.
    pub province: usize,
}

/// Header substrings that mark the coordinate column.
const COORDINATE_MARKERS: &[&str] = &["latlg", "lat", "coordinate", "coord"];

/// Locates the coordinate/address/district/province columns.
///
/// # Errors
///
/// Returns [`TableError::NoCoordinateColumn`] when neither the header
/// nor the first data row yields a usable coordinate column — a fatal
/// setup failure.
pub fn find_columns(rows: &[Vec<String>]) -> Result<ColumnLayout, TableError> {
    let header = rows.first().ok_or(TableError::Empty)?;

    let mut coordinates = None;
    let mut address = None;
    let mut district = None;
    let mut province = None;

    for (i, cell) in header.iter().enumerate() {
        let cell = cell.trim().to_lowercase();
        if coordinates.is_none() && COORDINATE_MARKERS.iter().any(|m| cell.contains(m)) {
            coordinates = Some(i);
        }
        if cell.contains("address") {
            address = Some(i);
        }
        if cell.contains("district") {
            district = Some(i);
        }
        if cell.contains("province") {
            province = Some(i);
        }
    }

    // No header match — look for a "float,float" cell in the first
    // data row instead.
    if coordinates.is_none()
        && let Some(first_data_row) = rows.get(1)
    {
        coordinates = detect_coordinate_column(first_data_row);
    }

    let coordinates = coordinates.ok_or(TableError::NoCoordinateColumn)?;

    log::info!(
        "Found coordinates column: {:?} (column {})",
        header.get(coordinates).map_or("", String::as_str),
        coordinates + 1
    );

    Ok(ColumnLayout {
        coordinates,
        address,
        district,
        province,
    })
}

/// Finds the first cell that splits on a comma into two parseable
/// floats.
fn detect_coordinate_column(row: &[String]) -> Option<usize> {
    row.iter().position(|cell| {
        cell.split_once(',').is_some_and(|(lat, lng)| {
            lat.trim().parse::<f64>().is_ok() && lng.trim().parse::<f64>().is_ok()
        })
    })
}

/// Returns the three destination columns, appending labeled columns
/// after the last existing header column when any is missing.
///
/// Column creation happens once, before any results are produced, so
/// workers never mutate the sheet.
pub fn ensure_result_columns(sheet: &mut Sheet, layout: ColumnLayout) -> ResultColumns {
    if let (Some(address), Some(district), Some(province)) =
        (layout.address, layout.district, layout.province)
    {
        return ResultColumns {
            address,
            district,
            province,
        };
    }

    let width = sheet.rows()[0].len();
    let columns = ResultColumns {
        address: width,
        district: width + 1,
        province: width + 2,
    };

    sheet.set_cell(0, columns.address, "Address");
    sheet.set_cell(0, columns.district, "District");
    sheet.set_cell(0, columns.province, "Province");

    log::info!(
        "Added Address/District/Province columns at columns {}-{}",
        columns.address + 1,
        columns.province + 1
    );

    columns
}
