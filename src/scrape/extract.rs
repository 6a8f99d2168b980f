//! Row-to-record extraction rules.
//!
//! Cell texts arrive from the page accessor in DOM order; this module
//! assigns column keys and applies the fixed sub-field split for the
//! designated columns.

// ============================================================================
// Imports
// ============================================================================

use super::session::Record;

// ============================================================================
// Constants
// ============================================================================

/// 1-based columns that are additionally split into sub-fields.
pub const SPLIT_COLUMNS: [usize; 2] = [3, 4];

/// Fixed sub-field arity: shorter cells pad, longer cells truncate.
pub const SPLIT_PART_COUNT: usize = 4;

// ============================================================================
// Extraction
// ============================================================================

/// Builds one [`Record`] from a row's cell texts.
///
/// Every cell becomes `column_<n>`. Cells in [`SPLIT_COLUMNS`] also get
/// exactly [`SPLIT_PART_COUNT`] sub-fields `column_<n>_part_<k>`, split
/// on line boundaries: missing parts render as empty strings, parts
/// beyond the fixed arity are discarded.
#[must_use]
pub fn record_from_cells(row_index: u64, page: u32, cells: &[String]) -> Record {
    let mut columns: Vec<(String, String)> = Vec::with_capacity(cells.len());

    for (i, cell) in cells.iter().enumerate() {
        let number = i + 1;
        columns.push((format!("column_{number}"), cell.clone()));

        if SPLIT_COLUMNS.contains(&number) {
            for (part, value) in split_parts(cell).into_iter().enumerate() {
                columns.push((format!("column_{number}_part_{}", part + 1), value));
            }
        }
    }

    Record {
        row_index,
        page,
        columns,
    }
}

/// Builds records for a whole page of rows.
///
/// Row indices continue from `start_index` so the dataset-wide sequence
/// stays gapless.
#[must_use]
pub fn records_from_rows(start_index: u64, page: u32, rows: &[Vec<String>]) -> Vec<Record> {
    rows.iter()
        .enumerate()
        .map(|(offset, cells)| record_from_cells(start_index + offset as u64, page, cells))
        .collect()
}

/// Splits a cell into exactly [`SPLIT_PART_COUNT`] trimmed line parts.
fn split_parts(cell: &str) -> Vec<String> {
    let mut parts: Vec<String> = cell
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    parts.truncate(SPLIT_PART_COUNT);
    while parts.len() < SPLIT_PART_COUNT {
        parts.push(String::new());
    }
    parts
}

// ============================================================================
// Tests
// ============================================================================
