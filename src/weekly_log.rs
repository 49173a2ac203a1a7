//! The weekly contact log: a grid whose first row holds week labels and whose
//! first column holds `<Name>'s Students` headers, each opening one staff
//! member's block of rows.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::roster::staff_key;

const BLOCK_MARKER: &str = "'s students";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyLog {
    rows: Vec<Vec<String>>,
}

impl WeeklyLog {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: &str) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.to_string();
    }

    /// Inserts an empty row so that it becomes row `at`; rows below shift down.
    pub fn insert_row(&mut self, at: usize) {
        let at = at.min(self.rows.len());
        self.rows.insert(at, Vec::new());
    }

    /// Column whose first-row label equals `label` after trimming.
    pub fn find_week_column(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.rows
            .first()?
            .iter()
            .position(|header| header.trim() == label)
    }

    pub fn require_week_column(&self, label: &str) -> EngineResult<usize> {
        self.find_week_column(label)
            .ok_or_else(|| EngineError::WeekColumnNotFound(label.to_string()))
    }

    /// Non-empty, normalised emails in a week column, header row excluded.
    pub fn column_emails(&self, column: usize) -> impl Iterator<Item = String> + '_ {
        (1..self.rows.len())
            .map(move |row| normalize_email(self.cell(row, column)))
            .filter(|email| !email.is_empty())
    }

    /// Staff blocks in table order, computed from the first column.
    pub fn blocks(&self) -> Vec<StaffBlock> {
        let headers: Vec<(usize, String)> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(row, _)| block_staff_name(self.cell(row, 0)).map(|name| (row, name)))
            .collect();

        headers
            .iter()
            .enumerate()
            .map(|(i, (header_row, staff))| StaffBlock {
                key: staff_key(staff),
                staff: staff.clone(),
                header_row: *header_row,
                end_row: headers
                    .get(i + 1)
                    .map(|(next, _)| *next)
                    .unwrap_or(self.rows.len()),
            })
            .collect()
    }
}

/// One staff member's rows: `header_row` holds the label, data rows run up
/// to (not including) `end_row`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffBlock {
    pub staff: String,
    key: String,
    pub header_row: usize,
    pub end_row: usize,
}

impl StaffBlock {
    pub fn data_rows(&self) -> std::ops::Range<usize> {
        self.header_row + 1..self.end_row
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Staff name from a `<Name>'s Students` header cell, if it is one. Text
/// after the marker, such as "(Tue)", is ignored.
pub fn block_staff_name(cell: &str) -> Option<String> {
    let cell = cell.replace(['\u{2018}', '\u{2019}'], "'");
    let split = cell.to_ascii_lowercase().find(BLOCK_MARKER)?;
    let name = cell[..split].trim();
    if name.is_empty() || !name.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    Some(name.to_string())
}

/// Writes emails into the current week's column, one per student, never twice.
pub struct PlacementGuard<'a> {
    log: &'a mut WeeklyLog,
    column: usize,
    blocks: Vec<StaffBlock>,
    seen: HashSet<String>,
}

impl<'a> PlacementGuard<'a> {
    pub fn open(log: &'a mut WeeklyLog, week_label: &str) -> EngineResult<Self> {
        let column = log.require_week_column(week_label)?;
        let blocks = log.blocks();
        let seen: HashSet<String> = log.column_emails(column).collect();
        debug!(
            week = week_label,
            column,
            blocks = blocks.len(),
            already_logged = seen.len(),
            "opened weekly log column"
        );
        Ok(Self {
            log,
            column,
            blocks,
            seen,
        })
    }

    pub fn contains(&self, email: &str) -> bool {
        self.seen.contains(&normalize_email(email))
    }

    /// Writes `email` into the first empty cell of `staff`'s block, growing the
    /// block by one row when it is full. Returns the row written.
    pub fn place(&mut self, email: &str, staff: &str) -> EngineResult<usize> {
        let key = staff_key(staff);
        let index = self
            .blocks
            .iter()
            .position(|block| block.key == key)
            .ok_or_else(|| EngineError::StaffBlockNotFound(staff.to_string()))?;

        let block = &self.blocks[index];
        let empty_row = block
            .data_rows()
            .find(|&row| self.log.cell(row, self.column).trim().is_empty());

        let row = match empty_row {
            Some(row) => row,
            None => {
                let row = block.end_row;
                self.log.insert_row(row);
                self.blocks[index].end_row += 1;
                for later in &mut self.blocks[index + 1..] {
                    later.header_row += 1;
                    later.end_row += 1;
                }
                debug!(staff, row, "grew staff block");
                row
            }
        };

        let email = normalize_email(email);
        self.log.set_cell(row, self.column, &email);
        self.seen.insert(email);
        Ok(row)
    }
}
