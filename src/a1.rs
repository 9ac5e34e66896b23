//! A1 notation: `'Sheet1'!A1:B2`.
//!
//! Indices are zero-based with exclusive ends, matching the Sheets API's
//! `GridRange`. Rows render one-based and the end column renders as the
//! last included column.

use crate::error::{Error, Result};
use std::fmt;

/// Column letters for a zero-based index: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
pub fn column_letter(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index as u64 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Zero-based index for column letters (case-insensitive).
pub fn column_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidArgument("empty column reference".to_string()));
    }

    let mut n: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidArgument(format!(
                "invalid column reference '{}'",
                letters
            )));
        }
        n = n * 26 + (c.to_ascii_uppercase() as u8 - b'A') as u64 + 1;
        if n > u32::MAX as u64 {
            return Err(Error::InvalidArgument(format!(
                "column reference '{}' out of range",
                letters
            )));
        }
    }

    Ok((n - 1) as u32)
}

/// Quote a sheet title for use in a range, doubling embedded quotes.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Build an A1 range from zero-based starts and exclusive ends.
///
/// An end that is not past its start is clamped to a single row/column.
pub fn range(title: &str, start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> String {
    CellRange {
        sheet: Some(title.to_string()),
        start_row,
        start_column: start_col,
        end_row: end_row.max(start_row.saturating_add(1)),
        end_column: end_col.max(start_col.saturating_add(1)),
    }
    .to_string()
}

/// A rectangular range of cells, optionally qualified by a sheet title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: Option<String>,
    pub start_row: u32,
    pub start_column: u32,
    /// Exclusive.
    pub end_row: u32,
    /// Exclusive.
    pub end_column: u32,
}

impl CellRange {
    /// Parse `A1`, `A1:B2`, `Sheet1!A1:B2` or `'My Sheet'!A1:B2`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (sheet, cells) = split_sheet(input)?;

        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (parse_cell(start)?, parse_cell(end)?),
            None => {
                let cell = parse_cell(cells)?;
                (cell, cell)
            }
        };

        if end.0 < start.0 || end.1 < start.1 {
            return Err(Error::InvalidArgument(format!(
                "range '{}' ends before it starts",
                input
            )));
        }

        Ok(Self {
            sheet,
            start_row: start.0,
            start_column: start.1,
            end_row: end.0.saturating_add(1),
            end_column: end.1.saturating_add(1),
        })
    }

    pub fn height(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row)
    }

    pub fn width(&self) -> u32 {
        self.end_column.saturating_sub(self.start_column)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_title(sheet))?;
        }
        write!(
            f,
            "{}{}:{}{}",
            column_letter(self.start_column),
            u64::from(self.start_row) + 1,
            column_letter(self.end_column.saturating_sub(1)),
            self.end_row
        )
    }
}

fn split_sheet(input: &str) -> Result<(Option<String>, &str)> {
    if let Some(quoted) = input.strip_prefix('\'') {
        // find the closing quote, skipping doubled quotes
        let bytes = quoted.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                let title = quoted[..i].replace("''", "'");
                let rest = quoted[i + 1..].strip_prefix('!').ok_or_else(|| {
                    Error::InvalidArgument(format!("expected '!' after sheet title in '{}'", input))
                })?;
                return Ok((Some(title), rest));
            }
            i += 1;
        }
        return Err(Error::InvalidArgument(format!(
            "unterminated sheet title in '{}'",
            input
        )));
    }

    match input.rsplit_once('!') {
        Some((title, rest)) => Ok((Some(title.to_string()), rest)),
        None => Ok((None, input)),
    }
}

/// Parse a single cell reference into zero-based (row, column).
fn parse_cell(cell: &str) -> Result<(u32, u32)> {
    let cell = cell.trim().trim_start_matches('$');
    let split = cell
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(|| Error::InvalidArgument(format!("missing row in cell '{}'", cell)))?;
    let (letters, digits) = cell.split_at(split);
    let digits = digits.trim_start_matches('$');

    let column = column_index(letters)?;
    let row: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("invalid row in cell '{}'", cell)))?;
    if row == 0 {
        return Err(Error::InvalidArgument(format!(
            "rows start at 1 in cell '{}'",
            cell
        )));
    }

    Ok((row - 1, column))
}
