use crate::a1::{CellRange, column_letter};
use crate::error::{Error, Result};
use crate::resource::bind;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::OnceLock;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '£', '€', '¥'];

#[derive(Debug, Default, Deserialize)]
struct ValueRangeData {
    range: Option<String>,
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// A single value inside a [`Block`].
#[derive(Debug, Clone)]
pub struct Cell {
    row: usize,
    column: usize,
    value: Value,
    decimal: OnceLock<Option<Decimal>>,
}

impl Cell {
    fn new(row: usize, column: usize, value: Value) -> Self {
        Self {
            row,
            column,
            value,
            decimal: OnceLock::new(),
        }
    }

    /// Zero-based row within the block.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Zero-based column within the block.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_decimal().is_some()
    }

    /// The cell as a decimal number. Formatted text such as `$1,234.50`,
    /// `(12)` or `15%` is understood.
    pub fn as_decimal(&self) -> Option<Decimal> {
        *self.decimal.get_or_init(|| match &self.value {
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
            }
            Value::String(s) => parse_decimal(s),
            _ => None,
        })
    }

    /// A1 reference of this cell, given the block's origin.
    pub fn a1(&self, origin: &CellRange) -> String {
        format!(
            "{}{}",
            column_letter(origin.start_column + self.column as u32),
            origin.start_row as usize + self.row + 1
        )
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let mut s = text.trim();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }

    let percent = match s.strip_suffix('%') {
        Some(rest) => {
            s = rest.trim_end();
            true
        }
        None => false,
    };

    // one sign, before or after the currency symbol: -$5, $-5
    let mut signed = false;
    let mut symbol = false;
    loop {
        if !signed && let Some(rest) = s.strip_prefix(['-', '+']) {
            negative ^= s.starts_with('-');
            signed = true;
            s = rest.trim_start();
        } else if !symbol && let Some(rest) = s.strip_prefix(CURRENCY_SYMBOLS) {
            symbol = true;
            s = rest.trim_start();
        } else {
            break;
        }
    }

    if !is_number(s) {
        return None;
    }

    let digits: String = s.chars().filter(|c| *c != ',').collect();
    let mut value = Decimal::from_str(&digits)
        .or_else(|_| Decimal::from_str(&format!("0{}", digits)))
        .ok()?;

    if percent {
        value /= Decimal::ONE_HUNDRED;
    }
    if negative {
        value = -value;
    }
    Some(value)
}

// Digits with optional thousands groups and fraction, or a bare fraction.
fn is_number(s: &str) -> bool {
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (s, None),
    };
    if let Some(fraction) = fraction
        && (fraction.is_empty() || !digits(fraction))
    {
        return false;
    }
    if whole.is_empty() {
        return fraction.is_some();
    }

    let mut groups = whole.split(',');
    match groups.next() {
        Some(first) if whole.contains(',') => {
            (1..=3).contains(&first.len())
                && digits(first)
                && groups.all(|g| g.len() == 3 && digits(g))
        }
        _ => digits(whole),
    }
}

/// The values of a sheet range, row-major.
#[derive(Debug, Clone, Default)]
pub struct Block {
    range: Option<String>,
    major_dimension: Option<String>,
    rows: Vec<Vec<Cell>>,
}

impl Block {
    /// Bind a `ValueRange` payload.
    pub fn from_existing(raw: Value) -> Result<Self> {
        let data: ValueRangeData = bind(raw)?;
        Ok(Self::from_rows(data.range, data.major_dimension, data.values))
    }

    fn from_rows(
        range: Option<String>,
        major_dimension: Option<String>,
        values: Vec<Vec<Value>>,
    ) -> Self {
        // the API drops trailing empty cells; pad back to a rectangle
        let width = values.iter().map(Vec::len).max().unwrap_or(0);
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(r, mut row)| {
                row.resize(width, Value::Null);
                row.into_iter()
                    .enumerate()
                    .map(|(c, value)| Cell::new(r, c, value))
                    .collect()
            })
            .collect();

        Self {
            range,
            major_dimension,
            rows,
        }
    }

    pub fn range(&self) -> Option<&str> {
        self.range.as_deref()
    }

    pub fn major_dimension(&self) -> &str {
        self.major_dimension.as_deref().unwrap_or("ROWS")
    }

    /// Where the block starts, parsed from its range.
    pub fn origin(&self) -> Result<CellRange> {
        let range = self
            .range
            .as_deref()
            .ok_or_else(|| Error::Payload("value range has no range".to_string()))?;
        CellRange::parse(range)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flatten()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Rows after the first, keyed by the first row's text.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        let Some((header, body)) = self.rows.split_first() else {
            return Vec::new();
        };
        let keys: Vec<String> = header.iter().map(Cell::text).collect();

        body.iter()
            .map(|row| {
                keys.iter()
                    .enumerate()
                    .map(|(i, key)| {
                        let value = row.get(i).map(|c| c.value.clone()).unwrap_or(Value::Null);
                        (key.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }

    /// Rows for a values write: a header row of every key seen, then one row
    /// per record.
    pub fn rows_from_records(records: &[Map<String, Value>]) -> Vec<Vec<Value>> {
        let mut header: Vec<&String> = Vec::new();
        for key in records.iter().flat_map(Map::keys) {
            if !header.contains(&key) {
                header.push(key);
            }
        }

        let mut rows = vec![header.iter().map(|k| Value::String(k.to_string())).collect()];
        rows.extend(records.iter().map(|record| {
            header
                .iter()
                .map(|key| record.get(*key).cloned().unwrap_or(Value::Null))
                .collect()
        }));
        rows
    }
}
