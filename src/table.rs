//! Client-side sortable table.
//!
//! Sorting is driven by column "clicks" that maintain a priority list of
//! sort keys. Keys are applied as successive stable sorts in priority order,
//! so rows that tie on every key keep their original order. Rows pinned to
//! the bottom are sorted among themselves and always come last.
//!
//! A key only orders a column whose present cells are all text or all
//! numbers. Any other column is left in its current order for that key.
//! Rows missing the column go after the rows that have it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use unicase::UniCase;

use crate::filter::SortDirection;

/// A single cell. Only text and numbers have an ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Other(serde_json::Value),
}

impl CellValue {

    /// Text used when rendering the cell.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Other(serde_json::Value::Null) => String::new(),
            CellValue::Other(v) => v.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<u64> for CellValue {
    fn from(n: u64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => CellValue::Text(s),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Other(serde_json::Value::Number(n)),
            },
            other => CellValue::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableRow {
    pub cells: BTreeMap<String, CellValue>,
    pub pinned_bottom: bool,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned_bottom = true;
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

/// Sort keys in priority order. Index 0 is the most recently clicked key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortState {
    keys: Vec<SortKey>,
}

impl SortState {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Handle a click on a column header.
    ///
    /// Clicking the key at priority 0 toggles its direction. Clicking any
    /// other column moves it to priority 0, ascending; the remaining keys
    /// keep their relative order.
    pub fn click(&mut self, column: &str) {
        if let Some(first) = self.keys.first_mut()
            && first.column == column
        {
            first.direction = first.direction.toggled();
            return;
        }

        self.keys.retain(|key| key.column != column);
        self.keys.insert(
            0,
            SortKey {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            },
        );
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Sort rows by the active keys, placing pinned rows last.
pub fn sort_rows(rows: &[TableRow], state: &SortState) -> Vec<TableRow> {
    let (mut body, mut pinned): (Vec<TableRow>, Vec<TableRow>) =
        rows.iter().cloned().partition(|row| !row.pinned_bottom);

    apply_keys(&mut body, state.keys());
    apply_keys(&mut pinned, state.keys());

    body.extend(pinned);
    body
}

/// How a column can be ordered, decided from every present cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Number,
    Unordered,
}

fn column_kind(rows: &[TableRow], column: &str) -> ColumnKind {
    let mut kind = None;
    for value in rows.iter().filter_map(|row| row.get(column)) {
        let this = match value {
            CellValue::Text(_) => ColumnKind::Text,
            CellValue::Number(_) => ColumnKind::Number,
            CellValue::Other(_) => return ColumnKind::Unordered,
        };
        match kind {
            None => kind = Some(this),
            Some(seen) if seen != this => return ColumnKind::Unordered,
            Some(_) => {}
        }
    }
    kind.unwrap_or(ColumnKind::Unordered)
}

/// NaN sorts after every number; all NaNs tie.
fn compare_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Compare two present cells of a column of the given kind.
fn compare_cells(kind: ColumnKind, a: &CellValue, b: &CellValue) -> Ordering {
    match (kind, a, b) {
        (ColumnKind::Text, CellValue::Text(a), CellValue::Text(b)) => {
            UniCase::new(a.as_str()).cmp(&UniCase::new(b.as_str()))
        }
        (ColumnKind::Number, CellValue::Number(a), CellValue::Number(b)) => {
            compare_numbers(*a, *b)
        }
        _ => Ordering::Equal,
    }
}

fn apply_keys(rows: &mut [TableRow], keys: &[SortKey]) {
    for key in keys {
        let kind = column_kind(rows, &key.column);
        if kind == ColumnKind::Unordered {
            continue;
        }
        rows.sort_by(|a, b| match (a.get(&key.column), b.get(&key.column)) {
            (Some(x), Some(y)) => {
                let ordering = compare_cells(kind, x, y);
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}
