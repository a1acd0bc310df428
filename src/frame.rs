//! In-memory, column-addressable tables.
//!
//! A [`Frame`] is an ordered list of rows whose cells are `Option<Value>`
//! (`None` is a null cell). Row-level transformations return new frames;
//! only the schema normalizer mutates a frame it owns.

use serde::Serialize;

use crate::data::Value;

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    /// Builds a frame, padding or truncating rows to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor from string cells; empty strings become nulls.
    pub fn from_strings<S: AsRef<str>>(columns: &[S], rows: &[Vec<S>]) -> Self {
        let columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let cell = cell.as_ref();
                        (!cell.is_empty()).then(|| Value::String(cell.to_string()))
                    })
                    .collect()
            })
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    /// Cells of one column in row order, or `None` when the column is absent.
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_ref()).collect())
    }

    pub fn sum(&self, name: &str) -> Option<f64> {
        self.column_values(name).map(|values| {
            values
                .into_iter()
                .flatten()
                .filter_map(Value::as_f64)
                .sum()
        })
    }

    pub fn filter_rows<F>(&self, mut keep: F) -> Frame
    where
        F: FnMut(&[Option<Value>]) -> bool,
    {
        Frame {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Projects the named columns that exist, in the requested order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Frame {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name.as_ref()))
            .collect();
        Frame {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for column in &mut self.columns {
            *column = rename(column);
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn map_column<F>(&mut self, name: &str, mut convert: F) -> bool
    where
        F: FnMut(Option<Value>) -> Option<Value>,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            let cell = row[idx].take();
            row[idx] = convert(cell);
        }
        true
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |cells| RowView { frame: self, cells })
    }
}

/// Borrowed row with by-name cell access.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    frame: &'a Frame,
    cells: &'a [Option<Value>],
}

impl<'a> RowView<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.frame.column_index(name)?;
        self.cells.get(idx)?.as_ref()
    }

    pub fn number(&self, name: &str) -> f64 {
        self.get(name).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(Value::as_display)
    }
}
