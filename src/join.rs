//! In-memory inner hash joins between frames.
//!
//! Duplicate column names are never suffixed. Each join states which side
//! owns a column present on both sides ([`Precedence`]); the other side's
//! copy is dropped before rows are combined. Rows whose key cell is null
//! never match.

use std::collections::{HashMap, HashSet};

use log::trace;
use thiserror::Error;

use crate::{
    data::join_key,
    frame::{Frame, Row},
};

/// Side whose copy of a shared non-key column survives the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct JoinSpec<'a> {
    pub left_key: &'a str,
    pub right_key: &'a str,
    pub precedence: Precedence,
}

impl<'a> JoinSpec<'a> {
    pub fn inner(left_key: &'a str, right_key: &'a str) -> Self {
        Self {
            left_key,
            right_key,
            precedence: Precedence::Left,
        }
    }

    pub fn prefer(self, precedence: Precedence) -> Self {
        Self { precedence, ..self }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Join key '{column}' not found in {side} table")]
pub struct MissingJoinKey {
    pub side: &'static str,
    pub column: String,
}

pub fn join(left: &Frame, right: &Frame, spec: &JoinSpec<'_>) -> Result<Frame, MissingJoinKey> {
    let left_key = left.column_index(spec.left_key).ok_or_else(|| MissingJoinKey {
        side: "left",
        column: spec.left_key.to_string(),
    })?;
    let right_key = right.column_index(spec.right_key).ok_or_else(|| MissingJoinKey {
        side: "right",
        column: spec.right_key.to_string(),
    })?;

    let (left_columns, right_columns) = output_columns(left, right, left_key, right_key, spec);
    let mut headers: Vec<String> = left_columns
        .iter()
        .map(|&idx| left.columns()[idx].clone())
        .collect();
    headers.extend(right_columns.iter().map(|&idx| right.columns()[idx].clone()));

    let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in right.rows().iter().enumerate() {
        if let Some(key) = join_key(row[right_key].as_ref()) {
            lookup.entry(key).or_default().push(row_idx);
        }
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut matched = 0usize;
    for row in left.rows() {
        let Some(indices) = join_key(row[left_key].as_ref()).and_then(|key| lookup.get(&key))
        else {
            continue;
        };
        for &right_idx in indices {
            matched += 1;
            let right_row = &right.rows()[right_idx];
            let mut combined: Row = left_columns.iter().map(|&i| row[i].clone()).collect();
            combined.extend(right_columns.iter().map(|&i| right_row[i].clone()));
            rows.push(combined);
        }
    }
    trace!(
        "Joined {} x {} row(s) on {}={}: {} matched, {} output",
        left.len(),
        right.len(),
        spec.left_key,
        spec.right_key,
        matched,
        rows.len()
    );
    Ok(Frame::new(headers, rows))
}

fn output_columns(
    left: &Frame,
    right: &Frame,
    left_key: usize,
    right_key: usize,
    spec: &JoinSpec<'_>,
) -> (Vec<usize>, Vec<usize>) {
    let left_names: HashSet<&str> = left.columns().iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != right_key)
        .map(|(_, name)| name.as_str())
        .collect();

    let left_columns = left
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx == left_key
                || spec.precedence == Precedence::Left
                || !right_names.contains(name.as_str())
        })
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    let right_columns = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            if *idx == right_key {
                return name.as_str() != spec.left_key;
            }
            let shared = left_names.contains(name.as_str());
            let shadows_key = name.as_str() == spec.left_key;
            !shadows_key && (!shared || spec.precedence == Precedence::Right)
        })
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    (left_columns, right_columns)
}
