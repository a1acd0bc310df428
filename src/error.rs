use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::dataset::DatasetId;

/// A column that a computation needed but the dataset does not provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumn {
    pub dataset: DatasetId,
    pub column: String,
}

impl MissingColumn {
    pub fn new(dataset: DatasetId, column: impl Into<String>) -> Self {
        Self {
            dataset,
            column: column.into(),
        }
    }
}

impl fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.column, self.dataset)
    }
}

/// Baseline columns are absent; nothing downstream can run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required columns: {}", join_missing(.0))]
    MissingColumns(Vec<MissingColumn>),
}

impl SchemaError {
    pub fn missing(&self) -> &[MissingColumn] {
        match self {
            SchemaError::MissingColumns(columns) => columns,
        }
    }
}

/// One derived metric could not be computed. Sibling metrics are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{metric} unavailable: {reason}")]
pub struct MetricUnavailable {
    pub metric: String,
    pub reason: String,
}

impl MetricUnavailable {
    pub fn new(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_columns(metric: impl Into<String>, missing: &[MissingColumn]) -> Self {
        Self::new(metric, format!("missing {}", join_missing(missing)))
    }
}

fn join_missing(columns: &[MissingColumn]) -> String {
    columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
