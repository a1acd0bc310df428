//! YAML run configuration.
//!
//! ```yaml
//! data:
//!   data_dir: ./data
//!   payouts: ./exports/payouts_q3.csv
//! filters:
//!   platforms: [Instagram, YouTube]
//!   min_followers: 10000
//!   start_date: 2025-01-01
//! top: 10
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{dataset::DataPaths, filter::FilterConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub data: DataPaths,
    pub filters: FilterConfig,
    pub top: Option<usize>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening configuration file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing configuration file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Values set in `overrides` win over values in `self`.
    pub fn merged_with(&self, overrides: &RunConfig) -> RunConfig {
        RunConfig {
            data: self.data.merged_with(&overrides.data),
            filters: self.filters.merged_with(&overrides.filters),
            top: overrides.top.or(self.top),
        }
    }
}
