//! The four campaign datasets and where they come from.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    frame::Frame,
    io_utils::{self, ReadOptions},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    Influencers,
    Posts,
    Tracking,
    Payouts,
}

impl DatasetId {
    pub const ALL: [DatasetId; 4] = [
        DatasetId::Influencers,
        DatasetId::Posts,
        DatasetId::Tracking,
        DatasetId::Payouts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::Influencers => "influencers",
            DatasetId::Posts => "posts",
            DatasetId::Tracking => "tracking",
            DatasetId::Payouts => "payouts",
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            DatasetId::Influencers => "influencers.csv",
            DatasetId::Posts => "posts.csv",
            DatasetId::Tracking => "tracking_data.csv",
            DatasetId::Payouts => "payouts.csv",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit mapping from dataset identifier to its table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub influencers: Frame,
    pub posts: Frame,
    pub tracking: Frame,
    pub payouts: Frame,
}

impl Datasets {
    pub fn get(&self, id: DatasetId) -> &Frame {
        match id {
            DatasetId::Influencers => &self.influencers,
            DatasetId::Posts => &self.posts,
            DatasetId::Tracking => &self.tracking,
            DatasetId::Payouts => &self.payouts,
        }
    }

    pub fn get_mut(&mut self, id: DatasetId) -> &mut Frame {
        match id {
            DatasetId::Influencers => &mut self.influencers,
            DatasetId::Posts => &mut self.posts,
            DatasetId::Tracking => &mut self.tracking,
            DatasetId::Payouts => &mut self.payouts,
        }
    }

    pub fn load(paths: &DataPaths, options: ReadOptions) -> Result<Self> {
        let mut datasets = Datasets::default();
        for id in DatasetId::ALL {
            let path = paths.path(id);
            let frame = io_utils::read_frame(&path, options)
                .with_context(|| format!("Loading {id} dataset from {path:?}"))?;
            *datasets.get_mut(id) = frame;
        }
        info!(
            "Loaded datasets: {} influencer(s), {} post(s), {} tracking record(s), {} payout(s)",
            datasets.influencers.len(),
            datasets.posts.len(),
            datasets.tracking.len(),
            datasets.payouts.len()
        );
        Ok(datasets)
    }
}

/// File locations of the four datasets. Unset entries resolve under `data_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataPaths {
    pub data_dir: Option<PathBuf>,
    pub influencers: Option<PathBuf>,
    pub posts: Option<PathBuf>,
    pub tracking: Option<PathBuf>,
    pub payouts: Option<PathBuf>,
}

impl DataPaths {
    pub const DEFAULT_DIR: &'static str = "data";

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: Some(dir.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    fn explicit(&self, id: DatasetId) -> Option<&PathBuf> {
        match id {
            DatasetId::Influencers => self.influencers.as_ref(),
            DatasetId::Posts => self.posts.as_ref(),
            DatasetId::Tracking => self.tracking.as_ref(),
            DatasetId::Payouts => self.payouts.as_ref(),
        }
    }

    pub fn path(&self, id: DatasetId) -> PathBuf {
        if let Some(path) = self.explicit(id) {
            return path.clone();
        }
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_DIR))
            .join(id.default_file_name())
    }

    /// Values set in `overrides` win over values in `self`.
    pub fn merged_with(&self, overrides: &DataPaths) -> DataPaths {
        DataPaths {
            data_dir: overrides.data_dir.clone().or_else(|| self.data_dir.clone()),
            influencers: overrides
                .influencers
                .clone()
                .or_else(|| self.influencers.clone()),
            posts: overrides.posts.clone().or_else(|| self.posts.clone()),
            tracking: overrides.tracking.clone().or_else(|| self.tracking.clone()),
            payouts: overrides.payouts.clone().or_else(|| self.payouts.clone()),
        }
    }
}
