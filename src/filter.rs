//! Filter engine: narrows influencers and tracking records to a selection.
//!
//! A [`FilterSelection`] is fully concrete. Platforms and campaigns are
//! always applied (an empty set selects nothing); every other dimension is
//! optional and passes all rows when unset, empty, or when the backing
//! column does not exist. Date ranges live on posts and are applied by the
//! post-performance view through [`filter_by_date()`].
//!
//! [`FilterConfig`] is the partial form read from YAML or the command line;
//! [`FilterConfig::resolve()`] completes it against the available facets.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, cell_label},
    dataset::DatasetId,
    facets::Facets,
    frame::Frame,
    schema::{self, NormalizedDatasets},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowerRange {
    pub min: f64,
    pub max: f64,
}

impl FollowerRange {
    pub fn contains(&self, followers: f64) -> bool {
        followers >= self.min && followers <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub platforms: BTreeSet<String>,
    pub campaigns: BTreeSet<String>,
    pub products: Option<BTreeSet<String>>,
    pub categories: Option<BTreeSet<String>>,
    pub genders: Option<BTreeSet<String>>,
    pub follower_range: Option<FollowerRange>,
    pub date_range: Option<DateRange>,
}

impl FilterSelection {
    /// Selection that keeps every row: all platforms and campaigns, nothing else constrained.
    pub fn everything(facets: &Facets) -> Self {
        Self {
            platforms: facets.platforms.labels().collect(),
            campaigns: facets.campaigns.labels().collect(),
            ..Self::default()
        }
    }
}

/// Influencer and tracking tables after filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredViews {
    pub influencers: Frame,
    pub tracking: Frame,
}

pub fn apply(datasets: &NormalizedDatasets, selection: &FilterSelection) -> FilteredViews {
    let influencers = filter_influencers(datasets.get(DatasetId::Influencers), selection);
    let tracking = filter_tracking(datasets.get(DatasetId::Tracking), selection);
    debug!(
        "Filters kept {} influencer(s) and {} tracking record(s)",
        influencers.len(),
        tracking.len()
    );
    FilteredViews {
        influencers,
        tracking,
    }
}

pub fn filter_influencers(frame: &Frame, selection: &FilterSelection) -> Frame {
    let platform = frame.column_index(schema::PLATFORM);
    let category = optional_dimension(frame, schema::CATEGORY, selection.categories.as_ref());
    let gender = optional_dimension(frame, schema::GENDER, selection.genders.as_ref());
    let followers = selection
        .follower_range
        .and_then(|range| frame.column_index(schema::FOLLOWER_COUNT).map(|idx| (idx, range)));

    frame.filter_rows(|row| {
        let platform_ok = platform.is_some_and(|idx| is_selected(row, idx, &selection.platforms));
        platform_ok
            && category.is_none_or(|(idx, set)| is_selected(row, idx, set))
            && gender.is_none_or(|(idx, set)| is_selected(row, idx, set))
            && followers.is_none_or(|(idx, range)| {
                row[idx]
                    .as_ref()
                    .and_then(Value::as_f64)
                    .is_some_and(|count| range.contains(count))
            })
    })
}

pub fn filter_tracking(frame: &Frame, selection: &FilterSelection) -> Frame {
    let campaign = frame.column_index(schema::CAMPAIGN);
    let product = optional_dimension(frame, schema::PRODUCT, selection.products.as_ref());

    frame.filter_rows(|row| {
        campaign.is_some_and(|idx| is_selected(row, idx, &selection.campaigns))
            && product.is_none_or(|(idx, set)| is_selected(row, idx, set))
    })
}

/// Keeps rows whose `date` falls within `range`; rows without a date are dropped.
pub fn filter_by_date(frame: &Frame, range: &DateRange) -> Frame {
    let Some(idx) = frame.column_index(schema::DATE) else {
        return frame.clone();
    };
    frame.filter_rows(|row| {
        row[idx]
            .as_ref()
            .and_then(Value::as_date)
            .is_some_and(|date| range.contains(date))
    })
}

fn optional_dimension<'a>(
    frame: &Frame,
    column: &str,
    selected: Option<&'a BTreeSet<String>>,
) -> Option<(usize, &'a BTreeSet<String>)> {
    let set = selected.filter(|set| !set.is_empty())?;
    frame.column_index(column).map(|idx| (idx, set))
}

fn is_selected(row: &[Option<Value>], idx: usize, selected: &BTreeSet<String>) -> bool {
    selected.contains(&cell_label(row[idx].as_ref()))
}

/// Partially specified filters; unset fields are completed by [`FilterConfig::resolve()`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub platforms: Option<Vec<String>>,
    pub campaigns: Option<Vec<String>>,
    pub products: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub genders: Option<Vec<String>>,
    pub min_followers: Option<f64>,
    pub max_followers: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterConfig {
    /// Values set in `overrides` win over values in `self`.
    pub fn merged_with(&self, overrides: &FilterConfig) -> FilterConfig {
        FilterConfig {
            platforms: overrides.platforms.clone().or_else(|| self.platforms.clone()),
            campaigns: overrides.campaigns.clone().or_else(|| self.campaigns.clone()),
            products: overrides.products.clone().or_else(|| self.products.clone()),
            categories: overrides
                .categories
                .clone()
                .or_else(|| self.categories.clone()),
            genders: overrides.genders.clone().or_else(|| self.genders.clone()),
            min_followers: overrides.min_followers.or(self.min_followers),
            max_followers: overrides.max_followers.or(self.max_followers),
            start_date: overrides.start_date.or(self.start_date),
            end_date: overrides.end_date.or(self.end_date),
        }
    }

    /// Completes the selection: unset required dimensions select every
    /// available value, partial ranges are closed with the facet bounds.
    pub fn resolve(&self, facets: &Facets) -> FilterSelection {
        let platforms = match &self.platforms {
            Some(values) => values.iter().cloned().collect(),
            None => facets.platforms.labels().collect(),
        };
        let campaigns = match &self.campaigns {
            Some(values) => values.iter().cloned().collect(),
            None => facets.campaigns.labels().collect(),
        };

        let follower_range = if self.min_followers.is_some() || self.max_followers.is_some() {
            let (low, high) = facets.follower_bounds;
            Some(FollowerRange {
                min: self.min_followers.unwrap_or(low),
                max: self.max_followers.unwrap_or(high),
            })
        } else {
            None
        };

        let date_range = if self.start_date.is_some() || self.end_date.is_some() {
            let (low, high) = facets
                .date_bounds
                .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
            Some(DateRange {
                start: self.start_date.unwrap_or(low),
                end: self.end_date.unwrap_or(high),
            })
        } else {
            None
        };

        FilterSelection {
            platforms,
            campaigns,
            products: optional_set(&self.products),
            categories: optional_set(&self.categories),
            genders: optional_set(&self.genders),
            follower_range,
            date_range,
        }
    }
}

fn optional_set(values: &Option<Vec<String>>) -> Option<BTreeSet<String>> {
    values
        .as_ref()
        .filter(|values| !values.is_empty())
        .map(|values| values.iter().cloned().collect())
}
