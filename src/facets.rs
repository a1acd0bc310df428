//! Filter options: the distinct values, ranges, and counts a selection can draw from.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    data::{Value, cell_label},
    dataset::DatasetId,
    frame::Frame,
    schema::{self, NormalizedDatasets},
    stats::NumericSummary,
};

/// Bounds offered when no influencer carries a usable follower count.
pub const DEFAULT_FOLLOWER_BOUNDS: (f64, f64) = (0.0, 1_000_000.0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
}

/// Distinct values of one column in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetValues {
    pub column: String,
    pub total: usize,
    pub values: Vec<FacetValue>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl FacetValues {
    pub fn from_column(frame: &Frame, column: &str) -> Option<Self> {
        let cells = frame.column_values(column)?;
        let mut facet = FacetValues {
            column: column.to_string(),
            total: 0,
            values: Vec::new(),
            positions: HashMap::new(),
        };
        for cell in cells {
            facet.record(cell_label(cell));
        }
        Some(facet)
    }

    fn record(&mut self, label: String) {
        self.total += 1;
        match self.positions.get(&label) {
            Some(&idx) => self.values[idx].count += 1,
            None => {
                self.positions.insert(label.clone(), self.values.len());
                self.values.push(FacetValue {
                    value: label,
                    count: 1,
                });
            }
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = String> + '_ {
        self.values.iter().map(|v| v.value.clone())
    }

    /// Most frequent values first, ties broken alphabetically.
    pub fn ranked(&self, top: usize) -> Vec<&FacetValue> {
        let mut items: Vec<&FacetValue> = self.values.iter().collect();
        items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        if top > 0 && items.len() > top {
            items.truncate(top);
        }
        items
    }

    pub fn render_rows(&self, dataset: DatasetId, top: usize) -> Vec<Vec<String>> {
        if self.total == 0 {
            return Vec::new();
        }
        self.ranked(top)
            .into_iter()
            .map(|item| {
                let percent = (item.count as f64 / self.total as f64) * 100.0;
                let value = if item.value.is_empty() {
                    "<empty>".to_string()
                } else {
                    item.value.clone()
                };
                vec![
                    dataset.to_string(),
                    self.column.clone(),
                    value,
                    item.count.to_string(),
                    format!("{percent:.2}%"),
                ]
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub platforms: FacetValues,
    pub campaigns: FacetValues,
    pub products: Option<FacetValues>,
    pub categories: Option<FacetValues>,
    pub genders: Option<FacetValues>,
    pub follower_bounds: (f64, f64),
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Facets {
    pub fn compute(datasets: &NormalizedDatasets) -> Self {
        let influencers = datasets.get(DatasetId::Influencers);
        let tracking = datasets.get(DatasetId::Tracking);
        let posts = datasets.get(DatasetId::Posts);

        Facets {
            platforms: FacetValues::from_column(influencers, schema::PLATFORM).unwrap_or_default(),
            campaigns: FacetValues::from_column(tracking, schema::CAMPAIGN).unwrap_or_default(),
            products: FacetValues::from_column(tracking, schema::PRODUCT),
            categories: FacetValues::from_column(influencers, schema::CATEGORY),
            genders: FacetValues::from_column(influencers, schema::GENDER),
            follower_bounds: follower_bounds(influencers),
            date_bounds: date_bounds(posts),
        }
    }

    /// Categorical facets paired with the dataset they come from.
    pub fn categorical(&self) -> Vec<(DatasetId, &FacetValues)> {
        let mut facets = vec![
            (DatasetId::Influencers, &self.platforms),
            (DatasetId::Tracking, &self.campaigns),
        ];
        if let Some(products) = &self.products {
            facets.push((DatasetId::Tracking, products));
        }
        if let Some(categories) = &self.categories {
            facets.push((DatasetId::Influencers, categories));
        }
        if let Some(genders) = &self.genders {
            facets.push((DatasetId::Influencers, genders));
        }
        facets
    }
}

fn follower_bounds(influencers: &Frame) -> (f64, f64) {
    let Some(cells) = influencers.column_values(schema::FOLLOWER_COUNT) else {
        return DEFAULT_FOLLOWER_BOUNDS;
    };
    let mut summary = NumericSummary::default();
    for count in cells.into_iter().flatten().filter_map(Value::as_f64) {
        summary.add(count);
    }
    match (summary.min(), summary.max()) {
        (Some(min), Some(max)) => (min.floor(), max.ceil()),
        _ => DEFAULT_FOLLOWER_BOUNDS,
    }
}

fn date_bounds(posts: &Frame) -> Option<(NaiveDate, NaiveDate)> {
    let cells = posts.column_values(schema::DATE)?;
    let dates: Vec<NaiveDate> = cells.into_iter().flatten().filter_map(Value::as_date).collect();
    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    Some((*min, *max))
}
