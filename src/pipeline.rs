//! One dashboard recomputation: filter, join, measure, rank.
//!
//! [`Dashboard`] normalizes the raw datasets once; every call to
//! [`Dashboard::compute()`] is then a pure function of the selection.

use log::info;
use serde::Serialize;

use crate::{
    dataset::Datasets,
    error::SchemaError,
    facets::Facets,
    filter::{self, FilterConfig, FilterSelection},
    frame::Frame,
    insights::{DEFAULT_HIGHLIGHT_SIZE, Highlights},
    metrics::{
        self, IncrementalRoasRow, MetricOutcome, Overview, PersonaBreakdown, RoasRow, RoiRow,
        Summary,
    },
    schema::{self, AliasResolution, NormalizedDatasets},
};

#[derive(Debug, Clone)]
pub struct Dashboard {
    datasets: NormalizedDatasets,
    facets: Facets,
}

/// Everything shown for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub selection: FilterSelection,
    pub overview: Overview,
    pub influencers: Frame,
    pub posts: Frame,
    pub roas: MetricOutcome<Vec<RoasRow>>,
    pub roi: MetricOutcome<Vec<RoiRow>>,
    pub incremental_roas: MetricOutcome<Vec<IncrementalRoasRow>>,
    pub highlights: MetricOutcome<Highlights>,
    pub personas: MetricOutcome<Vec<PersonaBreakdown>>,
    pub summary: Summary,
}

impl Dashboard {
    pub fn new(raw: &Datasets) -> Result<Self, SchemaError> {
        let datasets = schema::normalize(raw)?;
        let facets = Facets::compute(&datasets);
        Ok(Self { datasets, facets })
    }

    pub fn datasets(&self) -> &NormalizedDatasets {
        &self.datasets
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn resolutions(&self) -> &[AliasResolution] {
        &self.datasets.resolutions
    }

    /// Completes a partial filter configuration against this dashboard's facets.
    pub fn selection(&self, config: &FilterConfig) -> FilterSelection {
        config.resolve(&self.facets)
    }

    pub fn compute(&self, selection: &FilterSelection, highlight_size: usize) -> DashboardReport {
        let views = filter::apply(&self.datasets, selection);
        let posts = metrics::post_performance(&self.datasets, &views, selection);
        let roas = metrics::roas(&self.datasets, &views);
        let roi = metrics::roi(&self.datasets, &views);
        let incremental_roas = metrics::incremental_roas(&self.datasets, &views);
        let highlights = roas.map(|rows| Highlights::from_roas(rows, highlight_size));
        let personas = metrics::persona_insights(&roas, &views);
        let summary = metrics::summary(&views, &roas);
        let overview = metrics::overview(&views, selection);
        info!(
            "Computed dashboard for {} influencer(s) and {} tracking record(s)",
            overview.influencers, overview.tracking_records
        );

        DashboardReport {
            selection: selection.clone(),
            overview,
            influencers: views.influencers,
            posts,
            roas,
            roi,
            incremental_roas,
            highlights,
            personas,
            summary,
        }
    }

    /// Report for the unfiltered data.
    pub fn compute_all(&self) -> DashboardReport {
        self.compute(&FilterSelection::everything(&self.facets), DEFAULT_HIGHLIGHT_SIZE)
    }
}
