//! Join & metric pipeline.
//!
//! Every computation here is a pure function of the normalized datasets and
//! the filtered views. Each metric checks its own columns and reports a
//! [`MetricUnavailable`] instead of failing, so one missing column never
//! blocks a sibling metric. Ratios follow one policy: a zero or non-finite
//! denominator yields `0`, and every ratio is rounded to two decimals.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use serde::Serialize;

use crate::{
    data::{Value, join_key, round2, safe_ratio},
    dataset::DatasetId,
    error::{MetricUnavailable, MissingColumn},
    filter::{self, FilterSelection, FilteredViews},
    frame::Frame,
    insights,
    join::{self, JoinSpec, Precedence},
    schema::{self, Field, NormalizedDatasets},
    stats::{GroupedSummary, NumericSummary},
};

pub const ROAS_METRIC: &str = "ROAS";
pub const ROI_METRIC: &str = "ROI";
pub const INCREMENTAL_ROAS_METRIC: &str = "Incremental ROAS";
pub const PERSONA_METRIC: &str = "Persona insights";

const POST_DISPLAY_COLUMNS: &[&str] = &[
    schema::INFLUENCER_ID,
    schema::PLATFORM,
    schema::DATE,
    "url",
    "caption",
    "reach",
    "likes",
    "comments",
];

/// Persona dimensions in presentation order.
pub const PERSONA_DIMENSIONS: &[&str] = &[schema::CATEGORY, schema::GENDER, schema::PLATFORM];

/// Result of one metric: the computed value (possibly empty) or why it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum MetricOutcome<T> {
    Computed(T),
    Unavailable(MetricUnavailable),
}

impl<T> MetricOutcome<T> {
    pub fn computed(&self) -> Option<&T> {
        match self {
            MetricOutcome::Computed(value) => Some(value),
            MetricOutcome::Unavailable(_) => None,
        }
    }

    pub fn unavailable(&self) -> Option<&MetricUnavailable> {
        match self {
            MetricOutcome::Computed(_) => None,
            MetricOutcome::Unavailable(reason) => Some(reason),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, MetricOutcome::Computed(_))
    }

    pub fn map<U, F: FnOnce(&T) -> U>(&self, f: F) -> MetricOutcome<U> {
        match self {
            MetricOutcome::Computed(value) => MetricOutcome::Computed(f(value)),
            MetricOutcome::Unavailable(reason) => MetricOutcome::Unavailable(reason.clone()),
        }
    }

    fn from_result(result: Result<T, MetricUnavailable>) -> Self {
        match result {
            Ok(value) => MetricOutcome::Computed(value),
            Err(reason) => {
                warn!("{reason}");
                MetricOutcome::Unavailable(reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoasRow {
    pub influencer_id: String,
    pub name: Option<String>,
    pub basis: Option<String>,
    pub rate: Option<f64>,
    pub orders: Option<f64>,
    pub total_payout: f64,
    pub total_revenue: f64,
    pub roas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiRow {
    pub influencer_id: String,
    pub campaign: Option<String>,
    pub product: Option<String>,
    pub revenue: f64,
    pub total_payout: f64,
    pub roi_pct: f64,
}

/// Revenue per tracked order. Named "incremental" by the business, but no
/// control-group baseline is involved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncrementalRoasRow {
    pub influencer_id: String,
    pub orders: f64,
    pub revenue: f64,
    pub total_payout: f64,
    pub iroas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaInsightRow {
    pub value: String,
    pub avg_roas: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaBreakdown {
    pub dimension: String,
    pub rows: Vec<PersonaInsightRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_revenue: f64,
    pub total_orders: f64,
    pub avg_roas: f64,
    pub revenue_per_influencer: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub influencers: usize,
    pub campaigns: usize,
    pub tracking_records: usize,
    pub platforms_selected: usize,
}

fn require(
    datasets: &NormalizedDatasets,
    metric: &str,
    columns: &[(DatasetId, &str)],
) -> Result<(), MetricUnavailable> {
    let missing: Vec<MissingColumn> = schema::missing_columns(&datasets.datasets, columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MetricUnavailable::missing_columns(metric, &missing))
    }
}

fn key_text(value: Option<&Value>) -> String {
    join_key(value).unwrap_or_default()
}

/// Posts joined to the filtered influencers, optionally narrowed to a date range.
///
/// The influencer's platform replaces the post's own platform column.
pub fn post_performance(
    datasets: &NormalizedDatasets,
    views: &FilteredViews,
    selection: &FilterSelection,
) -> Frame {
    let posts = datasets.get(DatasetId::Posts);
    let spec = JoinSpec::inner(schema::INFLUENCER_ID, schema::ID).prefer(Precedence::Right);
    let mut merged = match join::join(posts, &views.influencers, &spec) {
        Ok(frame) => frame,
        Err(err) => {
            warn!("Post performance unavailable: {err}");
            return Frame::default();
        }
    };
    if let Some(range) = &selection.date_range {
        merged = filter::filter_by_date(&merged, range);
    }

    let mut display: Vec<&str> = POST_DISPLAY_COLUMNS.to_vec();
    if views.influencers.has_column(schema::CATEGORY) {
        display.push(schema::CATEGORY);
    }
    debug!("Post performance view has {} row(s)", merged.len());
    merged.select(&display)
}

/// Total tracked revenue keyed by influencer id.
pub fn revenue_by_influencer(tracking: &Frame) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in tracking.iter_rows() {
        if let Some(key) = join_key(row.get(schema::INFLUENCER_ID)) {
            *totals.entry(key).or_insert(0.0) += row.number(schema::REVENUE);
        }
    }
    totals
}

pub fn roas(datasets: &NormalizedDatasets, views: &FilteredViews) -> MetricOutcome<Vec<RoasRow>> {
    MetricOutcome::from_result(compute_roas(datasets, views))
}

fn compute_roas(
    datasets: &NormalizedDatasets,
    views: &FilteredViews,
) -> Result<Vec<RoasRow>, MetricUnavailable> {
    require(
        datasets,
        ROAS_METRIC,
        &[
            (DatasetId::Tracking, schema::INFLUENCER_ID),
            (DatasetId::Tracking, schema::REVENUE),
            (DatasetId::Payouts, schema::INFLUENCER_ID),
            (DatasetId::Payouts, schema::TOTAL_PAYOUT),
            (DatasetId::Influencers, schema::ID),
            (DatasetId::Influencers, schema::NAME),
        ],
    )?;

    let revenue = revenue_by_influencer(&views.tracking);
    let mut names: HashMap<String, Option<String>> = HashMap::new();
    for row in views.influencers.iter_rows() {
        if let Some(key) = join_key(row.get(schema::ID)) {
            names.entry(key).or_insert_with(|| row.text(schema::NAME));
        }
    }

    let rows = datasets
        .get(DatasetId::Payouts)
        .iter_rows()
        .filter_map(|row| {
            let key = join_key(row.get(schema::INFLUENCER_ID))?;
            let name = names.get(&key)?.clone();
            let total_revenue = revenue.get(&key).copied().unwrap_or(0.0);
            let total_payout = row.number(schema::TOTAL_PAYOUT);
            Some(RoasRow {
                roas: round2(safe_ratio(total_revenue, total_payout)),
                influencer_id: key,
                name,
                basis: row.text(schema::BASIS),
                rate: row.get(schema::RATE).and_then(Value::as_f64),
                orders: row.get(schema::ORDERS).and_then(Value::as_f64),
                total_payout,
                total_revenue,
            })
        })
        .collect::<Vec<_>>();
    debug!("ROAS computed for {} payout row(s)", rows.len());
    Ok(rows)
}

/// Payouts reduced to the join key and payout amount, so no other payout
/// column can shadow a tracking column.
fn payout_amounts(payouts: &Frame) -> Frame {
    payouts.select(&[schema::INFLUENCER_ID, schema::TOTAL_PAYOUT])
}

pub fn roi(datasets: &NormalizedDatasets, views: &FilteredViews) -> MetricOutcome<Vec<RoiRow>> {
    MetricOutcome::from_result(compute_roi(datasets, views))
}

fn compute_roi(
    datasets: &NormalizedDatasets,
    views: &FilteredViews,
) -> Result<Vec<RoiRow>, MetricUnavailable> {
    if !datasets.has_field(Field::TotalPayout) {
        return Err(MetricUnavailable::new(
            ROI_METRIC,
            "'total_payout' or 'payout_amount' missing in payouts",
        ));
    }
    require(
        datasets,
        ROI_METRIC,
        &[
            (DatasetId::Tracking, schema::INFLUENCER_ID),
            (DatasetId::Tracking, schema::REVENUE),
            (DatasetId::Payouts, schema::INFLUENCER_ID),
        ],
    )?;

    let payouts = payout_amounts(datasets.get(DatasetId::Payouts));
    let merged = join::join(
        &views.tracking,
        &payouts,
        &JoinSpec::inner(schema::INFLUENCER_ID, schema::INFLUENCER_ID),
    )
    .map_err(|err| MetricUnavailable::new(ROI_METRIC, err.to_string()))?;

    Ok(merged
        .iter_rows()
        .map(|row| {
            let revenue = row.number(schema::REVENUE);
            let total_payout = row.number(schema::TOTAL_PAYOUT);
            RoiRow {
                influencer_id: key_text(row.get(schema::INFLUENCER_ID)),
                campaign: row.text(schema::CAMPAIGN),
                product: row.text(schema::PRODUCT),
                revenue,
                total_payout,
                roi_pct: round2(safe_ratio(revenue - total_payout, total_payout) * 100.0),
            }
        })
        .collect())
}

pub fn incremental_roas(
    datasets: &NormalizedDatasets,
    views: &FilteredViews,
) -> MetricOutcome<Vec<IncrementalRoasRow>> {
    MetricOutcome::from_result(compute_incremental_roas(datasets, views))
}

#[derive(Default)]
struct Totals {
    orders: f64,
    revenue: f64,
    total_payout: f64,
}

fn compute_incremental_roas(
    datasets: &NormalizedDatasets,
    views: &FilteredViews,
) -> Result<Vec<IncrementalRoasRow>, MetricUnavailable> {
    require(
        datasets,
        INCREMENTAL_ROAS_METRIC,
        &[
            (DatasetId::Tracking, schema::INFLUENCER_ID),
            (DatasetId::Tracking, schema::REVENUE),
            (DatasetId::Tracking, schema::ORDERS),
            (DatasetId::Payouts, schema::INFLUENCER_ID),
            (DatasetId::Payouts, schema::TOTAL_PAYOUT),
        ],
    )?;

    // Tracking orders are observed customer orders; the payout-side copy is dropped.
    let payouts = payout_amounts(datasets.get(DatasetId::Payouts));
    let merged = join::join(
        &views.tracking,
        &payouts,
        &JoinSpec::inner(schema::INFLUENCER_ID, schema::INFLUENCER_ID),
    )
    .map_err(|err| MetricUnavailable::new(INCREMENTAL_ROAS_METRIC, err.to_string()))?;

    let mut groups: BTreeMap<Value, Totals> = BTreeMap::new();
    for row in merged.iter_rows() {
        let Some(key) = row.get(schema::INFLUENCER_ID) else {
            continue;
        };
        let totals = groups.entry(key.clone()).or_default();
        totals.orders += row.number(schema::ORDERS);
        totals.revenue += row.number(schema::REVENUE);
        totals.total_payout += row.number(schema::TOTAL_PAYOUT);
    }

    Ok(groups
        .into_iter()
        .map(|(key, totals)| IncrementalRoasRow {
            influencer_id: key.as_display(),
            iroas: round2(safe_ratio(totals.revenue, totals.orders)),
            orders: totals.orders,
            revenue: totals.revenue,
            total_payout: totals.total_payout,
        })
        .collect())
}

/// Average ROAS per persona value for every persona dimension the influencers carry.
pub fn persona_insights(
    roas: &MetricOutcome<Vec<RoasRow>>,
    views: &FilteredViews,
) -> MetricOutcome<Vec<PersonaBreakdown>> {
    let rows = match roas {
        MetricOutcome::Computed(rows) => rows,
        MetricOutcome::Unavailable(reason) => {
            return MetricOutcome::from_result(Err(MetricUnavailable::new(
                PERSONA_METRIC,
                format!("ROAS data not available ({})", reason.reason),
            )));
        }
    };
    MetricOutcome::from_result(compute_persona_insights(rows, &views.influencers))
}

fn compute_persona_insights(
    rows: &[RoasRow],
    influencers: &Frame,
) -> Result<Vec<PersonaBreakdown>, MetricUnavailable> {
    let dimensions: Vec<&str> = PERSONA_DIMENSIONS
        .iter()
        .copied()
        .filter(|column| influencers.has_column(column))
        .collect();
    if dimensions.is_empty() {
        return Err(MetricUnavailable::new(
            PERSONA_METRIC,
            "no persona columns (category, gender, platform) available",
        ));
    }

    let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in influencers.iter_rows().enumerate() {
        if let Some(key) = join_key(row.get(schema::ID)) {
            by_id.entry(key).or_default().push(idx);
        }
    }

    let breakdowns = dimensions
        .into_iter()
        .map(|dimension| {
            let mut grouped = GroupedSummary::default();
            for roas_row in rows {
                for &idx in by_id.get(&roas_row.influencer_id).into_iter().flatten() {
                    grouped.add(influencers.value(idx, dimension), roas_row.roas);
                }
            }
            let mut breakdown = PersonaBreakdown {
                dimension: dimension.to_string(),
                rows: grouped
                    .into_groups()
                    .into_iter()
                    .map(|(value, summary)| PersonaInsightRow {
                        value: value.as_display(),
                        avg_roas: summary.mean().unwrap_or(0.0),
                        count: summary.count(),
                    })
                    .collect(),
            };
            insights::rank_personas(&mut breakdown);
            breakdown
        })
        .collect();
    Ok(breakdowns)
}

pub fn summary(views: &FilteredViews, roas: &MetricOutcome<Vec<RoasRow>>) -> Summary {
    let total_revenue = views.tracking.sum(schema::REVENUE).unwrap_or(0.0);
    let total_orders = views.tracking.sum(schema::ORDERS).unwrap_or(0.0);
    let avg_roas = roas
        .computed()
        .map(|rows| rows.iter().map(|r| r.roas).collect::<NumericSummary>())
        .and_then(|summary| summary.mean())
        .unwrap_or(0.0);
    Summary {
        total_revenue,
        total_orders,
        avg_roas,
        revenue_per_influencer: safe_ratio(total_revenue, views.influencers.len() as f64),
    }
}

pub fn overview(views: &FilteredViews, selection: &FilterSelection) -> Overview {
    let campaigns = views
        .tracking
        .column_values(schema::CAMPAIGN)
        .map(|cells| {
            cells
                .into_iter()
                .map(key_text)
                .collect::<BTreeSet<_>>()
                .len()
        })
        .unwrap_or(0);
    Overview {
        influencers: views.influencers.len(),
        campaigns,
        tracking_records: views.tracking.len(),
        platforms_selected: selection.platforms.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Datasets;

    fn views_for(datasets: &NormalizedDatasets) -> FilteredViews {
        FilteredViews {
            influencers: datasets.get(DatasetId::Influencers).clone(),
            tracking: datasets.get(DatasetId::Tracking).clone(),
        }
    }

    fn normalized(payouts: Frame) -> NormalizedDatasets {
        schema::normalize(&Datasets {
            influencers: Frame::from_strings(
                &["id", "name", "platform", "gender"],
                &[
                    vec!["1", "A", "Instagram", "F"],
                    vec!["2", "B", "YouTube", "M"],
                    vec!["3", "C", "Instagram", "M"],
                ],
            ),
            posts: Frame::from_strings(&["influencer_id"], &[]),
            tracking: Frame::from_strings(
                &["influencer_id", "campaign", "revenue", "orders"],
                &[
                    vec!["1", "Summer", "1000", "10"],
                    vec!["3", "Summer", "100", "0"],
                    vec!["3", "Winter", "150", "0"],
                ],
            ),
            payouts,
        })
        .unwrap()
    }

    #[test]
    fn roas_divides_revenue_by_payout_and_guards_zero() {
        let data = normalized(Frame::from_strings(
            &["influencer_id", "total_payout"],
            &[vec!["1", "500"], vec!["2", "0"], vec!["3", "100"]],
        ));
        let rows = roas(&data, &views_for(&data)).computed().cloned().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].total_revenue, rows[0].roas), (1000.0, 2.0));
        assert_eq!(rows[0].name.as_deref(), Some("A"));
        assert_eq!((rows[1].total_revenue, rows[1].roas), (0.0, 0.0));
        assert_eq!((rows[2].total_revenue, rows[2].roas), (250.0, 2.5));
    }

    #[test]
    fn roas_only_covers_filtered_influencers() {
        let data = normalized(Frame::from_strings(
            &["influencer_id", "total_payout"],
            &[vec!["1", "500"], vec!["2", "10"]],
        ));
        let mut views = views_for(&data);
        views.influencers = views
            .influencers
            .filter_rows(|row| row[0] == Some(Value::Integer(1)));
        let rows = roas(&data, &views).computed().cloned().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].influencer_id, "1");
    }

    #[test]
    fn roi_is_per_tracking_row_and_uses_payout_alias() {
        let data = normalized(Frame::from_strings(
            &["influencer_id", "payout_amount"],
            &[vec!["1", "400"], vec!["3", "0"]],
        ));
        let rows = roi(&data, &views_for(&data)).computed().cloned().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].roi_pct, 150.0);
        assert_eq!(rows[1].roi_pct, 0.0);
        assert_eq!(rows[2].campaign.as_deref(), Some("Winter"));
    }

    #[test]
    fn roi_without_payout_column_is_unavailable_but_roas_reports_independently() {
        let data = normalized(Frame::from_strings(&["influencer_id", "basis"], &[]));
        let views = views_for(&data);
        let roi_outcome = roi(&data, &views);
        assert_eq!(
            roi_outcome.unavailable().map(|u| u.metric.as_str()),
            Some(ROI_METRIC)
        );
        assert!(!data.has_field(Field::TotalPayout));
        assert_eq!(
            roi_outcome.unavailable().map(|u| u.reason.as_str()),
            Some("'total_payout' or 'payout_amount' missing in payouts")
        );
        assert!(roas(&data, &views).unavailable().is_some());
        assert!(incremental_roas(&data, &views).unavailable().is_some());
        assert_eq!(summary(&views, &roas(&data, &views)).total_revenue, 1250.0);
    }

    #[test]
    fn incremental_roas_prefers_tracking_orders_and_clamps_zero_orders() {
        let data = normalized(Frame::from_strings(
            &["influencer_id", "orders", "total_payout"],
            &[vec!["1", "999", "500"], vec!["3", "999", "50"]],
        ));
        let rows = incremental_roas(&data, &views_for(&data))
            .computed()
            .cloned()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].influencer_id, "1");
        assert_eq!((rows[0].orders, rows[0].iroas), (10.0, 100.0));
        assert_eq!(rows[1].revenue, 250.0);
        assert_eq!(rows[1].total_payout, 100.0);
        assert_eq!(rows[1].iroas, 0.0);
    }

    #[test]
    fn persona_insights_average_roas_per_dimension() {
        let data = normalized(Frame::from_strings(
            &["influencer_id", "total_payout"],
            &[vec!["1", "500"], vec!["2", "100"], vec!["3", "50"]],
        ));
        let views = views_for(&data);
        let roas_outcome = roas(&data, &views);
        let breakdowns = persona_insights(&roas_outcome, &views)
            .computed()
            .cloned()
            .unwrap();
        let dimensions: Vec<&str> = breakdowns.iter().map(|b| b.dimension.as_str()).collect();
        assert_eq!(dimensions, vec!["gender", "platform"]);

        let platform = &breakdowns[1];
        assert_eq!(platform.rows[0].value, "Instagram");
        assert_eq!(platform.rows[0].avg_roas, 3.5);
        assert_eq!(platform.rows[0].count, 2);
        assert_eq!(platform.rows[1].value, "YouTube");
        assert_eq!(platform.rows[1].avg_roas, 0.0);
    }

    #[test]
    fn summary_and_overview_reflect_filtered_views() {
        let data = normalized(Frame::from_strings(
            &["influencer_id", "total_payout"],
            &[vec!["1", "500"], vec!["3", "50"]],
        ));
        let views = views_for(&data);
        let roas_outcome = roas(&data, &views);
        let totals = summary(&views, &roas_outcome);
        assert_eq!(totals.total_revenue, 1250.0);
        assert_eq!(totals.total_orders, 10.0);
        assert_eq!(totals.avg_roas, 3.5);
        assert!((totals.revenue_per_influencer - 1250.0 / 3.0).abs() < 1e-9);

        let selection = FilterSelection {
            platforms: ["Instagram".to_string()].into_iter().collect(),
            ..FilterSelection::default()
        };
        let counts = overview(&views, &selection);
        assert_eq!(counts.campaigns, 2);
        assert_eq!(counts.tracking_records, 3);
        assert_eq!(counts.platforms_selected, 1);
    }

    #[test]
    fn post_view_prefers_influencer_platform_and_filters_dates() {
        let data = schema::normalize(&Datasets {
            influencers: Frame::from_strings(
                &["id", "name", "platform", "category"],
                &[vec!["1", "A", "Instagram", "Fitness"]],
            ),
            posts: Frame::from_strings(
                &["influencer_id", "platform", "date", "likes"],
                &[
                    vec!["1", "Twitter", "2024-01-02", "5"],
                    vec!["1", "Twitter", "2024-03-02", "8"],
                    vec!["7", "Twitter", "2024-01-02", "1"],
                ],
            ),
            tracking: Frame::from_strings(&["influencer_id", "campaign"], &[]),
            payouts: Frame::from_strings(&["influencer_id"], &[]),
        })
        .unwrap();
        let views = views_for(&data);
        let selection = FilterSelection {
            date_range: Some(filter::DateRange {
                start: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            }),
            ..FilterSelection::default()
        };
        let view = post_performance(&data, &views, &selection);
        assert_eq!(
            view.columns(),
            &["influencer_id", "platform", "date", "likes", "category"]
        );
        assert_eq!(view.len(), 1);
        assert_eq!(
            view.value(0, "platform"),
            Some(&Value::String("Instagram".into()))
        );
    }
}
