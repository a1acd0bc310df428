//! Text and JSON rendering of a [`DashboardReport`].

use std::collections::BTreeSet;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::{
    dataset::DatasetId,
    facets::Facets,
    filter::FilterSelection,
    insights::Highlights,
    metrics::{IncrementalRoasRow, MetricOutcome, PersonaInsightRow, RoasRow, RoiRow},
    pipeline::DashboardReport,
    schema::AliasResolution,
    table::{self, Tabular, format_amount, format_number},
};

const NO_INFLUENCERS: &str = "No influencers match the selected filters.";
const NO_POSTS: &str = "No posts found for the selected filters.";

impl Tabular for RoasRow {
    fn headers() -> Vec<&'static str> {
        vec![
            "influencer_id",
            "name",
            "basis",
            "rate",
            "orders",
            "total_payout",
            "total_revenue",
            "roas",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.influencer_id.clone(),
            self.name.clone().unwrap_or_default(),
            self.basis.clone().unwrap_or_default(),
            self.rate.map(format_number).unwrap_or_default(),
            self.orders.map(format_number).unwrap_or_default(),
            format_amount(self.total_payout),
            format_amount(self.total_revenue),
            format!("{:.2}", self.roas),
        ]
    }
}

impl Tabular for RoiRow {
    fn headers() -> Vec<&'static str> {
        vec!["influencer_id", "campaign", "product", "revenue", "total_payout", "roi_%"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.influencer_id.clone(),
            self.campaign.clone().unwrap_or_default(),
            self.product.clone().unwrap_or_default(),
            format_amount(self.revenue),
            format_amount(self.total_payout),
            format!("{:.2}", self.roi_pct),
        ]
    }
}

impl Tabular for IncrementalRoasRow {
    fn headers() -> Vec<&'static str> {
        vec!["influencer_id", "orders", "revenue", "total_payout", "iroas"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.influencer_id.clone(),
            format_number(self.orders),
            format_amount(self.revenue),
            format_amount(self.total_payout),
            format!("{:.2}", self.iroas),
        ]
    }
}

impl Tabular for PersonaInsightRow {
    fn headers() -> Vec<&'static str> {
        vec!["value", "avg_roas", "count"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            if self.value.is_empty() {
                "<empty>".to_string()
            } else {
                self.value.clone()
            },
            format!("{:.2}", self.avg_roas),
            self.count.to_string(),
        ]
    }
}

pub fn render_json(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Serializing dashboard report")
}

pub fn render_text(report: &DashboardReport, facets: &Facets) -> String {
    let mut out = String::new();

    section(&mut out, "Overview");
    out.push_str(&table::render_pairs(&[
        ("Total Influencers", report.overview.influencers.to_string()),
        ("Active Campaigns", report.overview.campaigns.to_string()),
        ("Tracking Records", report.overview.tracking_records.to_string()),
        ("Platforms Selected", report.overview.platforms_selected.to_string()),
    ]));

    section(&mut out, "Influencer Details");
    if report.influencers.is_empty() {
        warning(&mut out, NO_INFLUENCERS);
    } else {
        out.push_str(&table::render_frame(&report.influencers));
    }

    section(&mut out, "Post Performance");
    if report.posts.is_empty() {
        warning(&mut out, NO_POSTS);
    } else {
        out.push_str(&table::render_frame(&report.posts));
    }

    section(&mut out, "ROAS & Campaign Performance");
    render_outcome(&mut out, &report.roas, "No ROAS data available for the selected filters.");

    section(&mut out, "ROI by Campaign");
    render_outcome(&mut out, &report.roi, "No ROI data available for the selected filters.");

    section(&mut out, "Incremental ROAS");
    render_outcome(
        &mut out,
        &report.incremental_roas,
        "No incremental ROAS data available for the selected filters.",
    );

    render_highlights(&mut out, &report.highlights);
    render_personas(&mut out, report);

    section(&mut out, "Filter Impact Summary");
    out.push_str(&table::render_pairs(&[
        ("Total Revenue", format_amount(report.summary.total_revenue)),
        ("Total Orders", format_number(report.summary.total_orders)),
        ("Average ROAS", format!("{:.2}", report.summary.avg_roas)),
        (
            "Revenue per Influencer",
            format_amount(report.summary.revenue_per_influencer),
        ),
    ]));

    section(&mut out, "Active Filters");
    for line in active_filters(&report.selection, facets) {
        let _ = writeln!(out, "- {line}");
    }
    out
}

/// Facet listing used by the `facets` command.
pub fn render_facets(facets: &Facets, top: usize) -> String {
    let mut out = String::new();
    let headers = ["dataset", "column", "value", "count", "percent"]
        .map(String::from)
        .to_vec();
    let rows = facets
        .categorical()
        .into_iter()
        .flat_map(|(dataset, values)| values.render_rows(dataset, top))
        .collect::<Vec<_>>();
    out.push_str(&table::render_table(&headers, &rows));

    let (low, high) = facets.follower_bounds;
    let _ = writeln!(
        out,
        "\nFollower count range: {} - {}",
        format_number(low),
        format_number(high)
    );
    match facets.date_bounds {
        Some((start, end)) => {
            let _ = writeln!(out, "Post date range: {start} - {end}");
        }
        None => {
            let _ = writeln!(out, "Post date range: unavailable");
        }
    }
    out
}

/// Normalized column names of every dataset followed by the alias decisions.
pub fn render_columns(
    columns: &[(DatasetId, Vec<String>)],
    resolutions: &[AliasResolution],
) -> String {
    let headers = vec!["dataset".to_string(), "columns".to_string()];
    let rows = columns
        .iter()
        .map(|(dataset, names)| vec![dataset.to_string(), names.join(", ")])
        .collect::<Vec<_>>();
    let mut out = table::render_table(&headers, &rows);

    let headers = ["dataset", "field", "source"].map(String::from).to_vec();
    let rows = resolutions
        .iter()
        .map(|resolution| {
            vec![
                resolution.dataset.to_string(),
                resolution.canonical.to_string(),
                resolution
                    .source
                    .clone()
                    .unwrap_or_else(|| "<missing>".to_string()),
            ]
        })
        .collect::<Vec<_>>();
    out.push('\n');
    out.push_str(&table::render_table(&headers, &rows));
    out
}

/// Human-readable description of each filter dimension.
pub fn active_filters(selection: &FilterSelection, facets: &Facets) -> Vec<String> {
    let mut lines = vec![
        format!("Platforms: {}", describe_required(&selection.platforms)),
        format!("Campaigns: {}", describe_required(&selection.campaigns)),
    ];
    if facets.products.is_some() {
        lines.push(format!(
            "Products: {}",
            describe_optional(selection.products.as_ref(), "products")
        ));
    }
    if facets.categories.is_some() {
        lines.push(format!(
            "Categories: {}",
            describe_optional(selection.categories.as_ref(), "categories")
        ));
    }
    if facets.genders.is_some() {
        lines.push(format!(
            "Genders: {}",
            describe_optional(selection.genders.as_ref(), "genders")
        ));
    }
    lines.push(match selection.follower_range {
        Some(range) => format!(
            "Follower Range: {} - {}",
            format_amount(range.min),
            format_amount(range.max)
        ),
        None => "Follower Range: Full range included".to_string(),
    });
    lines.push(match selection.date_range {
        Some(range) => format!("Date Range: {} to {}", range.start, range.end),
        None => "Date Range: All dates included".to_string(),
    });
    lines
}

fn describe_required(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "None selected".to_string()
    } else {
        values.iter().map(|v| display_label(v)).join(", ")
    }
}

fn describe_optional(values: Option<&BTreeSet<String>>, noun: &str) -> String {
    match values.filter(|set| !set.is_empty()) {
        Some(set) => format!("{} selected", set.len()),
        None => format!("All {noun} included"),
    }
}

fn display_label(value: &str) -> &str {
    if value.is_empty() { "<empty>" } else { value }
}

fn render_outcome<T: Tabular>(out: &mut String, outcome: &MetricOutcome<Vec<T>>, empty: &str) {
    match outcome {
        MetricOutcome::Computed(rows) if rows.is_empty() => warning(out, empty),
        MetricOutcome::Computed(rows) => out.push_str(&table::render_records(rows)),
        MetricOutcome::Unavailable(reason) => warning(out, &reason.to_string()),
    }
}

fn render_highlights(out: &mut String, highlights: &MetricOutcome<Highlights>) {
    match highlights {
        MetricOutcome::Computed(highlights) => {
            section(out, "Top Influencers (by ROAS)");
            if highlights.top.is_empty() {
                warning(out, "No influencers to rank.");
            } else {
                out.push_str(&table::render_records(&highlights.top));
            }
            section(out, "Influencers with Poor ROAS (Below 1)");
            if highlights.poor.is_empty() {
                let _ = writeln!(out, "No influencers with ROAS below 1.");
            } else {
                out.push_str(&table::render_records(&highlights.poor));
            }
        }
        MetricOutcome::Unavailable(reason) => {
            section(out, "Insights");
            warning(out, &reason.to_string());
        }
    }
}

fn render_personas(out: &mut String, report: &DashboardReport) {
    match &report.personas {
        MetricOutcome::Computed(breakdowns) if breakdowns.is_empty() => {
            section(out, "Persona Insights");
            warning(out, "No persona columns available.");
        }
        MetricOutcome::Computed(breakdowns) => {
            for breakdown in breakdowns {
                section(out, &format!("Average ROAS by {}", title_case(&breakdown.dimension)));
                if breakdown.rows.is_empty() {
                    warning(out, "No data for this dimension.");
                } else {
                    out.push_str(&table::render_records(&breakdown.rows));
                }
            }
        }
        MetricOutcome::Unavailable(reason) => {
            section(out, "Persona Insights");
            warning(out, &reason.to_string());
        }
    }
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "== {title} ==");
}

fn warning(out: &mut String, message: &str) {
    let _ = writeln!(out, "warning: {message}");
}
