use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    config::RunConfig, data::parse_naive_date, dataset::DataPaths, filter::FilterConfig,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Influencer campaign analytics over CSV exports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute the full campaign report for a filter selection
    Report(ReportArgs),
    /// List the filterable values found in the datasets
    Facets(FacetsArgs),
    /// Show normalized column names and resolved aliases per dataset
    Columns(ColumnsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// YAML configuration file with `data`, `filters` and `top` sections
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory holding influencers.csv, posts.csv, tracking_data.csv and payouts.csv
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    /// Influencers file (overrides the data directory)
    #[arg(long)]
    pub influencers: Option<PathBuf>,
    /// Posts file (overrides the data directory)
    #[arg(long)]
    pub posts: Option<PathBuf>,
    /// Tracking file (overrides the data directory)
    #[arg(long)]
    pub tracking: Option<PathBuf>,
    /// Payouts file (overrides the data directory)
    #[arg(long)]
    pub payouts: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl InputArgs {
    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            data_dir: self.data_dir.clone(),
            influencers: self.influencers.clone(),
            posts: self.posts.clone(),
            tracking: self.tracking.clone(),
            payouts: self.payouts.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Platforms to include (repeatable; default all)
    #[arg(long = "platform", action = clap::ArgAction::Append)]
    pub platforms: Vec<String>,
    /// Campaigns to include (repeatable; default all)
    #[arg(long = "campaign", action = clap::ArgAction::Append)]
    pub campaigns: Vec<String>,
    /// Products to include (repeatable)
    #[arg(long = "product", action = clap::ArgAction::Append)]
    pub products: Vec<String>,
    /// Influencer categories to include (repeatable)
    #[arg(long = "category", action = clap::ArgAction::Append)]
    pub categories: Vec<String>,
    /// Influencer genders to include (repeatable)
    #[arg(long = "gender", action = clap::ArgAction::Append)]
    pub genders: Vec<String>,
    /// Minimum follower count (inclusive)
    #[arg(long = "min-followers")]
    pub min_followers: Option<f64>,
    /// Maximum follower count (inclusive)
    #[arg(long = "max-followers")]
    pub max_followers: Option<f64>,
    /// First post date to include (YYYY-MM-DD)
    #[arg(long = "start-date", value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,
    /// Last post date to include (YYYY-MM-DD)
    #[arg(long = "end-date", value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,
}

impl FilterArgs {
    /// Flags given on the command line; repeatable flags left empty stay unset.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            platforms: non_empty(&self.platforms),
            campaigns: non_empty(&self.campaigns),
            products: non_empty(&self.products),
            categories: non_empty(&self.categories),
            genders: non_empty(&self.genders),
            min_followers: self.min_followers,
            max_followers: self.max_followers,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of influencers listed in the top and poor ROAS highlights
    #[arg(long)]
    pub top: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl ReportArgs {
    pub fn overrides(&self) -> RunConfig {
        RunConfig {
            data: self.input.data_paths(),
            filters: self.filters.filter_config(),
            top: self.top,
        }
    }
}

#[derive(Debug, Args)]
pub struct FacetsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Maximum number of values listed per column (0 lists all)
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_naive_date(value).map_err(|err| err.to_string())
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
