pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod facets;
pub mod filter;
pub mod frame;
pub mod insights;
pub mod io_utils;
pub mod join;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, InputArgs, OutputFormat},
    config::RunConfig,
    dataset::{DatasetId, Datasets},
    insights::DEFAULT_HIGHLIGHT_SIZE,
    io_utils::ReadOptions,
    pipeline::Dashboard,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("campaign_lens", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => handle_report(&args),
        Commands::Facets(args) => handle_facets(&args),
        Commands::Columns(args) => handle_columns(&args),
    }
}

fn handle_report(args: &cli::ReportArgs) -> Result<()> {
    let config = load_config(&args.input)?.merged_with(&args.overrides());
    let datasets = load_datasets(&config, &args.input)?;
    let dashboard = Dashboard::new(&datasets).context("Validating dataset columns")?;

    let selection = dashboard.selection(&config.filters);
    debug!("Resolved filter selection: {selection:?}");
    let top = config.top.unwrap_or(DEFAULT_HIGHLIGHT_SIZE);
    let report = dashboard.compute(&selection, top);

    let rendered = match args.format {
        OutputFormat::Table => report::render_text(&report, dashboard.facets()),
        OutputFormat::Json => report::render_json(&report)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn handle_facets(args: &cli::FacetsArgs) -> Result<()> {
    let config = load_config(&args.input)?.merged_with(&RunConfig {
        data: args.input.data_paths(),
        ..RunConfig::default()
    });
    let datasets = load_datasets(&config, &args.input)?;
    let dashboard = Dashboard::new(&datasets).context("Validating dataset columns")?;
    println!("{}", report::render_facets(dashboard.facets(), args.top).trim_end());
    Ok(())
}

fn handle_columns(args: &cli::ColumnsArgs) -> Result<()> {
    let config = load_config(&args.input)?.merged_with(&RunConfig {
        data: args.input.data_paths(),
        ..RunConfig::default()
    });
    let datasets = load_datasets(&config, &args.input)?;

    let mut normalized = Datasets::default();
    let mut columns = Vec::new();
    let mut resolutions = Vec::new();
    for id in DatasetId::ALL {
        let (frame, resolved) = schema::normalize_frame(id, datasets.get(id));
        columns.push((id, frame.columns().to_vec()));
        resolutions.extend(resolved);
        *normalized.get_mut(id) = frame;
    }
    for missing in schema::missing_columns(&normalized, schema::REQUIRED_COLUMNS) {
        warn!("Required column missing: {missing}");
    }
    println!("{}", report::render_columns(&columns, &resolutions).trim_end());
    Ok(())
}

fn load_config(input: &InputArgs) -> Result<RunConfig> {
    match &input.config {
        Some(path) => {
            info!("Loading configuration from {path:?}");
            RunConfig::load(path)
        }
        None => Ok(RunConfig::default()),
    }
}

fn load_datasets(config: &RunConfig, input: &InputArgs) -> Result<Datasets> {
    let options = ReadOptions {
        delimiter: input.delimiter,
        encoding: io_utils::resolve_encoding(input.input_encoding.as_deref())?,
    };
    if let Some(delimiter) = input.delimiter {
        debug!("Reading datasets with delimiter '{}'", printable_delimiter(delimiter));
    }
    Datasets::load(&config.data, options)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
