//! Schema normalization for the four campaign datasets.
//!
//! Column names are canonicalized (trimmed, lowercased) once, logical fields
//! that arrive under several spellings are resolved through a declarative
//! alias table and renamed to one canonical name, and designated columns are
//! coerced to keys, numbers, or dates. Coercion never drops rows: cells that
//! fail to parse become `0` or null depending on the column.
//!
//! Downstream modules only ever see canonical lowercase names.

use serde::Serialize;

use crate::{
    data::{coerce_date, coerce_key, coerce_nullable_number, coerce_zero_filled_number},
    dataset::{DatasetId, Datasets},
    error::{MissingColumn, SchemaError},
    frame::Frame,
};

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const PLATFORM: &str = "platform";
pub const CATEGORY: &str = "category";
pub const GENDER: &str = "gender";
pub const FOLLOWER_COUNT: &str = "follower_count";
pub const INFLUENCER_ID: &str = "influencer_id";
pub const DATE: &str = "date";
pub const CAMPAIGN: &str = "campaign";
pub const PRODUCT: &str = "product";
pub const REVENUE: &str = "revenue";
pub const ORDERS: &str = "orders";
pub const TOTAL_PAYOUT: &str = "total_payout";
pub const BASIS: &str = "basis";
pub const RATE: &str = "rate";

/// Logical fields that may appear under more than one column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FollowerCount,
    TotalPayout,
    PostDate,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub field: Field,
    pub dataset: DatasetId,
    pub canonical: &'static str,
    /// Acceptable raw names, in order of preference.
    pub aliases: &'static [&'static str],
}

pub const ALIASES: &[FieldAlias] = &[
    FieldAlias {
        field: Field::FollowerCount,
        dataset: DatasetId::Influencers,
        canonical: FOLLOWER_COUNT,
        aliases: &["follower count", "follower_count", "followers"],
    },
    FieldAlias {
        field: Field::TotalPayout,
        dataset: DatasetId::Payouts,
        canonical: TOTAL_PAYOUT,
        aliases: &["total_payout", "payout_amount"],
    },
    FieldAlias {
        field: Field::PostDate,
        dataset: DatasetId::Posts,
        canonical: DATE,
        aliases: &["date", "post_date", "campaign_date", "created_at"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Key,
    NullableNumber,
    ZeroFilledNumber,
    Date,
}

impl Coercion {
    fn apply(&self, frame: &mut Frame, column: &str) {
        let convert = match self {
            Coercion::Key => coerce_key,
            Coercion::NullableNumber => coerce_nullable_number,
            Coercion::ZeroFilledNumber => coerce_zero_filled_number,
            Coercion::Date => coerce_date,
        };
        frame.map_column(column, convert);
    }
}

const COERCIONS: &[(DatasetId, &str, Coercion)] = &[
    (DatasetId::Influencers, ID, Coercion::Key),
    (DatasetId::Influencers, FOLLOWER_COUNT, Coercion::NullableNumber),
    (DatasetId::Posts, INFLUENCER_ID, Coercion::Key),
    (DatasetId::Posts, DATE, Coercion::Date),
    (DatasetId::Posts, "reach", Coercion::NullableNumber),
    (DatasetId::Posts, "likes", Coercion::NullableNumber),
    (DatasetId::Posts, "comments", Coercion::NullableNumber),
    (DatasetId::Tracking, INFLUENCER_ID, Coercion::Key),
    (DatasetId::Tracking, REVENUE, Coercion::ZeroFilledNumber),
    (DatasetId::Tracking, ORDERS, Coercion::ZeroFilledNumber),
    (DatasetId::Payouts, INFLUENCER_ID, Coercion::Key),
    (DatasetId::Payouts, TOTAL_PAYOUT, Coercion::ZeroFilledNumber),
    (DatasetId::Payouts, ORDERS, Coercion::NullableNumber),
    (DatasetId::Payouts, RATE, Coercion::NullableNumber),
];

/// Columns without which no part of the dashboard can be computed.
pub const REQUIRED_COLUMNS: &[(DatasetId, &str)] = &[
    (DatasetId::Influencers, ID),
    (DatasetId::Influencers, PLATFORM),
    (DatasetId::Posts, INFLUENCER_ID),
    (DatasetId::Tracking, CAMPAIGN),
];

pub fn canonical_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn normalize_headers(frame: &mut Frame) {
    frame.rename_columns(canonical_column_name);
}

/// First alias present in `frame`, or `None` when the field is unavailable.
pub fn resolve_alias<'a>(frame: &Frame, aliases: &[&'a str]) -> Option<&'a str> {
    aliases.iter().copied().find(|alias| frame.has_column(alias))
}

/// Outcome of resolving one aliased field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasResolution {
    pub field: Field,
    pub dataset: DatasetId,
    pub canonical: &'static str,
    /// Raw column that satisfied the field, if any.
    pub source: Option<String>,
}

/// Normalized datasets plus the alias decisions taken while normalizing.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDatasets {
    pub datasets: Datasets,
    pub resolutions: Vec<AliasResolution>,
}

impl NormalizedDatasets {
    pub fn get(&self, id: DatasetId) -> &Frame {
        self.datasets.get(id)
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.resolutions
            .iter()
            .any(|r| r.field == field && r.source.is_some())
    }
}

/// Normalizes a single table: canonical headers, resolved aliases, coerced cells.
pub fn normalize_frame(id: DatasetId, frame: &Frame) -> (Frame, Vec<AliasResolution>) {
    let mut frame = frame.clone();
    normalize_headers(&mut frame);

    let mut resolutions = Vec::new();
    for alias in ALIASES.iter().filter(|a| a.dataset == id) {
        let source = resolve_alias(&frame, alias.aliases).map(str::to_string);
        if let Some(found) = &source
            && found != alias.canonical
        {
            frame.rename_column(found, alias.canonical);
        }
        resolutions.push(AliasResolution {
            field: alias.field,
            dataset: id,
            canonical: alias.canonical,
            source,
        });
    }

    for (_, column, coercion) in COERCIONS.iter().filter(|(ds, _, _)| *ds == id) {
        coercion.apply(&mut frame, column);
    }
    (frame, resolutions)
}

/// Normalizes all four datasets and validates the baseline columns.
///
/// The raw tables are left untouched; the result owns fresh copies.
pub fn normalize(raw: &Datasets) -> Result<NormalizedDatasets, SchemaError> {
    let mut datasets = Datasets::default();
    let mut resolutions = Vec::new();
    for id in DatasetId::ALL {
        let (frame, resolved) = normalize_frame(id, raw.get(id));
        *datasets.get_mut(id) = frame;
        resolutions.extend(resolved);
    }
    validate_required(&datasets)?;
    Ok(NormalizedDatasets {
        datasets,
        resolutions,
    })
}

pub fn validate_required(datasets: &Datasets) -> Result<(), SchemaError> {
    let missing = missing_columns(datasets, REQUIRED_COLUMNS);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

pub fn missing_columns(datasets: &Datasets, required: &[(DatasetId, &str)]) -> Vec<MissingColumn> {
    required
        .iter()
        .filter(|(id, column)| !datasets.get(*id).has_column(column))
        .map(|(id, column)| MissingColumn::new(*id, *column))
        .collect()
}
