use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::time::Instant;

use super::error::{LoadError, ParseWarning};
use super::model::{Dataset, TransactionRecord};
use super::source::CsvSource;

pub const COL_ORDER_ID: &str = "order_id";
pub const COL_PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const COL_QUANTITY: &str = "product_qty";
pub const COL_REVENUE: &str = "item_revenue";
pub const COL_CATEGORY_PRIMARY: &str = "product_category_name_english_x";
pub const COL_CATEGORY_SECONDARY: &str = "product_category_name";
pub const COL_CUSTOMER_CITY: &str = "customer_city";
pub const COL_CUSTOMER_STATE: &str = "customer_state";
pub const COL_DELIVERY_DAYS: &str = "delivery_days";

/// Columns that must be present, checked in this order
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_PURCHASE_TIMESTAMP,
    COL_QUANTITY,
    COL_REVENUE,
    COL_CATEGORY_PRIMARY,
    COL_CATEGORY_SECONDARY,
    COL_CUSTOMER_CITY,
    COL_CUSTOMER_STATE,
    COL_DELIVERY_DAYS,
];

/// Cell contents read as missing values
const NULL_MARKERS: [&str; 12] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// How many parse warnings are kept on the dataset
    pub max_warning_samples: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_warning_samples: 100,
        }
    }
}

/// Fetch the CSV from `source` and build a validated dataset
pub async fn load(source: &dyn CsvSource, options: LoadOptions) -> Result<Dataset, LoadError> {
    let start = Instant::now();
    tracing::info!("Loading dataset from {}", source.location());

    let body = source.fetch().await?;
    let dataset = parse_dataset(&body, source.location(), options)?;

    tracing::info!(
        "Dataset loaded: {} rows, {} parse warnings, {}ms",
        dataset.len(),
        dataset.warning_count,
        start.elapsed().as_millis()
    );
    Ok(dataset)
}

/// Column positions resolved from the header row
struct ColumnIndex {
    order_id: Option<usize>,
    purchase_timestamp: usize,
    quantity: usize,
    revenue: usize,
    category_primary: usize,
    category_secondary: usize,
    customer_city: usize,
    customer_state: usize,
    delivery_days: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        for column in REQUIRED_COLUMNS {
            if find(column).is_none() {
                tracing::error!("Required column '{}' not found in dataset", column);
                return Err(LoadError::SchemaValidation {
                    column: column.to_string(),
                });
            }
        }

        let required = |name: &str| {
            find(name).ok_or_else(|| LoadError::SchemaValidation {
                column: name.to_string(),
            })
        };

        Ok(Self {
            order_id: find(COL_ORDER_ID),
            purchase_timestamp: required(COL_PURCHASE_TIMESTAMP)?,
            quantity: required(COL_QUANTITY)?,
            revenue: required(COL_REVENUE)?,
            category_primary: required(COL_CATEGORY_PRIMARY)?,
            category_secondary: required(COL_CATEGORY_SECONDARY)?,
            customer_city: required(COL_CUSTOMER_CITY)?,
            customer_state: required(COL_CUSTOMER_STATE)?,
            delivery_days: required(COL_DELIVERY_DAYS)?,
        })
    }
}

/// Collects parse warnings, keeping only the first `limit` of them
struct WarningSink {
    samples: Vec<ParseWarning>,
    count: usize,
    limit: usize,
}

impl WarningSink {
    fn new(limit: usize) -> Self {
        Self {
            samples: Vec::new(),
            count: 0,
            limit,
        }
    }

    fn push(&mut self, line: u64, column: &'static str, value: &str) {
        self.count += 1;
        if self.samples.len() < self.limit {
            let warning = ParseWarning {
                line,
                column,
                value: value.to_string(),
            };
            tracing::warn!("{}", warning);
            self.samples.push(warning);
        }
    }
}

/// Parse CSV text into a dataset: validate the schema, coerce cell types and
/// derive `category_final` / `order_month`.
pub fn parse_dataset(
    csv_text: &str,
    source: &str,
    options: LoadOptions,
) -> Result<Dataset, LoadError> {
    // Strip UTF-8 BOM if present
    let text = csv_text.trim_start_matches('\u{FEFF}');
    if text.trim().is_empty() {
        return Err(LoadError::fetch(source, "document is empty"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadError::fetch(source, format!("cannot read CSV headers: {e}")))?
        .clone();
    tracing::debug!("Dataset CSV headers: {:?}", headers.iter().collect::<Vec<_>>());

    let columns = ColumnIndex::resolve(&headers)?;
    let mut warnings = WarningSink::new(options.max_warning_samples);
    let mut rows = Vec::new();

    for result in reader.records() {
        let record =
            result.map_err(|e| LoadError::fetch(source, format!("malformed CSV: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > headers.len() {
            return Err(LoadError::fetch(
                source,
                format!(
                    "malformed CSV: line {}: expected {} fields, found {}",
                    line,
                    headers.len(),
                    record.len()
                ),
            ));
        }

        rows.push(parse_record(&record, &columns, line, &mut warnings));
    }

    if warnings.count > warnings.samples.len() {
        tracing::warn!(
            "{} more parse warnings not shown",
            warnings.count - warnings.samples.len()
        );
    }

    Ok(Dataset::new(source, rows, warnings.samples, warnings.count))
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &ColumnIndex,
    line: u64,
    warnings: &mut WarningSink,
) -> TransactionRecord {
    // Missing trailing fields read as null
    let cell = |index: usize| {
        record
            .get(index)
            .map(str::trim)
            .filter(|v| !NULL_MARKERS.contains(v))
    };
    let text = |index: usize| cell(index).map(str::to_string);

    let purchase_timestamp = cell(columns.purchase_timestamp).and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warnings.push(line, COL_PURCHASE_TIMESTAMP, raw);
        }
        parsed
    });

    let quantity = match cell(columns.quantity) {
        None => 1,
        Some(raw) => parse_quantity(raw).unwrap_or_else(|| {
            warnings.push(line, COL_QUANTITY, raw);
            1
        }),
    };

    let mut decimal = |index: usize, column: &'static str| {
        cell(index).and_then(|raw| {
            let parsed = parse_decimal(raw);
            if parsed.is_none() {
                warnings.push(line, column, raw);
            }
            parsed
        })
    };
    let revenue = decimal(columns.revenue, COL_REVENUE);
    let delivery_days = decimal(columns.delivery_days, COL_DELIVERY_DAYS);

    TransactionRecord {
        order_id: columns.order_id.and_then(text),
        purchase_timestamp,
        category_primary: text(columns.category_primary),
        category_secondary: text(columns.category_secondary),
        category_final: None,
        quantity,
        revenue,
        customer_city: text(columns.customer_city),
        customer_state: text(columns.customer_state),
        delivery_days,
        order_month: None,
    }
    .with_derived_fields()
}

/// Parse a purchase timestamp. Returns None for anything unrecognised.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer quantity; whole floats such as "2.0" are accepted
fn parse_quantity(raw: &str) -> Option<i64> {
    if let Ok(q) = raw.parse::<i64>() {
        return Some(q);
    }
    parse_decimal(raw)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}
