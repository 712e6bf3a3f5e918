use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filters selected by the user for the sales overview dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilters {
    /// Inclusive lower bound of the purchase date (YYYY-MM-DD)
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound of the purchase date (YYYY-MM-DD)
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Categories to keep. `None` keeps every category of the dataset,
    /// an empty list keeps nothing.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl DashboardFilters {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            date_from,
            date_to,
            categories: Some(categories),
        }
    }
}

/// One bar of a ranked (Top-N) chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub label: String,
    pub value: f64,
    /// True only for the single highest entry of the ranking
    pub highlighted: bool,
}

/// One point of the monthly revenue line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenuePoint {
    /// Month in format "YYYY-MM"
    pub month: String,
    pub revenue: f64,
}

/// Average delivery time for one state, feeds the choropleth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDeliveryAverage {
    /// State abbreviation (e.g. "SP")
    pub state: String,
    /// None when no row of the state has a delivery time
    pub average_delivery_days: Option<f64>,
    /// Rows that contributed to the average
    pub sample_count: usize,
}

/// Everything the presentation layer needs to draw the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardAggregates {
    pub filtered_row_count: usize,
    pub top_categories_by_quantity: Vec<RankedEntry>,
    pub top_categories_by_revenue: Vec<RankedEntry>,
    pub monthly_revenue: Vec<MonthlyRevenuePoint>,
    pub top_cities: Vec<RankedEntry>,
    pub delivery_by_state: Vec<StateDeliveryAverage>,
}

/// Description of the loaded dataset, used to seed the filter controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Where the dataset was loaded from
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub row_count: usize,
    /// Distinct order ids; 0 when the source has no order_id column
    pub order_count: usize,
    /// Earliest valid purchase timestamp (default lower bound of the date picker)
    pub min_purchase: Option<NaiveDateTime>,
    /// Latest valid purchase timestamp (default upper bound of the date picker)
    pub max_purchase: Option<NaiveDateTime>,
    /// Sorted distinct categories (default category selection)
    pub categories: Vec<String>,
    pub rows_without_timestamp: usize,
    pub parse_warning_count: usize,
    /// First parse warnings of the load, as readable messages
    pub parse_warnings: Vec<String>,
}

/// Settings for the delivery time choropleth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayerConfig {
    /// GeoJSON with the state boundaries
    pub geojson_url: String,
    /// Feature property matched against `StateDeliveryAverage::state`
    pub key_property: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub legend: String,
}

/// Error body returned by the dashboard endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardError {
    /// Machine readable kind: "fetch", "schema_validation", "not_loaded"
    pub kind: String,
    pub message: String,
}
