use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use super::error::ParseWarning;

/// One line item of the source table, with the derived columns filled in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    pub order_id: Option<String>,
    pub purchase_timestamp: Option<NaiveDateTime>,
    /// English category name
    pub category_primary: Option<String>,
    /// Localized category name, used when the English one is missing
    pub category_secondary: Option<String>,
    pub category_final: Option<String>,
    pub quantity: i64,
    pub revenue: Option<f64>,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
    pub delivery_days: Option<f64>,
    /// "YYYY-MM" of the purchase timestamp
    pub order_month: Option<String>,
}

impl TransactionRecord {
    /// Recompute `category_final` and `order_month` from the source fields
    pub fn with_derived_fields(mut self) -> Self {
        self.category_final = self
            .category_primary
            .clone()
            .or_else(|| self.category_secondary.clone());
        self.order_month = self.purchase_timestamp.map(|ts| month_label(&ts));
        self
    }

    pub fn revenue_or_zero(&self) -> f64 {
        self.revenue.unwrap_or(0.0)
    }
}

/// Year-month label; lexical order equals chronological order
pub fn month_label(ts: &NaiveDateTime) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

/// The loaded transaction table. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    rows: Vec<TransactionRecord>,
    /// First warnings of the load, capped by configuration
    pub warnings: Vec<ParseWarning>,
    /// Total number of warnings, including the ones not sampled
    pub warning_count: usize,
}

impl Dataset {
    pub fn new(
        source: impl Into<String>,
        rows: Vec<TransactionRecord>,
        warnings: Vec<ParseWarning>,
        warning_count: usize,
    ) -> Self {
        Self {
            source: source.into(),
            loaded_at: Utc::now(),
            rows,
            warnings,
            warning_count,
        }
    }

    /// Dataset built from in-memory records, without any load warnings
    #[cfg(test)]
    pub fn from_records(source: impl Into<String>, rows: Vec<TransactionRecord>) -> Self {
        Self::new(source, rows, Vec::new(), 0)
    }

    pub fn rows(&self) -> &[TransactionRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest valid purchase timestamps
    pub fn purchase_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut timestamps = self.rows.iter().filter_map(|r| r.purchase_timestamp);
        let first = timestamps.next()?;
        Some(timestamps.fold((first, first), |(min, max), ts| (min.min(ts), max.max(ts))))
    }

    /// Sorted distinct non-null categories
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.category_final.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_category_final_prefers_primary() {
        let record = TransactionRecord {
            category_primary: Some("toys".to_string()),
            category_secondary: Some("brinquedos".to_string()),
            ..Default::default()
        }
        .with_derived_fields();
        assert_eq!(record.category_final.as_deref(), Some("toys"));

        let record = TransactionRecord {
            category_secondary: Some("brinquedos".to_string()),
            ..Default::default()
        }
        .with_derived_fields();
        assert_eq!(record.category_final.as_deref(), Some("brinquedos"));

        let record = TransactionRecord::default().with_derived_fields();
        assert_eq!(record.category_final, None);
    }

    #[test]
    fn test_order_month_follows_timestamp() {
        let record = TransactionRecord {
            purchase_timestamp: Some(ts(2018, 3, 7)),
            ..Default::default()
        }
        .with_derived_fields();
        assert_eq!(record.order_month.as_deref(), Some("2018-03"));

        let record = TransactionRecord::default().with_derived_fields();
        assert_eq!(record.order_month, None);
    }

    #[test]
    fn test_bounds_and_categories() {
        let rows = vec![
            TransactionRecord {
                purchase_timestamp: Some(ts(2018, 5, 1)),
                category_primary: Some("toys".to_string()),
                ..Default::default()
            },
            TransactionRecord {
                category_primary: Some("books".to_string()),
                ..Default::default()
            },
            TransactionRecord {
                purchase_timestamp: Some(ts(2017, 1, 2)),
                category_primary: Some("toys".to_string()),
                ..Default::default()
            },
        ]
        .into_iter()
        .map(TransactionRecord::with_derived_fields)
        .collect();
        let dataset = Dataset::from_records("memory", rows);

        assert_eq!(
            dataset.purchase_bounds(),
            Some((ts(2017, 1, 2), ts(2018, 5, 1)))
        );
        assert_eq!(dataset.categories(), vec!["books", "toys"]);
    }

    #[test]
    fn test_bounds_of_empty_dataset() {
        let dataset = Dataset::from_records("memory", vec![]);
        assert!(dataset.is_empty());
        assert_eq!(dataset.purchase_bounds(), None);
    }
}
