use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use super::model::{Dataset, TransactionRecord};

/// Inclusive range of purchase dates. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// No bound set: rows without a timestamp pass
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, timestamp: Option<NaiveDateTime>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(ts) = timestamp else {
            return false;
        };
        let date = ts.date();
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Rows of a dataset that passed the filters. Borrows the dataset, never changes it.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    rows: Vec<&'a TransactionRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn new(rows: Vec<&'a TransactionRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[&'a TransactionRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep rows inside `range` whose `category_final` is one of `categories`
pub fn filter<'a>(
    dataset: &'a Dataset,
    range: &DateRange,
    categories: &HashSet<String>,
) -> FilteredView<'a> {
    if categories.is_empty() {
        return FilteredView::new(Vec::new());
    }

    let rows = dataset
        .rows()
        .iter()
        .filter(|row| range.contains(row.purchase_timestamp))
        .filter(|row| {
            row.category_final
                .as_ref()
                .is_some_and(|category| categories.contains(category))
        })
        .collect();

    FilteredView::new(rows)
}
