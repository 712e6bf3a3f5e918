use contracts::dashboards::d100_sales_overview::{
    MonthlyRevenuePoint, RankedEntry, StateDeliveryAverage,
};
use std::collections::{BTreeMap, HashMap};

use super::filter::FilteredView;
use super::model::TransactionRecord;

pub const DEFAULT_TOP_N: usize = 10;

/// Sum `value` per `key`, groups in first-encountered order.
/// Rows without a key are skipped.
pub fn grouped_totals<K, V>(view: &FilteredView<'_>, key: K, value: V) -> Vec<(String, f64)>
where
    K: Fn(&TransactionRecord) -> Option<&str>,
    V: Fn(&TransactionRecord) -> f64,
{
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for &row in view.rows() {
        let Some(group) = key(row) else {
            continue;
        };
        match positions.get(group) {
            Some(&i) => totals[i].1 += value(row),
            None => {
                positions.insert(group.to_string(), totals.len());
                totals.push((group.to_string(), value(row)));
            }
        }
    }

    totals
}

/// Descending ranking limited to `n` entries; the first one is highlighted.
/// Equal values keep their input order.
pub fn top_n(mut totals: Vec<(String, f64)>, n: usize) -> Vec<RankedEntry> {
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (label, value))| RankedEntry {
            label,
            value,
            highlighted: i == 0,
        })
        .collect()
}

fn category(row: &TransactionRecord) -> Option<&str> {
    row.category_final.as_deref()
}

pub fn category_quantity_totals(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    grouped_totals(view, category, |row| row.quantity as f64)
}

pub fn category_revenue_totals(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    grouped_totals(view, category, TransactionRecord::revenue_or_zero)
}

pub fn top_categories_by_quantity(view: &FilteredView<'_>, n: usize) -> Vec<RankedEntry> {
    top_n(category_quantity_totals(view), n)
}

pub fn top_categories_by_revenue(view: &FilteredView<'_>, n: usize) -> Vec<RankedEntry> {
    top_n(category_revenue_totals(view), n)
}

/// Revenue per month, ascending by month. Rows without a month are skipped.
pub fn monthly_revenue(view: &FilteredView<'_>) -> Vec<MonthlyRevenuePoint> {
    let mut months: BTreeMap<&str, f64> = BTreeMap::new();
    for &row in view.rows() {
        if let Some(month) = row.order_month.as_deref() {
            *months.entry(month).or_insert(0.0) += row.revenue_or_zero();
        }
    }

    months
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenuePoint {
            month: month.to_string(),
            revenue,
        })
        .collect()
}

/// Cities ranked by number of rows
pub fn top_cities(view: &FilteredView<'_>, n: usize) -> Vec<RankedEntry> {
    let counts = grouped_totals(view, |row| row.customer_city.as_deref(), |_| 1.0);
    top_n(counts, n)
}

/// Mean delivery days per state, ascending by state.
/// Rows without delivery days count in neither the sum nor the sample size.
pub fn delivery_by_state(view: &FilteredView<'_>) -> Vec<StateDeliveryAverage> {
    let mut states: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for &row in view.rows() {
        let Some(state) = row.customer_state.as_deref() else {
            continue;
        };
        let entry = states.entry(state).or_insert((0.0, 0));
        if let Some(days) = row.delivery_days {
            entry.0 += days;
            entry.1 += 1;
        }
    }

    states
        .into_iter()
        .map(|(state, (sum, count))| StateDeliveryAverage {
            state: state.to_string(),
            average_delivery_days: (count > 0).then(|| sum / count as f64),
            sample_count: count,
        })
        .collect()
}
