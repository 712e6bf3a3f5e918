use contracts::dashboards::d100_sales_overview::{
    DashboardAggregates, DashboardFilters, DatasetSummary, MapLayerConfig,
};
use std::collections::HashSet;

use crate::shared::config::MapConfig;

use super::aggregation;
use super::filter::{self, DateRange};
use super::model::Dataset;

/// Filter the dataset and compute every chart table.
///
/// Pure: the same dataset and filters always give the same aggregates.
pub fn render(dataset: &Dataset, filters: &DashboardFilters, top_n: usize) -> DashboardAggregates {
    let range = DateRange::new(filters.date_from, filters.date_to);
    let categories: HashSet<String> = match &filters.categories {
        Some(selected) => selected.iter().cloned().collect(),
        None => dataset.categories().into_iter().collect(),
    };

    let view = filter::filter(dataset, &range, &categories);

    DashboardAggregates {
        filtered_row_count: view.len(),
        top_categories_by_quantity: aggregation::top_categories_by_quantity(&view, top_n),
        top_categories_by_revenue: aggregation::top_categories_by_revenue(&view, top_n),
        monthly_revenue: aggregation::monthly_revenue(&view),
        top_cities: aggregation::top_cities(&view, top_n),
        delivery_by_state: aggregation::delivery_by_state(&view),
    }
}

/// Default filter values and load statistics for the dataset
pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let bounds = dataset.purchase_bounds();
    DatasetSummary {
        source: dataset.source.clone(),
        loaded_at: dataset.loaded_at,
        row_count: dataset.len(),
        order_count: dataset
            .rows()
            .iter()
            .filter_map(|r| r.order_id.as_deref())
            .collect::<HashSet<_>>()
            .len(),
        min_purchase: bounds.map(|(min, _)| min),
        max_purchase: bounds.map(|(_, max)| max),
        categories: dataset.categories(),
        rows_without_timestamp: dataset
            .rows()
            .iter()
            .filter(|r| r.purchase_timestamp.is_none())
            .count(),
        parse_warning_count: dataset.warning_count,
        parse_warnings: dataset.warnings.iter().map(ToString::to_string).collect(),
    }
}

pub fn map_layer(config: &MapConfig) -> MapLayerConfig {
    MapLayerConfig {
        geojson_url: config.geojson_url.clone(),
        key_property: config.key_property.clone(),
        center_lat: config.center_lat,
        center_lon: config.center_lon,
        zoom: config.zoom,
        legend: config.legend.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d100_sales_overview::aggregation::DEFAULT_TOP_N;
    use crate::dashboards::d100_sales_overview::loader::{parse_dataset, LoadOptions};
    use chrono::NaiveDate;

    const CSV: &str = "order_id,order_purchase_timestamp,product_qty,item_revenue,product_category_name_english_x,product_category_name,customer_city,customer_state,delivery_days
o1,2018-01-10 10:00:00,2,50,toys,,sao paulo,SP,5
o2,2018-02-03 12:00:00,1,20,toys,,campinas,SP,
o3,2018-01-20 09:00:00,5,150,,livros,rio de janeiro,RJ,12
o4,garbage,3,30,toys,,sao paulo,SP,7";

    fn dataset() -> Dataset {
        parse_dataset(CSV, "memory", LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_render_without_filters_covers_all_rows() {
        let dataset = dataset();
        let aggregates = render(&dataset, &DashboardFilters::all(), DEFAULT_TOP_N);

        assert_eq!(aggregates.filtered_row_count, 4);
        assert_eq!(aggregates.top_categories_by_quantity[0].label, "toys");
        assert_eq!(aggregates.top_categories_by_quantity[0].value, 6.0);
        assert_eq!(aggregates.top_categories_by_revenue[0].label, "livros");
        // the row without a timestamp has no month
        assert_eq!(aggregates.monthly_revenue.len(), 2);
        assert_eq!(aggregates.top_cities[0].label, "sao paulo");
        assert_eq!(aggregates.top_cities[0].value, 2.0);

        let sp = aggregates
            .delivery_by_state
            .iter()
            .find(|s| s.state == "SP")
            .unwrap();
        assert_eq!(sp.average_delivery_days, Some(6.0));
        assert_eq!(sp.sample_count, 2);
    }

    #[test]
    fn test_render_with_date_range_drops_unparsed_rows() {
        let dataset = dataset();
        let filters = DashboardFilters {
            date_from: NaiveDate::from_ymd_opt(2018, 1, 1),
            date_to: None,
            categories: None,
        };
        let aggregates = render(&dataset, &filters, DEFAULT_TOP_N);
        assert_eq!(aggregates.filtered_row_count, 3);
    }

    #[test]
    fn test_render_with_empty_selection() {
        let dataset = dataset();
        let filters = DashboardFilters::new(None, None, vec![]);
        let aggregates = render(&dataset, &filters, DEFAULT_TOP_N);
        assert_eq!(aggregates, DashboardAggregates::default());
    }

    #[test]
    fn test_render_respects_top_n() {
        let dataset = dataset();
        let aggregates = render(&dataset, &DashboardFilters::all(), 1);
        assert_eq!(aggregates.top_categories_by_quantity.len(), 1);
        assert_eq!(aggregates.top_cities.len(), 1);
        assert!(aggregates.top_cities[0].highlighted);
    }

    #[test]
    fn test_summary_seeds_filter_defaults() {
        let dataset = dataset();
        let summary = summarize(&dataset);

        assert_eq!(summary.row_count, 4);
        assert_eq!(summary.order_count, 4);
        assert_eq!(
            summary.parse_warnings,
            vec!["line 5: cannot parse 'garbage' in column 'order_purchase_timestamp'"]
        );
        assert_eq!(summary.categories, vec!["livros", "toys"]);
        assert_eq!(summary.rows_without_timestamp, 1);
        assert_eq!(summary.parse_warning_count, 1);
        assert_eq!(
            summary.min_purchase.map(|ts| ts.date()),
            NaiveDate::from_ymd_opt(2018, 1, 10)
        );
        assert_eq!(
            summary.max_purchase.map(|ts| ts.date()),
            NaiveDate::from_ymd_opt(2018, 2, 3)
        );

        let filters = DashboardFilters::new(
            summary.min_purchase.map(|ts| ts.date()),
            summary.max_purchase.map(|ts| ts.date()),
            summary.categories.clone(),
        );
        let aggregates = render(&dataset, &filters, DEFAULT_TOP_N);
        assert_eq!(aggregates.filtered_row_count, 3);
    }

    #[test]
    fn test_map_layer_from_config() {
        let config = MapConfig::default();
        let layer = map_layer(&config);
        assert_eq!(layer.key_property, "sigla");
        assert_eq!(layer.zoom, 4);
    }
}
