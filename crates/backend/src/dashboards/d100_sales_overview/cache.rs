use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::LoadError;
use super::loader::{self, LoadOptions};
use super::model::Dataset;
use super::source::CsvSource;

static DATASET_CACHE: OnceCell<DatasetCache> = OnceCell::new();

/// Holds the last successfully loaded dataset.
///
/// Filled by the first successful load, replaced by `reload`, emptied by
/// `clear` or a failed `reload`. Never expires on its own. Loads are
/// serialized by the inner mutex, so only one fetch runs at a time.
pub struct DatasetCache {
    source: Box<dyn CsvSource>,
    options: LoadOptions,
    dataset: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(source: Box<dyn CsvSource>, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            dataset: Mutex::new(None),
        }
    }

    pub fn source_location(&self) -> &str {
        self.source.location()
    }

    /// Cached dataset, loading it first if the cache is empty
    pub async fn get_or_load(&self) -> Result<Arc<Dataset>, LoadError> {
        let mut slot = self.dataset.lock().await;
        if let Some(dataset) = slot.as_ref() {
            tracing::debug!("Dataset cache hit ({} rows)", dataset.len());
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(loader::load(self.source.as_ref(), self.options).await?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Load again, bypassing the cache
    pub async fn reload(&self) -> Result<Arc<Dataset>, LoadError> {
        let mut slot = self.dataset.lock().await;
        tracing::info!("Reloading dataset from {}", self.source.location());

        match loader::load(self.source.as_ref(), self.options).await {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                *slot = Some(Arc::clone(&dataset));
                Ok(dataset)
            }
            Err(e) => {
                tracing::error!("Dataset reload failed, cache cleared: {}", e);
                *slot = None;
                Err(e)
            }
        }
    }

    /// Cached dataset without triggering a load
    pub async fn current(&self) -> Option<Arc<Dataset>> {
        self.dataset.lock().await.clone()
    }

    pub async fn clear(&self) {
        *self.dataset.lock().await = None;
        tracing::info!("Dataset cache cleared");
    }
}

/// Install the process-wide cache. Can only be done once.
pub fn initialize(cache: DatasetCache) -> anyhow::Result<()> {
    DATASET_CACHE
        .set(cache)
        .map_err(|_| anyhow::anyhow!("dataset cache is already initialized"))
}

pub fn get_cache() -> Option<&'static DatasetCache> {
    DATASET_CACHE.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d100_sales_overview::source::testing::MemoryCsvSource;

    const CSV_ONE_ROW: &str = "order_purchase_timestamp,product_qty,item_revenue,product_category_name_english_x,product_category_name,customer_city,customer_state,delivery_days\n2018-01-05 10:00:00,1,10,toys,,campinas,SP,4";
    const CSV_TWO_ROWS: &str = "order_purchase_timestamp,product_qty,item_revenue,product_category_name_english_x,product_category_name,customer_city,customer_state,delivery_days\n2018-01-05 10:00:00,1,10,toys,,campinas,SP,4\n2018-02-05 10:00:00,2,30,books,,santos,SP,6";

    fn cache_for(source: &MemoryCsvSource) -> DatasetCache {
        DatasetCache::new(Box::new(source.clone()), LoadOptions::default())
    }

    #[tokio::test]
    async fn test_second_call_uses_cache() {
        let source = MemoryCsvSource::new(CSV_ONE_ROW);
        let cache = cache_for(&source);

        let first = cache.get_or_load().await.unwrap();
        source.set_body(CSV_TWO_ROWS);
        let second = cache.get_or_load().await.unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let source = MemoryCsvSource::new(CSV_ONE_ROW);
        let cache = cache_for(&source);

        let (first, second) = tokio::join!(cache.get_or_load(), cache.get_or_load());

        assert_eq!(source.fetch_count(), 1);
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[tokio::test]
    async fn test_reload_bypasses_cache() {
        let source = MemoryCsvSource::new(CSV_ONE_ROW);
        let cache = cache_for(&source);

        cache.get_or_load().await.unwrap();
        source.set_body(CSV_TWO_ROWS);
        let reloaded = cache.reload().await.unwrap();

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(cache.current().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_cache_empty() {
        let source = MemoryCsvSource::new("order_purchase_timestamp,product_qty\n2018-01-01,1");
        let cache = cache_for(&source);

        let err = cache.get_or_load().await.unwrap_err();
        assert!(matches!(err, LoadError::SchemaValidation { ref column } if column == "item_revenue"));
        assert!(cache.current().await.is_none());

        source.set_body(CSV_ONE_ROW);
        assert_eq!(cache.get_or_load().await.unwrap().len(), 1);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_clears_cache() {
        let source = MemoryCsvSource::new(CSV_ONE_ROW);
        let cache = cache_for(&source);
        cache.get_or_load().await.unwrap();

        source.set_unreachable("dns error");
        assert!(cache.reload().await.is_err());
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_current_and_clear() {
        let source = MemoryCsvSource::new(CSV_ONE_ROW);
        let cache = cache_for(&source);

        assert!(cache.current().await.is_none());
        assert_eq!(source.fetch_count(), 0);

        cache.get_or_load().await.unwrap();
        assert!(cache.current().await.is_some());

        cache.clear().await;
        assert!(cache.current().await.is_none());
        cache.get_or_load().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }
}
