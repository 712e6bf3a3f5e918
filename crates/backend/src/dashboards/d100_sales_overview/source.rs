use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use super::error::LoadError;

/// Where the raw CSV text of the dataset comes from
#[async_trait]
pub trait CsvSource: Send + Sync {
    /// Fetch the whole CSV document
    async fn fetch(&self) -> Result<String, LoadError>;

    /// URL or path, for logs and the dataset summary
    fn location(&self) -> &str;
}

/// CSV served over HTTP(S)
pub struct HttpCsvSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::fetch(&url, format!("cannot create HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CsvSource for HttpCsvSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        tracing::info!("Downloading dataset from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LoadError::fetch(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(500).collect();
            tracing::error!("Dataset request failed with status {}: {}", status, preview);
            return Err(LoadError::fetch(
                &self.url,
                format!("HTTP status {status}: {preview}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::fetch(&self.url, e))?;
        tracing::debug!("Dataset download finished: {} bytes", bytes.len());
        decode_body(&self.url, bytes.to_vec())
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// Body bytes as UTF-8 text. Invalid sequences are a fetch error.
fn decode_body(location: &str, bytes: Vec<u8>) -> Result<String, LoadError> {
    String::from_utf8(bytes).map_err(|e| LoadError::fetch(location, format!("malformed CSV: {e}")))
}

/// CSV stored on the local filesystem
pub struct FileCsvSource {
    path: PathBuf,
    location: String,
}

impl FileCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = path.display().to_string();
        Self { path, location }
    }
}

#[async_trait]
impl CsvSource for FileCsvSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        tracing::info!("Reading dataset from {}", self.location);
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LoadError::fetch(&self.location, e))
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Pick the source implementation from a configured location:
/// http(s) URLs are downloaded, anything else is read as a file path.
pub fn from_location(location: &str, timeout: Duration) -> Result<Box<dyn CsvSource>, LoadError> {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(Box::new(HttpCsvSource::new(location, timeout)?))
    } else {
        Ok(Box::new(FileCsvSource::new(location)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory source that counts fetches. The body can be swapped between calls.
    #[derive(Clone)]
    pub struct MemoryCsvSource {
        body: Arc<Mutex<Result<String, String>>>,
        fetches: Arc<AtomicUsize>,
    }

    impl MemoryCsvSource {
        pub fn new(body: &str) -> Self {
            Self {
                body: Arc::new(Mutex::new(Ok(body.to_string()))),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn set_body(&self, body: &str) {
            *self.body.lock().unwrap() = Ok(body.to_string());
        }

        pub fn set_unreachable(&self, reason: &str) {
            *self.body.lock().unwrap() = Err(reason.to_string());
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CsvSource for MemoryCsvSource {
        async fn fetch(&self) -> Result<String, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            // Let concurrent callers run while this fetch is in flight
            tokio::task::yield_now().await;
            self.body
                .lock()
                .unwrap()
                .clone()
                .map_err(|reason| LoadError::fetch("memory", reason))
        }

        fn location(&self) -> &str {
            "memory"
        }
    }
}
