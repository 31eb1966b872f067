use super::source::TileSource;
use crate::core::geo::TileCoord;
use crate::Result;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;

/// Shared async HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("mapview/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|err| {
            log::warn!("falling back to default HTTP client: {}", err);
            reqwest::Client::new()
        })
});

/// Configuration for the tile loader
#[derive(Debug, Clone)]
pub struct TileLoaderConfig {
    /// Maximum concurrent tile downloads
    pub max_concurrent: usize,
    /// Extra attempts per tile after the first failure
    pub max_retries: usize,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            max_retries: 1,
        }
    }
}

/// Outcome of one batch; failures never abort the rest of the batch
#[derive(Debug, Default)]
pub struct TileBatch {
    pub loaded: Vec<(String, Vec<u8>)>,
    pub failed: Vec<(String, String)>,
}

impl TileBatch {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches raster tiles. Tile availability and rate limits belong to the
/// provider, so a view shows whatever loaded and logs the rest.
#[derive(Debug, Clone, Default)]
pub struct TileLoader {
    config: TileLoaderConfig,
}

impl TileLoader {
    pub fn new(config: TileLoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TileLoaderConfig {
        &self.config
    }

    pub async fn fetch_tiles(&self, source: &dyn TileSource, coords: &[TileCoord]) -> TileBatch {
        let urls = coords.iter().map(|coord| source.url(*coord)).collect();
        self.fetch_urls(urls).await
    }

    pub async fn fetch_urls(&self, urls: Vec<String>) -> TileBatch {
        let results: Vec<(String, Result<Vec<u8>>)> = stream::iter(urls)
            .map(|url| async move {
                let result = self.fetch_with_retries(&url).await;
                (url, result)
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut batch = TileBatch::default();
        for (url, result) in results {
            match result {
                Ok(bytes) => batch.loaded.push((url, bytes)),
                Err(err) => {
                    log::warn!("tile {} unavailable: {}", url, err);
                    batch.failed.push((url, err.to_string()));
                }
            }
        }
        log::debug!(
            "tile batch finished: {} loaded, {} failed",
            batch.loaded.len(),
            batch.failed.len()
        );
        batch
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) if attempt > self.config.max_retries => return Err(err),
                Err(err) => {
                    log::debug!("tile {} attempt {} failed: {}", url, attempt, err);
                }
            }
        }
    }
}

async fn fetch_once(url: &str) -> Result<Vec<u8>> {
    let response = HTTP_CLIENT.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_tiles_degrade_without_failing_the_batch() {
        let loader = TileLoader::new(TileLoaderConfig {
            max_concurrent: 2,
            max_retries: 0,
        });
        let batch = loader
            .fetch_urls(vec![
                "http://127.0.0.1:9/1/0/0.png".to_string(),
                "http://127.0.0.1:9/1/1/0.png".to_string(),
            ])
            .await;

        assert!(batch.loaded.is_empty());
        assert_eq!(batch.failed.len(), 2);
        assert!(!batch.is_complete());
    }

    #[test]
    fn test_default_config() {
        let loader = TileLoader::default();
        assert_eq!(loader.config().max_concurrent, 8);
        assert_eq!(loader.config().max_retries, 1);
    }
}
