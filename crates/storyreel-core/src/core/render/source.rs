//! Media source fetching.
//!
//! Image and audio references are data URIs, http(s) URLs or local paths.
//! Staging turns any of them into bytes.

use async_trait::async_trait;

use crate::core::assets::data_uri;
use crate::core::{CoreError, CoreResult};

/// Resolves a media reference to its bytes
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> CoreResult<Vec<u8>>;
}

/// Default fetcher: data URIs, local files and (with `remote-sources`) http(s)
#[derive(Debug, Clone, Default)]
pub struct MediaFetcher {
    #[cfg(feature = "remote-sources")]
    client: reqwest::Client,
}

impl MediaFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "remote-sources")]
    async fn fetch_remote(&self, url: &str) -> CoreResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::UnsupportedSource(format!("request to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(CoreError::UnsupportedSource(format!(
                "{url} returned HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::UnsupportedSource(format!("reading {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "remote-sources"))]
    async fn fetch_remote(&self, url: &str) -> CoreResult<Vec<u8>> {
        Err(CoreError::UnsupportedSource(format!(
            "remote sources are disabled (feature 'remote-sources'): {url}"
        )))
    }
}

#[async_trait]
impl SourceFetcher for MediaFetcher {
    async fn fetch(&self, source: &str) -> CoreResult<Vec<u8>> {
        let source = source.trim();
        if source.is_empty() {
            return Err(CoreError::UnsupportedSource("empty media reference".to_string()));
        }
        if data_uri::is_data_uri(source) {
            return data_uri::decode(source)
                .map(|d| d.bytes)
                .map_err(CoreError::UnsupportedSource);
        }

        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return self.fetch_remote(source).await;
        }

        let path = source.strip_prefix("file://").unwrap_or(source);
        Ok(tokio::fs::read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_data_uri() {
        let fetcher = MediaFetcher::new();
        let uri = data_uri::encode("image/png", b"pixels");
        assert_eq!(fetcher.fetch(&uri).await.unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let fetcher = MediaFetcher::new();
        let plain = path.to_string_lossy().to_string();
        assert_eq!(fetcher.fetch(&plain).await.unwrap(), b"RIFF");
        assert_eq!(
            fetcher.fetch(&format!("file://{plain}")).await.unwrap(),
            b"RIFF"
        );
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let fetcher = MediaFetcher::new();
        assert!(fetcher.fetch("  ").await.is_err());
        assert!(fetcher.fetch("data:image/png;base64,%%%").await.is_err());
        assert!(matches!(
            fetcher.fetch("/definitely/not/here.png").await,
            Err(CoreError::IoError(_))
        ));
    }
}
