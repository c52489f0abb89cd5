//! Image asset downloads

use crate::crawler::fetcher::{classify_request_error, get_checked};
use crate::crawler::retry::RetryPolicy;
use crate::storage::{asset_file_name, store_asset};
use crate::FolioError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Downloads record images into a content-addressed asset directory
pub struct AssetDownloader {
    client: Client,
    retry: RetryPolicy,
}

impl AssetDownloader {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Downloads an image and stores it under `dest_dir`
    ///
    /// # Returns
    ///
    /// * `Some(PathBuf)` - Path of the stored asset
    /// * `None` - Retries were exhausted, the response was not an image, or
    ///   the file could not be written
    pub async fn fetch(&self, image_url: &str, dest_dir: &Path) -> Option<PathBuf> {
        let client = &self.client;

        let (content_type, bytes) = match self
            .retry
            .with_retry(image_url, move |_| download_image(client, image_url))
            .await
        {
            Ok(download) => download,
            Err(e) => {
                tracing::warn!("Image unavailable, using placeholder: {}", e);
                return None;
            }
        };

        let file_name = asset_file_name(image_url, &content_type);
        let dir = dest_dir.to_path_buf();
        let size = bytes.len();

        match tokio::task::spawn_blocking(move || store_asset(&dir, &file_name, &bytes)).await {
            Ok(Ok(path)) => {
                tracing::debug!("Stored {} ({} bytes) at {}", image_url, size, path.display());
                Some(path)
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to store image {}: {}", image_url, e);
                None
            }
            Err(e) => {
                tracing::warn!("Image store task for {} did not finish: {}", image_url, e);
                None
            }
        }
    }
}

/// Fetches one image, rejecting responses that are not `image/*`
async fn download_image(client: &Client, url: &str) -> Result<(String, Vec<u8>), FolioError> {
    let response = get_checked(client, url).await?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string();

    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(FolioError::ContentMismatch {
            url: url.to_string(),
            content_type,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify_request_error(url, e))?;

    Ok((content_type, bytes.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader() -> AssetDownloader {
        AssetDownloader::new(
            Client::new(),
            RetryPolicy::new(3, Duration::from_millis(1), Duration::from_secs(5)),
        )
    }

    fn png_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(b"\x89PNG fake".to_vec(), "image/png")
    }

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_repeated_download_leaves_one_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/chair.png"))
            .respond_with(png_response())
            .expect(2)
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/img/chair.png", mock_server.uri());
        let downloader = downloader();

        let first = downloader.fetch(&url, dir.path()).await.unwrap();
        let second = downloader.fetch(&url, dir.path()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            asset_file_name(&url, "image/png")
        );
        assert_eq!(dir_entries(dir.path()), vec![first.clone()]);
        assert_eq!(std::fs::read(&first).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_concurrent_downloads_of_same_url() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/lamp.png"))
            .respond_with(png_response())
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/img/lamp.png", mock_server.uri());
        let downloader = Arc::new(downloader());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let downloader = Arc::clone(&downloader);
                let url = url.clone();
                let dest = dir.path().to_path_buf();
                tokio::spawn(async move { downloader.fetch(&url, &dest).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        let entries = dir_entries(dir.path());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].to_str().unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn test_non_image_response_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/missing.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"<html></html>".to_vec(), "text/html"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/img/missing.jpg", mock_server.uri());

        assert!(downloader().fetch(&url, dir.path()).await.is_none());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/img/x.jpg", mock_server.uri());
        assert!(downloader().fetch(&url, dir.path()).await.is_none());
    }
}
