//! Result media: image tiles, video thumbnails and product photos.
//!
//! Plain GETs of the URLs the search provider handed back. Bodies are kept
//! as bytes; decoding is left to the window.

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::api;
use crate::config::AppConfig;
use crate::error::ClientError;

/// Largest image body accepted.
pub const MAX_MEDIA_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MediaClient {
    client: Client,
}

impl MediaClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: api::build_client(config.search_timeout())?,
        })
    }

    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<u8>, ClientError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ClientError::Malformed(format!("unsupported media URL: {url}")));
        }
        tracing::debug!("Fetching media {}", url);
        api::send_bytes(self.client.get(url), cancel, MAX_MEDIA_BYTES).await
    }
}
