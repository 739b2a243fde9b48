use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{VerifyError, VerifyResult};
use crate::services::ImageBytesFetcher;

/// Downloads listing photos over HTTP(S), refusing anything above
/// `max_bytes`.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }
}

fn unavailable(locator: &str, reason: impl ToString) -> VerifyError {
    VerifyError::ImageUnavailable {
        locator: locator.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl ImageBytesFetcher for HttpImageFetcher {
    async fn fetch(&self, image_url: &str) -> VerifyResult<Vec<u8>> {
        let url = url::Url::parse(image_url).map_err(|e| VerifyError::InvalidLocator {
            locator: image_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(VerifyError::InvalidLocator {
                locator: image_url.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(image_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(image_url, format!("status {}", status)));
        }

        let too_large = || VerifyError::ImageTooLarge {
            locator: image_url.to_string(),
            limit: self.max_bytes,
        };

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(too_large());
            }
        }

        // length headers can lie, so the cap is enforced while streaming too
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| unavailable(image_url, e))?;
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(unavailable(image_url, "empty body"));
        }

        tracing::debug!(image_url, bytes = bytes.len(), "image fetched");
        Ok(bytes)
    }
}
