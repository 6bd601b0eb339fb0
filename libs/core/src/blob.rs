//! Authenticated blob download.

use std::sync::Arc;

use async_trait::async_trait;

use crate::credentials::{TokenCredential, STORAGE_SCOPE};
use crate::error::RelayError;

/// Storage REST API version sent with every blob request.
pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// Retrieves a blob's full content as decoded text.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, RelayError>;
}

/// Downloads blobs over HTTP, authenticating with a storage-scoped bearer
/// token. Reads the full body in one pass; no size limit, no streaming.
pub struct HttpBlobStore {
    http: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
}

impl HttpBlobStore {
    pub fn new(http: reqwest::Client, credential: Arc<dyn TokenCredential>) -> Self {
        Self { http, credential }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn fetch_text(&self, url: &str) -> Result<String, RelayError> {
        // An auth failure while reaching for the blob is a blob-access
        // failure from the pipeline's point of view.
        let token = self.credential.token(STORAGE_SCOPE).await.map_err(|err| {
            tracing::error!(error = %err, url, "could not obtain a storage token");
            RelayError::BlobAccess {
                url: url.into(),
                message: err.to_string(),
            }
        })?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&token.secret)
            .header("x-ms-version", STORAGE_API_VERSION)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %err, url, "blob download failed");
                RelayError::BlobAccess {
                    url: url.into(),
                    message: err.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable>".into());
            tracing::error!(status = status.as_u16(), body = %body, url, "storage service refused the download");
            return Err(RelayError::BlobAccess {
                url: url.into(),
                message: format!("status={} body={}", status.as_u16(), body),
            });
        }

        let bytes = response.bytes().await.map_err(|err| {
            tracing::error!(error = %err, url, "blob body read failed");
            RelayError::BlobAccess {
                url: url.into(),
                message: err.to_string(),
            }
        })?;
        decode_utf8(url, &bytes)
    }
}

fn decode_utf8(url: &str, bytes: &[u8]) -> Result<String, RelayError> {
    String::from_utf8(bytes.to_vec()).map_err(|err| {
        tracing::error!(error = %err, url, "blob content is not valid UTF-8");
        RelayError::BlobAccess {
            url: url.into(),
            message: format!("blob content is not valid UTF-8: {err}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_utf8_text() {
        let text = decode_utf8("https://a", br#"{"x":1}"#).unwrap();
        assert_eq!(text, r#"{"x":1}"#);
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let err = decode_utf8("https://a", &[0xff, 0xfe, 0x00]).unwrap_err();
        match err {
            RelayError::BlobAccess { url, message } => {
                assert_eq!(url, "https://a");
                assert!(message.contains("UTF-8"));
            }
            other => panic!("expected BlobAccess, got {other:?}"),
        }
    }
}
