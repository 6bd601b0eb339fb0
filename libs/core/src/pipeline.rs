//! The relay pipeline: normalize → filter → fetch → token → forward.
//!
//! Strictly sequential per invocation. Events in a batch are processed one
//! after another and the first failure aborts the remaining events; the
//! hosting trigger owns any retry semantics.

use std::sync::Arc;

use crate::blob::{BlobStore, HttpBlobStore};
use crate::config::{MessageFormat, RelayConfig};
use crate::credentials::{ClientSecretCredential, TokenCredential, MONITOR_SCOPE};
use crate::error::RelayError;
use crate::event::events;
use crate::ingest::{HttpIngestionSink, IngestionSink};

pub struct Pipeline {
    format: MessageFormat,
    blobs: Arc<dyn BlobStore>,
    credential: Arc<dyn TokenCredential>,
    sink: Arc<dyn IngestionSink>,
}

impl Pipeline {
    pub fn new(
        format: MessageFormat,
        blobs: Arc<dyn BlobStore>,
        credential: Arc<dyn TokenCredential>,
        sink: Arc<dyn IngestionSink>,
    ) -> Self {
        Self {
            format,
            blobs,
            credential,
            sink,
        }
    }

    /// Wires the production collaborators from configuration, sharing one
    /// HTTP client and one credential across all of them.
    pub fn from_config(config: &RelayConfig, http: reqwest::Client) -> Result<Self, RelayError> {
        let credential: Arc<dyn TokenCredential> = Arc::new(
            ClientSecretCredential::from_settings(
                http.clone(),
                &config.auth_base,
                &config.credentials,
            )?,
        );
        Ok(Self::new(
            config.message_format,
            Arc::new(HttpBlobStore::new(http.clone(), credential.clone())),
            credential,
            Arc::new(HttpIngestionSink::new(
                http,
                config.ingestion_endpoint.clone(),
            )),
        ))
    }

    /// Runs one trigger payload through the pipeline and returns the number
    /// of events forwarded to the ingestion endpoint.
    pub async fn run(&self, payload: &str) -> Result<usize, RelayError> {
        tracing::info!(
            bytes = payload.len(),
            format = self.format.as_str(),
            "received trigger payload"
        );
        tracing::trace!(payload = %payload, "trigger payload content");

        let mut forwarded = 0usize;
        for event in events(payload, self.format)? {
            let event = event?;
            if !event.is_blob_write() {
                tracing::trace!(operation = %event.operation_kind, "skipping non-write event");
                continue;
            }
            if event.resource_url.is_empty() {
                return Err(RelayError::Parse(
                    "blob-write event carries no url".into(),
                ));
            }

            let text = self.blobs.fetch_text(&event.resource_url).await?;
            tracing::info!(url = %event.resource_url, bytes = text.len(), "fetched blob content");
            tracing::trace!(url = %event.resource_url, content = %text, "blob content");

            let token = self.credential.token(MONITOR_SCOPE).await?;
            self.sink.forward(&token, &text).await?;
            forwarded += 1;
        }

        Ok(forwarded)
    }
}
