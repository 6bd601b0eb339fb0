//! Forwarding fetched blob content to the log-ingestion endpoint.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::credentials::AccessToken;
use crate::error::RelayError;

/// Posts a payload to the ingestion service. The body is forwarded verbatim;
/// the blob's text is trusted to already be valid JSON for the endpoint.
#[async_trait]
pub trait IngestionSink: Send + Sync {
    async fn forward(&self, token: &AccessToken, body: &str) -> Result<(), RelayError>;
}

pub struct HttpIngestionSink {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpIngestionSink {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl IngestionSink for HttpIngestionSink {
    async fn forward(&self, token: &AccessToken, body: &str) -> Result<(), RelayError> {
        tracing::info!(endpoint = %self.endpoint, bytes = body.len(), "forwarding payload to ingestion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&token.secret)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %err, endpoint = %self.endpoint, "ingestion request failed");
                RelayError::Ingestion(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable>".into());
            tracing::error!(status = status.as_u16(), body = %body, endpoint = %self.endpoint, "ingestion endpoint refused the payload");
            return Err(status_failure(status.as_u16(), &body));
        }

        Ok(())
    }
}

fn status_failure(status: u16, body: &str) -> RelayError {
    RelayError::Ingestion(format!("status={status} body={body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_failure_carries_status_and_body() {
        let err = status_failure(403, r#"{"error":"Forbidden"}"#);
        match err {
            RelayError::Ingestion(message) => {
                assert!(message.contains("status=403"));
                assert!(message.contains(r#"body={"error":"Forbidden"}"#));
            }
            other => panic!("expected Ingestion, got {other:?}"),
        }
    }

    #[test]
    fn status_failure_display_names_the_forwarding_stage() {
        let err = status_failure(503, "<unavailable>");
        assert_eq!(
            err.to_string(),
            "ingestion forwarding failed: status=503 body=<unavailable>"
        );
    }
}
