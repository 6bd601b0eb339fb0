use thiserror::Error;

/// Failure kinds surfaced by the relay pipeline.
///
/// Every error is logged in full where it occurs and then propagated to the
/// caller; no component attempts local recovery. The hosting trigger decides
/// what an invocation failure means externally.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required setting is missing or carries an unsupported value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The trigger payload (or one of its elements) is malformed.
    #[error("failed to parse trigger payload: {0}")]
    Parse(String),

    /// Download or UTF-8 decode of a blob failed.
    #[error("blob access failed for {url}: {message}")]
    BlobAccess { url: String, message: String },

    /// The identity provider was unreachable or denied the token request.
    #[error("token acquisition failed: {0}")]
    Auth(String),

    /// The ingestion endpoint was unreachable or answered with a non-success
    /// status.
    #[error("ingestion forwarding failed: {0}")]
    Ingestion(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
