//! Core contracts and pipeline for the blob-to-log-ingestion relay.
//!
//! A trigger payload comes in, individual blob-change events come out of the
//! normalizer, writes pass the filter, the referenced blob is downloaded and
//! its text is forwarded to the ingestion endpoint with a bearer token. All
//! collaborators sit behind traits so hosts and tests can swap transports.
pub mod blob;
pub mod config;
pub mod credentials;
pub mod error;
pub mod event;
pub mod ingest;
pub mod pipeline;

pub use blob::{BlobStore, HttpBlobStore, STORAGE_API_VERSION};
pub use config::{CredentialSettings, MessageFormat, RelayConfig};
pub use credentials::{
    AccessToken, ClientSecretCredential, TokenCredential, MONITOR_SCOPE, STORAGE_SCOPE,
};
pub use error::{RelayError, RelayResult};
pub use event::{events, BlobChangeEvent, EventIter, BLOB_WRITE_OPERATION};
pub use ingest::{HttpIngestionSink, IngestionSink};
pub use pipeline::Pipeline;
