//! Environment-backed relay configuration.
//!
//! Settings are resolved exactly once at process start and the resulting
//! struct is immutable, so it can be shared across concurrent invocations
//! without locking. Construction goes through an injectable lookup so tests
//! never have to touch process environment variables.

use std::env;

use crate::error::RelayError;

pub const TENANT_ID_ENV: &str = "DATA_FETCHER_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "DATA_FETCHER_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "DATA_FETCHER_CLIENT_SECRET";
pub const INGESTION_ENDPOINT_ENV: &str = "LOG_INGESTION_ENDPOINT";
pub const MESSAGE_FORMAT_ENV: &str = "MESSAGE_FORMAT";
pub const AUTH_BASE_ENV: &str = "AUTH_BASE_URL";

const DEFAULT_AUTH_BASE: &str = "https://login.microsoftonline.com";

/// Shape of the trigger payload elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// Each element is the event object itself.
    Bare,
    /// Each element wraps the event object under a `data` field.
    Wrapped,
}

impl MessageFormat {
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        match raw {
            "bare" => Ok(Self::Bare),
            "wrapped" => Ok(Self::Wrapped),
            other => Err(RelayError::Config(format!(
                "unknown message format '{other}' (expected 'bare' or 'wrapped')"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bare => "bare",
            Self::Wrapped => "wrapped",
        }
    }
}

/// Which identity the relay authenticates as.
#[derive(Debug, Clone)]
pub enum CredentialSettings {
    /// Explicit service-principal triple from the relay's own settings.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Discover the triple from the conventional ambient variables.
    Ambient,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: CredentialSettings,
    pub ingestion_endpoint: String,
    pub message_format: MessageFormat,
    pub auth_base: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let ingestion_endpoint = require(&lookup, INGESTION_ENDPOINT_ENV)?;
        let message_format = MessageFormat::parse(&require(&lookup, MESSAGE_FORMAT_ENV)?)?;

        // Presence of the client secret selects the explicit credential mode;
        // without it the ambient discovery path is used.
        let credentials = match lookup(CLIENT_SECRET_ENV) {
            Some(client_secret) => CredentialSettings::ClientSecret {
                tenant_id: require(&lookup, TENANT_ID_ENV)?,
                client_id: require(&lookup, CLIENT_ID_ENV)?,
                client_secret,
            },
            None => CredentialSettings::Ambient,
        };

        let auth_base = lookup(AUTH_BASE_ENV).unwrap_or_else(|| DEFAULT_AUTH_BASE.into());

        Ok(Self {
            credentials,
            ingestion_endpoint,
            message_format,
            auth_base,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, RelayError> {
    lookup(name).ok_or_else(|| RelayError::Config(format!("{name} must be set")))
}
