//! OAuth2 client-credentials token acquisition.
//!
//! One capability, two construction paths: an explicit service-principal
//! triple from the relay's own settings, or ambient discovery from the
//! conventional `AZURE_*` variables. Tokens are requested fresh on every
//! call; nothing is cached.

use std::env;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::CredentialSettings;
use crate::error::RelayError;

/// Scope requested for blob downloads.
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
/// Scope requested for log ingestion. The token service expects this string
/// verbatim, double slash included.
pub const MONITOR_SCOPE: &str = "https://monitor.azure.com//.default";

pub const AMBIENT_TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
pub const AMBIENT_CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
pub const AMBIENT_CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";

/// Short-lived bearer token. Held only for the duration of one call.
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub secret: String,
    pub expires_in: Option<u64>,
}

/// Produces a bearer token for a given scope.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self, scope: &str) -> Result<AccessToken, RelayError>;
}

#[derive(Debug)]
pub struct ClientSecretCredential {
    http: reqwest::Client,
    auth_base: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    pub fn new(
        http: reqwest::Client,
        auth_base: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth_base: auth_base.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Builds the credential selected by configuration: the explicit triple
    /// when present, otherwise ambient discovery.
    pub fn from_settings(
        http: reqwest::Client,
        auth_base: &str,
        settings: &CredentialSettings,
    ) -> Result<Self, RelayError> {
        match settings {
            CredentialSettings::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => Ok(Self::new(
                http,
                auth_base,
                tenant_id.clone(),
                client_id.clone(),
                client_secret.clone(),
            )),
            CredentialSettings::Ambient => Self::ambient(http, auth_base),
        }
    }

    /// Discovers the service-principal triple from the ambient environment.
    pub fn ambient(http: reqwest::Client, auth_base: &str) -> Result<Self, RelayError> {
        Self::ambient_from_lookup(http, auth_base, |name| env::var(name).ok())
    }

    fn ambient_from_lookup(
        http: reqwest::Client,
        auth_base: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RelayError> {
        let var = |name: &str| {
            lookup(name).ok_or_else(|| {
                RelayError::Config(format!(
                    "ambient credentials require {name} to be set"
                ))
            })
        };
        Ok(Self::new(
            http,
            auth_base,
            var(AMBIENT_TENANT_ID_ENV)?,
            var(AMBIENT_CLIENT_ID_ENV)?,
            var(AMBIENT_CLIENT_SECRET_ENV)?,
        ))
    }

    fn token_url(&self) -> String {
        let base = self.auth_base.trim_end_matches('/');
        format!("{base}/{}/oauth2/v2.0/token", self.tenant_id)
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self, scope: &str) -> Result<AccessToken, RelayError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope),
        ];

        let response = self
            .http
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %err, scope, "token request failed to reach the identity provider");
                RelayError::Auth(err.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RelayError::Auth(err.to_string()))?;
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                scope,
                "identity provider refused the token request"
            );
            return Err(RelayError::Auth(format!(
                "status={} body={}",
                status.as_u16(),
                body
            )));
        }

        decode_token_response(&body)
    }
}

fn decode_token_response(body: &str) -> Result<AccessToken, RelayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| RelayError::Auth(format!("invalid token response: {err}")))?;
    let secret = value
        .get("access_token")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| RelayError::Auth("access_token missing in response".into()))?;
    let expires_in = value.get("expires_in").and_then(Value::as_u64);
    Ok(AccessToken { secret, expires_in })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn token_url_joins_authority_and_tenant() {
        let cred = ClientSecretCredential::new(
            reqwest::Client::new(),
            "https://login.microsoftonline.com/",
            "tenant-1",
            "client-1",
            "s3cret",
        );
        assert_eq!(
            cred.token_url(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
    }

    #[test]
    fn decode_extracts_token_and_expiry() {
        let token = decode_token_response(
            r#"{"token_type":"Bearer","expires_in":3599,"access_token":"abc"}"#,
        )
        .unwrap();
        assert_eq!(token.secret, "abc");
        assert_eq!(token.expires_in, Some(3599));
    }

    #[test]
    fn decode_without_access_token_is_an_auth_error() {
        let err = decode_token_response(r#"{"token_type":"Bearer"}"#).unwrap_err();
        assert!(matches!(err, RelayError::Auth(_)));
    }

    #[test]
    fn decode_of_non_json_body_is_an_auth_error() {
        let err = decode_token_response("<html>oops</html>").unwrap_err();
        assert!(matches!(err, RelayError::Auth(_)));
    }

    #[test]
    fn ambient_discovery_reads_the_conventional_triple() {
        let vars: HashMap<&str, &str> = [
            (AMBIENT_TENANT_ID_ENV, "ambient-tenant"),
            (AMBIENT_CLIENT_ID_ENV, "ambient-client"),
            (AMBIENT_CLIENT_SECRET_ENV, "ambient-secret"),
        ]
        .into_iter()
        .collect();
        let cred = ClientSecretCredential::ambient_from_lookup(
            reqwest::Client::new(),
            "https://login.microsoftonline.com",
            |name| vars.get(name).map(|v| v.to_string()),
        )
        .unwrap();
        assert_eq!(
            cred.token_url(),
            "https://login.microsoftonline.com/ambient-tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn ambient_discovery_without_triple_is_a_config_error() {
        let err = ClientSecretCredential::ambient_from_lookup(
            reqwest::Client::new(),
            "https://login.microsoftonline.com",
            |_| None,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
