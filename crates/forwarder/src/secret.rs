//! Secret store abstraction and the ingestion auth token.
//!
//! The [`SecretProvider`] trait abstracts the secret store, allowing
//! production code to use [`SecretsManagerProvider`] while tests use a mock.
//! The orchestrator resolves the token at most once per invocation and reuses
//! it for every outbound call.
//!
//! # Token hygiene
//!
//! [`AuthToken`] redacts its value in `Debug` and `Display` output and does
//! not implement `Serialize`. The raw value is only reachable through
//! [`AuthToken::expose`], which the HTTP sink uses to build the
//! `Authorization` header.

use std::fmt;
use std::future::Future;

use aws_types::region::Region;

use crate::error::ForwardError;

/// Opaque ingestion credential.
///
/// Owned exclusively by the current invocation; never logged, never
/// persisted.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value for header construction.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(****)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "****")
    }
}

/// Trait abstracting the secret store.
///
/// # Errors
///
/// - [`ForwardError::SecretUnavailable`]: store unreachable, unknown secret
///   id, or a secret value that is not a JSON object
/// - [`ForwardError::SecretKeyMissing`]: the secret value does not contain
///   the requested key
pub trait SecretProvider: Send + Sync {
    /// Resolves the named credential from the store.
    ///
    /// `key_name` selects one string field within the structured secret
    /// value. Must be called at most once per invocation.
    fn resolve(
        &self,
        secret_id: &str,
        key_name: &str,
    ) -> impl Future<Output = Result<AuthToken, ForwardError>> + Send;
}

/// Production provider backed by AWS Secrets Manager.
pub struct SecretsManagerProvider {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerProvider {
    /// Creates a provider over an existing Secrets Manager client.
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }

    /// Loads default AWS configuration for the given region and connects.
    pub async fn connect(region: impl Into<String>) -> Self {
        let conf = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self::new(aws_sdk_secretsmanager::Client::new(&conf))
    }
}

impl SecretProvider for SecretsManagerProvider {
    async fn resolve(&self, secret_id: &str, key_name: &str) -> Result<AuthToken, ForwardError> {
        let resp = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| ForwardError::SecretUnavailable {
                secret_id: secret_id.to_owned(),
                reason: e.to_string(),
            })?;

        let raw = resp
            .secret_string()
            .ok_or_else(|| ForwardError::SecretUnavailable {
                secret_id: secret_id.to_owned(),
                reason: "secret has no string value".to_owned(),
            })?;

        token_from_secret_string(secret_id, key_name, raw)
    }
}

/// Extracts one string field from a JSON-structured secret value.
fn token_from_secret_string(
    secret_id: &str,
    key_name: &str,
    raw: &str,
) -> Result<AuthToken, ForwardError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| ForwardError::SecretUnavailable {
            secret_id: secret_id.to_owned(),
            reason: "secret value is not valid JSON".to_owned(),
        })?;

    match value.get(key_name).and_then(|v| v.as_str()) {
        Some(token) if !token.is_empty() => Ok(AuthToken::new(token)),
        _ => Err(ForwardError::SecretKeyMissing {
            secret_id: secret_id.to_owned(),
            key: key_name.to_owned(),
        }),
    }
}
