use reqwest::Method;
use serde::Deserialize;
use std::time::{Duration, Instant};
use url::Url;

use crate::api::{HttpRequest, Transport};
use crate::error::{Error, Result};

/// The identity endpoint, relative to the service root.
pub const TOKEN_PATH: &str = "/identity/oauth/token";

/// The API user's client credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// What the identity endpoint answers with.
/// Only `access_token` is required; the rest helps with diagnostics.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// A bearer token along with the moment it stops being valid, if known.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    /// A lifetime too long to represent as an `Instant` never expires.
    pub fn new(value: String, expires_in: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: expires_in.and_then(|lifetime| Instant::now().checked_add(lifetime)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Tokens without a known lifetime are kept for the whole process.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// Builds the client-credentials URL for the identity endpoint.
pub fn token_url(service_root: &Url, credentials: &Credentials) -> Result<Url> {
    let mut url = service_root.join(TOKEN_PATH)?;
    url.query_pairs_mut()
        .append_pair("grant_type", "client_credentials")
        .append_pair("client_id", &credentials.client_id)
        .append_pair("client_secret", &credentials.client_secret);
    Ok(url)
}

/// Exchanges client credentials for an access token.
///
/// Any failure along the way, be it the network, the status or a body
/// without `access_token`, is reported as [`Error::Auth`].
pub async fn obtain_access_token<T: Transport>(
    transport: &T,
    service_root: &Url,
    credentials: &Credentials,
) -> Result<AccessToken> {
    let request = HttpRequest {
        method: Method::GET,
        url: token_url(service_root, credentials)?,
        body: None,
    };

    let response = transport
        .execute(request)
        .await
        .map_err(|err| Error::Auth(err.to_string()))?;

    if !response.status.is_success() {
        return Err(Error::Auth(format!(
            "identity endpoint answered {}: {}",
            response.status, response.body
        )));
    }

    let body: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|err| Error::Auth(format!("unreadable identity response: {err}")))?;

    let Some(access_token) = body.access_token else {
        let detail = body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| "no access_token in identity response".to_string());
        return Err(Error::Auth(detail));
    };

    tracing::debug!(expires_in = ?body.expires_in, "obtained access token");
    Ok(AccessToken::new(
        access_token,
        body.expires_in.map(Duration::from_secs),
    ))
}
