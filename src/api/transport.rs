use reqwest::{header, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::Result;

/// Whole-request timeout applied to every call.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection timeout applied to every call.
pub const CONNECT_TIMEOUT_SECS: u64 = 15;

/// POST bodies are always JSON.
const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Query parameters and body keys whose values never make it into logs.
const SECRET_PARAMS: [&str; 2] = ["access_token", "client_secret"];

/// A fully-built outbound call. Every parameter, the token included,
/// is already part of `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// The status and raw text of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Carries requests to the service and brings back the raw response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// The real network, via reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("marketoctl/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %redacted(&request.url), "sending request");

        let mut builder = self.client.request(request.method, request.url);
        if let Some(body) = &request.body {
            let posted_contents = serde_json::to_string(body)?;
            tracing::debug!(body = %posted_contents, "request body");
            builder = builder
                .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(posted_contents);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, body = %redacted_body(&body), "received response");

        Ok(HttpResponse { status, body })
    }
}

/// Renders `url` with secret query values masked.
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if SECRET_PARAMS.iter().any(|secret| *secret == key) {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    if !pairs.is_empty() {
        masked.query_pairs_mut().clear().extend_pairs(pairs);
    }
    masked.to_string()
}

/// Renders a JSON response body with secret top-level values masked.
/// Anything that is not a JSON object is shown as is.
pub fn redacted_body(body: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    let mut masked = false;
    for key in SECRET_PARAMS {
        if let Some(value) = object.get_mut(key) {
            *value = Value::String("***".to_string());
            masked = true;
        }
    }
    if !masked {
        return body.to_string();
    }
    Value::Object(object).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_masks_secrets() {
        let url = Url::parse(
            "https://x.mktorest.com/identity/oauth/token?grant_type=client_credentials&client_id=abc&client_secret=s3cret",
        )
        .unwrap();
        let shown = redacted(&url);
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("client_id=abc"));
        assert!(shown.contains("client_secret=***") || shown.contains("client_secret=%2A%2A%2A"));
    }

    #[test]
    fn test_redacted_masks_access_token_only() {
        let url =
            Url::parse("https://x.mktorest.com/rest/v1/leads.json?access_token=tok&fields=email")
                .unwrap();
        let shown = redacted(&url);
        assert!(!shown.contains("tok&"));
        assert!(shown.contains("fields=email"));
    }

    #[test]
    fn test_redacted_body_masks_identity_token() {
        let body = r#"{"access_token":"cdf01657-110d-4155-99a7-f986b2ff13a0:int","token_type":"bearer","expires_in":3599}"#;
        let shown = redacted_body(body);
        assert!(!shown.contains("cdf01657"));
        let parsed: Value = serde_json::from_str(&shown).unwrap();
        assert_eq!(parsed["access_token"], "***");
        assert_eq!(parsed["expires_in"], 3599);
    }

    #[test]
    fn test_redacted_body_leaves_payloads_alone() {
        let body = r#"{"success":true,"result":[{"id":5,"status":"created"}]}"#;
        assert_eq!(redacted_body(body), body);
        assert_eq!(redacted_body("<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn test_redacted_leaves_plain_urls_alone() {
        let url = Url::parse("https://x.mktorest.com/rest/v1/leads.json").unwrap();
        assert_eq!(redacted(&url), "https://x.mktorest.com/rest/v1/leads.json");
    }
}
