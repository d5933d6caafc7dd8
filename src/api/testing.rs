use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::{Error, Result};

/// An in-memory transport that plays back queued responses in order
/// and remembers every request it was handed.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: StatusCode, body: &str) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn respond_json(&self, body: Value) {
        self.respond(StatusCode::OK, &body.to_string());
    }

    /// Queues a successful identity response.
    pub fn respond_token(&self, token: &str) {
        self.respond_json(serde_json::json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3599
        }));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests made to anything but the identity endpoint.
    pub fn api_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.path() != crate::oauth::TOKEN_PATH)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "no scripted response left",
            ))
        })
    }
}

/// Query parameters of `request`, in order.
pub fn query(request: &HttpRequest) -> Vec<(String, String)> {
    request.url.query_pairs().into_owned().collect()
}

/// The value of a single query parameter.
pub fn param(request: &HttpRequest, name: &str) -> Option<String> {
    query(request)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}
