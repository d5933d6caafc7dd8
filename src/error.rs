use thiserror::Error;

use crate::api::Reason;

/// Everything that can go wrong between reading the configuration
/// and receiving a validated payload.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not obtain an access token: {0}")]
    Auth(String),

    /// The service answered with a non-success HTTP status.
    #[error("Request failed with {code}")]
    Transport { code: String, body: String },

    /// The payload reported `success: false`.
    #[error("API call failed")]
    Api { errors: Vec<Reason> },

    /// The payload succeeded, but the mutated record was not accepted.
    #[error("Record {status}")]
    Rejected { status: String, reasons: Vec<Reason> },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The command line asked for something the actions cannot do.
    #[error("{0}")]
    Usage(String),

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Editor error: {0}")]
    Editor(String),
}

impl Error {
    /// The structured reasons behind this error, if the service gave any.
    pub fn reasons(&self) -> Vec<Reason> {
        match self {
            Error::Api { errors } => errors.clone(),
            Error::Rejected { reasons, .. } => reasons.clone(),
            Error::Transport { code, body } => vec![Reason {
                code: Some(code.clone()),
                message: body.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_exposes_body_as_reason() {
        let err = Error::Transport {
            code: "http-500".to_string(),
            body: "<html>oops</html>".to_string(),
        };
        let reasons = err.reasons();
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].code.as_deref(), Some("http-500"));
        assert_eq!(reasons[0].message, "<html>oops</html>");
        assert_eq!(err.to_string(), "Request failed with http-500");
    }

    #[test]
    fn test_rejected_error_carries_reasons() {
        let err = Error::Rejected {
            status: "skipped".to_string(),
            reasons: vec![Reason {
                code: Some("1005".to_string()),
                message: "Lead already exists".to_string(),
            }],
        };
        assert_eq!(err.to_string(), "Record skipped");
        assert_eq!(err.reasons()[0].message, "Lead already exists");
    }

    #[test]
    fn test_invalid_filter_has_no_reasons() {
        let err = Error::InvalidFilter("no filter given".to_string());
        assert!(err.reasons().is_empty());
    }
}
