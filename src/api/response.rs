use reqwest::{Method, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Record statuses that mean a mutation actually took effect.
pub const ACCEPTED_STATUSES: [&str; 3] = ["created", "updated", "deleted"];

/// A `{code, message}` pair, used both for top-level `errors`
/// and for per-record `reasons`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    #[serde(
        default,
        deserialize_with = "code_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// The service sends codes as strings, but be lenient about numbers.
fn code_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(code)) => Some(code),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// The parts of a payload that validation looks at.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<Reason>,
    #[serde(default)]
    result: Vec<Value>,
}

#[derive(Deserialize)]
struct RecordOutcome {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reasons: Vec<Reason>,
}

/// A validated payload, kept exactly as the service sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse(Value);

impl ApiResponse {
    /// The `result` records, or nothing if the payload has none.
    pub fn result(&self) -> &[Value] {
        self.0
            .get("result")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn first_record(&self) -> Option<&Map<String, Value>> {
        self.result().first().and_then(Value::as_object)
    }

    /// Reads a field of the first record as a string, whatever its JSON type.
    pub fn first_field(&self, name: &str) -> Option<String> {
        match self.first_record()?.get(name)? {
            Value::String(value) => Some(value.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Turns a raw HTTP exchange into a validated payload.
///
/// 1. A non-success HTTP status is a transport error carrying the raw body.
/// 2. `success: false` is an API error carrying the payload's `errors`.
/// 3. For anything but a plain fetch, the single result record must have an
///    accepted status, otherwise the record's `reasons` are surfaced.
///
/// A `200` with `success: true` can still be a rejection, so step 3 runs
/// regardless of the flag.
pub fn validate(method: &Method, status: StatusCode, body: &str) -> Result<ApiResponse> {
    if !status.is_success() {
        return Err(Error::Transport {
            code: format!("http-{}", status.as_u16()),
            body: body.to_string(),
        });
    }

    let payload: Value = serde_json::from_str(body)
        .map_err(|err| Error::MalformedResponse(format!("body is not JSON: {err}")))?;
    let envelope: Envelope = serde_json::from_value(payload.clone())
        .map_err(|err| Error::MalformedResponse(format!("unrecognised payload: {err}")))?;

    if !envelope.success {
        return Err(Error::Api {
            errors: envelope.errors,
        });
    }

    if *method != Method::GET {
        let mut records = envelope.result;
        if records.len() != 1 {
            return Err(Error::MalformedResponse(format!(
                "expected exactly one result record, got {}",
                records.len()
            )));
        }
        let outcome: RecordOutcome = serde_json::from_value(records.remove(0))
            .map_err(|err| Error::MalformedResponse(format!("unrecognised record: {err}")))?;

        let accepted = outcome
            .status
            .as_deref()
            .is_some_and(|status| ACCEPTED_STATUSES.contains(&status));
        if !accepted {
            return Err(Error::Rejected {
                status: outcome.status.unwrap_or_else(|| "without status".to_string()),
                reasons: outcome.reasons,
            });
        }
    }

    Ok(ApiResponse(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(method: Method, payload: &Value) -> Result<ApiResponse> {
        validate(&method, StatusCode::OK, &payload.to_string())
    }

    #[test]
    fn test_created_mutation_returns_payload_unmodified() {
        let payload = json!({
            "requestId": "e42b#14272d07d78",
            "success": true,
            "result": [{"id": 50, "status": "created"}]
        });
        let response = ok(Method::POST, &payload).unwrap();
        assert_eq!(response.into_value(), payload);
    }

    #[test]
    fn test_updated_and_deleted_are_accepted() {
        for status in ["updated", "deleted"] {
            let payload = json!({"success": true, "result": [{"seq": 0, "status": status}]});
            assert!(ok(Method::POST, &payload).is_ok(), "{status} should pass");
        }
    }

    #[test]
    fn test_skipped_mutation_is_rejected_with_reasons() {
        let payload = json!({
            "success": true,
            "result": [{
                "seq": 0,
                "status": "skipped",
                "reasons": [{"code": "1005", "message": "Lead already exists"}]
            }]
        });
        match ok(Method::POST, &payload) {
            Err(Error::Rejected { status, reasons }) => {
                assert_eq!(status, "skipped");
                assert_eq!(reasons.len(), 1);
                assert_eq!(reasons[0].code.as_deref(), Some("1005"));
                assert_eq!(reasons[0].message, "Lead already exists");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_mutation_without_status_is_rejected() {
        let payload = json!({"success": true, "result": [{"seq": 0}]});
        assert!(matches!(
            ok(Method::POST, &payload),
            Err(Error::Rejected { .. })
        ));
    }

    #[test]
    fn test_mutation_must_have_exactly_one_record() {
        let empty = json!({"success": true, "result": []});
        assert!(matches!(
            ok(Method::POST, &empty),
            Err(Error::MalformedResponse(ref msg)) if msg.ends_with("got 0")
        ));

        let two = json!({"success": true, "result": [
            {"status": "created"}, {"status": "created"}
        ]});
        assert!(matches!(
            ok(Method::POST, &two),
            Err(Error::MalformedResponse(ref msg)) if msg.ends_with("got 2")
        ));
    }

    #[test]
    fn test_fetch_skips_status_check() {
        let payload = json!({"success": true, "result": [{"id": 7, "email": "a@b.com"}]});
        let response = ok(Method::GET, &payload).unwrap();
        assert_eq!(response.first_field("id").as_deref(), Some("7"));
        assert_eq!(response.first_field("email").as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_fetch_with_empty_result_is_fine() {
        let payload = json!({"success": true, "result": []});
        let response = ok(Method::GET, &payload).unwrap();
        assert!(response.result().is_empty());
        assert!(response.first_record().is_none());
    }

    #[test]
    fn test_success_false_is_api_error() {
        let payload = json!({
            "success": false,
            "errors": [{"code": "601", "message": "Access token invalid"}]
        });
        match ok(Method::GET, &payload) {
            Err(Error::Api { errors }) => {
                assert_eq!(errors[0].code.as_deref(), Some("601"));
                assert_eq!(errors[0].message, "Access token invalid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_codes_are_stringified() {
        let payload = json!({"success": false, "errors": [{"code": 602, "message": "expired"}]});
        let err = ok(Method::GET, &payload).unwrap_err();
        assert_eq!(err.reasons()[0].code.as_deref(), Some("602"));
    }

    #[test]
    fn test_http_500_is_transport_error_regardless_of_body() {
        let body = json!({"success": true, "result": [{"status": "created"}]}).to_string();
        match validate(&Method::POST, StatusCode::INTERNAL_SERVER_ERROR, &body) {
            Err(Error::Transport { code, body: raw }) => {
                assert_eq!(code, "http-500");
                assert_eq!(raw, body);
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = validate(&Method::GET, StatusCode::OK, "<html/>").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
