//! Response envelope.
//!
//! Every search response is HTTP 200 with `{"error", "info", "data"?}`;
//! the outcome lives in the `error` code, not the status line.

use axum::Json;
use axum::response::{IntoResponse, Response};
use edgesearch_core::Error;
use edgesearch_core::error::CODE_SUCCESS;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub error: i32,
    pub info: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    pub fn success(data: serde_json::Value) -> Self {
        Self { error: CODE_SUCCESS, info: "success", data: Some(data) }
    }

    pub fn failure(err: &Error) -> Self {
        Self { error: err.envelope_code(), info: err.envelope_info(), data: None }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let value = serde_json::to_value(Envelope::success(json!({"a": 1}))).unwrap();
        assert_eq!(value, json!({"error": 0, "info": "success", "data": {"a": 1}}));
    }

    #[test]
    fn test_failure_omits_data() {
        let value = serde_json::to_value(Envelope::failure(&Error::MissingQuery)).unwrap();
        assert_eq!(value, json!({"error": 1100, "info": "Query is missing!"}));

        let value = serde_json::to_value(Envelope::failure(&Error::Blocked)).unwrap();
        assert_eq!(value, json!({"error": 1050, "info": "Bots aren't allowed to use this API endpoint."}));
    }

    #[test]
    fn test_cache_failure_reported_as_upstream() {
        let envelope = Envelope::failure(&Error::MigrationFailed("disk".into()));
        assert_eq!(envelope.error, 1105);
        assert_eq!(envelope.info, "Something went wrong while trying to fetch search results.");
    }
}
