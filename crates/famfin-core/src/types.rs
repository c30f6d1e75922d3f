//! Shared types used across famfin crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The synchronous result handed back to the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Set when `body` carries base64 because the payload was not UTF-8.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_base64_encoded: bool,
}

impl InvocationResult {
    /// A JSON result with a `content-type: application/json` header.
    pub fn json(status_code: u16, body: &serde_json::Value) -> Self {
        Self {
            status_code,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }
}

/// Body of every error result produced at the invocation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            hint: None,
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        Self {
            hint: Some(hint.into()),
            ..self
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("Bad request").with_message(message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("Not found").with_message(message)
    }

    pub fn internal() -> Self {
        Self::new("Internal server error")
    }

    pub fn to_value(&self) -> serde_json::Value {
        let mut value = serde_json::json!({ "error": self.error });
        if let Some(message) = &self.message {
            value["message"] = serde_json::Value::from(message.as_str());
        }
        if let Some(hint) = &self.hint {
            value["hint"] = serde_json::Value::from(hint.as_str());
        }
        value
    }

    pub fn into_result(self, status_code: u16) -> InvocationResult {
        InvocationResult::json(status_code, &self.to_value())
    }
}
