// Serializable response envelope for transport adapters

use crate::error::Errors;
use crate::outcome::ApiResult;
use crate::status;
use serde::Serialize;
use serde_json::Value;

/// Flat, serializable rendering of an outcome, for adapters that need to
/// put a result on the wire. Purely derived: building one never changes
/// the outcome it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub success: bool,
    pub name: String,
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errs: Option<Errors>,
    pub tag: String,
}

impl Response {
    /// Builds the envelope from an outcome plus the request's correlation tag.
    pub fn from_outcome(outcome: &ApiResult, tag: &str) -> Self {
        let status = outcome.status();
        Self {
            success: outcome.is_success(),
            name: status.name.to_string(),
            code: status.code,
            message: outcome.message(),
            value: outcome.value().cloned(),
            errs: outcome.errors().cloned(),
            tag: tag.to_string(),
        }
    }

    /// HTTP status this response maps to, for web adapters.
    pub fn http_code(&self) -> u16 {
        status::to_http_code(self.code)
    }
}
