//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker carried in `error` when a lookup or remove finds no key.
/// The status stays `Success`: absence is an answer, not a fault.
pub const NOT_FOUND: &str = "KeyError";

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Success,

    /// Operational failure on the server; the caller may retry
    Failure,

    /// The request itself is wrong; retrying cannot help
    #[serde(rename = "Invalid Request")]
    InvalidRequest,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Create a Success response carrying `result`
    pub fn success(result: Value) -> Self {
        Self {
            status: Status::Success,
            result: Some(result),
            error: None,
        }
    }

    /// Create the Success response for an absent key
    pub fn not_found() -> Self {
        Self {
            status: Status::Success,
            result: None,
            error: Some(NOT_FOUND.to_string()),
        }
    }

    /// Create a Failure response
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Create an Invalid Request response
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: Status::InvalidRequest,
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == Status::Failure
    }

    pub fn is_invalid_request(&self) -> bool {
        self.status == Status::InvalidRequest
    }

    /// Successful answer saying the key does not exist
    pub fn is_not_found(&self) -> bool {
        self.is_success() && self.result.is_none() && self.error.as_deref() == Some(NOT_FOUND)
    }

    /// Error message, or an empty string
    pub fn message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}
