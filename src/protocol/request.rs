//! Request definitions
//!
//! `Request` is the validated form the server dispatches and the WAL records.
//! `RequestBody` is what clients put on the wire: a known method with loosely
//! typed arguments, so a bad argument is rejected by the server rather than
//! by the caller's type system.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, RingError};

/// RPC method names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Insert,
    Lookup,
    Remove,
    Scan,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Insert => "insert",
            Method::Lookup => "lookup",
            Method::Remove => "remove",
            Method::Scan => "scan",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "insert" => Some(Method::Insert),
            "lookup" => Some(Method::Lookup),
            "remove" => Some(Method::Remove),
            "scan" => Some(Method::Scan),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Validated Request
// =============================================================================

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Request {
    /// Store `value` under `key`
    Insert { key: String, value: Value },

    /// Fetch the value under `key`
    Lookup { key: String },

    /// Delete `key`, returning its value
    Remove { key: String },

    /// List every pair whose key matches `regex`
    Scan { regex: String },
}

impl Request {
    pub fn method(&self) -> Method {
        match self {
            Request::Insert { .. } => Method::Insert,
            Request::Lookup { .. } => Method::Lookup,
            Request::Remove { .. } => Method::Remove,
            Request::Scan { .. } => Method::Scan,
        }
    }

    /// Whether this request changes state and must be logged
    pub fn is_mutation(&self) -> bool {
        matches!(self, Request::Insert { .. } | Request::Remove { .. })
    }

    /// Decode and validate a JSON body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| RingError::InvalidRequest("Failed to load JSON".into()))?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON body
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(RingError::InvalidRequest("request must be a JSON object".into()));
        };

        let method = match fields.get("method") {
            Some(Value::String(name)) => Method::parse(name).ok_or_else(|| {
                RingError::InvalidRequest(format!("unknown method {name:?}"))
            })?,
            Some(_) => return Err(RingError::InvalidRequest("method must be a string".into())),
            None => return Err(RingError::InvalidRequest("missing method".into())),
        };

        let request = match method {
            Method::Insert => {
                let key = take_key(&mut fields)?;
                let value = fields
                    .remove("value")
                    .ok_or_else(|| RingError::InvalidRequest("insert requires a value".into()))?;
                Request::Insert { key, value }
            }
            Method::Lookup => Request::Lookup { key: take_key(&mut fields)? },
            Method::Remove => Request::Remove { key: take_key(&mut fields)? },
            Method::Scan => match fields.remove("regex") {
                Some(Value::String(regex)) => Request::Scan { regex },
                Some(_) => return Err(RingError::InvalidRequest("regex must be a string".into())),
                None => return Err(RingError::InvalidRequest("scan requires a regex".into())),
            },
        };

        request.validate()?;
        Ok(request)
    }

    /// Check the rules a typed request can still break
    ///
    /// Anything accepted here decodes again from its own JSON, so a logged
    /// request always replays.
    pub fn validate(&self) -> Result<()> {
        match self {
            Request::Insert { key, .. } | Request::Lookup { key } | Request::Remove { key }
                if key.is_empty() =>
            {
                Err(RingError::InvalidRequest("key must not be empty".into()))
            }
            _ => Ok(()),
        }
    }

    /// Serialize to a single-line JSON body
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn take_key(fields: &mut Map<String, Value>) -> Result<String> {
    match fields.remove("key") {
        Some(Value::String(key)) => Ok(key),
        Some(_) => Err(RingError::InvalidRequest("key must be a string".into())),
        None => Err(RingError::InvalidRequest("missing key".into())),
    }
}

// =============================================================================
// Client Body
// =============================================================================

/// Request as built by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub method: Method,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<Value>,
}

impl RequestBody {
    pub fn insert(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            method: Method::Insert,
            key: Some(key.into()),
            value: Some(value.into()),
            regex: None,
        }
    }

    pub fn lookup(key: impl Into<Value>) -> Self {
        Self {
            method: Method::Lookup,
            key: Some(key.into()),
            value: None,
            regex: None,
        }
    }

    pub fn remove(key: impl Into<Value>) -> Self {
        Self {
            method: Method::Remove,
            key: Some(key.into()),
            value: None,
            regex: None,
        }
    }

    pub fn scan(regex: impl Into<Value>) -> Self {
        Self {
            method: Method::Scan,
            key: None,
            value: None,
            regex: Some(regex.into()),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl From<&Request> for RequestBody {
    fn from(request: &Request) -> Self {
        match request {
            Request::Insert { key, value } => RequestBody::insert(key.as_str(), value.clone()),
            Request::Lookup { key } => RequestBody::lookup(key.as_str()),
            Request::Remove { key } => RequestBody::remove(key.as_str()),
            Request::Scan { regex } => RequestBody::scan(regex.as_str()),
        }
    }
}
