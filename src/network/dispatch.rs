//! Request dispatch
//!
//! Turns one frame body into one response.

use serde_json::Value;

use crate::engine::{Engine, Outcome};
use crate::protocol::{Request, Response};

/// Decode, validate and execute a request body
///
/// Request-level problems become `Invalid Request`; anything the engine
/// fails to do becomes `Failure`, so the caller knows a mutation may not
/// have persisted.
pub fn respond(engine: &mut Engine, body: &[u8]) -> Response {
    let request = match Request::from_json(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Rejecting request: {}", e);
            return Response::invalid_request(e.to_string());
        }
    };

    let method = request.method();
    match engine.execute(request) {
        Ok(outcome) => {
            tracing::trace!("{} succeeded", method);
            outcome_response(outcome)
        }
        Err(e) if e.is_invalid_request() => {
            tracing::debug!("Rejecting {}: {}", method, e);
            Response::invalid_request(e.to_string())
        }
        Err(e) => {
            tracing::error!("{} failed: {}", method, e);
            Response::failure(e.to_string())
        }
    }
}

fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Inserted { key } => Response::success(Value::String(format!("Inserted {key}"))),
        Outcome::Value(value) => Response::success(value),
        Outcome::NotFound => Response::not_found(),
        Outcome::Matches(pairs) => Response::success(Value::Array(
            pairs
                .into_iter()
                .map(|(key, value)| Value::Array(vec![Value::String(key), value]))
                .collect(),
        )),
    }
}
