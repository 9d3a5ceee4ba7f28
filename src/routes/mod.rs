//! HTTP routes for Cabinet
//!
//! Handlers build `Response<BoxBody>` directly; domain errors are mapped
//! onto status codes and `{"error": ...}` bodies in one place.

pub mod app;
pub mod auth_routes;
pub mod files;
pub mod users;

pub use app::{handle_stats, handle_status};
pub use auth_routes::{handle_connect, handle_disconnect};
pub use files::{handle_data, handle_list, handle_publish, handle_show, handle_upload};
pub use users::{handle_me, handle_register};

use bson::oid::ObjectId;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::server::AppState;
use crate::types::{CabinetError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Request header carrying the session token
pub const TOKEN_HEADER: &str = "X-Token";

/// Maximum accepted request body (uploads arrive base64-encoded)
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full_body(json))
        .unwrap_or_else(|_| Response::new(empty_body()))
}

/// Map a domain error onto its status code and `{"error": ...}` body
pub fn error_response(err: CabinetError) -> Response<BoxBody> {
    if err.status_code().is_server_error() {
        error!("Request failed: {}", err);
    }
    let (status, message) = err.into_status_code_and_body();
    json_response(status, &ErrorResponse { error: message })
}

/// Unwrap a handler result, turning errors into their HTTP shape
pub fn respond(result: Result<Response<BoxBody>>) -> Response<BoxBody> {
    result.unwrap_or_else(error_response)
}

/// Parse a JSON request body. An empty body is treated as an empty object
/// so field-level validation produces the field-specific error.
///
/// The size cap is enforced during the read, so an oversized body is
/// rejected without ever being buffered in full.
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned + Default,
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| CabinetError::BadRequest(format!("Failed to read body: {}", e)))?
        .to_bytes();

    if bytes.is_empty() {
        return Ok(T::default());
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| CabinetError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Fetch a header value as a string
pub fn get_header<'a>(req: &'a Request<Incoming>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Fetch a query-string parameter
pub fn query_param(req: &Request<Incoming>, key: &str) -> Option<String> {
    req.uri().query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

/// Resolve the caller from the token header, if any.
///
/// A missing header short-circuits to `None` before the session store is
/// consulted. A header that is present but does not resolve is
/// `Unauthorized`.
pub async fn authenticate_optional(
    state: &Arc<AppState>,
    req: &Request<Incoming>,
) -> Result<Option<ObjectId>> {
    let token = match get_header(req, TOKEN_HEADER) {
        Some(token) => token,
        None => return Ok(None),
    };

    let user_id = state
        .sessions
        .resolve(token)
        .await?
        .ok_or(CabinetError::Unauthorized)?;

    let user_id = ObjectId::parse_str(&user_id).map_err(|_| CabinetError::Unauthorized)?;
    Ok(Some(user_id))
}

/// Resolve the caller from the token header, requiring one
pub async fn authenticate(state: &Arc<AppState>, req: &Request<Incoming>) -> Result<ObjectId> {
    authenticate_optional(state, req)
        .await?
        .ok_or(CabinetError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Payload {
        name: Option<String>,
    }

    fn json_request(body: impl Into<Bytes>) -> Request<Full<Bytes>> {
        Request::new(Full::new(body.into()))
    }

    #[tokio::test]
    async fn body_over_the_cap_is_rejected_during_the_read() {
        let oversized = vec![b'x'; MAX_BODY_BYTES + 1];
        let result = parse_json_body::<Payload, _>(json_request(oversized)).await;
        assert!(matches!(result, Err(CabinetError::BadRequest(_))));
    }

    #[tokio::test]
    async fn empty_body_parses_as_defaults() {
        let payload: Payload = parse_json_body(json_request("")).await.unwrap();
        assert!(payload.name.is_none());
    }

    #[tokio::test]
    async fn well_formed_body_parses() {
        let payload: Payload = parse_json_body(json_request(r#"{"name":"docs"}"#))
            .await
            .unwrap();
        assert_eq!(payload.name.as_deref(), Some("docs"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let result = parse_json_body::<Payload, _>(json_request("{not json")).await;
        assert!(matches!(result, Err(CabinetError::BadRequest(_))));
    }
}
