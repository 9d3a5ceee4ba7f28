//! Session creation and teardown
//!
//! GET /connect trades Basic credentials for a token; GET /disconnect
//! revokes the token. Every credential failure collapses to the same
//! generic `Unauthorized`.

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::parse_basic_header;
use crate::routes::{
    empty_body, get_header, json_response, respond, BoxBody, TOKEN_HEADER,
};
use crate::server::AppState;
use crate::types::{CabinetError, Result};
use crate::users::verify_credentials;

#[derive(Serialize)]
struct ConnectResponse {
    token: String,
}

/// GET /connect - authenticate with Basic credentials, issue a session token
pub async fn handle_connect(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    respond(connect(req, state).await)
}

async fn connect(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let credentials = get_header(&req, "Authorization")
        .and_then(parse_basic_header)
        .ok_or(CabinetError::Unauthorized)?;

    let user = verify_credentials(state.users.as_ref(), &credentials)
        .await?
        .ok_or(CabinetError::Unauthorized)?;

    let user_id = user._id.ok_or(CabinetError::Unauthorized)?;
    let token = state.sessions.issue(&user_id.to_hex()).await?;

    info!(user = %user_id, "Session created");
    Ok(json_response(StatusCode::OK, &ConnectResponse { token }))
}

/// GET /disconnect - revoke the caller's session token
pub async fn handle_disconnect(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    respond(disconnect(req, state).await)
}

async fn disconnect(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let token = get_header(&req, TOKEN_HEADER).ok_or(CabinetError::Unauthorized)?;

    // The token must resolve before it can be ended; revocation itself
    // is idempotent.
    state
        .sessions
        .resolve(token)
        .await?
        .ok_or(CabinetError::Unauthorized)?;
    state.sessions.revoke(token).await?;

    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap_or_else(|_| Response::new(empty_body())))
}
