//! User registration and identity endpoints

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::routes::{authenticate, json_response, parse_json_body, respond, BoxBody};
use crate::server::AppState;
use crate::types::{CabinetError, Result};
use crate::users::register;

#[derive(Debug, Default, Deserialize)]
struct RegisterRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct UserResponse {
    id: String,
    email: String,
}

/// POST /users - register a new user
pub async fn handle_register(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    respond(post_new(req, state).await)
}

async fn post_new(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let body: RegisterRequest = parse_json_body(req).await?;

    let user = register(
        state.users.as_ref(),
        body.email.as_deref(),
        body.password.as_deref(),
    )
    .await?;

    let id = user
        ._id
        .ok_or_else(|| CabinetError::Internal("Inserted user has no id".into()))?;

    Ok(json_response(
        StatusCode::CREATED,
        &UserResponse {
            id: id.to_hex(),
            email: user.email,
        },
    ))
}

/// GET /users/me - the currently authenticated user
pub async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    respond(get_me(req, state).await)
}

async fn get_me(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&state, &req).await?;

    // A session whose user record is gone is no longer a valid identity
    let user = state
        .users
        .find_by_id(&caller)
        .await?
        .ok_or(CabinetError::Unauthorized)?;

    Ok(json_response(
        StatusCode::OK,
        &UserResponse {
            id: caller.to_hex(),
            email: user.email,
        },
    ))
}
