//! Service status and statistics endpoints

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::{json_response, respond, BoxBody};
use crate::server::AppState;
use crate::types::Result;

#[derive(Serialize)]
struct StatusResponse {
    /// Session store liveness (named for the Redis role it plays)
    redis: bool,
    db: bool,
}

#[derive(Serialize)]
struct StatsResponse {
    users: u64,
    files: u64,
}

/// GET /status - liveness of the session store and the document store
pub async fn handle_status(state: Arc<AppState>) -> Response<BoxBody> {
    let db = match &state.mongo {
        Some(mongo) => mongo.is_alive().await,
        // Dev mode runs on in-memory stores
        None => true,
    };

    json_response(
        StatusCode::OK,
        &StatusResponse {
            redis: state.sessions.is_alive(),
            db,
        },
    )
}

/// GET /stats - user and file counts
pub async fn handle_stats(state: Arc<AppState>) -> Response<BoxBody> {
    respond(stats(state).await)
}

async fn stats(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let users = state.users.count().await?;
    let files = state.files.count().await?;

    Ok(json_response(StatusCode::OK, &StatsResponse { users, files }))
}
