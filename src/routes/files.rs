//! File hierarchy endpoints
//!
//! Upload, metadata fetch, paginated listing, visibility toggles and raw
//! content delivery. Visibility failures surface as `Not found` so private
//! files are indistinguishable from absent ones.

use bson::oid::ObjectId;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{FileDoc, FileNode, Parent};
use crate::files::policy;
use crate::files::UploadRequest;
use crate::routes::{
    authenticate, authenticate_optional, full_body, json_response, parse_json_body, query_param,
    respond, BoxBody,
};
use crate::server::AppState;
use crate::types::{CabinetError, Result};

/// Extract the `:id` segment of a `/files/:id[/suffix]` path
pub fn path_file_id(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/files/")?;
    let id = rest.split('/').next()?;
    (!id.is_empty()).then_some(id)
}

/// Extract the `:id` of a bare `/files/:id` path. Any trailing segment
/// means this is not the metadata route.
pub fn path_exact_file_id(path: &str) -> Option<&str> {
    let id = path.strip_prefix("/files/")?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

fn parse_file_id(id: &str) -> Result<ObjectId> {
    // An unparsable id cannot name any existing node
    ObjectId::parse_str(id).map_err(|_| CabinetError::NotFound)
}

/// POST /files - create a folder, file or image
pub async fn handle_upload(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    respond(post_upload(req, state).await)
}

async fn post_upload(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    // Auth first: no validation runs for unauthenticated callers
    let caller = authenticate(&state, &req).await?;

    let body: UploadRequest = parse_json_body(req).await?;
    let node = state.uploads.create(caller, body).await?;

    Ok(json_response(StatusCode::CREATED, &node))
}

/// GET /files/:id - file node metadata
pub async fn handle_show(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    respond(get_show(req, state, id).await)
}

async fn get_show(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate_optional(&state, &req).await?;

    let node = fetch_readable(&state, id, caller.as_ref()).await?;
    Ok(json_response(StatusCode::OK, &FileNode::from(&node)))
}

/// GET /files?parentId=&page= - paginated listing of the caller's nodes
pub async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    respond(get_index(req, state).await)
}

async fn get_index(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&state, &req).await?;

    let parent = match query_param(&req, "parentId") {
        None => Parent::Root,
        Some(raw) => Parent::parse(&serde_json::Value::String(raw))
            // A parent that cannot exist simply matches nothing
            .unwrap_or(Parent::Folder(ObjectId::new())),
    };
    let page: u32 = query_param(&req, "page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);

    let nodes = state.files.list(&caller, &parent, page).await?;
    let body: Vec<FileNode> = nodes.iter().map(FileNode::from).collect();

    Ok(json_response(StatusCode::OK, &body))
}

/// PUT /files/:id/publish and /files/:id/unpublish
pub async fn handle_publish(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
    is_public: bool,
) -> Response<BoxBody> {
    respond(put_publish(req, state, id, is_public).await)
}

async fn put_publish(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
    is_public: bool,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(&state, &req).await?;
    let file_id = parse_file_id(id)?;

    let node = state
        .files
        .get(&file_id)
        .await?
        .ok_or(CabinetError::NotFound)?;
    if !policy::can_modify(&node, &caller) {
        // Non-owners learn nothing about the node's existence
        return Err(CabinetError::NotFound);
    }

    let updated = state
        .files
        .set_visibility(&file_id, is_public)
        .await?
        .ok_or(CabinetError::NotFound)?;

    info!(id = %file_id, is_public, "Visibility updated");
    Ok(json_response(StatusCode::OK, &FileNode::from(&updated)))
}

/// GET /files/:id/data - raw content with inferred content type
pub async fn handle_data(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    respond(get_data(req, state, id).await)
}

async fn get_data(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    // Content delivery is purely visibility-gated: an invalid token is
    // treated as an anonymous caller, not rejected.
    let caller = authenticate_optional(&state, &req).await.ok().flatten();

    let node = fetch_readable(&state, id, caller.as_ref()).await?;

    if node.kind.is_folder() {
        return Err(CabinetError::FolderHasNoContent);
    }
    let local_path = node.local_path.as_deref().ok_or(CabinetError::NotFound)?;
    let bytes = state.blobs.read(local_path).await?;

    let content_type = mime_guess::from_path(&node.name).first_or_octet_stream();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type.essence_str())
        .body(full_body(bytes))
        .unwrap_or_else(|_| Response::new(full_body(Vec::new()))))
}

/// Fetch a node and apply the read-visibility rule. Absence and denied
/// access are the same `NotFound`.
async fn fetch_readable(
    state: &Arc<AppState>,
    id: &str,
    caller: Option<&ObjectId>,
) -> Result<FileDoc> {
    let file_id = parse_file_id(id)?;

    let node = state
        .files
        .get(&file_id)
        .await?
        .ok_or(CabinetError::NotFound)?;

    if !policy::can_read(&node, caller) {
        return Err(CabinetError::NotFound);
    }
    Ok(node)
}
