//! End-to-end scenarios against in-memory application state
//!
//! Walks the same flows a client would: register, sign in, create a
//! hierarchy, read content back, toggle visibility. Exercises the wiring
//! between sessions, user store, upload pipeline and blob store.

use std::sync::Arc;

use base64::Engine;
use bson::oid::ObjectId;
use tempfile::TempDir;

use cabinet::auth::BasicCredentials;
use cabinet::db::schemas::{FileKind, Parent};
use cabinet::files::{FileIndex, UploadRequest};
use cabinet::server::AppState;
use cabinet::types::CabinetError;
use cabinet::users::{register, verify_credentials};
use cabinet::Args;

fn test_args(storage_root: &TempDir) -> Args {
    Args {
        listen: "127.0.0.1:0".parse().unwrap(),
        mongodb_uri: "mongodb://localhost:27017".to_string(),
        mongodb_db: "files_manager_test".to_string(),
        folder_path: storage_root.path().to_path_buf(),
        session_ttl_secs: 86400,
        dev_mode: true,
        log_level: "info".to_string(),
    }
}

fn upload(name: &str, kind: &str, data: Option<&str>) -> UploadRequest {
    UploadRequest {
        name: Some(name.to_string()),
        kind: Some(kind.to_string()),
        data: data.map(|d| d.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn session_lifecycle() {
    let dir = TempDir::new().unwrap();
    let state = AppState::in_memory(test_args(&dir));

    let user = register(state.users.as_ref(), Some("bob@dylan.com"), Some("toto1234!"))
        .await
        .unwrap();
    let user_id = user._id.unwrap();

    // Wrong password yields no user, never an error
    let denied = verify_credentials(
        state.users.as_ref(),
        &BasicCredentials {
            email: "bob@dylan.com".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(denied.is_none());

    let verified = verify_credentials(
        state.users.as_ref(),
        &BasicCredentials {
            email: "bob@dylan.com".to_string(),
            password: "toto1234!".to_string(),
        },
    )
    .await
    .unwrap()
    .expect("valid credentials");
    assert_eq!(verified._id, Some(user_id));

    let token = state.sessions.issue(&user_id.to_hex()).await.unwrap();
    let resolved = state.sessions.resolve(&token).await.unwrap();
    assert_eq!(resolved.as_deref(), Some(user_id.to_hex().as_str()));

    state.sessions.revoke(&token).await.unwrap();
    assert!(state.sessions.resolve(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = AppState::in_memory(test_args(&dir));

    register(state.users.as_ref(), Some("bob@dylan.com"), Some("pw"))
        .await
        .unwrap();
    let err = register(state.users.as_ref(), Some("bob@dylan.com"), Some("other"))
        .await
        .unwrap_err();
    assert!(matches!(err, CabinetError::AlreadyExist));
}

#[tokio::test]
async fn folder_and_file_hierarchy() {
    let dir = TempDir::new().unwrap();
    let state = AppState::in_memory(test_args(&dir));
    let owner = ObjectId::new();

    let folder = state
        .uploads
        .create(owner, upload("images", "folder", None))
        .await
        .unwrap();
    assert_eq!(folder.kind, FileKind::Folder);
    assert_eq!(folder.parent_id, "0");

    let payload = base64::engine::general_purpose::STANDARD.encode("Hello Cabinet\n");
    let child = state
        .uploads
        .create(
            owner,
            UploadRequest {
                name: Some("hello.txt".to_string()),
                kind: Some("file".to_string()),
                parent_id: Some(serde_json::Value::String(folder.id.clone())),
                data: Some(payload),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(child.parent_id, folder.id);

    // Listing is scoped by owner and parent
    let root_nodes = state.files.list(&owner, &Parent::Root, 0).await.unwrap();
    assert_eq!(root_nodes.len(), 1);
    assert_eq!(root_nodes[0].name, "images");

    let folder_oid = ObjectId::parse_str(&folder.id).unwrap();
    let children = state
        .files
        .list(&owner, &Parent::Folder(folder_oid), 0)
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "hello.txt");

    // Stored content round-trips through the blob store
    let child_doc = state
        .files
        .get(&ObjectId::parse_str(&child.id).unwrap())
        .await
        .unwrap()
        .unwrap();
    let local_path = child_doc.local_path.as_deref().unwrap();
    let bytes = state.blobs.read(local_path).await.unwrap();
    assert_eq!(bytes, b"Hello Cabinet\n");
}

#[tokio::test]
async fn file_under_non_folder_parent_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = AppState::in_memory(test_args(&dir));
    let owner = ObjectId::new();

    let payload = base64::engine::general_purpose::STANDARD.encode("x");
    let file = state
        .uploads
        .create(owner, upload("a.txt", "file", Some(&payload)))
        .await
        .unwrap();

    let err = state
        .uploads
        .create(
            owner,
            UploadRequest {
                name: Some("b.txt".to_string()),
                kind: Some("file".to_string()),
                parent_id: Some(serde_json::Value::String(file.id)),
                data: Some(base64::engine::general_purpose::STANDARD.encode("y")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CabinetError::ParentNotAFolder));
}

#[tokio::test]
async fn visibility_toggle_and_read_policy() {
    let dir = TempDir::new().unwrap();
    let state = AppState::in_memory(test_args(&dir));
    let owner = ObjectId::new();
    let stranger = ObjectId::new();

    let payload = base64::engine::general_purpose::STANDARD.encode("secret");
    let node = state
        .uploads
        .create(owner, upload("secret.txt", "file", Some(&payload)))
        .await
        .unwrap();
    let id = ObjectId::parse_str(&node.id).unwrap();

    let doc = state.files.get(&id).await.unwrap().unwrap();
    assert!(!doc.is_public);
    assert!(cabinet::files::policy::can_read(&doc, Some(&owner)));
    assert!(!cabinet::files::policy::can_read(&doc, Some(&stranger)));
    assert!(!cabinet::files::policy::can_read(&doc, None));

    let published = state.files.set_visibility(&id, true).await.unwrap().unwrap();
    assert!(published.is_public);
    assert!(cabinet::files::policy::can_read(&published, None));

    let unpublished = state.files.set_visibility(&id, false).await.unwrap().unwrap();
    assert!(!unpublished.is_public);
}
