//! Upload pipeline
//!
//! Single ordered pass from request to stored node:
//! shape validation, parent validation, blob write, index insert. The blob
//! write happens strictly before the index insert: a disk failure may
//! orphan a blob (recoverable out of band) but never leaves the index
//! pointing at content that does not exist.

use std::sync::Arc;

use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::info;

use crate::db::schemas::{FileDoc, FileKind, FileNode, Parent};
use crate::files::index::FileIndex;
use crate::storage::{decode_payload, BlobStore};
use crate::types::{CabinetError, Result};

/// Request body for POST /files.
///
/// Untyped on the wire: every field is optional here and validated in
/// order, so each missing field yields its own error.
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "parentId")]
    pub parent_id: Option<serde_json::Value>,
    #[serde(rename = "isPublic", default)]
    pub is_public: bool,
    /// Base64-encoded content; required for files and images
    pub data: Option<String>,
}

/// Orchestrates validation, blob write and index insert for new nodes
pub struct UploadPipeline {
    index: Arc<dyn FileIndex>,
    blobs: Arc<BlobStore>,
}

impl UploadPipeline {
    pub fn new(index: Arc<dyn FileIndex>, blobs: Arc<BlobStore>) -> Self {
        Self { index, blobs }
    }

    /// Create a node for an already-authenticated owner.
    ///
    /// Validation order is fixed; the first failing check wins:
    /// name, kind, data presence, parent existence, parent kind,
    /// payload decodability.
    pub async fn create(&self, owner: ObjectId, request: UploadRequest) -> Result<FileNode> {
        let name = request
            .name
            .filter(|n| !n.is_empty())
            .ok_or(CabinetError::MissingName)?;

        // An unknown kind string and a missing one are the same failure
        let kind: FileKind = request
            .kind
            .ok_or(CabinetError::MissingType)?
            .parse()
            .map_err(|_| CabinetError::MissingType)?;

        let data = if kind.is_folder() {
            None
        } else {
            Some(request.data.ok_or(CabinetError::MissingData)?)
        };

        let parent = match request.parent_id {
            None => Parent::Root,
            Some(value) => Parent::parse(&value)?,
        };

        if let Some(parent_id) = parent.as_object_id() {
            let parent_doc = self
                .index
                .get(parent_id)
                .await?
                .ok_or(CabinetError::ParentNotFound)?;
            if !parent_doc.kind.is_folder() {
                return Err(CabinetError::ParentNotAFolder);
            }
        }

        // Materialize content before touching the index
        let local_path = match data {
            Some(encoded) => {
                let payload = decode_payload(&encoded)?;
                let path = self.blobs.write(&payload).await?;
                Some(path.to_string_lossy().into_owned())
            }
            None => None,
        };

        let mut doc = FileDoc {
            _id: None,
            user_id: owner,
            name,
            kind,
            is_public: request.is_public,
            parent,
            local_path,
        };

        let id = self.index.insert(doc.clone()).await?;
        doc._id = Some(id);

        info!(id = %id, kind = %doc.kind, name = %doc.name, "Created file node");
        Ok(FileNode::from(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::index::MemoryFileIndex;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use tempfile::TempDir;

    fn pipeline(temp_dir: &TempDir) -> (UploadPipeline, Arc<MemoryFileIndex>) {
        let index = Arc::new(MemoryFileIndex::new());
        let blobs = Arc::new(BlobStore::new(temp_dir.path()));
        (
            UploadPipeline::new(Arc::clone(&index) as Arc<dyn FileIndex>, blobs),
            index,
        )
    }

    fn folder_request(name: &str) -> UploadRequest {
        UploadRequest {
            name: Some(name.to_string()),
            kind: Some("folder".to_string()),
            ..Default::default()
        }
    }

    fn file_request(name: &str, payload: &[u8]) -> UploadRequest {
        UploadRequest {
            name: Some(name.to_string()),
            kind: Some("file".to_string()),
            data: Some(BASE64.encode(payload)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn folder_create_has_no_local_path() {
        let temp = TempDir::new().unwrap();
        let (pipeline, index) = pipeline(&temp);
        let owner = ObjectId::new();

        let node = pipeline.create(owner, folder_request("docs")).await.unwrap();
        assert_eq!(node.kind, FileKind::Folder);
        assert_eq!(node.parent_id, "0");

        let stored = index
            .get(&ObjectId::parse_str(&node.id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.local_path.is_none());
        assert_eq!(stored.name, "docs");
    }

    #[tokio::test]
    async fn file_content_round_trips_through_blob_store() {
        let temp = TempDir::new().unwrap();
        let (pipeline, index) = pipeline(&temp);
        let owner = ObjectId::new();

        let payload = b"Hello Cabinet";
        let node = pipeline
            .create(owner, file_request("hello.txt", payload))
            .await
            .unwrap();

        let stored = index
            .get(&ObjectId::parse_str(&node.id).unwrap())
            .await
            .unwrap()
            .unwrap();
        let local_path = stored.local_path.expect("file node must carry a blob path");
        assert_eq!(std::fs::read(&local_path).unwrap(), payload);
    }

    #[tokio::test]
    async fn shape_validation_fails_in_order() {
        let temp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&temp);
        let owner = ObjectId::new();

        let no_name = UploadRequest {
            kind: Some("file".into()),
            data: Some("aGk=".into()),
            ..Default::default()
        };
        assert!(matches!(
            pipeline.create(owner, no_name).await,
            Err(CabinetError::MissingName)
        ));

        let bad_kind = UploadRequest {
            name: Some("x".into()),
            kind: Some("symlink".into()),
            ..Default::default()
        };
        assert!(matches!(
            pipeline.create(owner, bad_kind).await,
            Err(CabinetError::MissingType)
        ));

        let no_data = UploadRequest {
            name: Some("x".into()),
            kind: Some("image".into()),
            ..Default::default()
        };
        assert!(matches!(
            pipeline.create(owner, no_data).await,
            Err(CabinetError::MissingData)
        ));
    }

    #[tokio::test]
    async fn parent_must_exist_and_be_a_folder() {
        let temp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&temp);
        let owner = ObjectId::new();

        let mut request = folder_request("child");
        request.parent_id = Some(serde_json::json!(ObjectId::new().to_hex()));
        assert!(matches!(
            pipeline.create(owner, request).await,
            Err(CabinetError::ParentNotFound)
        ));

        let file_node = pipeline
            .create(owner, file_request("a.txt", b"a"))
            .await
            .unwrap();
        let mut request = folder_request("child");
        request.parent_id = Some(serde_json::json!(file_node.id));
        assert!(matches!(
            pipeline.create(owner, request).await,
            Err(CabinetError::ParentNotAFolder)
        ));
    }

    #[tokio::test]
    async fn parent_may_belong_to_another_user() {
        let temp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&temp);
        let alice = ObjectId::new();
        let bob = ObjectId::new();

        let shared = pipeline.create(alice, folder_request("shared")).await.unwrap();

        let mut request = file_request("note.txt", b"hi");
        request.parent_id = Some(serde_json::json!(shared.id));
        let node = pipeline.create(bob, request).await.unwrap();

        assert_eq!(node.user_id, bob.to_hex());
        assert_eq!(node.parent_id, shared.id);
    }

    #[tokio::test]
    async fn undecodable_payload_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let (pipeline, index) = pipeline(&temp);
        let owner = ObjectId::new();

        let request = UploadRequest {
            name: Some("x".into()),
            kind: Some("file".into()),
            data: Some("!!not base64!!".into()),
            ..Default::default()
        };
        assert!(matches!(
            pipeline.create(owner, request).await,
            Err(CabinetError::InvalidData)
        ));

        // No metadata and no blob left behind
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(std::fs::read_dir(temp.path())
            .map(|mut d| d.next().is_none())
            .unwrap_or(true));
    }
}
