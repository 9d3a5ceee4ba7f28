//! File document schema
//!
//! One document per node of the hierarchy: folders, files and images.
//! Files and images carry a `localPath` pointing at their blob on disk;
//! folders never do.

use std::fmt;
use std::str::FromStr;

use bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::mongo::IntoIndexes;
use crate::types::CabinetError;

/// Collection name for file nodes
pub const FILE_COLLECTION: &str = "files";

/// Node kind: a folder, an opaque file, or an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    File,
    Image,
}

impl FileKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, FileKind::Folder)
    }
}

impl FromStr for FileKind {
    type Err = CabinetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(FileKind::Folder),
            "file" => Ok(FileKind::File),
            "image" => Ok(FileKind::Image),
            _ => Err(CabinetError::MissingType),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Folder => "folder",
            FileKind::File => "file",
            FileKind::Image => "image",
        };
        f.write_str(s)
    }
}

/// Parent reference of a file node.
///
/// `Root` is the sentinel meaning "no parent folder". It is stored as the
/// int32 `0`; legacy documents that stored the string `"0"` are accepted on
/// read. Everything else must be the ObjectId of a folder node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Root,
    Folder(ObjectId),
}

impl Parent {
    pub fn is_root(&self) -> bool {
        matches!(self, Parent::Root)
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Parent::Root => None,
            Parent::Folder(oid) => Some(oid),
        }
    }

    /// API-facing representation: `"0"` for root, hex id otherwise
    pub fn to_api_string(&self) -> String {
        match self {
            Parent::Root => "0".to_string(),
            Parent::Folder(oid) => oid.to_hex(),
        }
    }

    /// Parse a request-supplied parentId: the number `0`, the string `"0"`,
    /// or a hex ObjectId. An id that cannot parse cannot reference any
    /// existing node, so it surfaces as `ParentNotFound`.
    pub fn parse(value: &serde_json::Value) -> Result<Self, CabinetError> {
        match value {
            serde_json::Value::Null => Ok(Parent::Root),
            serde_json::Value::Number(n) if n.as_i64() == Some(0) => Ok(Parent::Root),
            serde_json::Value::String(s) if s == "0" => Ok(Parent::Root),
            serde_json::Value::String(s) => ObjectId::parse_str(s)
                .map(Parent::Folder)
                .map_err(|_| CabinetError::ParentNotFound),
            _ => Err(CabinetError::ParentNotFound),
        }
    }
}

impl Serialize for Parent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Parent::Root => serializer.serialize_i32(0),
            Parent::Folder(oid) => oid.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Parent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bson = Bson::deserialize(deserializer)?;
        match bson {
            Bson::Int32(0) | Bson::Int64(0) => Ok(Parent::Root),
            Bson::String(ref s) if s == "0" => Ok(Parent::Root),
            Bson::ObjectId(oid) => Ok(Parent::Folder(oid)),
            Bson::String(s) => ObjectId::parse_str(&s)
                .map(Parent::Folder)
                .map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "invalid parent reference: {}",
                other
            ))),
        }
    }
}

/// File node document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Owner of the node, immutable after creation
    #[serde(rename = "userId")]
    pub user_id: ObjectId,

    /// Display name, non-empty
    pub name: String,

    /// Node kind
    #[serde(rename = "type")]
    pub kind: FileKind,

    /// Whether non-owners may read this node
    #[serde(rename = "isPublic", default)]
    pub is_public: bool,

    /// Parent folder, or the root sentinel
    #[serde(rename = "parentId")]
    pub parent: Parent,

    /// Blob location on disk; present iff the node is not a folder
    #[serde(rename = "localPath", skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl IntoIndexes for FileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Compound index backing the owner+parent paginated listing
        vec![(
            doc! { "userId": 1, "parentId": 1 },
            Some(
                IndexOptions::builder()
                    .name("owner_parent_index".to_string())
                    .build(),
            ),
        )]
    }
}

/// API-facing view of a file node.
///
/// The on-disk `localPath` stays server-side; everything else is returned
/// verbatim with string ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub is_public: bool,
    pub parent_id: String,
}

impl From<&FileDoc> for FileNode {
    fn from(doc: &FileDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doc.user_id.to_hex(),
            name: doc.name.clone(),
            kind: doc.kind,
            is_public: doc.is_public,
            parent_id: doc.parent.to_api_string(),
        }
    }
}
