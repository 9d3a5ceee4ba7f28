//! User document schema
//!
//! Stores the registration email and the one-way password digest. The raw
//! password is never persisted.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Registration email, unique and case-sensitive as stored
    pub email: String,

    /// Argon2 password hash (PHC string)
    #[serde(rename = "password")]
    pub password_hash: String,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            _id: None,
            email,
            password_hash,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Unique index on email: backstop for the check-then-insert race
        // on registration.
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}
