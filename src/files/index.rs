//! File hierarchy index
//!
//! Policy-agnostic metadata queries: the index always returns the raw
//! record if it exists; visibility decisions belong to the caller.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use std::sync::Mutex;

use crate::db::schemas::{FileDoc, Parent, FILE_COLLECTION};
use crate::db::MongoClient;
use crate::types::{CabinetError, Result};

/// Fixed page size for listings
pub const PAGE_SIZE: i64 = 20;

/// Store of file node metadata
#[async_trait]
pub trait FileIndex: Send + Sync {
    /// Insert one record and return its assigned id
    async fn insert(&self, doc: FileDoc) -> Result<ObjectId>;

    /// Fetch by id. Returns the raw record regardless of visibility.
    async fn get(&self, id: &ObjectId) -> Result<Option<FileDoc>>;

    /// Nodes owned by `owner` under `parent`, in insertion order, skipping
    /// `page * PAGE_SIZE` records. Out-of-range pages yield an empty list.
    async fn list(&self, owner: &ObjectId, parent: &Parent, page: u32) -> Result<Vec<FileDoc>>;

    /// Update exactly the isPublic field, returning the updated record
    async fn set_visibility(&self, id: &ObjectId, is_public: bool) -> Result<Option<FileDoc>>;

    async fn count(&self) -> Result<u64>;
}

/// MongoDB-backed file index
pub struct MongoFileIndex {
    collection: Collection<FileDoc>,
}

impl MongoFileIndex {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<FileDoc>(FILE_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl FileIndex for MongoFileIndex {
    async fn insert(&self, doc: FileDoc) -> Result<ObjectId> {
        let result = self.collection.insert_one(doc).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| CabinetError::Database("Failed to get inserted ID".into()))
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<FileDoc>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn list(&self, owner: &ObjectId, parent: &Parent, page: u32) -> Result<Vec<FileDoc>> {
        let parent_bson = bson::to_bson(parent)
            .map_err(|e| CabinetError::Database(format!("Invalid parent filter: {}", e)))?;

        let pipeline = vec![
            doc! { "$match": { "userId": owner, "parentId": parent_bson } },
            doc! { "$skip": i64::from(page) * PAGE_SIZE },
            doc! { "$limit": PAGE_SIZE },
        ];

        let cursor = self
            .collection
            .aggregate(pipeline)
            .with_type::<FileDoc>()
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn set_visibility(&self, id: &ObjectId, is_public: bool) -> Result<Option<FileDoc>> {
        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "isPublic": is_public } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

/// In-memory file index for tests and dev mode.
///
/// A Vec keeps insertion order, which the paginated listing relies on.
#[derive(Default)]
pub struct MemoryFileIndex {
    docs: Mutex<Vec<FileDoc>>,
}

impl MemoryFileIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileIndex for MemoryFileIndex {
    async fn insert(&self, mut doc: FileDoc) -> Result<ObjectId> {
        let id = ObjectId::new();
        doc._id = Some(id);
        self.docs.lock().expect("file index poisoned").push(doc);
        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<FileDoc>> {
        Ok(self
            .docs
            .lock()
            .expect("file index poisoned")
            .iter()
            .find(|d| d._id.as_ref() == Some(id))
            .cloned())
    }

    async fn list(&self, owner: &ObjectId, parent: &Parent, page: u32) -> Result<Vec<FileDoc>> {
        let skip = page as usize * PAGE_SIZE as usize;
        Ok(self
            .docs
            .lock()
            .expect("file index poisoned")
            .iter()
            .filter(|d| d.user_id == *owner && d.parent == *parent)
            .skip(skip)
            .take(PAGE_SIZE as usize)
            .cloned()
            .collect())
    }

    async fn set_visibility(&self, id: &ObjectId, is_public: bool) -> Result<Option<FileDoc>> {
        let mut docs = self.docs.lock().expect("file index poisoned");
        match docs.iter_mut().find(|d| d._id.as_ref() == Some(id)) {
            Some(doc) => {
                doc.is_public = is_public;
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.docs.lock().expect("file index poisoned").len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::FileKind;

    fn folder(owner: ObjectId, name: &str) -> FileDoc {
        FileDoc {
            _id: None,
            user_id: owner,
            name: name.to_string(),
            kind: FileKind::Folder,
            is_public: false,
            parent: Parent::Root,
            local_path: None,
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let index = MemoryFileIndex::new();
        let owner = ObjectId::new();

        let id = index.insert(folder(owner, "docs")).await.unwrap();
        let fetched = index.get(&id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "docs");
        assert_eq!(fetched.user_id, owner);
        assert!(fetched.local_path.is_none());
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let index = MemoryFileIndex::new();
        let owner = ObjectId::new();

        for i in 0..45 {
            index.insert(folder(owner, &format!("f{}", i))).await.unwrap();
        }

        let page0 = index.list(&owner, &Parent::Root, 0).await.unwrap();
        assert_eq!(page0.len(), 20);
        assert_eq!(page0[0].name, "f0");

        let page2 = index.list(&owner, &Parent::Root, 2).await.unwrap();
        assert_eq!(page2.len(), 5);
        assert_eq!(page2[0].name, "f40");

        // Past the end: empty, never an error
        assert!(index.list(&owner, &Parent::Root, 3).await.unwrap().is_empty());
        assert!(index.list(&owner, &Parent::Root, 1000).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner_and_parent() {
        let index = MemoryFileIndex::new();
        let alice = ObjectId::new();
        let bob = ObjectId::new();

        let docs_id = index.insert(folder(alice, "docs")).await.unwrap();
        let mut child = folder(alice, "inside");
        child.parent = Parent::Folder(docs_id);
        index.insert(child).await.unwrap();
        index.insert(folder(bob, "bobs")).await.unwrap();

        let at_root = index.list(&alice, &Parent::Root, 0).await.unwrap();
        assert_eq!(at_root.len(), 1);
        assert_eq!(at_root[0].name, "docs");

        let in_docs = index
            .list(&alice, &Parent::Folder(docs_id), 0)
            .await
            .unwrap();
        assert_eq!(in_docs.len(), 1);
        assert_eq!(in_docs[0].name, "inside");

        assert!(index.list(&bob, &Parent::Folder(docs_id), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_visibility_touches_only_that_field() {
        let index = MemoryFileIndex::new();
        let owner = ObjectId::new();
        let id = index.insert(folder(owner, "docs")).await.unwrap();

        let updated = index.set_visibility(&id, true).await.unwrap().unwrap();
        assert!(updated.is_public);
        assert_eq!(updated.name, "docs");
        assert_eq!(updated.user_id, owner);

        assert!(index
            .set_visibility(&ObjectId::new(), true)
            .await
            .unwrap()
            .is_none());
    }
}
