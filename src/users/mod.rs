//! User accounts: registration and credential lookup
//!
//! The store is an injected collaborator so the credential logic runs the
//! same against MongoDB or the in-memory implementation used in tests and
//! dev mode.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use dashmap::DashMap;
use mongodb::Collection;
use tracing::info;

use crate::auth::{hash_password, verify_password, BasicCredentials};
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::MongoClient;
use crate::types::{CabinetError, Result};

/// Persistent store of user records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserDoc>>;

    async fn insert(&self, user: UserDoc) -> Result<ObjectId>;

    async fn count(&self) -> Result<u64>;
}

/// MongoDB-backed user store
pub struct MongoUserStore {
    collection: Collection<UserDoc>,
}

impl MongoUserStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<UserDoc>(USER_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, user: UserDoc) -> Result<ObjectId> {
        // The unique email index turns the registration check-then-insert
        // race into a duplicate-key error here; report it as the same
        // duplicate the pre-check would have caught.
        let result = self.collection.insert_one(user).await.map_err(|e| {
            if is_duplicate_key_error(&e) {
                CabinetError::AlreadyExist
            } else {
                e.into()
            }
        })?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| CabinetError::Database("Failed to get inserted ID".into()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

/// MongoDB duplicate-key write failures carry code 11000
fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we))
            if we.code == 11000
    )
}

/// In-memory user store for tests and dev mode
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<ObjectId, UserDoc>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, mut user: UserDoc) -> Result<ObjectId> {
        // Mirror the unique email index of the MongoDB store
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(CabinetError::AlreadyExist);
        }
        let id = ObjectId::new();
        user._id = Some(id);
        self.users.insert(id, user);
        Ok(id)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.len() as u64)
    }
}

/// Register a new user.
///
/// Check-then-insert: the duplicate check admits a narrow race under
/// concurrent registration; the unique index on `email` is the backstop.
pub async fn register(
    store: &dyn UserStore,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<UserDoc> {
    let email = match email {
        Some(e) if !e.is_empty() => e,
        _ => return Err(CabinetError::MissingEmail),
    };
    let password = match password {
        Some(p) if !p.is_empty() => p,
        _ => return Err(CabinetError::MissingPassword),
    };

    if store.find_by_email(email).await?.is_some() {
        return Err(CabinetError::AlreadyExist);
    }

    let mut user = UserDoc::new(email.to_string(), hash_password(password)?);
    let id = store.insert(user.clone()).await?;
    user._id = Some(id);

    info!(email = %user.email, "Registered user");
    Ok(user)
}

/// Verify basic credentials against the store.
///
/// Unknown email and wrong password are indistinguishable from the caller's
/// point of view: both yield `None`.
pub async fn verify_credentials(
    store: &dyn UserStore,
    credentials: &BasicCredentials,
) -> Result<Option<UserDoc>> {
    let user = match store.find_by_email(&credentials.email).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    if verify_password(&credentials.password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
