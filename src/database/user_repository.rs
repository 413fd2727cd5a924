use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::ReturnDocument,
    Collection,
};
use validator::Validate;

use crate::database::store::MongoStore;
use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::{Error, Result, EMAIL_IN_USE};
use crate::models::user::{User, UserDocument, USERS_COLLECTION};
use crate::utils::time;

/// Persistence for users. `get_by_id`, `update_partial` and `delete` report a
/// missing document as [`Error::NotFound`]; infrastructure failures surface as
/// [`Error::Database`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Newest first.
    async fn list_all(&self) -> Result<Vec<User>>;

    async fn get_by_id(&self, id: ObjectId) -> Result<User>;

    /// `email` must already be normalized.
    async fn exists_by_email(&self, email: &str, exclude_id: Option<ObjectId>) -> Result<bool>;

    async fn create(&self, fields: CreateUserPayload) -> Result<User>;

    async fn update_partial(&self, id: ObjectId, fields: UpdateUserPayload) -> Result<User>;

    async fn delete(&self, id: ObjectId) -> Result<User>;

    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct MongoUserRepository {
    store: Arc<MongoStore>,
}

impl MongoUserRepository {
    pub fn new(store: Arc<MongoStore>) -> Self {
        Self { store }
    }

    async fn collection(&self) -> Result<Collection<UserDocument>> {
        let db = self.store.acquire().await?;
        Ok(db.collection::<UserDocument>(USERS_COLLECTION))
    }
}

fn email_filter(email: &str, exclude_id: Option<ObjectId>) -> Document {
    let mut filter = doc! { "email": email };
    if let Some(id) = exclude_id {
        filter.insert("_id", doc! { "$ne": id });
    }
    filter
}

fn set_document(fields: &UpdateUserPayload) -> Document {
    let mut set = doc! { "updatedAt": bson::DateTime::from_chrono(time::now()) };
    if let Some(name) = &fields.name {
        set.insert("name", name.as_str());
    }
    if let Some(email) = &fields.email {
        set.insert("email", email.as_str());
    }
    if let Some(age) = fields.age {
        set.insert("age", age);
    }
    set
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn list_all(&self) -> Result<Vec<User>> {
        let users = self.collection().await?;
        let docs: Vec<UserDocument> = users
            .find(doc! {})
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(User::from).collect())
    }

    async fn get_by_id(&self, id: ObjectId) -> Result<User> {
        let users = self.collection().await?;
        users
            .find_one(doc! { "_id": id })
            .await?
            .map(User::from)
            .ok_or_else(Error::user_not_found)
    }

    async fn exists_by_email(&self, email: &str, exclude_id: Option<ObjectId>) -> Result<bool> {
        let users = self.collection().await?;
        let found = users.find_one(email_filter(email, exclude_id)).await?;
        Ok(found.is_some())
    }

    async fn create(&self, fields: CreateUserPayload) -> Result<User> {
        fields.validate()?;
        let users = self.collection().await?;

        let doc = UserDocument::new(fields, time::now());
        users.insert_one(&doc).await?;

        tracing::info!(user_id = %doc.id, "Created user");
        Ok(User::from(doc))
    }

    async fn update_partial(&self, id: ObjectId, fields: UpdateUserPayload) -> Result<User> {
        fields.validate()?;
        let users = self.collection().await?;

        let updated = users
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set_document(&fields) })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|err| match Error::from(err) {
                Error::Conflict(_) => Error::Conflict(EMAIL_IN_USE.to_string()),
                other => other,
            })?
            .ok_or_else(Error::user_not_found)?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(User::from(updated))
    }

    async fn delete(&self, id: ObjectId) -> Result<User> {
        let users = self.collection().await?;
        let removed = users
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .ok_or_else(Error::user_not_found)?;

        tracing::info!(user_id = %id, "Deleted user");
        Ok(User::from(removed))
    }

    async fn ping(&self) -> Result<()> {
        let db = self.store.acquire().await?;
        db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_filter_excludes_own_id() {
        let id = ObjectId::new();
        let filter = email_filter("a@b.com", Some(id));
        assert_eq!(filter, doc! { "email": "a@b.com", "_id": { "$ne": id } });
        assert_eq!(email_filter("a@b.com", None), doc! { "email": "a@b.com" });
    }

    #[test]
    fn set_document_only_touches_supplied_fields() {
        let set = set_document(&UpdateUserPayload {
            age: Some(31),
            ..Default::default()
        });
        assert!(set.contains_key("updatedAt"));
        assert_eq!(set.get_i64("age").unwrap(), 31);
        assert!(!set.contains_key("name"));
        assert!(!set.contains_key("email"));
    }

    fn live_repository() -> MongoUserRepository {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        MongoUserRepository::new(Arc::new(MongoStore::new(uri, "user_crud_test")))
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn create_then_get_round_trips() {
        let repo = live_repository();
        let email = format!("round-trip-{}@example.com", ObjectId::new().to_hex());

        let created = repo
            .create(CreateUserPayload {
                name: "Jo".into(),
                email: email.clone(),
                age: Some(30),
            })
            .await
            .unwrap();
        let fetched = repo
            .get_by_id(ObjectId::parse_str(&created.id).unwrap())
            .await
            .unwrap();
        assert_eq!(created, fetched);

        repo.delete(ObjectId::parse_str(&created.id).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn unique_index_turns_duplicates_into_conflicts() {
        let repo = live_repository();
        let email = format!("dup-{}@example.com", ObjectId::new().to_hex());
        let payload = CreateUserPayload {
            name: "Jo".into(),
            email,
            age: None,
        };

        let first = repo.create(payload.clone()).await.unwrap();
        let second = repo.create(payload).await;
        assert!(matches!(second, Err(Error::Conflict(_))));

        repo.delete(ObjectId::parse_str(&first.id).unwrap())
            .await
            .unwrap();
    }
}
