use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tokio::sync::RwLock;
use validator::Validate;

use crate::database::user_repository::UserRepository;
use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::{Error, Result, EMAIL_EXISTS, EMAIL_IN_USE};
use crate::models::user::{User, UserDocument};
use crate::utils::time;

/// Process-local user store for development (`USER_STORE=memory`) and tests.
/// Email uniqueness is re-checked under the write lock, mirroring the unique
/// index of the Mongo store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<ObjectId, UserDocument>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn email_taken(
    users: &HashMap<ObjectId, UserDocument>,
    email: &str,
    exclude_id: Option<ObjectId>,
) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != exclude_id)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut docs: Vec<&UserDocument> = users.values().collect();
        docs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(docs.into_iter().cloned().map(User::from).collect())
    }

    async fn get_by_id(&self, id: ObjectId) -> Result<User> {
        let users = self.users.read().await;
        users
            .get(&id)
            .cloned()
            .map(User::from)
            .ok_or_else(Error::user_not_found)
    }

    async fn exists_by_email(&self, email: &str, exclude_id: Option<ObjectId>) -> Result<bool> {
        let users = self.users.read().await;
        Ok(email_taken(&users, email, exclude_id))
    }

    async fn create(&self, fields: CreateUserPayload) -> Result<User> {
        fields.validate()?;
        let mut users = self.users.write().await;

        if email_taken(&users, &fields.email, None) {
            return Err(Error::Conflict(EMAIL_EXISTS.to_string()));
        }

        let doc = UserDocument::new(fields, time::now());
        users.insert(doc.id, doc.clone());

        tracing::info!(user_id = %doc.id, "Created user");
        Ok(User::from(doc))
    }

    async fn update_partial(&self, id: ObjectId, fields: UpdateUserPayload) -> Result<User> {
        fields.validate()?;
        let mut users = self.users.write().await;

        if let Some(email) = &fields.email {
            if email_taken(&users, email, Some(id)) {
                return Err(Error::Conflict(EMAIL_IN_USE.to_string()));
            }
        }

        let doc = users.get_mut(&id).ok_or_else(Error::user_not_found)?;
        doc.apply(fields, time::now());

        tracing::info!(user_id = %id, "Updated user");
        Ok(User::from(doc.clone()))
    }

    async fn delete(&self, id: ObjectId) -> Result<User> {
        let mut users = self.users.write().await;
        let removed = users.remove(&id).ok_or_else(Error::user_not_found)?;

        tracing::info!(user_id = %id, "Deleted user");
        Ok(User::from(removed))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, email: &str) -> CreateUserPayload {
        CreateUserPayload {
            name: name.into(),
            email: email.into(),
            age: None,
        }
    }

    fn oid(user: &User) -> ObjectId {
        ObjectId::parse_str(&user.id).unwrap()
    }

    #[tokio::test]
    async fn create_then_get_returns_same_record() {
        let repo = InMemoryUserRepository::new();
        let created = repo
            .create(CreateUserPayload {
                age: Some(30),
                ..payload("Jo", "a@b.com")
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id(oid(&created)).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = InMemoryUserRepository::new();
        let first = repo.create(payload("First", "1@b.com")).await.unwrap();
        let second = repo.create(payload("Second", "2@b.com")).await.unwrap();

        let listed = repo.list_all().await.unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let repo = InMemoryUserRepository::new();
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exists_by_email_honours_exclusion() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(payload("Jo", "a@b.com")).await.unwrap();

        assert!(repo.exists_by_email("a@b.com", None).await.unwrap());
        assert!(!repo
            .exists_by_email("a@b.com", Some(oid(&user)))
            .await
            .unwrap());
        assert!(!repo.exists_by_email("c@d.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_create_is_a_conflict() {
        let repo = InMemoryUserRepository::new();
        repo.create(payload("Jo", "a@b.com")).await.unwrap();

        let err = repo.create(payload("Al", "a@b.com")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_to_taken_email_reports_email_in_use() {
        let repo = InMemoryUserRepository::new();
        repo.create(payload("Jo", "a@b.com")).await.unwrap();
        let other = repo.create(payload("Al", "c@d.com")).await.unwrap();

        let err = repo
            .update_partial(
                oid(&other),
                UpdateUserPayload {
                    email: Some("a@b.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(ref msg) if msg == EMAIL_IN_USE));
        assert_eq!(repo.get_by_id(oid(&other)).await.unwrap().email, "c@d.com");
    }

    #[tokio::test]
    async fn update_rejects_invalid_fields_at_storage_layer() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(payload("Jo", "a@b.com")).await.unwrap();

        let err = repo
            .update_partial(
                oid(&user),
                UpdateUserPayload {
                    age: Some(200),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(repo.get_by_id(oid(&user)).await.unwrap().age, None);
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields_at_storage_layer() {
        let repo = InMemoryUserRepository::new();
        let err = repo.create(payload("J", "a@b.com")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let repo = InMemoryUserRepository::new();
        let id = ObjectId::new();

        assert!(matches!(repo.get_by_id(id).await, Err(Error::NotFound(_))));
        assert!(matches!(repo.delete(id).await, Err(Error::NotFound(_))));
        assert!(matches!(
            repo.update_partial(id, UpdateUserPayload::default()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_permanently() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(payload("Jo", "a@b.com")).await.unwrap();

        let removed = repo.delete(oid(&user)).await.unwrap();
        assert_eq!(removed, user);
        assert!(matches!(
            repo.get_by_id(oid(&user)).await,
            Err(Error::NotFound(_))
        ));
    }
}
