use std::sync::Arc;

use crate::database::UserRepository;
use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::{Error, Result, EMAIL_EXISTS, EMAIL_IN_USE};
use crate::models::user::{parse_id, User};

/// Orchestrates the user operations on top of a [`UserRepository`].
///
/// Payloads arrive already validated; the email pre-check and the write that
/// follows are two separate round-trips.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub fn backend(&self) -> &'static str {
        self.repo.backend()
    }

    pub async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.repo.list_all().await
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        let id = parse_id(id).ok_or_else(Error::user_not_found)?;
        self.repo.get_by_id(id).await
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User> {
        if self.repo.exists_by_email(&payload.email, None).await? {
            tracing::debug!(email = %payload.email, "Rejected create: email taken");
            return Err(Error::Conflict(EMAIL_EXISTS.to_string()));
        }
        self.repo.create(payload).await
    }

    pub async fn update(&self, id: &str, payload: UpdateUserPayload) -> Result<User> {
        let oid = parse_id(id);

        if let Some(email) = &payload.email {
            if self.repo.exists_by_email(email, oid).await? {
                tracing::debug!(user_id = %id, "Rejected update: email in use");
                return Err(Error::Conflict(EMAIL_IN_USE.to_string()));
            }
        }

        let oid = oid.ok_or_else(Error::user_not_found)?;
        self.repo.update_partial(oid, payload).await
    }

    pub async fn delete(&self, id: &str) -> Result<User> {
        let id = parse_id(id).ok_or_else(Error::user_not_found)?;
        self.repo.delete(id).await
    }
}
