use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, Database, IndexModel,
};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::models::user::{UserDocument, USERS_COLLECTION};

const APP_NAME: &str = "user-crud-api";

/// Owned handle to the document store.
///
/// Connecting is deferred to the first [`MongoStore::acquire`] call and shared
/// by every caller afterwards. A failed attempt is not cached, so the next
/// request tries again.
#[derive(Debug)]
pub struct MongoStore {
    uri: String,
    database: String,
    db: OnceCell<Database>,
}

impl MongoStore {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            db: OnceCell::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.mongodb_uri.clone(), config.mongodb_database.clone())
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    #[cfg(test)]
    fn is_connected(&self) -> bool {
        self.db.initialized()
    }

    pub async fn acquire(&self) -> Result<&Database> {
        self.db.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<Database> {
        info!(database = %self.database, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(&self.uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(Duration::from_secs(10));
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        let db = client.database(&self.database);
        db.run_command(doc! { "ping": 1 }).await?;

        ensure_indexes(&db).await?;
        info!(database = %self.database, "MongoDB connection established");
        Ok(db)
    }
}

/// Backs the email pre-check with a unique index so concurrent writers that
/// both pass the check still cannot store the same address twice.
async fn ensure_indexes(db: &Database) -> Result<()> {
    let users = db.collection::<UserDocument>(USERS_COLLECTION);

    let email_unique = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(
            IndexOptions::builder()
                .name("email_unique".to_string())
                .unique(true)
                .build(),
        )
        .build();
    let created_at = IndexModel::builder()
        .keys(doc! { "createdAt": -1 })
        .build();

    users.create_indexes([email_unique, created_at]).await?;
    tracing::debug!(collection = USERS_COLLECTION, "Indexes ensured");
    Ok(())
}
