//! MongoDB persistence for users, sessions and tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{Session, Token, User};
use crate::services::store::{SessionRepository, StoreHealth, TokenRepository, UserRepository};
use crate::services::ServiceError;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);

        // The driver connects lazily; ping so an unreachable server fails startup.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB did not answer ping: {}", e);
                AppError::from(e)
            })?;

        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for auth-service");

        let mail_index = IndexModel::builder()
            .keys(doc! { "mail": 1 })
            .options(
                IndexOptions::builder()
                    .name("mail_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users()
            .create_index(mail_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create mail index on users collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on users.mail");

        let session_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_user_lookup".to_string())
                    .build(),
            )
            .build();
        let session_age_index = IndexModel::builder()
            .keys(doc! { "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_created_at".to_string())
                    .build(),
            )
            .build();
        self.sessions()
            .create_indexes(vec![session_user_index, session_age_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on sessions collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on sessions.user_id and sessions.created_at");

        let token_expiry_index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("token_expires_at".to_string())
                    .build(),
            )
            .build();
        self.tokens()
            .create_index(token_expiry_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create expires_at index on tokens collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on tokens.expires_at");

        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn sessions(&self) -> Collection<Session> {
        self.db.collection("sessions")
    }

    pub fn tokens(&self) -> Collection<Token> {
        self.db.collection("tokens")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn user_write_error(err: mongodb::error::Error) -> ServiceError {
    if is_duplicate_key(&err) {
        ServiceError::conflict("mail", "already registered")
    } else {
        tracing::error!(error = %err, "User write failed");
        ServiceError::from(err)
    }
}

#[async_trait]
impl UserRepository for MongoDb {
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(user_write_error)?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_mail(&self, mail: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "mail": mail }, None).await?)
    }

    async fn replace_user(&self, user: &User) -> Result<bool, ServiceError> {
        let result = self
            .users()
            .replace_one(doc! { "_id": &user.id }, user, None)
            .await
            .map_err(user_write_error)?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self.users().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let cursor = self.users().find(doc! {}, None).await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users)
    }
}

#[async_trait]
impl SessionRepository for MongoDb {
    async fn insert_session(&self, session: &Session) -> Result<(), ServiceError> {
        self.sessions().insert_one(session, None).await?;
        Ok(())
    }

    async fn find_session(&self, id: &str) -> Result<Option<Session>, ServiceError> {
        Ok(self.sessions().find_one(doc! { "_id": id }, None).await?)
    }

    async fn delete_session(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self.sessions().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64, ServiceError> {
        let result = self
            .sessions()
            .delete_many(doc! { "user_id": user_id }, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn delete_sessions_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = self
            .sessions()
            .delete_many(
                doc! { "created_at": { "$lt": BsonDateTime::from_chrono(cutoff) } },
                None,
            )
            .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl TokenRepository for MongoDb {
    async fn insert_token(&self, token: &Token) -> Result<(), ServiceError> {
        self.tokens().insert_one(token, None).await?;
        Ok(())
    }

    async fn take_token(&self, id: &str) -> Result<Option<Token>, ServiceError> {
        Ok(self
            .tokens()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }

    async fn delete_tokens_expired_at(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let result = self
            .tokens()
            .delete_many(
                doc! { "expires_at": { "$lte": BsonDateTime::from_chrono(now) } },
                None,
            )
            .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl StoreHealth for MongoDb {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::from(e)
            })?;
        Ok(())
    }
}
