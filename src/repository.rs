use crate::models::{
    NewUser, Notification, NotificationRow, ROLE_MEMBER, UpdateUserRequest, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Failures surfaced by write operations. Reads log and degrade instead.
#[derive(Debug, Error, PartialEq)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict("email is already registered".to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers and the
/// `AuthUser` extractor only ever see `Arc<dyn Repository>`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> Vec<User>;
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Looked up by normalized (lower-cased) email during log-in.
    async fn get_credentials(&self, email: &str) -> Option<UserCredentials>;
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    // Partial update; `Ok(None)` when the user does not exist.
    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError>;

    // --- Notifications ---
    // Newest first, recipient only.
    async fn get_notifications(&self, user_id: Uuid) -> Vec<Notification>;
    // Ownership enforced: false when the notification is missing or not the caller's.
    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> bool;
}

pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation backed by a `PgPool`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, avatar, preferred_locale, role, created_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_users(&self) -> Vec<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name ASC");
        sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            })
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn get_credentials(&self, email: &str) -> Option<UserCredentials> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_credentials error: {:?}", e);
            None
        })
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, preferred_locale, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.preferred_locale)
            .bind(ROLE_MEMBER)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// Uses `COALESCE` so only the provided fields change.
    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError> {
        let query = format!(
            "UPDATE users \
             SET name = COALESCE($2, name), \
                 avatar = COALESCE($3, avatar), \
                 preferred_locale = COALESCE($4, preferred_locale) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(req.name)
            .bind(req.avatar)
            .bind(req.preferred_locale)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn get_notifications(&self, user_id: Uuid) -> Vec<Notification> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, actor_id, text, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch notifications: {:?}", e);
            vec![]
        });

        rows.into_iter()
            .filter_map(|row| {
                let id = row.id;
                Notification::try_from(row)
                    .map_err(|e| tracing::error!(notification_id = %id, "{}", e))
                    .ok()
            })
            .collect()
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> bool {
        let result =
            sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(&self.pool)
                .await;

        match result {
            Ok(r) => r.rows_affected() > 0,
            Err(e) => {
                tracing::error!("Failed to mark notification read: {:?}", e);
                false
            }
        }
    }
}

/// InMemoryRepository
///
/// A `Repository` held entirely in memory. Backs the router and auth tests so
/// they run without a Postgres instance.
#[derive(Default)]
pub struct InMemoryRepository {
    data: RwLock<InMemoryData>,
}

#[derive(Default)]
struct InMemoryData {
    users: Vec<(User, String)>,
    // (recipient, notification)
    notifications: Vec<(Uuid, Notification)>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user directly, bypassing sign-up. Returns the stored record.
    pub async fn insert_user(&self, user: User, password_hash: String) -> User {
        let mut data = self.data.write().await;
        data.users.push((user.clone(), password_hash));
        user
    }

    pub async fn push_notification(&self, recipient: Uuid, notification: Notification) {
        self.data
            .write()
            .await
            .notifications
            .push((recipient, notification));
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .data
            .read()
            .await
            .users
            .iter()
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.data
            .read()
            .await
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone())
    }

    async fn get_credentials(&self, email: &str) -> Option<UserCredentials> {
        self.data
            .read()
            .await
            .users
            .iter()
            .find(|(user, _)| user.email == email)
            .map(|(user, hash)| UserCredentials {
                id: user.id,
                password_hash: hash.clone(),
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;
        if data.users.iter().any(|(user, _)| user.email == new_user.email) {
            return Err(RepositoryError::Conflict(
                "email is already registered".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            avatar: None,
            preferred_locale: new_user.preferred_locale,
            role: ROLE_MEMBER.to_string(),
            created_at: Utc::now(),
        };
        data.users.push((user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError> {
        let mut data = self.data.write().await;
        let Some((user, _)) = data.users.iter_mut().find(|(user, _)| user.id == id) else {
            return Ok(None);
        };

        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(avatar) = req.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(locale) = req.preferred_locale {
            user.preferred_locale = locale;
        }
        Ok(Some(user.clone()))
    }

    async fn get_notifications(&self, user_id: Uuid) -> Vec<Notification> {
        let mut notifications: Vec<Notification> = self
            .data
            .read()
            .await
            .notifications
            .iter()
            .filter(|(recipient, _)| *recipient == user_id)
            .map(|(_, notification)| notification.clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> bool {
        let mut data = self.data.write().await;
        match data
            .notifications
            .iter_mut()
            .find(|(recipient, n)| n.id == notification_id && *recipient == user_id)
        {
            Some((_, notification)) => {
                notification.is_read = true;
                true
            }
            None => false,
        }
    }
}
