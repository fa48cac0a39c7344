use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A task bookmarked by a user. Unique per (user, task) pair.
#[derive(Debug, Serialize, FromRow)]
pub struct SavedTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A provider bookmarked by a user. Unique per (user, provider) pair.
#[derive(Debug, Serialize, FromRow)]
pub struct SavedProvider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub created_at: DateTime<Utc>,
}
