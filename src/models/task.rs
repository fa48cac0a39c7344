use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a posted job.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Posted and looking for a worker.
    Open,
    /// A worker has been engaged.
    Assigned,
    /// Work finished; the client may now leave a review.
    Completed,
    /// Withdrawn by the client.
    Cancelled,
}

/// Input structure for creating or updating a task posting.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 2000 characters if provided.
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(max = 100))]
    pub category: Option<String>,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    /// Free-form budget indication ("GHS 200", "negotiable", ...).
    #[validate(length(max = 50))]
    pub budget: Option<String>,

    /// Omitted on creation: new postings start `open`. On update, omitted
    /// keeps the current status.
    pub status: Option<TaskStatus>,

    /// The engaged worker, set when the client assigns someone.
    pub worker_id: Option<Uuid>,
}

/// A task posting as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub budget: String,
    pub status: TaskStatus,
    pub worker_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for filtering the caller's task list.
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    /// Case-insensitive search over title and description.
    pub search: Option<String>,
}

impl Task {
    /// Creates a new `Task` from input and the posting client's id.
    pub fn new(input: TaskInput, client_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            title: input.title,
            description: input.description.unwrap_or_default(),
            category: input.category.unwrap_or_default(),
            location: input.location.unwrap_or_default(),
            budget: input.budget.unwrap_or_default(),
            status: input.status.unwrap_or(TaskStatus::Open),
            worker_id: input.worker_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation_defaults() {
        let input = TaskInput {
            title: "Fix kitchen sink".to_string(),
            description: Some("Leaking tap".to_string()),
            category: None,
            location: Some("Osu, Accra".to_string()),
            budget: None,
            status: None,
            worker_id: None,
        };

        let client_id = Uuid::new_v4();
        let task = Task::new(input, client_id);
        assert_eq!(task.title, "Fix kitchen sink");
        assert_eq!(task.client_id, client_id);
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.category, "");
        assert!(task.worker_id.is_none());
    }

    #[test]
    fn test_task_input_validation() {
        let invalid_empty_title = TaskInput {
            title: "".to_string(),
            description: None,
            category: None,
            location: None,
            budget: None,
            status: None,
            worker_id: None,
        };
        assert!(invalid_empty_title.validate().is_err());

        let invalid_long_title = TaskInput {
            title: "a".repeat(201),
            description: None,
            category: None,
            location: None,
            budget: None,
            status: None,
            worker_id: None,
        };
        assert!(invalid_long_title.validate().is_err());

        let valid = TaskInput {
            title: "Paint bedroom walls".to_string(),
            description: Some("Two coats, white".to_string()),
            category: Some("painting".to_string()),
            location: None,
            budget: Some("GHS 300".to_string()),
            status: Some(TaskStatus::Open),
            worker_id: None,
        };
        assert!(valid.validate().is_ok());
    }
}
