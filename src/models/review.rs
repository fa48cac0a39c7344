use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input for leaving a review on a worker after a completed task.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewInput {
    pub worker_id: Uuid,
    pub task_id: Uuid,
    /// 1 to 5 stars.
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// A review as stored in the database. One per task.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub client_id: Uuid,
    pub task_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A review joined with the reviewing client's public details, as returned by
/// the public worker-reviews listing.
#[derive(Debug, Serialize, FromRow)]
pub struct WorkerReview {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub client_id: Uuid,
    pub task_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub client_email: String,
    pub client_profile_image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_input_validation() {
        let valid = ReviewInput {
            worker_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            rating: 5,
            comment: Some("Great work, on time".to_string()),
        };
        assert!(valid.validate().is_ok());

        let zero_rating = ReviewInput {
            worker_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            rating: 0,
            comment: None,
        };
        assert!(zero_rating.validate().is_err());

        let too_high = ReviewInput {
            worker_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            rating: 6,
            comment: None,
        };
        assert!(too_high.validate().is_err());
    }
}
