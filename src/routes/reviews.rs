use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Review, ReviewInput, TaskStatus, WorkerReview},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Leave a review for a worker
///
/// Only the client of a completed task involving that worker may review, and
/// only once per task. Creating the review recomputes the worker's rating
/// aggregate.
#[post("")]
pub async fn create_review(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    data: web::Json<ReviewInput>,
) -> Result<impl Responder, AppError> {
    data.validate()?;

    let task: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM tasks WHERE id = $1 AND client_id = $2 AND worker_id = $3 AND status = $4",
    )
    .bind(data.task_id)
    .bind(auth.id)
    .bind(data.worker_id)
    .bind(TaskStatus::Completed)
    .fetch_optional(&**pool)
    .await?;

    if task.is_none() {
        return Err(AppError::Forbidden("You cannot review this worker".into()));
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM reviews WHERE task_id = $1")
        .bind(data.task_id)
        .fetch_optional(&**pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "You already reviewed this worker".into(),
        ));
    }

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, worker_id, client_id, task_id, rating, comment)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(data.worker_id)
    .bind(auth.id)
    .bind(data.task_id)
    .bind(data.rating)
    .bind(data.comment.clone().unwrap_or_default())
    .fetch_one(&**pool)
    .await?;

    let (average, count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating)::DOUBLE PRECISION, COUNT(*) FROM reviews WHERE worker_id = $1",
    )
    .bind(data.worker_id)
    .fetch_one(&**pool)
    .await?;

    sqlx::query(
        "UPDATE users SET average_rating = $1, reviews_count = $2, updated_at = now() WHERE id = $3",
    )
    .bind(average.unwrap_or(0.0))
    .bind(count as i32)
    .bind(data.worker_id)
    .execute(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Review added",
        "review": review,
    })))
}

/// Public list of a worker's reviews, newest first, with the reviewing
/// client's public details.
#[get("/worker/{worker_id}")]
pub async fn worker_reviews(
    pool: web::Data<PgPool>,
    worker_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let reviews = sqlx::query_as::<_, WorkerReview>(
        "SELECT r.id, r.worker_id, r.client_id, r.task_id, r.rating, r.comment, r.created_at,
                u.email AS client_email, u.profile_image AS client_profile_image
         FROM reviews r
         JOIN users u ON u.id = r.client_id
         WHERE r.worker_id = $1
         ORDER BY r.created_at DESC",
    )
    .bind(worker_id.into_inner())
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(reviews))
}
