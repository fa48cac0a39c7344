use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Provider, SavedProvider, SavedTask, Task},
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// The authenticated user's bookmarked tasks, most recently saved first.
#[get("/tasks")]
pub async fn list_saved_tasks(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT t.* FROM tasks t
         JOIN saved_tasks s ON s.task_id = t.id
         WHERE s.user_id = $1
         ORDER BY s.created_at DESC",
    )
    .bind(auth.id)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Toggle a task bookmark: saves it if absent, removes it if present.
#[post("/tasks/{task_id}")]
pub async fn toggle_saved_task(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let existing = sqlx::query_as::<_, SavedTask>(
        "SELECT * FROM saved_tasks WHERE user_id = $1 AND task_id = $2",
    )
    .bind(auth.id)
    .bind(task_id)
    .fetch_optional(&**pool)
    .await?;

    if let Some(saved) = existing {
        sqlx::query("DELETE FROM saved_tasks WHERE id = $1")
            .bind(saved.id)
            .execute(&**pool)
            .await?;
        return Ok(HttpResponse::Ok().json(json!({ "saved": false })));
    }

    sqlx::query("INSERT INTO saved_tasks (id, user_id, task_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(auth.id)
        .bind(task_id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "saved": true })))
}

/// Remove a task bookmark explicitly. Succeeds whether or not it existed.
#[delete("/tasks/{task_id}")]
pub async fn remove_saved_task(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    sqlx::query("DELETE FROM saved_tasks WHERE user_id = $1 AND task_id = $2")
        .bind(auth.id)
        .bind(task_id.into_inner())
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Removed from saved tasks"
    })))
}

/// The authenticated user's bookmarked providers. The join naturally drops
/// bookmarks whose provider has since been deleted.
#[get("/providers")]
pub async fn list_saved_providers(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let providers = sqlx::query_as::<_, Provider>(
        "SELECT p.* FROM providers p
         JOIN saved_providers s ON s.provider_id = p.id
         WHERE s.user_id = $1
         ORDER BY s.created_at DESC",
    )
    .bind(auth.id)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(providers))
}

/// Bookmark a provider. Saving twice is a no-op.
#[post("/providers/{provider_id}")]
pub async fn save_provider(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    provider_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let provider_id = provider_id.into_inner();

    let provider: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM providers WHERE id = $1")
        .bind(provider_id)
        .fetch_optional(&**pool)
        .await?;
    if provider.is_none() {
        return Err(AppError::NotFound("Provider not found".into()));
    }

    let existing = sqlx::query_as::<_, SavedProvider>(
        "SELECT * FROM saved_providers WHERE user_id = $1 AND provider_id = $2",
    )
    .bind(auth.id)
    .bind(provider_id)
    .fetch_optional(&**pool)
    .await?;
    if existing.is_some() {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "Provider already saved"
        })));
    }

    sqlx::query("INSERT INTO saved_providers (id, user_id, provider_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(auth.id)
        .bind(provider_id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Provider saved successfully"
    })))
}

/// Remove a provider bookmark.
#[delete("/providers/{provider_id}")]
pub async fn remove_saved_provider(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    provider_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM saved_providers WHERE user_id = $1 AND provider_id = $2")
        .bind(auth.id)
        .bind(provider_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Provider not found in saved list".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Provider removed from saved list"
    })))
}
