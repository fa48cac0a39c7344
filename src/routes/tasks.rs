use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskQuery},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated client's task postings.
///
/// Supports filtering by `status` and a `search` term matched
/// case-insensitively against title and description. Ordered newest first.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    // Conditions are appended dynamically; binds follow in the same order.
    let mut sql = String::from("SELECT * FROM tasks WHERE client_id = $1");
    let mut param_count = 2;

    if query_params.status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        sql.push_str(&format!(
            " AND (title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(auth.id);
    if let Some(status) = &query_params.status {
        query_builder = query_builder.bind(*status);
    }
    if let Some(search) = &query_params.search {
        let pattern = format!("%{}%", search);
        query_builder = query_builder.bind(pattern.clone()).bind(pattern);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task posting owned by the authenticated client.
/// New postings start in the `open` status unless the input says otherwise.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), auth.id);

    let result = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, client_id, title, description, category, location, budget, status, worker_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(task.id)
    .bind(task.client_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.category)
    .bind(&task.location)
    .bind(&task.budget)
    .bind(task.status)
    .bind(task.worker_id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(result))
}

/// Retrieves a single task posting. Only the owner can see it; foreign tasks
/// answer 404 rather than 403 to avoid leaking their existence.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .fetch_optional(&**pool)
        .await?;

    match task {
        Some(task) if task.client_id == auth.id => Ok(HttpResponse::Ok().json(task)),
        _ => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates a task posting the authenticated client owns.
///
/// Omitted optional fields keep their current value; this is also how the
/// client assigns a worker and later marks the task completed, which unlocks
/// leaving a review.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let result = sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET title = $1,
             description = COALESCE($2, description),
             category = COALESCE($3, category),
             location = COALESCE($4, location),
             budget = COALESCE($5, budget),
             status = COALESCE($6, status),
             worker_id = COALESCE($7, worker_id),
             updated_at = now()
         WHERE id = $8 AND client_id = $9
         RETURNING *",
    )
    .bind(&task_data.title)
    .bind(&task_data.description)
    .bind(&task_data.category)
    .bind(&task_data.location)
    .bind(&task_data.budget)
    .bind(task_data.status)
    .bind(task_data.worker_id)
    .bind(task_id.into_inner())
    .bind(auth.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found or not owned by user".into()))?;

    Ok(HttpResponse::Ok().json(result))
}

/// Deletes a task posting the authenticated client owns.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND client_id = $2")
        .bind(task_id.into_inner())
        .bind(auth.id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found or not owned by user".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
