use crate::{
    auth::{hash_password, token, verify_password, AdminPrincipal, LoginRequest},
    config::Config,
    error::AppError,
    models::{Admin, Provider, TaskStatus, User, UserType},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Administrator decision on a staged profile proposal.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub accept: bool,
}

/// Direct override of a record's approval flag.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkApproveRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub task_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub user_type: Option<UserType>,
    #[validate(length(max = 500))]
    pub profile_image: Option<String>,
}

/// A task posting joined with its client's contact details for the admin
/// overview.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminTaskRow {
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
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
}

/// Registers the guarded admin routes. The login route lives outside the
/// guarded scope and is registered separately.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(pending_users)
        .service(list_users)
        .service(create_user)
        .service(decide_user_changes)
        .service(approve_user)
        .service(block_user)
        .service(update_user)
        .service(delete_user)
        .service(pending_providers)
        .service(bulk_approve_providers)
        .service(decide_provider_changes)
        .service(approve_provider)
        .service(list_tasks)
        .service(bulk_delete_tasks)
        .service(delete_task)
        .service(list_admins);
}

/// Admin login
///
/// Mints a short-lived token carrying the admin role; the admin gate resolves
/// it against the admins table rather than users.
#[post("/admin/auth/login")]
pub async fn admin_login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let email = login_data.email.to_lowercase();

    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?;

    let admin = match admin {
        Some(admin) => admin,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };
    if !verify_password(&login_data.password, &admin.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let jwt = token::issue(
        admin.id,
        token::ROLE_ADMIN,
        &config.jwt_secret,
        token::ADMIN_TOKEN_TTL_HOURS,
    )?;

    Ok(HttpResponse::Ok().json(json!({
        "token": jwt,
        "admin": admin,
    })))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// All user records, newest first.
#[get("/users")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
) -> Result<impl Responder, AppError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&**pool)
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Users whose profile proposals await a decision, oldest submission first.
#[get("/users/pending")]
pub async fn pending_users(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
) -> Result<impl Responder, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE has_pending_changes = TRUE
         ORDER BY pending_changes_submitted_at ASC",
    )
    .fetch_all(&**pool)
    .await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Create a user directly. Admin-created accounts start approved so they are
/// immediately usable without email verification.
#[post("/users")]
pub async fn create_user(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    data: web::Json<AdminCreateUserRequest>,
) -> Result<impl Responder, AppError> {
    data.validate()?;
    let email = data.email.to_lowercase();

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&data.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, name, email, password_hash, phone, approved, last_approved_at)
         VALUES ($1, $2, $3, $4, $5, TRUE, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&data.name)
    .bind(&email)
    .bind(&password_hash)
    .bind(&data.phone)
    .bind(Utc::now())
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully",
        "user": user,
    })))
}

/// Direct edit of a user's published fields.
///
/// This is the administrator acting, so the staging workflow does not apply:
/// the change is equivalent to a proposal staged and accepted in one step.
#[put("/users/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    user_id: web::Path<Uuid>,
    data: web::Json<AdminUpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    data.validate()?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users
         SET name = COALESCE($1, name),
             email = COALESCE($2, email),
             phone = COALESCE($3, phone),
             location = COALESCE($4, location),
             user_type = COALESCE($5, user_type),
             profile_image = COALESCE($6, profile_image),
             updated_at = now()
         WHERE id = $7
         RETURNING *",
    )
    .bind(&data.name)
    .bind(data.email.as_ref().map(|e| e.to_lowercase()))
    .bind(&data.phone)
    .bind(&data.location)
    .bind(data.user_type)
    .bind(&data.profile_image)
    .bind(user_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully",
        "user": user,
    })))
}

/// Toggle the block flag on a user.
#[patch("/users/{id}/block")]
pub async fn block_user(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET is_blocked = NOT is_blocked, updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(user_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let message = if user.is_blocked {
        "User blocked"
    } else {
        "User unblocked"
    };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "user": user,
    })))
}

/// Delete a user. Providers, tasks, reviews and saved-item rows cascade.
#[delete("/users/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted" })))
}

/// Decide a user's pending profile proposal.
///
/// Accepting publishes the staged snapshot; rejecting discards it. Either way
/// the proposal is cleared. Rejection does not revert the approval flag.
#[post("/users/{id}/pending-changes")]
pub async fn decide_user_changes(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    user_id: web::Path<Uuid>,
    body: web::Json<DecideRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut state = user.approval_state();
    state.decide_pending_change(body.accept, Utc::now())?;

    // Conditional on the pending flag so a double submission cannot decide
    // twice; the original snapshot stays behind for audit.
    let updated = if body.accept {
        let published = &state.published;
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = $1, fname = $2, sname = $3, oname = $4, email = $5, phone = $6,
                 whatsapp = $7, location = $8, region = $9, profile_image = $10,
                 pending_profile = NULL, has_pending_changes = FALSE,
                 pending_changes_submitted_at = NULL, last_approved_at = $11, updated_at = now()
             WHERE id = $12 AND has_pending_changes = TRUE
             RETURNING *",
        )
        .bind(&published.name)
        .bind(&published.fname)
        .bind(&published.sname)
        .bind(&published.oname)
        .bind(&published.email)
        .bind(&published.phone)
        .bind(&published.whatsapp)
        .bind(&published.location)
        .bind(&published.region)
        .bind(&published.profile_image)
        .bind(state.last_approved_at)
        .bind(user_id)
        .fetch_optional(&**pool)
        .await?
    } else {
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET pending_profile = NULL, has_pending_changes = FALSE,
                 pending_changes_submitted_at = NULL, updated_at = now()
             WHERE id = $1 AND has_pending_changes = TRUE
             RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(&**pool)
        .await?
    };

    let updated = updated
        .ok_or_else(|| AppError::Conflict("Pending changes were already decided".into()))?;

    let message = if body.accept {
        "Pending changes approved"
    } else {
        "Pending changes rejected"
    };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "user": updated,
    })))
}

/// Set a user's approval flag directly, independent of email verification.
#[patch("/users/{id}/approve")]
pub async fn approve_user(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    user_id: web::Path<Uuid>,
    body: web::Json<ApproveRequest>,
) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut state = user.approval_state();
    state.set_approval(body.approved, Utc::now());

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET approved = $1, last_approved_at = $2, updated_at = now()
         WHERE id = $3
         RETURNING *",
    )
    .bind(state.approved)
    .bind(state.last_approved_at)
    .bind(user.id)
    .fetch_one(&**pool)
    .await?;

    let message = if updated.approved { "Approved" } else { "Disapproved" };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "user": updated,
    })))
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Providers whose profile proposals await a decision.
#[get("/providers/pending")]
pub async fn pending_providers(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
) -> Result<impl Responder, AppError> {
    let providers = sqlx::query_as::<_, Provider>(
        "SELECT * FROM providers WHERE has_pending_changes = TRUE
         ORDER BY pending_changes_submitted_at ASC",
    )
    .fetch_all(&**pool)
    .await?;
    Ok(HttpResponse::Ok().json(providers))
}

/// Decide a provider's pending profile proposal.
#[post("/providers/{id}/pending-changes")]
pub async fn decide_provider_changes(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    provider_id: web::Path<Uuid>,
    body: web::Json<DecideRequest>,
) -> Result<impl Responder, AppError> {
    let provider_id = provider_id.into_inner();
    let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
        .bind(provider_id)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider not found".into()))?;

    let mut state = provider.approval_state();
    state.decide_pending_change(body.accept, Utc::now())?;

    let updated = if body.accept {
        let published = &state.published;
        sqlx::query_as::<_, Provider>(
            "UPDATE providers
             SET first_name = $1, surname = $2, other_name = $3, full_name = $4, city = $5,
                 region = $6, category = $7, skills = $8, bio = $9, experience = $10,
                 hourly_rate = $11, availability = $12, phone = $13, whatsapp = $14,
                 email = $15, profile_pic = $16, sample_work = $17,
                 pending_profile = NULL, has_pending_changes = FALSE,
                 pending_changes_submitted_at = NULL, last_approved_at = $18, updated_at = now()
             WHERE id = $19 AND has_pending_changes = TRUE
             RETURNING *",
        )
        .bind(&published.first_name)
        .bind(&published.surname)
        .bind(&published.other_name)
        .bind(published.full_name())
        .bind(&published.city)
        .bind(&published.region)
        .bind(&published.category)
        .bind(&published.skills)
        .bind(&published.bio)
        .bind(&published.experience)
        .bind(&published.hourly_rate)
        .bind(&published.availability)
        .bind(&published.phone)
        .bind(&published.whatsapp)
        .bind(&published.email)
        .bind(&published.profile_pic)
        .bind(&published.sample_work)
        .bind(state.last_approved_at)
        .bind(provider_id)
        .fetch_optional(&**pool)
        .await?
    } else {
        sqlx::query_as::<_, Provider>(
            "UPDATE providers
             SET pending_profile = NULL, has_pending_changes = FALSE,
                 pending_changes_submitted_at = NULL, updated_at = now()
             WHERE id = $1 AND has_pending_changes = TRUE
             RETURNING *",
        )
        .bind(provider_id)
        .fetch_optional(&**pool)
        .await?
    };

    let updated = updated
        .ok_or_else(|| AppError::Conflict("Pending changes were already decided".into()))?;

    let message = if body.accept {
        "Pending changes approved"
    } else {
        "Pending changes rejected"
    };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "provider": updated,
    })))
}

/// Set a provider's approval flag directly.
#[patch("/providers/{id}/approve")]
pub async fn approve_provider(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    provider_id: web::Path<Uuid>,
    body: web::Json<ApproveRequest>,
) -> Result<impl Responder, AppError> {
    let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
        .bind(provider_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider not found".into()))?;

    let mut state = provider.approval_state();
    state.set_approval(body.approved, Utc::now());

    let updated = sqlx::query_as::<_, Provider>(
        "UPDATE providers SET approved = $1, last_approved_at = $2, updated_at = now()
         WHERE id = $3
         RETURNING *",
    )
    .bind(state.approved)
    .bind(state.last_approved_at)
    .bind(provider.id)
    .fetch_one(&**pool)
    .await?;

    let message = if updated.approved { "Approved" } else { "Disapproved" };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "provider": updated,
    })))
}

/// Approve several providers at once.
#[patch("/providers/bulk-approve")]
pub async fn bulk_approve_providers(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    body: web::Json<BulkApproveRequest>,
) -> Result<impl Responder, AppError> {
    if body.ids.is_empty() {
        return Err(AppError::BadRequest("No provider IDs provided".into()));
    }

    let result = sqlx::query(
        "UPDATE providers SET approved = TRUE, last_approved_at = $2, updated_at = now()
         WHERE id = ANY($1)",
    )
    .bind(&body.ids)
    .bind(Utc::now())
    .execute(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Providers approved successfully",
        "approved_count": result.rows_affected(),
    })))
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// All task postings with client contact details, newest first.
#[get("/tasks")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
) -> Result<impl Responder, AppError> {
    let tasks = sqlx::query_as::<_, AdminTaskRow>(
        "SELECT t.*, u.name AS client_name, u.email AS client_email, u.phone AS client_phone
         FROM tasks t
         JOIN users u ON u.id = t.client_id
         ORDER BY t.created_at DESC",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "total": tasks.len(),
        "tasks": tasks,
    })))
}

/// Delete a single task posting.
#[delete("/tasks/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}

/// Delete several task postings at once.
#[post("/tasks/bulk-delete")]
pub async fn bulk_delete_tasks(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
    body: web::Json<BulkDeleteRequest>,
) -> Result<impl Responder, AppError> {
    if body.task_ids.is_empty() {
        return Err(AppError::BadRequest("No task IDs provided".into()));
    }

    let result = sqlx::query("DELETE FROM tasks WHERE id = ANY($1)")
        .bind(&body.task_ids)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} tasks deleted successfully", result.rows_affected()),
        "deleted_count": result.rows_affected(),
    })))
}

// ---------------------------------------------------------------------------
// Admins
// ---------------------------------------------------------------------------

/// All administrator accounts.
#[get("/admins")]
pub async fn list_admins(
    pool: web::Data<PgPool>,
    _admin: AdminPrincipal,
) -> Result<impl Responder, AppError> {
    let admins = sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY created_at ASC")
        .fetch_all(&**pool)
        .await?;
    Ok(HttpResponse::Ok().json(admins))
}
