use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{User, UserProfilePatch},
    paths,
};
use actix_web::{get, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::types::Json;
use sqlx::PgPool;
use validator::Validate;

async fn load_user(pool: &PgPool, id: uuid::Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Retrieves the authenticated user's own record, including any pending
/// profile proposal.
#[get("/profile")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = load_user(&pool, auth.id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Proposes profile edits.
///
/// Edits are not applied directly: the patch is staged as a pending proposal
/// for administrator review, with the current profile snapshotted for audit.
/// Fails 403 while the account is unapproved and 400 while an earlier
/// proposal is still undecided; a lost race against a concurrent submission
/// surfaces as 409.
#[put("/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    patch: web::Json<UserProfilePatch>,
) -> Result<impl Responder, AppError> {
    patch.validate()?;
    let mut patch = patch.into_inner();
    if let Some(image) = patch.profile_image.take() {
        patch.profile_image = Some(paths::normalize_file_path(&image));
    }

    let user = load_user(&pool, auth.id).await?;

    let mut state = user.approval_state();
    state.stage_edit(&patch, Utc::now())?;

    // The WHERE clause re-asserts the engine's preconditions so two racing
    // submissions cannot both stage a proposal.
    let updated = sqlx::query_as::<_, User>(
        "UPDATE users
         SET original_profile = $1, pending_profile = $2, has_pending_changes = TRUE,
             pending_changes_submitted_at = $3, updated_at = now()
         WHERE id = $4 AND approved = TRUE AND has_pending_changes = FALSE
         RETURNING *",
    )
    .bind(state.original.clone().map(Json))
    .bind(state.pending.clone().map(Json))
    .bind(state.pending_submitted_at)
    .bind(user.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Profile changed concurrently, please retry".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile changes submitted for admin approval",
        "has_pending_changes": true,
        "user": updated,
    })))
}

/// Account statistics for the dashboard.
#[get("/stats")]
pub async fn stats(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = load_user(&pool, auth.id).await?;

    let total_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE client_id = $1")
        .bind(auth.id)
        .fetch_one(&**pool)
        .await?;
    let saved_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_tasks WHERE user_id = $1")
        .bind(auth.id)
        .fetch_one(&**pool)
        .await?;
    let saved_providers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM saved_providers WHERE user_id = $1")
            .bind(auth.id)
            .fetch_one(&**pool)
            .await?;

    let days_on_platform = (Utc::now() - user.created_at).num_days();

    Ok(HttpResponse::Ok().json(json!({
        "stats": {
            "total_tasks": total_tasks,
            "saved_tasks": saved_tasks,
            "saved_providers": saved_providers,
            "joined": user.created_at,
            "days_on_platform": days_on_platform,
        }
    })))
}
