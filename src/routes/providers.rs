use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Provider, ProviderProfile, ProviderProfilePatch},
    paths,
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Payload for the one-time provider registration.
#[derive(Debug, Deserialize, Validate)]
pub struct ProviderRegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub fname: String,
    #[validate(length(min = 1, max = 100))]
    pub sname: String,
    #[validate(length(max = 100))]
    pub other_name: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    pub category: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 200))]
    pub experience: Option<String>,
    #[validate(length(max = 50))]
    pub hourly_rate: Option<String>,
    #[validate(length(max = 50))]
    pub availability: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 30))]
    pub whatsapp: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub profile_pic: Option<String>,
    pub sample_work: Option<Vec<String>>,
}

async fn load_provider_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Provider>, AppError> {
    let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(provider)
}

/// Register as a provider (only once per user)
///
/// The new profile starts unapproved and stays out of reach of staged edits
/// until an administrator approves it.
#[post("")]
pub async fn register_provider(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    data: web::Json<ProviderRegisterRequest>,
) -> Result<impl Responder, AppError> {
    data.validate()?;

    if load_provider_by_user(&pool, auth.id).await?.is_some() {
        return Err(AppError::BadRequest(
            "You have already registered as a provider".into(),
        ));
    }

    let data = data.into_inner();
    let profile = ProviderProfile {
        first_name: data.fname,
        surname: data.sname,
        other_name: data.other_name.unwrap_or_default(),
        city: data.city.unwrap_or_default(),
        region: data.region.unwrap_or_default(),
        category: data.category.unwrap_or_default(),
        skills: data.skills.unwrap_or_default(),
        bio: data.bio.unwrap_or_default(),
        experience: data.experience.unwrap_or_default(),
        hourly_rate: data.hourly_rate.unwrap_or_default(),
        availability: data.availability.unwrap_or_else(|| "flexible".into()),
        phone: data.phone.unwrap_or_default(),
        whatsapp: data.whatsapp.unwrap_or_default(),
        email: data.email.unwrap_or_default(),
        profile_pic: data
            .profile_pic
            .map(|p| paths::normalize_file_path(&p))
            .unwrap_or_default(),
        sample_work: data
            .sample_work
            .unwrap_or_default()
            .iter()
            .map(|p| paths::normalize_file_path(p))
            .collect(),
    };

    let provider = sqlx::query_as::<_, Provider>(
        "INSERT INTO providers (id, user_id, first_name, surname, other_name, full_name,
                                city, region, category, skills, bio, experience, hourly_rate,
                                availability, phone, whatsapp, email, profile_pic, sample_work)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(auth.id)
    .bind(&profile.first_name)
    .bind(&profile.surname)
    .bind(&profile.other_name)
    .bind(profile.full_name())
    .bind(&profile.city)
    .bind(&profile.region)
    .bind(&profile.category)
    .bind(&profile.skills)
    .bind(&profile.bio)
    .bind(&profile.experience)
    .bind(&profile.hourly_rate)
    .bind(&profile.availability)
    .bind(&profile.phone)
    .bind(&profile.whatsapp)
    .bind(&profile.email)
    .bind(&profile.profile_pic)
    .bind(&profile.sample_work)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Provider registration submitted successfully",
        "provider": provider,
    })))
}

/// Whether the authenticated user has a provider profile.
#[get("/check")]
pub async fn check_registration(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let provider = load_provider_by_user(&pool, auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "exists": provider.is_some(),
        "provider": provider,
    })))
}

/// The authenticated user's own provider profile.
#[get("/me")]
pub async fn my_provider(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let provider = load_provider_by_user(&pool, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider profile not found".into()))?;
    Ok(HttpResponse::Ok().json(provider))
}

/// Proposes edits to the provider profile.
///
/// Same staging workflow as user profiles: nothing is published until an
/// administrator accepts the proposal. Replacing `sample_work` (including
/// removing entries) goes through here too.
#[put("/me")]
pub async fn update_provider(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    patch: web::Json<ProviderProfilePatch>,
) -> Result<impl Responder, AppError> {
    patch.validate()?;
    let mut patch = patch.into_inner();
    if let Some(pic) = patch.profile_pic.take() {
        patch.profile_pic = Some(paths::normalize_file_path(&pic));
    }
    if let Some(samples) = patch.sample_work.take() {
        patch.sample_work = Some(
            samples
                .iter()
                .map(|p| paths::normalize_file_path(p))
                .collect(),
        );
    }

    let provider = load_provider_by_user(&pool, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider profile not found".into()))?;

    let mut state = provider.approval_state();
    state.stage_edit(&patch, Utc::now())?;

    let updated = sqlx::query_as::<_, Provider>(
        "UPDATE providers
         SET original_profile = $1, pending_profile = $2, has_pending_changes = TRUE,
             pending_changes_submitted_at = $3, updated_at = now()
         WHERE id = $4 AND approved = TRUE AND has_pending_changes = FALSE
         RETURNING *",
    )
    .bind(state.original.clone().map(Json))
    .bind(state.pending.clone().map(Json))
    .bind(state.pending_submitted_at)
    .bind(provider.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Profile changed concurrently, please retry".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Provider changes submitted for admin approval",
        "has_pending_changes": true,
        "provider": updated,
    })))
}

/// Public provider search by name, category or skill.
#[get("/search")]
pub async fn search_providers(
    pool: web::Data<PgPool>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, AppError> {
    let q = query.q.as_deref().map(str::trim).unwrap_or("");
    if q.is_empty() {
        return Ok(HttpResponse::Ok().json(Vec::<Provider>::new()));
    }

    let pattern = format!("%{}%", q);
    let providers = sqlx::query_as::<_, Provider>(
        "SELECT * FROM providers
         WHERE first_name ILIKE $1 OR surname ILIKE $1
            OR array_to_string(category, ' ') ILIKE $1
            OR array_to_string(skills, ' ') ILIKE $1
         ORDER BY rating DESC, created_at DESC",
    )
    .bind(&pattern)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(providers))
}

/// Public provider directory, newest first.
#[get("")]
pub async fn list_providers(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let providers =
        sqlx::query_as::<_, Provider>("SELECT * FROM providers ORDER BY created_at DESC")
            .fetch_all(&**pool)
            .await?;
    Ok(HttpResponse::Ok().json(providers))
}

/// Public provider detail page.
#[get("/{id}")]
pub async fn get_provider(
    pool: web::Data<PgPool>,
    provider_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
        .bind(provider_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider not found".into()))?;
    Ok(HttpResponse::Ok().json(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = ProviderRegisterRequest {
            fname: "Kofi".into(),
            sname: "Asante".into(),
            other_name: None,
            city: Some("Accra".into()),
            region: None,
            category: Some(vec!["plumbing".into()]),
            skills: None,
            bio: None,
            experience: None,
            hourly_rate: None,
            availability: None,
            phone: None,
            whatsapp: None,
            email: Some("kofi@example.com".into()),
            profile_pic: None,
            sample_work: None,
        };
        assert!(valid.validate().is_ok());

        let missing_surname = ProviderRegisterRequest {
            sname: "".into(),
            ..valid
        };
        assert!(missing_surname.validate().is_err());
    }
}
