use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::approval::{ApprovalState, Overlay};

/// The editable, moderated part of a provider record. Same role as
/// `UserProfile` on users: staged proposals carry this shape as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderProfile {
    pub first_name: String,
    pub surname: String,
    pub other_name: String,
    pub city: String,
    pub region: String,
    pub category: Vec<String>,
    pub skills: Vec<String>,
    pub bio: String,
    pub experience: String,
    pub hourly_rate: String,
    pub availability: String,
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
    pub profile_pic: String,
    pub sample_work: Vec<String>,
}

impl ProviderProfile {
    /// Display name derived from the name parts.
    pub fn full_name(&self) -> String {
        let mut full = format!("{} {}", self.first_name, self.surname);
        if !self.other_name.is_empty() {
            full.push(' ');
            full.push_str(&self.other_name);
        }
        full.trim().to_string()
    }
}

/// A proposed provider profile edit. List fields (`category`, `skills`,
/// `sample_work`) replace the whole list when present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProviderProfilePatch {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub surname: Option<String>,
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

impl Overlay for ProviderProfile {
    type Patch = ProviderProfilePatch;

    fn overlay(&self, patch: &ProviderProfilePatch) -> Self {
        Self {
            first_name: patch
                .first_name
                .clone()
                .unwrap_or_else(|| self.first_name.clone()),
            surname: patch.surname.clone().unwrap_or_else(|| self.surname.clone()),
            other_name: patch
                .other_name
                .clone()
                .unwrap_or_else(|| self.other_name.clone()),
            city: patch.city.clone().unwrap_or_else(|| self.city.clone()),
            region: patch.region.clone().unwrap_or_else(|| self.region.clone()),
            category: patch
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            skills: patch.skills.clone().unwrap_or_else(|| self.skills.clone()),
            bio: patch.bio.clone().unwrap_or_else(|| self.bio.clone()),
            experience: patch
                .experience
                .clone()
                .unwrap_or_else(|| self.experience.clone()),
            hourly_rate: patch
                .hourly_rate
                .clone()
                .unwrap_or_else(|| self.hourly_rate.clone()),
            availability: patch
                .availability
                .clone()
                .unwrap_or_else(|| self.availability.clone()),
            phone: patch.phone.clone().unwrap_or_else(|| self.phone.clone()),
            whatsapp: patch
                .whatsapp
                .clone()
                .unwrap_or_else(|| self.whatsapp.clone()),
            email: patch.email.clone().unwrap_or_else(|| self.email.clone()),
            profile_pic: patch
                .profile_pic
                .clone()
                .unwrap_or_else(|| self.profile_pic.clone()),
            sample_work: patch
                .sample_work
                .clone()
                .unwrap_or_else(|| self.sample_work.clone()),
        }
    }
}

/// A provider (worker) record as stored in the database. One per user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Provider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub surname: String,
    pub other_name: String,
    pub full_name: String,
    pub city: String,
    pub region: String,
    pub category: Vec<String>,
    pub skills: Vec<String>,
    pub bio: String,
    pub experience: String,
    pub hourly_rate: String,
    pub availability: String,
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
    pub profile_pic: String,
    pub sample_work: Vec<String>,

    pub email_verified: bool,
    pub approved: bool,
    pub has_pending_changes: bool,
    pub pending_profile: Option<Json<ProviderProfile>>,
    pub original_profile: Option<Json<ProviderProfile>>,
    pub last_approved_at: Option<DateTime<Utc>>,
    pub pending_changes_submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub verification_expiry: Option<DateTime<Utc>>,

    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    pub fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            first_name: self.first_name.clone(),
            surname: self.surname.clone(),
            other_name: self.other_name.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
            category: self.category.clone(),
            skills: self.skills.clone(),
            bio: self.bio.clone(),
            experience: self.experience.clone(),
            hourly_rate: self.hourly_rate.clone(),
            availability: self.availability.clone(),
            phone: self.phone.clone(),
            whatsapp: self.whatsapp.clone(),
            email: self.email.clone(),
            profile_pic: self.profile_pic.clone(),
            sample_work: self.sample_work.clone(),
        }
    }

    pub fn approval_state(&self) -> ApprovalState<ProviderProfile> {
        ApprovalState {
            email_verified: self.email_verified,
            approved: self.approved,
            has_pending_changes: self.has_pending_changes,
            published: self.profile(),
            pending: self.pending_profile.as_ref().map(|p| p.0.clone()),
            original: self.original_profile.as_ref().map(|p| p.0.clone()),
            last_approved_at: self.last_approved_at,
            pending_submitted_at: self.pending_changes_submitted_at,
            verification_token: self.verification_token.clone(),
            verification_expiry: self.verification_expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_composition() {
        let profile = ProviderProfile {
            first_name: "Kofi".into(),
            surname: "Asante".into(),
            ..Default::default()
        };
        assert_eq!(profile.full_name(), "Kofi Asante");

        let with_other = ProviderProfile {
            first_name: "Kofi".into(),
            surname: "Asante".into(),
            other_name: "Yaw".into(),
            ..Default::default()
        };
        assert_eq!(with_other.full_name(), "Kofi Asante Yaw");
    }

    #[test]
    fn test_overlay_replaces_whole_lists() {
        let published = ProviderProfile {
            first_name: "Kofi".into(),
            surname: "Asante".into(),
            skills: vec!["plumbing".into(), "tiling".into()],
            ..Default::default()
        };
        let patch = ProviderProfilePatch {
            skills: Some(vec!["carpentry".into()]),
            ..Default::default()
        };

        let merged = published.overlay(&patch);
        assert_eq!(merged.skills, vec!["carpentry".to_string()]);
        assert_eq!(merged.first_name, "Kofi");
        assert_eq!(merged.category, published.category);
    }

    #[test]
    fn test_patch_validation() {
        let valid = ProviderProfilePatch {
            first_name: Some("Kofi".into()),
            email: Some("kofi@example.com".into()),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let empty_first_name = ProviderProfilePatch {
            first_name: Some("".into()),
            ..Default::default()
        };
        assert!(empty_first_name.validate().is_err());
    }
}
