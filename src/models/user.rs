use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::approval::{ApprovalState, Overlay};

lazy_static! {
    // Digits, plus sign, parentheses, dashes and spaces. Empty is allowed:
    // phone numbers are optional profile data.
    static ref PHONE_REGEX: Regex = Regex::new(r"^[0-9+()\-\s]*$").unwrap();
}

/// Marketplace-facing account kind. `client` posts tasks, `worker` offers
/// services. `admin` only appears on records provisioned by legacy imports;
/// see [`User::is_admin`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Client,
    Worker,
    Admin,
}

/// Legacy role enum, kept alongside `user_type`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// The editable, moderated part of a user record. This is the payload that
/// flows through the approval workflow: staged proposals and their original
/// snapshots are stored as JSON columns with exactly this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub fname: String,
    pub sname: String,
    pub oname: String,
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
    pub location: String,
    pub region: String,
    pub profile_image: String,
}

/// A proposed profile edit. Fields left out keep their current published
/// value when the patch is overlaid.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserProfilePatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub fname: Option<String>,
    #[validate(length(max = 100))]
    pub sname: Option<String>,
    #[validate(length(max = 100))]
    pub oname: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub whatsapp: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(length(max = 500))]
    pub profile_image: Option<String>,
}

impl Overlay for UserProfile {
    type Patch = UserProfilePatch;

    fn overlay(&self, patch: &UserProfilePatch) -> Self {
        Self {
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            fname: patch.fname.clone().unwrap_or_else(|| self.fname.clone()),
            sname: patch.sname.clone().unwrap_or_else(|| self.sname.clone()),
            oname: patch.oname.clone().unwrap_or_else(|| self.oname.clone()),
            email: patch.email.clone().unwrap_or_else(|| self.email.clone()),
            phone: patch.phone.clone().unwrap_or_else(|| self.phone.clone()),
            whatsapp: patch
                .whatsapp
                .clone()
                .unwrap_or_else(|| self.whatsapp.clone()),
            location: patch
                .location
                .clone()
                .unwrap_or_else(|| self.location.clone()),
            region: patch.region.clone().unwrap_or_else(|| self.region.clone()),
            profile_image: patch
                .profile_image
                .clone()
                .unwrap_or_else(|| self.profile_image.clone()),
        }
    }
}

/// A user record as stored in the database.
///
/// Credentials and single-use tokens are never serialized into responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub fname: String,
    pub sname: String,
    pub oname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub whatsapp: String,
    pub location: String,
    pub region: String,
    pub profile_image: String,
    pub user_type: UserType,
    pub role: UserRole,
    pub is_blocked: bool,

    pub email_verified: bool,
    pub approved: bool,
    pub has_pending_changes: bool,
    pub pending_profile: Option<Json<UserProfile>>,
    pub original_profile: Option<Json<UserProfile>>,
    pub last_approved_at: Option<DateTime<Utc>>,
    pub pending_changes_submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub verification_expiry: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTime<Utc>>,

    pub average_rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The published profile snapshot, assembled from the record's columns.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            fname: self.fname.clone(),
            sname: self.sname.clone(),
            oname: self.oname.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            whatsapp: self.whatsapp.clone(),
            location: self.location.clone(),
            region: self.region.clone(),
            profile_image: self.profile_image.clone(),
        }
    }

    /// The record's approval workflow state. Routes run engine transitions on
    /// this and persist the result with a conditional update.
    pub fn approval_state(&self) -> ApprovalState<UserProfile> {
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

    /// Whether this user holds administrator privileges.
    ///
    /// Both fields are checked because they are populated by different
    /// upstream paths; either one marking admin is sufficient. Do not unify
    /// them: records written by the other path would silently lose access.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin || self.user_type == UserType::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Ama Mensah".into(),
            email: "ama@example.com".into(),
            phone: "+233201234567".into(),
            location: "Kumasi".into(),
            region: "Ashanti".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_overlay_keeps_omitted_fields() {
        let published = profile();
        let patch = UserProfilePatch {
            location: Some("Accra".into()),
            ..Default::default()
        };

        let merged = published.overlay(&patch);
        assert_eq!(merged.location, "Accra");
        assert_eq!(merged.name, published.name);
        assert_eq!(merged.email, published.email);
        assert_eq!(merged.phone, published.phone);
        assert_eq!(merged.region, published.region);
    }

    #[test]
    fn test_patch_validation() {
        let valid = UserProfilePatch {
            name: Some("Ama".into()),
            email: Some("ama@example.com".into()),
            phone: Some("+233 20 123 4567".into()),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let bad_email = UserProfilePatch {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let bad_phone = UserProfilePatch {
            phone: Some("call me maybe".into()),
            ..Default::default()
        };
        assert!(bad_phone.validate().is_err());

        let empty_name = UserProfilePatch {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(empty_name.validate().is_err());
    }
}
