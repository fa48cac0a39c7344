//!
//! # Approval Workflow
//!
//! State transitions for moderated identity records (users and providers).
//! A record's published profile can only change through staging: the owner
//! proposes an edit, the proposal is held in `pending` until an administrator
//! accepts or rejects it. Independently, a record becomes usable (allowed to
//! authenticate) once its email is verified *or* an administrator approves it.
//!
//! The engine is pure: it mutates an in-memory [`ApprovalState`] and performs
//! no I/O. Callers persist the outcome with a conditional `UPDATE` that
//! re-asserts the precondition columns, so two racing requests cannot both
//! observe `has_pending_changes = false` and both succeed; the loser gets zero
//! rows affected and surfaces a conflict.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::fmt;

/// Email verification links are valid for 24 hours.
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Errors produced by workflow transitions.
///
/// Each maps to a rejection of the triggering request; none is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalError {
    /// The record is not approved, so it may not propose profile edits.
    NotApproved,
    /// A proposal is already awaiting an administrator decision.
    ChangesAlreadyPending,
    /// A decision was requested but no proposal is pending.
    NoPendingChange,
    /// The supplied verification token does not match or has expired.
    /// Deliberately one error for both causes so callers cannot tell which.
    InvalidOrExpiredToken,
}

impl fmt::Display for ApprovalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApprovalError::NotApproved => {
                write!(f, "Your account must be approved before you can edit your profile")
            }
            ApprovalError::ChangesAlreadyPending => {
                write!(f, "You already have pending changes awaiting approval")
            }
            ApprovalError::NoPendingChange => {
                write!(f, "No pending changes awaiting approval")
            }
            ApprovalError::InvalidOrExpiredToken => {
                write!(f, "Invalid or expired verification token")
            }
        }
    }
}

/// Typed field-by-field patch merge.
///
/// Implemented by each profile payload together with its patch type. Fields
/// omitted from the patch keep their current published value.
pub trait Overlay: Clone {
    type Patch;

    fn overlay(&self, patch: &Self::Patch) -> Self;
}

/// The moderation fields shared by every identity record, parameterized over
/// the record's editable profile payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalState<T> {
    pub email_verified: bool,
    pub approved: bool,
    pub has_pending_changes: bool,
    /// The live, administrator-accepted snapshot.
    pub published: T,
    /// Staged proposal; `Some` iff `has_pending_changes`.
    pub pending: Option<T>,
    /// Snapshot of `published` taken when the proposal was staged.
    /// Kept after the decision for audit.
    pub original: Option<T>,
    pub last_approved_at: Option<DateTime<Utc>>,
    pub pending_submitted_at: Option<DateTime<Utc>>,
    pub verification_token: Option<String>,
    pub verification_expiry: Option<DateTime<Utc>>,
}

impl<T: Overlay> ApprovalState<T> {
    /// Fresh state for a newly registered record: unverified, unapproved,
    /// nothing pending.
    pub fn new(published: T) -> Self {
        Self {
            email_verified: false,
            approved: false,
            has_pending_changes: false,
            published,
            pending: None,
            original: None,
            last_approved_at: None,
            pending_submitted_at: None,
            verification_token: None,
            verification_expiry: None,
        }
    }

    /// Stage a profile edit for administrator review.
    ///
    /// The current `published` snapshot is preserved in `original` and the
    /// patch is overlaid onto a copy to form `pending`. `published` itself is
    /// not touched until the proposal is accepted.
    pub fn stage_edit(&mut self, patch: &T::Patch, now: DateTime<Utc>) -> Result<(), ApprovalError> {
        if !self.approved {
            return Err(ApprovalError::NotApproved);
        }
        if self.has_pending_changes {
            return Err(ApprovalError::ChangesAlreadyPending);
        }
        self.original = Some(self.published.clone());
        self.pending = Some(self.published.overlay(patch));
        self.has_pending_changes = true;
        self.pending_submitted_at = Some(now);
        Ok(())
    }

    /// Administrator decision on the pending proposal.
    ///
    /// Accepting publishes the staged payload; rejecting discards it. Either
    /// way the pending fields are cleared. Rejection never reverts `approved`.
    pub fn decide_pending_change(
        &mut self,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        if !self.has_pending_changes {
            return Err(ApprovalError::NoPendingChange);
        }
        let pending = self.pending.take().ok_or(ApprovalError::NoPendingChange)?;
        if accept {
            self.published = pending;
            self.last_approved_at = Some(now);
        }
        self.has_pending_changes = false;
        self.pending_submitted_at = None;
        Ok(())
    }

    /// Issue a fresh single-use verification token, overwriting any previous
    /// one. No precondition: resending is always allowed.
    pub fn issue_verification_token(&mut self, now: DateTime<Utc>) -> String {
        let token = generate_token_hex();
        self.verification_token = Some(token.clone());
        self.verification_expiry = Some(now + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS));
        token
    }

    /// Redeem a verification token.
    ///
    /// On success the record becomes email-verified and the token pair is
    /// cleared. When `auto_approve` is configured (or the record was already
    /// approved) verification also grants approval.
    pub fn redeem_verification_token(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        auto_approve: bool,
    ) -> Result<(), ApprovalError> {
        let valid = match (&self.verification_token, &self.verification_expiry) {
            (Some(stored), Some(expiry)) => stored == token && now < *expiry,
            _ => false,
        };
        if !valid {
            return Err(ApprovalError::InvalidOrExpiredToken);
        }
        self.email_verified = true;
        self.verification_token = None;
        self.verification_expiry = None;
        if auto_approve || self.approved {
            self.approved = true;
            self.last_approved_at = Some(now);
        }
        Ok(())
    }

    /// Direct administrator override of the approval flag, independent of the
    /// email verification flow. Always legal.
    pub fn set_approval(&mut self, approved: bool, now: DateTime<Utc>) {
        if approved && !self.approved {
            self.last_approved_at = Some(now);
        }
        self.approved = approved;
    }

    /// Whether the record may authenticate and act as its owner.
    /// Dual gate: email verification OR administrator approval.
    pub fn is_usable(&self) -> bool {
        self.email_verified || self.approved
    }
}

/// 32 random bytes, hex-encoded. Used for verification and reset tokens.
pub fn generate_token_hex() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Profile {
        name: String,
        city: String,
    }

    #[derive(Default)]
    struct ProfilePatch {
        name: Option<String>,
        city: Option<String>,
    }

    impl Overlay for Profile {
        type Patch = ProfilePatch;

        fn overlay(&self, patch: &ProfilePatch) -> Self {
            Self {
                name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
                city: patch.city.clone().unwrap_or_else(|| self.city.clone()),
            }
        }
    }

    fn approved_state() -> ApprovalState<Profile> {
        let mut state = ApprovalState::new(Profile {
            name: "Ama".into(),
            city: "Kumasi".into(),
        });
        state.set_approval(true, Utc::now());
        state
    }

    #[test]
    fn test_new_state_is_clean() {
        let state = ApprovalState::new(Profile::default());
        assert!(!state.email_verified);
        assert!(!state.approved);
        assert!(!state.has_pending_changes);
        assert!(state.pending.is_none());
        assert!(state.pending_submitted_at.is_none());
        assert!(!state.is_usable());
    }

    #[test]
    fn test_stage_edit_requires_approval() {
        let mut state = ApprovalState::new(Profile::default());
        let err = state.stage_edit(&ProfilePatch::default(), Utc::now());
        assert_eq!(err, Err(ApprovalError::NotApproved));
        assert!(!state.has_pending_changes);
    }

    #[test]
    fn test_stage_edit_keeps_pending_fields_in_sync() {
        let mut state = approved_state();
        state
            .stage_edit(
                &ProfilePatch {
                    city: Some("Accra".into()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        // Invariant: flag, payload and timestamp are all set together.
        assert!(state.has_pending_changes);
        assert!(state.pending.is_some());
        assert!(state.pending_submitted_at.is_some());
        assert_eq!(state.original.as_ref().unwrap().city, "Kumasi");
        // Published is untouched until the decision.
        assert_eq!(state.published.city, "Kumasi");
    }

    #[test]
    fn test_issue_token_overwrites_previous() {
        let mut state = ApprovalState::new(Profile::default());
        let first = state.issue_verification_token(Utc::now());
        let second = state.issue_verification_token(Utc::now());
        assert_ne!(first, second);
        assert_eq!(state.verification_token.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn test_generate_token_hex_shape() {
        let token = generate_token_hex();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token_hex());
    }
}
