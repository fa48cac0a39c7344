//! Workflow tests for the approval engine over the real profile payloads:
//! staging, decisions, verification tokens and the usability gate.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use workmarket::approval::{ApprovalError, ApprovalState};
use workmarket::models::{ProviderProfile, ProviderProfilePatch, UserProfile, UserProfilePatch};

fn user_profile() -> UserProfile {
    UserProfile {
        name: "Ama Mensah".into(),
        email: "ama@example.com".into(),
        phone: "+233201234567".into(),
        location: "Kumasi".into(),
        region: "Ashanti".into(),
        ..Default::default()
    }
}

fn provider_profile() -> ProviderProfile {
    ProviderProfile {
        first_name: "Kofi".into(),
        surname: "Asante".into(),
        city: "Kumasi".into(),
        region: "Ashanti".into(),
        skills: vec!["plumbing".into()],
        ..Default::default()
    }
}

fn approved_user() -> ApprovalState<UserProfile> {
    let mut state = ApprovalState::new(user_profile());
    state.set_approval(true, Utc::now());
    state
}

#[test]
fn stage_edit_fails_until_approved() {
    let mut state = ApprovalState::new(user_profile());
    let patch = UserProfilePatch {
        location: Some("Accra".into()),
        ..Default::default()
    };

    assert_eq!(
        state.stage_edit(&patch, Utc::now()),
        Err(ApprovalError::NotApproved)
    );
    assert!(!state.has_pending_changes);
    assert_eq!(state.published, user_profile());
}

#[test]
fn second_stage_edit_fails_and_leaves_published_untouched() {
    let mut state = approved_user();
    let first = UserProfilePatch {
        location: Some("Accra".into()),
        ..Default::default()
    };
    state.stage_edit(&first, Utc::now()).unwrap();

    let second = UserProfilePatch {
        name: Some("Someone Else".into()),
        ..Default::default()
    };
    assert_eq!(
        state.stage_edit(&second, Utc::now()),
        Err(ApprovalError::ChangesAlreadyPending)
    );

    // Neither the published snapshot nor the first proposal moved.
    assert_eq!(state.published, user_profile());
    assert_eq!(state.pending.as_ref().unwrap().location, "Accra");
    assert_eq!(state.pending.as_ref().unwrap().name, "Ama Mensah");
}

#[test]
fn accepting_a_proposal_publishes_it() {
    // The partial-patch scenario: only the city moves, everything else keeps
    // its published value.
    let mut state = ApprovalState::new(provider_profile());
    state.set_approval(true, Utc::now());

    let patch = ProviderProfilePatch {
        city: Some("Accra".into()),
        ..Default::default()
    };
    state.stage_edit(&patch, Utc::now()).unwrap();

    let staged = state.pending.clone().unwrap();
    assert_eq!(staged.city, "Accra");
    assert_eq!(staged.first_name, "Kofi");
    assert_eq!(staged.surname, "Asante");
    assert_eq!(staged.skills, vec!["plumbing".to_string()]);

    let decided_at = Utc::now();
    state.decide_pending_change(true, decided_at).unwrap();

    assert_eq!(state.published, staged);
    assert_eq!(state.published.city, "Accra");
    assert_eq!(state.last_approved_at, Some(decided_at));
}

#[test]
fn rejecting_a_proposal_keeps_published_and_approval() {
    let mut state = approved_user();
    let before = state.published.clone();
    let approved_at = state.last_approved_at;

    let patch = UserProfilePatch {
        location: Some("Accra".into()),
        ..Default::default()
    };
    state.stage_edit(&patch, Utc::now()).unwrap();
    state.decide_pending_change(false, Utc::now()).unwrap();

    assert_eq!(state.published, before);
    // Rejection discards the data but never revokes approval.
    assert!(state.approved);
    assert_eq!(state.last_approved_at, approved_at);
}

#[test]
fn either_decision_clears_the_pending_fields() {
    for accept in [true, false] {
        let mut state = approved_user();
        let patch = UserProfilePatch {
            phone: Some("+233555000111".into()),
            ..Default::default()
        };
        state.stage_edit(&patch, Utc::now()).unwrap();

        state.decide_pending_change(accept, Utc::now()).unwrap();

        assert!(!state.has_pending_changes, "accept={}", accept);
        assert!(state.pending.is_none(), "accept={}", accept);
        assert!(state.pending_submitted_at.is_none(), "accept={}", accept);
        // The pre-stage snapshot stays behind for audit.
        assert!(state.original.is_some(), "accept={}", accept);
    }
}

#[test]
fn deciding_without_a_proposal_fails() {
    let mut state = approved_user();
    assert_eq!(
        state.decide_pending_change(true, Utc::now()),
        Err(ApprovalError::NoPendingChange)
    );
}

#[test]
fn wrong_token_is_rejected_without_side_effects() {
    let mut state = ApprovalState::new(user_profile());
    let _token = state.issue_verification_token(Utc::now());

    assert_eq!(
        state.redeem_verification_token("deadbeef", Utc::now(), false),
        Err(ApprovalError::InvalidOrExpiredToken)
    );
    assert!(!state.email_verified);
    assert!(state.verification_token.is_some());
}

#[test]
fn expired_token_is_rejected_with_the_same_error() {
    let mut state = ApprovalState::new(user_profile());
    let issued_at = Utc::now();
    let token = state.issue_verification_token(issued_at);

    let after_expiry = issued_at + Duration::hours(25);
    assert_eq!(
        state.redeem_verification_token(&token, after_expiry, false),
        Err(ApprovalError::InvalidOrExpiredToken)
    );
    assert!(!state.email_verified);
}

#[test]
fn reissuing_invalidates_the_previous_token() {
    let mut state = ApprovalState::new(user_profile());
    let first = state.issue_verification_token(Utc::now());
    let second = state.issue_verification_token(Utc::now());

    assert_eq!(
        state.redeem_verification_token(&first, Utc::now(), false),
        Err(ApprovalError::InvalidOrExpiredToken)
    );
    state
        .redeem_verification_token(&second, Utc::now(), false)
        .unwrap();
    assert!(state.email_verified);
    assert!(state.verification_token.is_none());
    assert!(state.verification_expiry.is_none());
}

#[test]
fn usability_is_an_or_over_both_flags() {
    let mut state = ApprovalState::new(user_profile());
    assert!(!state.is_usable());

    // Verified but unapproved: usable.
    let token = state.issue_verification_token(Utc::now());
    state
        .redeem_verification_token(&token, Utc::now(), false)
        .unwrap();
    assert!(state.email_verified);
    assert!(!state.approved);
    assert!(state.is_usable());

    // Approved but unverified: usable.
    let mut state = ApprovalState::new(user_profile());
    state.set_approval(true, Utc::now());
    assert!(!state.email_verified);
    assert!(state.is_usable());
}

#[test]
fn registration_to_usable_flow() {
    // Register: unverified, unapproved, cannot log in yet.
    let mut state = ApprovalState::new(user_profile());
    let token = state.issue_verification_token(Utc::now());
    assert!(!state.is_usable());

    // Redeem the emailed token: verified, and the gate opens.
    state
        .redeem_verification_token(&token, Utc::now(), false)
        .unwrap();
    assert!(state.is_usable());
    // Without the auto-approve policy, verification alone does not approve.
    assert!(!state.approved);
}

#[test]
fn auto_approve_policy_grants_approval_on_verification() {
    let mut state = ApprovalState::new(user_profile());
    let token = state.issue_verification_token(Utc::now());

    let redeemed_at = Utc::now();
    state
        .redeem_verification_token(&token, redeemed_at, true)
        .unwrap();

    assert!(state.email_verified);
    assert!(state.approved);
    assert_eq!(state.last_approved_at, Some(redeemed_at));
}

#[test]
fn admin_override_tracks_the_approval_timestamp() {
    let mut state = ApprovalState::new(user_profile());

    let first = Utc::now();
    state.set_approval(true, first);
    assert_eq!(state.last_approved_at, Some(first));

    // Revoking keeps the historical timestamp.
    state.set_approval(false, Utc::now());
    assert!(!state.approved);
    assert_eq!(state.last_approved_at, Some(first));

    // Re-approving refreshes it.
    let second = Utc::now();
    state.set_approval(true, second);
    assert_eq!(state.last_approved_at, Some(second));
}
