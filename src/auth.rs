//! Authentication surface. The core only needs "current user, possibly
//! absent"; session subscription mechanics stay with the embedding. The
//! trait is implemented for the hosted service by
//! [`crate::backend::RestStore`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::BackendError;

/// Passwords shorter than this are rejected locally, before any request.
pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserIdentity,
}

pub trait AuthApi {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    fn sign_up(&self, email: &str, password: &str) -> Result<(), BackendError>;

    fn sign_out(&self) -> Result<(), BackendError>;

    fn current_user(&self) -> Result<Option<UserIdentity>, BackendError>;

    /// Ask the backend to email a reset link that lands on `redirect_to`
    /// with a token pair in the URL (see [`parse_recovery_tokens`]).
    fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), BackendError>;

    fn update_password(&self, access_token: &str, new_password: &str) -> Result<(), BackendError>;
}

pub fn password_acceptable(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

/// Token pair carried by a password-reset email link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Extract the access/refresh token pair from a reset link's arrival URL.
/// Accepts a full URL, a bare fragment (with or without `#`), or a query
/// string (with or without `?`). Both tokens must be present.
pub fn parse_recovery_tokens(raw: &str) -> Option<RecoveryTokens> {
    let params = if let Some((_, fragment)) = raw.rsplit_once('#') {
        fragment
    } else if let Some((_, query)) = raw.split_once('?') {
        query
    } else {
        raw
    };

    let mut access_token = None;
    let mut refresh_token = None;
    for pair in params.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "access_token" => access_token = Some(value),
            "refresh_token" => refresh_token = Some(value),
            _ => {}
        }
    }
    Some(RecoveryTokens {
        access_token: access_token?.to_string(),
        refresh_token: refresh_token?.to_string(),
    })
}
