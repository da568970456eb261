use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use sea_orm::EntityTrait;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    entity::Profiles,
    error::{AppError, AppResult},
    identity::{IdentityError, IdentityUser, UserMetadata},
    state::AppState,
};

const ADMIN_FLAG_KEYS: [&str; 3] = ["is_admin", "admin", "role"];

/// Caller authenticated through the identity provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: IdentityUser,
    pub token: String,
}

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Present when a valid bearer token was sent. Missing or rejected tokens
/// yield `None`; a provider outage is still an error.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

pub async fn ensure_admin(state: &AppState, user: &AuthUser) -> AppResult<()> {
    if !is_admin(state, user).await {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// The `profiles.role` column decides first; if it is unreadable or not
/// `admin`, user metadata flags are consulted.
pub async fn is_admin(state: &AppState, user: &AuthUser) -> bool {
    match Profiles::find_by_id(user.user_id()).one(&state.orm).await {
        Ok(Some(profile)) => {
            if profile
                .role
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case("admin"))
            {
                return true;
            }
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(user_id = %user.user_id(), error = %err, "profile role lookup failed");
        }
    }
    metadata_grants_admin(&user.user.user_metadata)
}

pub fn metadata_grants_admin(metadata: &UserMetadata) -> bool {
    if metadata.extra.get("is_admin").is_some_and(is_truthy_flag) {
        return true;
    }
    ADMIN_FLAG_KEYS.iter().any(|key| {
        metadata
            .extra
            .get(*key)
            .and_then(Value::as_str)
            .is_some_and(|v| {
                ["1", "true", "yes", "admin"]
                    .iter()
                    .any(|flag| v.eq_ignore_ascii_case(flag))
            })
    })
}

fn is_truthy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0",
        _ => false,
    }
}

pub fn bearer_token(parts: &Parts) -> AppResult<Option<&str>> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let (scheme, token) = auth_str.split_once(' ').unwrap_or((auth_str, ""));
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
    }
    Ok(Some(token))
}

async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let user = state
        .identity
        .user_for_token(token)
        .await
        .map_err(|err| match err {
            e if e.is_rejection() => AppError::Unauthorized("Invalid or expired token".into()),
            IdentityError::Rejected { status, message } => AppError::gateway(Some(status), message),
            e => AppError::gateway(e.status(), e.to_string()),
        })?;

    Ok(AuthUser {
        user,
        token: token.to_string(),
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
        authenticate(state, token).await
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Ok(Some(token)) => token,
            Ok(None) | Err(AppError::Unauthorized(_)) => return Ok(OptionalAuthUser(None)),
            Err(err) => return Err(err),
        };
        match authenticate(state, token).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(AppError::Unauthorized(_)) => Ok(OptionalAuthUser(None)),
            Err(err) => Err(err),
        }
    }
}
