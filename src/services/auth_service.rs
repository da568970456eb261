use serde_json::Value;

use crate::{
    dto::auth::{AuthResult, LoginRequest, MeResponse, SignUpRequest, UpdateProfileRequest},
    error::{AppError, AppResult},
    identity::{IdentityError, IdentityUpdate, IdentityUser, NewIdentity, UserMetadata},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn sign_up(state: &AppState, payload: SignUpRequest) -> AppResult<ApiResponse<AuthResult>> {
    let SignUpRequest {
        email,
        password,
        full_name,
        phone,
    } = payload;
    validate_email(&email)?;

    let identity = NewIdentity {
        email,
        password,
        data: UserMetadata {
            full_name: Some(full_name),
            phone: Some(phone),
            addresses: Some(Vec::new()),
            ..Default::default()
        },
    };

    let session = state
        .identity
        .sign_up(&identity)
        .await
        .map_err(|err| rejection_as(err, AppError::BadRequest))?;

    if session.tokens.is_none() && session.user.is_none() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "identity provider returned neither session nor user on sign-up"
        )));
    }

    if let Some(user) = &session.user {
        tracing::info!(user_id = %user.id, "user signed up");
    }

    Ok(ApiResponse::success(
        "Registration successful",
        AuthResult {
            session: session.tokens,
            user: session.user,
        },
        None,
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<AuthResult>> {
    let LoginRequest { email, password } = payload;

    let session = state
        .identity
        .sign_in(&email, &password)
        .await
        .map_err(|err| {
            rejection_as(err, |_| {
                AppError::Unauthorized("Invalid email or password".into())
            })
        })?;

    let Some(tokens) = session.tokens else {
        return Err(AppError::Unauthorized("Login failed".into()));
    };

    Ok(ApiResponse::success(
        "Logged in",
        AuthResult {
            session: Some(tokens),
            user: session.user,
        },
        Some(Meta::empty()),
    ))
}

pub fn me(user: AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::success("Current user", MeResponse { user: user.user }, Some(Meta::empty()))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<AuthResult>> {
    let update = profile_update(&user.user, payload)?;

    if update.is_empty() {
        return Ok(ApiResponse::success(
            "No changes detected",
            AuthResult {
                session: None,
                user: Some(user.user.clone()),
            },
            Some(Meta::empty()),
        ));
    }

    state
        .identity
        .update_user(user.user_id(), &update)
        .await
        .map_err(|err| rejection_as(err, AppError::BadRequest))?;

    let refreshed = state
        .identity
        .user_by_id(user.user_id())
        .await
        .map_err(|err| rejection_as(err, AppError::BadRequest))?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %user.user_id(), "profile updated");
    Ok(ApiResponse::success(
        "Profile updated",
        AuthResult {
            session: None,
            user: Some(refreshed),
        },
        Some(Meta::empty()),
    ))
}

/// Diff of the request against the current user. Metadata is merged, so keys
/// the request does not mention survive.
pub fn profile_update(current: &IdentityUser, payload: UpdateProfileRequest) -> AppResult<IdentityUpdate> {
    let mut metadata = current.user_metadata.clone();
    if let Some(full_name) = payload.full_name {
        metadata.full_name = Some(full_name);
    }
    if let Some(phone) = payload.phone {
        metadata.phone = Some(phone);
    }
    if let Some(addresses) = payload.addresses {
        let addresses = addresses
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(|e| AppError::Internal(e.into()))?;
        metadata.addresses = Some(addresses);
    }

    let email = match payload.email {
        Some(email) if current.email.as_deref() != Some(email.as_str()) => {
            validate_email(&email)?;
            Some(email)
        }
        _ => None,
    };

    Ok(IdentityUpdate {
        email,
        password: payload.password,
        user_metadata: (metadata != current.user_metadata).then_some(metadata),
    })
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    Ok(())
}

/// Client-side refusals become `on_rejection(message)`; outages become
/// gateway errors.
fn rejection_as(err: IdentityError, on_rejection: impl FnOnce(String) -> AppError) -> AppError {
    match err {
        IdentityError::Rejected { status, message } if (400..500).contains(&status) => {
            on_rejection(message)
        }
        other => AppError::gateway(other.status(), other.to_string()),
    }
}
