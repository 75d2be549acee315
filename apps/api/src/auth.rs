use std::str::FromStr;

use axum::Json;
use axum::http::StatusCode;
use stockroom_core::{AppError, NonEmptyString, Role, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;

pub const SESSION_USER_KEY: &str = "user_identity";

/// POST /auth/login - Start a session for a username and role.
///
/// Credentials are verified by the fronting identity provider; this endpoint
/// only records the resolved principal.
pub async fn login_handler(
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = identity_from_login(payload)?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(subject = identity.subject(), role = %identity.role(), "session started");

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

fn identity_from_login(payload: LoginRequest) -> Result<UserIdentity, AppError> {
    let username = NonEmptyString::new(payload.username)
        .map_err(|_| AppError::Validation("username is required".to_owned()))?;
    let role = Role::from_str(payload.role.as_str())?;

    Ok(UserIdentity::new(String::from(username), role))
}
