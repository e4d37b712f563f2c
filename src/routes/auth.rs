use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::auth::{LoginAck, LoginRequest, RegisterRequest, TokenResponse, VerifyRequest};
use crate::models::user::UserProfile;
use crate::routes::ApiError;

/// POST /api/v1/auth/register — create a portal account.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    req.validate()?;

    if queries::get_user_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::EmailTaken);
    }

    let password = req.password.clone();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|_| ApiError::Internal)?;

    let user = queries::create_user(&state.db, &req.username, &req.email, &hash).await?;
    tracing::info!(email = %user.email, "account registered");
    Ok(Json(UserProfile::from(user)))
}

/// POST /api/v1/auth/login — check credentials and dispatch a one-time code.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginAck>, ApiError> {
    req.validate()?;
    metrics::counter!("login_attempts_total").increment(1);

    // Unknown email and wrong password are indistinguishable to the caller.
    let Some(user) = queries::get_user_by_email(&state.db, &req.email).await? else {
        return Err(ApiError::InvalidCredentials);
    };

    let password = req.password.clone();
    let hash = user.hashed_password.clone();
    let credentials_match = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|_| ApiError::Internal)?;
    if !credentials_match {
        return Err(ApiError::InvalidCredentials);
    }

    let code = state.challenges.issue(&req.email);
    tracing::debug!(email = %req.email, "verification code issued");

    // Dispatch is best-effort: a relay hiccup must not abort the login flow.
    if let Err(err) = state.mailer.send_code(&req.email, &code).await {
        tracing::error!(email = %req.email, error = %err, "failed to send verification code");
    }

    Ok(Json(LoginAck {
        message: "Verification code sent to your email".to_string(),
    }))
}

/// POST /api/v1/auth/verify — trade a valid code for a session token.
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    req.validate()?;

    state
        .challenges
        .verify_and_consume(&req.email, &req.code)
        .map_err(|_| ApiError::InvalidCode)?;

    let access_token = state
        .tokens
        .issue(&req.email)
        .map_err(|_| ApiError::Internal)?;
    metrics::counter!("logins_completed_total").increment(1);
    tracing::info!(email = %req.email, "login verified");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
