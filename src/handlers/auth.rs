use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, LOGIN_PATH};
use crate::models::{AuthUser, Session};
use crate::services::auth;
use crate::state::AppState;

// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user = auth::register(
        state.backend.as_ref(),
        &body.email,
        &body.password,
        &body.full_name,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "user": user,
            "message": "Account created! You can now log in.",
            "redirect": LOGIN_PATH,
        })),
    ))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    access_token: String,
    user: AuthUser,
    is_admin: bool,
    redirect: &'static str,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = auth::login(state.backend.as_ref(), &body.email, &body.password).await?;

    let identity = outcome
        .session
        .identity()
        .cloned()
        .ok_or_else(|| AppError::Auth("sign-in returned no session".to_string()))?;

    Ok(Json(LoginResponse {
        access_token: identity.access_token,
        user: identity.user,
        is_admin: outcome.session.is_admin(),
        redirect: outcome.redirect,
    }))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::logout(state.backend.as_ref(), session).await?;
    Ok(Json(serde_json::json!({"ok": true, "redirect": "/"})))
}

// GET /api/auth/me
pub async fn me(session: Session) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user": session.user(),
        "is_admin": session.is_admin(),
    }))
}
