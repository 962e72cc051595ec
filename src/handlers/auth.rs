use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bearer_token, json_body, AppState, MessageResponse};
use crate::db::models::User;
use crate::error::ClinicError;
use crate::store::ClinicStore;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// `POST /api/auth/login`
pub async fn login<S: ClinicStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ClinicError> {
    let request = json_body(body)?;
    let (issued, user) = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout<S: ClinicStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ClinicError> {
    let token =
        bearer_token(&headers).ok_or_else(|| ClinicError::validation("No token provided"))?;
    state.auth.logout(token).await?;
    Ok(Json(MessageResponse {
        message: "Successfully logged out",
    }))
}
