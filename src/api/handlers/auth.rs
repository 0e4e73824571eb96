use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{AccessToken, Profile},
    services::auth::{AuthService, Claims},
    AppState,
};

use super::super::middleware::get_user_id;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: Profile,
    pub token: AccessToken,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let auth_service = AuthService::new(state.db, (*state.config).clone());
    let (user, token) = auth_service
        .register(req.email.trim(), &req.password, req.full_name.as_deref())
        .await?;

    Ok(Json(AuthResponse { user, token }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let auth_service = AuthService::new(state.db, (*state.config).clone());
    let (user, token) = auth_service.login(req.email.trim(), &req.password).await?;

    Ok(Json(AuthResponse { user, token }))
}

pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Profile>> {
    let user_id = get_user_id(&claims)?;

    let auth_service = AuthService::new(state.db, (*state.config).clone());
    let profile = auth_service.get_profile(user_id).await?;

    Ok(Json(profile))
}
