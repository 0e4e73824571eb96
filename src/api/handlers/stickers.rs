use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    generation::styles,
    models::Sticker,
    services::{
        auth::Claims,
        stickers::{GenerateStickerInput, StickerService},
    },
    AppState,
};

use super::super::middleware::get_user_id;

#[derive(Debug, Deserialize)]
pub struct GenerateStickerRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[serde(rename = "styleKey")]
    pub style_key: Option<String>,
    #[serde(rename = "qrCodeDataURL")]
    pub qr_code_data_url: Option<String>,
}

/// Client-facing sticker envelope; omits the style snapshot and counters.
#[derive(Debug, Serialize)]
pub struct StickerSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub qr_code_data: Option<String>,
    pub sticker_image_url: Option<String>,
    pub theme: String,
    pub created_at: DateTime<Utc>,
}

impl From<Sticker> for StickerSummary {
    fn from(s: Sticker) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            url: s.url,
            qr_code_data: s.qr_code_data,
            sticker_image_url: s.sticker_image_url,
            theme: s.theme,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateStickerResponse {
    pub success: bool,
    pub sticker: StickerSummary,
}

pub async fn generate_sticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GenerateStickerRequest>,
) -> AppResult<Json<GenerateStickerResponse>> {
    let user_id = get_user_id(&claims)?;

    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    let sticker = sticker_service
        .generate(
            user_id,
            GenerateStickerInput {
                title: req.title,
                url: req.url,
                description: req.description,
                style_key: req.style_key,
                qr_code_data_url: req.qr_code_data_url,
            },
        )
        .await?;

    Ok(Json(GenerateStickerResponse {
        success: true,
        sticker: sticker.into(),
    }))
}

pub async fn list_stickers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Sticker>>> {
    let user_id = get_user_id(&claims)?;

    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    let stickers = sticker_service.list_stickers(user_id).await?;

    Ok(Json(stickers))
}

pub async fn get_sticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sticker_id): Path<Uuid>,
) -> AppResult<Json<Sticker>> {
    let user_id = get_user_id(&claims)?;

    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    let sticker = sticker_service.get_sticker(user_id, sticker_id).await?;

    Ok(Json(sticker))
}

pub async fn get_public_sticker(
    State(state): State<AppState>,
    Path(sticker_id): Path<Uuid>,
) -> AppResult<Json<StickerSummary>> {
    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    let sticker = sticker_service.get_public_sticker(sticker_id).await?;

    Ok(Json(sticker.into()))
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

pub async fn update_visibility(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sticker_id): Path<Uuid>,
    Json(req): Json<VisibilityRequest>,
) -> AppResult<Json<Sticker>> {
    let user_id = get_user_id(&claims)?;

    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    let sticker = sticker_service
        .set_visibility(user_id, sticker_id, req.is_public)
        .await?;

    Ok(Json(sticker))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_sticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sticker_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let user_id = get_user_id(&claims)?;

    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    sticker_service.delete_sticker(user_id, sticker_id).await?;

    Ok(Json(MessageResponse {
        message: "Sticker deleted".to_string(),
    }))
}

pub async fn list_styles() -> Json<Vec<&'static styles::StickerStyle>> {
    Json(styles::all().to_vec())
}
