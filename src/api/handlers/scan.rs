use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Redirect,
};
use uuid::Uuid;

use crate::{error::AppResult, services::stickers::StickerService, AppState};

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Scan endpoint printed on the stickers themselves. Records the visit and
/// bounces the scanner to the sticker's target URL.
pub async fn scan_sticker(
    State(state): State<AppState>,
    Path(sticker_id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    let user_agent = header_str(&headers, header::USER_AGENT);
    let referrer = header_str(&headers, header::REFERER);
    // First hop of x-forwarded-for is the client.
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim());

    let sticker_service = StickerService::new(state.db, state.gemini.clone());
    let url = sticker_service
        .record_scan(sticker_id, user_agent, ip_address, referrer)
        .await?;

    Ok(Redirect::temporary(&url))
}
