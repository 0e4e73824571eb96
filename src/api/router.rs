use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use super::{handlers, middleware::auth_middleware};
use crate::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    // Public auth routes
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Protected auth routes
    let auth_protected = Router::new()
        .route("/me", get(handlers::auth::get_current_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Sticker routes (protected)
    let sticker_routes = Router::new()
        .route("/generate", post(handlers::stickers::generate_sticker))
        .route("/", get(handlers::stickers::list_stickers))
        .route("/:id", get(handlers::stickers::get_sticker))
        .route("/:id/visibility", put(handlers::stickers::update_visibility))
        .route("/:id", delete(handlers::stickers::delete_sticker))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Public sticker view (only is_public stickers resolve)
    let sticker_public_routes = Router::new().route(
        "/:id/public",
        get(handlers::stickers::get_public_sticker),
    );

    // Style catalog (public, static data)
    let style_routes = Router::new().route("/", get(handlers::stickers::list_styles));

    // Combine all routes
    Router::new()
        .nest("/auth", auth_routes.merge(auth_protected))
        .nest("/stickers", sticker_routes.merge(sticker_public_routes))
        .nest("/styles", style_routes)
        .with_state(state)
}
