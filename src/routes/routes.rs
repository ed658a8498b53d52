//! Defines routes for client and image operations.
//!
//! ## Structure
//! - **Client endpoints**
//!   - `GET    /clients/count` — total number of clients
//!   - `GET    /clients`       — list (supports sort, page, search, filters)
//!   - `POST   /clients`       — create
//!   - `GET    /clients/{id}`  — show
//!   - `PUT    /clients/{id}`  — update
//!   - `DELETE /clients/{id}`  — remove
//!
//! - **Image endpoints**
//!   - `POST   /images` — upload a temporary image (multipart field `image`)
//!
//! Anything else is served from the public directory, falling back to a
//! JSON 404.

use crate::{
    errors::AppError,
    handlers::{
        client_handlers::{
            count_clients, create_client, list_clients, remove_client, show_client,
            update_client,
        },
        health_handlers::{healthz, readyz},
        image_handlers::upload_image,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the API router.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Client routes
        .route("/clients/count", get(count_clients))
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(show_client).put(update_client).delete(remove_client),
        )
        // Image routes
        .route(
            "/images",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// The complete application: API routes, static assets and request tracing.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    let assets = ServeDir::new(&state.public_dir).not_found_service(not_found.into_service());

    routes(max_upload_bytes)
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::not_found("Not Found")
}
