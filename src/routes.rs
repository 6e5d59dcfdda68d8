use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/booking/form", get(handlers::booking::booking_form))
        .route("/api/bookings", post(handlers::booking::submit_booking))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route("/api/admin/bookings/:id", get(handlers::admin::get_booking))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::update_status),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match origin.parse::<HeaderValue>() {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ),
        Err(_) => {
            tracing::warn!(origin, "ignoring invalid CORS_ORIGIN");
            None
        }
    }
}
