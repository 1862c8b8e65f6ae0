pub mod catalog;
pub mod placements;
pub mod wallet;

use crate::{
    app_state::AppState,
    middleware::{identity_middleware, internal_key_middleware, logging_middleware},
};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs.max(1));

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .nest("/internal/v1", internal_v1_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}

/// Listing-owner routes; identity comes from the gateway header
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/purchases", post(placements::create_purchase))
        .route("/listings/{listing_id}/bump", post(placements::bump_now))
        .route("/listings/{listing_id}/schedule", get(placements::get_schedule))
        .route(
            "/listings/{listing_id}/placement",
            patch(placements::update_placement),
        )
        .route(
            "/listings/{listing_id}/bump-history",
            get(placements::bump_history),
        )
        .route("/wallet", get(wallet::get_wallet))
        .layer(middleware::from_fn(identity_middleware))
}

/// Service-to-service routes guarded by the internal key
fn internal_v1_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/wallet/credits", post(wallet::credit_wallet))
        .route("/wallet/adjustments", post(wallet::adjust_wallet))
        .route("/products", post(catalog::create_product))
        .route("/products/{code}", patch(catalog::update_product))
        .layer(middleware::from_fn_with_state(
            state,
            internal_key_middleware,
        ))
}
