//! API Routes

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health))
        // Book routes
        .route("/api/books", get(handlers::books::list))
        .route("/api/books", post(handlers::books::create))
        .route("/api/books/categories", get(handlers::books::categories))
        .route("/api/books/:id", get(handlers::books::get))
        .route("/api/books/:id", put(handlers::books::update))
        .route("/api/books/:id", delete(handlers::books::delete))
        // User routes
        .route("/api/users", get(handlers::patrons::list))
        .route("/api/users", post(handlers::patrons::create))
        .route("/api/users/types", get(handlers::patrons::types))
        .route("/api/users/:id", get(handlers::patrons::get))
        .route("/api/users/:id", put(handlers::patrons::update))
        .route("/api/users/:id", delete(handlers::patrons::deactivate))
        // Transaction routes
        .route("/api/transactions", get(handlers::loans::list))
        .route("/api/transactions/borrow", post(handlers::loans::borrow))
        .route("/api/transactions/return", post(handlers::loans::return_book))
        .route("/api/transactions/renew", post(handlers::loans::renew))
        .route("/api/transactions/overdue", get(handlers::loans::overdue))
        .route("/api/transactions/sweep", post(handlers::loans::sweep))
        // Analytics routes
        .route("/api/analytics/dashboard", get(handlers::analytics::dashboard))
        .route(
            "/api/analytics/most-borrowed",
            get(handlers::analytics::most_borrowed),
        )
        .route(
            "/api/analytics/user-categories",
            get(handlers::analytics::user_categories),
        )
        .route(
            "/api/analytics/reading-patterns",
            get(handlers::analytics::reading_patterns),
        )
        .route(
            "/api/analytics/monthly-report",
            get(handlers::analytics::monthly_report),
        )
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
