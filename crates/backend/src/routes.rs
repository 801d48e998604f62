use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{api::handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SYSTEM AUTH ROUTES (PUBLIC)
        // ========================================
        .route(
            "/api/system/auth/login",
            post(system::handlers::auth::login),
        )
        // System auth routes (protected)
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_user)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // A001 Analysis session
        // ========================================
        .route(
            "/api/a001-session",
            get(handlers::a001_analysis_session::get_current)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/a001-session/finish",
            post(handlers::a001_analysis_session::finish)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // A002 Conversation (SSE ask аутентифицируется токеном в query:
        // EventSource не умеет заголовки)
        // ========================================
        .route(
            "/api/a002-conversation/ask",
            get(handlers::a002_conversation::ask),
        )
        .route(
            "/api/a002-conversation/cancel",
            post(handlers::a002_conversation::cancel)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // A003 Artifacts
        // ========================================
        .route(
            "/api/a003-artifact/list",
            get(handlers::a003_artifact::list)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/a003-artifact/:file_id",
            get(handlers::a003_artifact::download)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // P900 Dataset preview
        // ========================================
        .route(
            "/api/p900/dataset-preview",
            get(handlers::p900_dataset_preview::get)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
}
