//! HTTP gateway
//!
//! Thin axum layer over [`OrderIntake`](crate::intake::OrderIntake),
//! [`WithdrawalGuard`](crate::withdrawal::WithdrawalGuard),
//! [`LedgerService`](crate::ledger::LedgerService) and
//! [`UserAuthService`](crate::user_auth::UserAuthService).

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Build the complete router
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Auth Routes (public)
    // ==========================================================================
    let auth_routes = Router::new()
        .route("/register", post(crate::user_auth::handlers::register))
        .route("/login", post(crate::user_auth::handlers::login));

    // ==========================================================================
    // User Routes - Protected by JWT
    // ==========================================================================
    let user_routes = Router::new()
        .route(
            "/orders",
            post(handlers::upload_order).get(handlers::list_orders),
        )
        .route("/balance", get(handlers::get_balance))
        .route("/balance/withdraw", post(handlers::withdraw))
        .route("/withdrawals", get(handlers::list_withdrawals))
        .layer(from_fn_with_state(
            state.clone(),
            crate::user_auth::middleware::jwt_auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .nest("/api/user", auth_routes.merge(user_routes))
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}
