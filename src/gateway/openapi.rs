//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{BalanceData, OrderData, WithdrawRequest, WithdrawalData};
use crate::order::OrderStatus;
use crate::user_auth::{AuthResponse, LoginRequest, RegisterRequest};

/// JWT bearer authentication security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token from /api/user/register or /api/user/login: Bearer {jwt}",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Loyalty Mart API",
        version = "1.0.0",
        description = "Loyalty points service: order uploads, accrual reconciliation, balance and withdrawals.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::gateway::handlers::orders::upload_order,
        crate::gateway::handlers::orders::list_orders,
        crate::gateway::handlers::balance::get_balance,
        crate::gateway::handlers::balance::withdraw,
        crate::gateway::handlers::balance::list_withdrawals,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            OrderStatus,
            OrderData,
            BalanceData,
            WithdrawRequest,
            WithdrawalData,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Orders", description = "Order upload and history (auth required)"),
        (name = "Balance", description = "Balance and withdrawals (auth required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
