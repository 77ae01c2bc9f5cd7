use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use std::sync::Arc;
use validator::Validate;

use super::service::{AuthError, AuthResponse, LoginRequest, RegisterRequest};
use crate::gateway::types::{ApiError, error_codes};
use crate::gateway::{state::AppState, types::ApiResponse};

type AuthReply = (StatusCode, HeaderMap, Json<ApiResponse<AuthResponse>>);

/// Token goes in the body and in the `Authorization` response header
fn auth_reply(resp: AuthResponse) -> Result<AuthReply, ApiError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", resp.token)).map_err(|e| {
        tracing::error!("Token is not a valid header value: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(
                error_codes::INTERNAL_ERROR,
                "Failed to issue token",
            )),
        )
    })?;
    headers.insert(header::AUTHORIZATION, value);
    Ok((StatusCode::OK, headers, Json(ApiResponse::success(resp))))
}

fn invalid_input(e: validator::ValidationErrors) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            error_codes::INVALID_PARAMETER,
            format!("Invalid login or password: {}", e),
        )),
    )
}

/// Register a new user
///
/// POST /api/user/register
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered and logged in", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Login already taken"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<AuthReply, ApiError> {
    req.validate().map_err(invalid_input)?;

    match state.user_auth.register(req).await {
        Ok(resp) => auth_reply(resp),
        Err(AuthError::LoginTaken(login)) => {
            tracing::warn!("Registration attempt for existing login: {}", login);
            Err((
                StatusCode::CONFLICT,
                Json(ApiResponse::<()>::error(
                    error_codes::LOGIN_TAKEN,
                    "Login already taken",
                )),
            ))
        }
        Err(e) => {
            tracing::error!("Registration failed: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(
                    error_codes::INTERNAL_ERROR,
                    "Registration failed",
                )),
            ))
        }
    }
}

/// Login user
///
/// POST /api/user/login
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<AuthReply, ApiError> {
    req.validate().map_err(invalid_input)?;

    match state.user_auth.login(req).await {
        Ok(resp) => auth_reply(resp),
        Err(AuthError::InvalidCredentials) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::AUTH_FAILED,
                "Invalid login or password",
            )),
        )),
        Err(e) => {
            tracing::error!("Login failed: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(
                    error_codes::INTERNAL_ERROR,
                    "Login failed",
                )),
            ))
        }
    }
}
