use super::{ApiResult, AppState, bearer_token};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Bearer token for later admin requests
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let token = state
        .sessions
        .login(state.admin.as_deref(), &request.email, &request.password)
        .await?;
    Ok(Json(LoginResponse { token }))
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.logout(token).await;
    }
    StatusCode::NO_CONTENT
}
