//! Endpoints for the caller's own account.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sweater_common::AppResult;
use sweater_core::{NotificationOutcome, UpdateProfileInput};

use super::users::MeResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Get current account.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::ok(user.into())
}

/// Profile update request.
///
/// Omitting `email` removes the stored address.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Profile update response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileResponse {
    #[serde(flatten)]
    pub account: MeResponse,
    pub notification: NotificationOutcome,
}

/// Change the caller's password and/or email.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UpdateProfileResponse>> {
    let input = UpdateProfileInput {
        password: req.password,
        email: req.email,
    };

    let change = state.account_service.update_profile(user, input).await?;

    Ok(ApiResponse::ok(UpdateProfileResponse {
        account: change.account.into(),
        notification: change.notification,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/i", get(me))
        .route("/i/update", post(update))
}
