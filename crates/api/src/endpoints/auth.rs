//! Registration, sign-in and activation endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sweater_common::AppResult;
use sweater_core::{NotificationOutcome, RegisterInput};

use super::users::MeResponse;
use crate::{middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Signup response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(flatten)]
    pub account: MeResponse,
    pub token: String,
    pub notification: NotificationOutcome,
}

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let input = RegisterInput {
        username: req.username,
        password: req.password,
        email: req.email,
    };

    let change = state.account_service.register(input).await?;
    let token = change.account.token.clone().unwrap_or_default();

    Ok(ApiResponse::ok(SignupResponse {
        account: MeResponse::from(change.account),
        token,
        notification: change.notification,
    }))
}

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let account = state
        .account_service
        .sign_in(&req.username, &req.password)
        .await?;

    Ok(ApiResponse::ok(SigninResponse {
        id: account.id,
        username: account.username,
        token: account.token.unwrap_or_default(),
    }))
}

/// Confirm an email address.
async fn activate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<MeResponse>> {
    let account = state.account_service.activate(&code).await?;

    Ok(ApiResponse::ok(MeResponse::from(account)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/activate/{code}", get(activate))
}
