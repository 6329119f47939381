//! Users endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sweater_common::{AppError, AppResult};
use sweater_core::{Account, ChannelStats, EditUserInput};
use sweater_db::entities::user::Role;

use super::messages::MessageResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public view of an account.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub username: String,
    pub roles: Vec<Role>,
    pub active: bool,
    pub subscribers_count: usize,
    pub subscriptions_count: usize,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            created_at: account.created_at.to_rfc3339(),
            username: account.username,
            roles: account.roles.into_iter().collect(),
            active: account.active,
            subscribers_count: account.subscribers.len(),
            subscriptions_count: account.subscriptions.len(),
        }
    }
}

/// The caller's own account, including private fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub email: Option<String>,
    pub email_confirmed: bool,
}

impl From<Account> for MeResponse {
    fn from(account: Account) -> Self {
        let email_confirmed = account.is_confirmed();
        let email = account.email.clone();

        Self {
            user: UserResponse::from(account),
            email,
            email_confirmed,
        }
    }
}

/// List all users.
async fn list(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let accounts = state.account_service.find_all().await?;

    Ok(ApiResponse::ok(
        accounts.into_iter().map(UserResponse::from).collect(),
    ))
}

/// A user's channel: the account, its messages and subscription counters.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub user: UserResponse,
    pub stats: ChannelStats,
    pub messages: Vec<MessageResponse>,
}

/// Show a user's channel.
async fn channel(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ChannelResponse>> {
    let channel = state.account_service.find_by_id(&user_id).await?;
    let stats = state.subscription_service.channel_stats(&viewer, &channel);
    let messages = state.message_service.by_author(&channel.id).await?;

    Ok(ApiResponse::ok(ChannelResponse {
        user: UserResponse::from(channel),
        stats,
        messages: messages
            .into_iter()
            .map(|m| MessageResponse::new(m, &state.message_service))
            .collect(),
    }))
}

/// Edit user request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserRequest {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Replace a user's name and roles. Administrators only.
async fn edit(
    AuthUser(admin): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<EditUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    if !admin.is_admin() {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }

    let account = state.account_service.find_by_id(&user_id).await?;
    let input = EditUserInput {
        username: req.username,
        roles: req.roles,
    };

    let account = state.account_service.edit_user(account, input).await?;

    Ok(ApiResponse::ok(account.into()))
}

/// Subscribe to a user's channel.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ChannelStats>> {
    let target = state.account_service.find_by_id(&user_id).await?;
    let target = state.subscription_service.subscribe(&user, target).await?;

    Ok(ApiResponse::ok(
        state.subscription_service.channel_stats(&user, &target),
    ))
}

/// Unsubscribe from a user's channel.
async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ChannelStats>> {
    let target = state.account_service.find_by_id(&user_id).await?;
    let target = state.subscription_service.unsubscribe(&user, target).await?;

    Ok(ApiResponse::ok(
        state.subscription_service.channel_stats(&user, &target),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(channel))
        .route("/{id}/edit", post(edit))
        .route("/{id}/subscribe", post(subscribe))
        .route("/{id}/unsubscribe", post(unsubscribe))
}
