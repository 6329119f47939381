//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use sweater_core::{AccountService, MessageService, SubscriptionService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub subscription_service: SubscriptionService,
    pub message_service: MessageService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` and stores the account in the
/// request extensions. Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.account_service.authenticate_by_token(&token).await {
            Ok(account) => {
                req.extensions_mut().insert(account);
            }
            Err(e) if e.is_server_error() => {
                tracing::warn!(error = %e, "Token lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
