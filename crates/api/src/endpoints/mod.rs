//! API endpoints.

mod account;
mod auth;
mod messages;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(account::router())
        .nest("/users", users::router())
        .nest("/messages", messages::router())
}
