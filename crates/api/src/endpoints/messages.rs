//! Message endpoints.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sweater_common::{AppError, AppResult};
use sweater_core::{Attachment, CreateMessageInput, MessageService, UpdateMessageInput};
use sweater_db::entities::message;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Message response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub tag: Option<String>,
    pub filename: Option<String>,
    pub file_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl MessageResponse {
    pub fn new(message: message::Model, service: &MessageService) -> Self {
        Self {
            file_url: message
                .filename
                .as_deref()
                .map(|f| service.attachment_url(f)),
            id: message.id,
            author_id: message.author_id,
            text: message.text,
            tag: message.tag,
            filename: message.filename,
            created_at: message.created_at.to_rfc3339(),
            updated_at: message.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Fields of a message form.
#[derive(Default)]
struct MessageForm {
    text: Option<String>,
    tag: Option<String>,
    attachment: Option<Attachment>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<MessageForm> {
    let mut form = MessageForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();

                form.attachment = Some(Attachment {
                    original_name,
                    content_type,
                    data,
                });
            }
            "text" | "tag" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if name == "text" {
                    form.text = Some(value);
                } else {
                    form.tag = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Message list query.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tag: Option<String>,
}

/// List messages, optionally filtered by tag.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<MessageResponse>>> {
    let messages = state.message_service.filter(query.tag.as_deref()).await?;

    Ok(ApiResponse::ok(
        messages
            .into_iter()
            .map(|m| MessageResponse::new(m, &state.message_service))
            .collect(),
    ))
}

/// Post a message.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<MessageResponse>> {
    let form = read_form(multipart).await?;

    let input = CreateMessageInput {
        text: form.text.unwrap_or_default(),
        tag: form.tag,
    };

    let message = state
        .message_service
        .post(&user, input, form.attachment)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::new(
        message,
        &state.message_service,
    )))
}

/// Edit one of the caller's messages.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<MessageResponse>> {
    let form = read_form(multipart).await?;

    let input = UpdateMessageInput {
        text: form.text,
        tag: form.tag,
    };

    let message = state
        .message_service
        .update(&user, &message_id, input, form.attachment)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::new(
        message,
        &state.message_service,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", post(update))
}
