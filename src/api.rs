use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, ValidationError};

/// `Json` whose rejection is reported through [`AppError`].
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "rejected json body");
                Err(ValidationError::MalformedJson.into())
            }
        }
    }
}

/// `{success, message}` body for operations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Parses a path id, reporting which entity it was meant to address.
pub fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ValidationError::InvalidId(entity))
}

/// Treats absent and blank values the same way.
pub fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(name)),
    }
}
