use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Body(rejection) => {
                let kind = match rejection {
                    JsonRejection::JsonDataError(_) => "InvalidPayload",
                    JsonRejection::JsonSyntaxError(_) => "MalformedJson",
                    JsonRejection::MissingJsonContentType(_) => "UnsupportedMediaType",
                    _ => "BadRequest",
                };
                (rejection.status(), kind, rejection.body_text())
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        } else {
            tracing::debug!("Rejected request body ({}): {}", status, message);
        }

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
