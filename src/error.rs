use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("screenshot not found: {0}")]
    ScreenshotNotFound(i64),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no image file uploaded")]
    MissingImage,

    #[error("invalid file type {0}: only PNG, JPEG and GIF are allowed")]
    UnsupportedImageType(String),

    #[error("image too large: {size} bytes exceeds {max} bytes")]
    ImageTooLarge { size: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ScreenshotNotFound(_) => AppError::NotFound("Screenshot not found".into()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(err) => err.status(),
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Unauthorized(msg) => {
                msg.clone()
            }
            AppError::Validation(ValidationError::MissingField(_)) => {
                "Invalid screenshot data".to_string()
            }
            AppError::Validation(ValidationError::MissingImage) => {
                "No image file uploaded".to_string()
            }
            AppError::Validation(err) => err.to_string(),
            AppError::Multipart(_) => "Malformed upload".to_string(),
            AppError::Io(_) | AppError::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}
