use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] mongodb::error::Error),

    #[error("Payment request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Payment provider rejected the request ({status}): {message}")]
    PaymentError { status: u16, message: String },

    #[error("Payment provider is not configured")]
    PaymentUnavailable,

    #[error("Invalid token: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Missing authorization token")]
    MissingToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed identifier: {0}")]
    InvalidId(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {message}")]
    StoreError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 請求本身有問題
    Client,
    /// 身分驗證或權限
    Auth,
    /// 外部服務 (資料庫、金流)
    Upstream,
    /// 設定或程式內部錯誤
    Internal,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::InvalidId(_)
            | AppError::InvalidBody(_)
            | AppError::ValidationError { .. }
            | AppError::NotFound(_)
            | AppError::Conflict(_)
            | AppError::SerializationError(_) => ErrorCategory::Client,
            AppError::TokenError(_) | AppError::MissingToken | AppError::Forbidden(_) => {
                ErrorCategory::Auth
            }
            AppError::DatabaseError(_)
            | AppError::HttpError(_)
            | AppError::PaymentError { .. }
            | AppError::PaymentUnavailable => ErrorCategory::Upstream,
            AppError::IoError(_)
            | AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::StoreError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidId(_)
            | AppError::InvalidBody(_)
            | AppError::ValidationError { .. }
            | AppError::SerializationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TokenError(_) | AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::HttpError(_) | AppError::PaymentError { .. } => StatusCode::BAD_GATEWAY,
            AppError::PaymentUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_)
            | AppError::IoError(_)
            | AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::StoreError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.category() {
            ErrorCategory::Upstream | ErrorCategory::Internal => {
                tracing::error!("❌ Request failed: {} (Category: {:?})", self, self.category());
            }
            ErrorCategory::Client | ErrorCategory::Auth => {
                tracing::debug!("Request rejected: {}", self);
            }
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
