use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Request body too large")]
    PayloadTooLarge(String),

    #[error("Error reading image directory")]
    DirectoryNotFound {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No image files found in {dir} directory.")]
    NoAssetsFound { dir: String },

    #[error("Selected background image not found.")]
    AssetMissing { file: String },

    #[error("Error processing image")]
    InvalidImage(String),

    #[error("Logo unavailable")]
    LogoUnavailable(String),

    #[error("Error generating card")]
    CompositionFailure(String),

    #[error("Configuration error")]
    Config(String),
}

/// Body JSON untuk semua respons error.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn missing_parameters() -> Self {
        Self::BadRequest {
            message: "Missing parameters".to_string(),
            details: None,
        }
    }

    pub fn invalid_body(details: impl Into<String>) -> Self {
        Self::BadRequest {
            message: "Invalid request body".to_string(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DirectoryNotFound { .. } | Self::NoAssetsFound { .. } | Self::AssetMissing { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidImage(_)
            | Self::LogoUnavailable(_)
            | Self::CompositionFailure(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Keterangan tambahan untuk field `details`, jika ada.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::BadRequest { details, .. } => details.clone(),
            Self::MethodNotAllowed | Self::NoAssetsFound { .. } => None,
            Self::DirectoryNotFound { dir, source } => Some(format!("{dir}: {source}")),
            Self::AssetMissing { file } => Some(file.clone()),
            Self::PayloadTooLarge(msg)
            | Self::InvalidImage(msg)
            | Self::LogoUnavailable(msg)
            | Self::CompositionFailure(msg)
            | Self::Config(msg) => Some(msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.to_string(),
            details: self.details(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, details = ?body.details, "{}", body.message);
        } else {
            tracing::warn!(status = %status, details = ?body.details, "{}", body.message);
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
