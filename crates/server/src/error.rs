//! # HTTP エラー型
//!
//! | エラー | ステータス | ボディ |
//! |--------|-----------|--------|
//! | `Malformed` | 400 | `{"error":"malformed_document","reason":...}` |
//! | `Validation` | 422 | `{"field":...,"reason":...}` |
//! | `Signing` | 500 | `{"error":"signing_failed"}` |

use axum::http::StatusCode;
use axum::Json;
use dte_core::{MalformedDocument, SignError, SigningFailure, ValidationError};
use dte_types::{ErrorBody, ValidationErrorBody};

/// HTTPハンドラのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// 原因はクライアントに返さない
    #[error(transparent)]
    Signing(#[from] SigningFailure),
}

impl From<SignError> for ApiError {
    fn from(err: SignError) -> Self {
        match err {
            SignError::Malformed(e) => ApiError::Malformed(e),
            SignError::Validation(e) => ApiError::Validation(e),
            SignError::Signing(e) => ApiError::Signing(e),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Malformed(e) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "malformed_document".to_string(),
                    reason: Some(e.reason),
                }),
            )
                .into_response(),
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorBody {
                    field: e.field,
                    reason: e.reason,
                }),
            )
                .into_response(),
            ApiError::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "signing_failed".to_string(),
                    reason: None,
                }),
            )
                .into_response(),
        }
    }
}
