use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::jwt::TokenError;
use crate::auth::verification::VerificationError;
use crate::store::StoreError;

/// Error returned by every handler; renders as `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("User already exists")]
    DuplicateEmail,
    #[error("{0}")]
    InvalidData(String),
    #[error("User is already an admin")]
    AlreadyAdmin,
    #[error("Admin request is already pending")]
    RequestAlreadyPending,
    #[error("No pending admin request found for this user")]
    NoPendingRequest,
    #[error("Invalid status")]
    InvalidStatus,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Record was modified concurrently, retry the request")]
    Conflict,
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail
            | AppError::InvalidData(_)
            | AppError::AlreadyAdmin
            | AppError::RequestAlreadyPending
            | AppError::NoPendingRequest
            | AppError::InvalidStatus
            | AppError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::Stale => AppError::Conflict,
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::InvalidOrExpiredToken
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::AlreadyAdmin => AppError::AlreadyAdmin,
            VerificationError::RequestAlreadyPending => AppError::RequestAlreadyPending,
            VerificationError::NoPendingRequest => AppError::NoPendingRequest,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidData(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidData(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AppError::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        let body = Json(ErrorBody {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
