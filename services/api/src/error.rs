//! Error envelope of the HTTP layer
//!
//! Every failure leaves the server as `{code, message, error}` where `error`
//! names the category and `code` repeats the status. Internal failures are
//! logged here and reported with a generic message.

use auth::AuthError;
use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::DatabaseError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::upload::UploadError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub error: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not found",
            ApiError::Internal(_) => "internal server error",
        }
    }

    fn internal(source: impl std::fmt::Display) -> Self {
        error!("Internal error: {}", source);
        ApiError::Internal("Internal Server Error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            code: status.as_u16(),
            error: self.category(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::InvalidId { .. } | DatabaseError::Validation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            DatabaseError::NotFound(message) => ApiError::NotFound(message),
            other => ApiError::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken(_)
            | AuthError::SessionSuperseded => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::AlreadyRegistered | AuthError::Validation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::Database(db) => db.into(),
            other => ApiError::internal(other),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Empty | UploadError::TooLarge { .. } | UploadError::UnsupportedType => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_categories() {
        let err: ApiError = DatabaseError::invalid_id("id", "xyz").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid id: xyz");

        let err: ApiError = DatabaseError::NotFound("book not found".to_string()).into();
        assert_eq!(err.category(), "not found");

        let err: ApiError = DatabaseError::Timeout("aggregate").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn auth_errors_map_onto_categories() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::SessionSuperseded, StatusCode::UNAUTHORIZED),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::AlreadyRegistered, StatusCode::BAD_REQUEST),
            (
                AuthError::Database(DatabaseError::Validation("No fields to update".into())),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::Hashing("bad salt".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn upload_errors_are_client_errors_unless_io() {
        let err: ApiError = UploadError::UnsupportedType.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ApiError = UploadError::Io(io).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn non_multipart_uploads_get_the_envelope() {
        use axum::{Router, body::Body, extract::Multipart, http::Request, routing::post};
        use axum_extra::extract::WithRejection;
        use tower::ServiceExt;

        async fn accept(WithRejection(_, _): WithRejection<Multipart, ApiError>) -> StatusCode {
            StatusCode::OK
        }

        let response = Router::new()
            .route("/upload", post(accept))
            .oneshot(
                Request::post("/upload")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 400);
        assert_eq!(body["error"], "bad request");
    }

    #[tokio::test]
    async fn envelope_repeats_the_status() {
        let response = ApiError::Forbidden("Forbidden Access".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "code": 403, "message": "Forbidden Access", "error": "forbidden" })
        );
    }
}
