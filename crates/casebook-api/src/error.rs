//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No caller identity could be resolved for a mutating operation.
  #[error("not authenticated")]
  NotAuthenticated,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(casebook_core::Error),
}

impl ApiError {
  /// Translate a store failure into the HTTP taxonomy: missing rows become
  /// 404, identity-pair collisions 409, everything else 500.
  pub fn from_store<E: Into<casebook_core::Error>>(e: E) -> Self {
    match e.into() {
      err @ casebook_core::Error::SubjectNotFound(_)
      | err @ casebook_core::Error::VersionNotFound { .. } => {
        Self::NotFound(err.to_string())
      }
      err @ casebook_core::Error::AlreadyExists { .. } => {
        Self::Conflict(err.to_string())
      }
      other => Self::Store(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotAuthenticated => {
        (StatusCode::UNAUTHORIZED, self.to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"casebook\""),
      );
    }
    res
  }
}
