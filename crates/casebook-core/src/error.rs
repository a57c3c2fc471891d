//! Error types for `casebook-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("subject {site_code}-{subject_number} already exists")]
  AlreadyExists {
    site_code:      String,
    subject_number: String,
  },

  #[error("version {version} not found for subject {subject_id}")]
  VersionNotFound { subject_id: Uuid, version: i64 },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A backend failure that carries no domain meaning (I/O, SQL, decode).
  #[error("storage error: {0}")]
  Storage(String),
}

impl From<std::convert::Infallible> for Error {
  fn from(i: std::convert::Infallible) -> Self { match i {} }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
