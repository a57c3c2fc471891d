//! Error type for `casebook-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("subject {site_code}-{subject_number} already exists")]
  AlreadyExists {
    site_code:      String,
    subject_number: String,
  },

  #[error("version {version} not found for subject {subject_id}")]
  VersionNotFound { subject_id: Uuid, version: i64 },
}

impl From<Error> for casebook_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::SubjectNotFound(id) => Self::SubjectNotFound(id),
      Error::AlreadyExists {
        site_code,
        subject_number,
      } => Self::AlreadyExists {
        site_code,
        subject_number,
      },
      Error::VersionNotFound {
        subject_id,
        version,
      } => Self::VersionNotFound {
        subject_id,
        version,
      },
      Error::Json(e) => Self::Serialization(e),
      other => Self::Storage(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
