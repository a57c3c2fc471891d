//! Handlers for the version-history endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/subjects/:id/versions` | All snapshots, newest first |
//! | `GET` | `/subjects/:id/versions/:version` | JSON null when absent |

use axum::{
  Json,
  extract::{Path, State},
};
use casebook_core::{store::SubjectStore, subject::SubjectVersion};
use uuid::Uuid;

use crate::{AppState, auth::MaybeCaller, error::ApiError};

/// `GET /subjects/:id/versions`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  MaybeCaller(identity): MaybeCaller,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubjectVersion>>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  if identity.is_none() {
    return Ok(Json(Vec::new()));
  }

  let versions = state
    .store
    .get_history(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(versions))
}

/// `GET /subjects/:id/versions/:version`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  MaybeCaller(identity): MaybeCaller,
  Path((id, version)): Path<(Uuid, i64)>,
) -> Result<Json<Option<SubjectVersion>>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  if identity.is_none() {
    return Ok(Json(None));
  }

  let snapshot = state
    .store
    .get_version(id, version)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(snapshot))
}
