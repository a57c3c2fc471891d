//! Handlers for `/subjects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects` | Optional `?created_by=`; empty when unauthenticated |
//! | `POST` | `/subjects` | 201; 409 when the `(site, number)` pair is taken |
//! | `GET`  | `/subjects/by-identifier` | `?site_code=&subject_number=` |
//! | `GET`  | `/subjects/:id` | JSON null when absent or unauthenticated |
//! | `PUT`  | `/subjects/:id` | New snapshot; returns the new version number |
//! | `POST` | `/subjects/:id/rollback` | Restores a prior snapshot, forward |
//! | `POST` | `/subjects/:id/archive` | Soft delete; no snapshot |
//! | `PUT`  | `/subjects/:id/status` | Any transition accepted; no snapshot |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use casebook_core::{
  store::SubjectStore,
  subject::{NewSubject, Subject, SubjectStatus, SubjectUpdate},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Caller, MaybeCaller},
  error::ApiError,
};

/// Response body for mutations that produce a new version.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
  pub version: i64,
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub created_by: Option<String>,
}

/// `GET /subjects[?created_by=<user>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  MaybeCaller(identity): MaybeCaller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  if identity.is_none() {
    return Ok(Json(Vec::new()));
  }

  let subjects = state
    .store
    .list_subjects(params.created_by)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects` — body: `{"site_code", "subject_number", "data"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  let subject = state
    .store
    .create_subject(&identity, body)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(
    subject_id = %subject.subject_id,
    site_code = %subject.site_code,
    subject_number = %subject.subject_number,
    "created subject"
  );
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Point reads ──────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  MaybeCaller(identity): MaybeCaller,
  Path(id): Path<Uuid>,
) -> Result<Json<Option<Subject>>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  if identity.is_none() {
    return Ok(Json(None));
  }

  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subject))
}

#[derive(Debug, Deserialize)]
pub struct IdentifierParams {
  pub site_code:      String,
  pub subject_number: String,
}

/// `GET /subjects/by-identifier?site_code=MSW&subject_number=001`
pub async fn get_by_identifier<S>(
  State(state): State<AppState<S>>,
  MaybeCaller(identity): MaybeCaller,
  Query(params): Query<IdentifierParams>,
) -> Result<Json<Option<Subject>>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  if identity.is_none() {
    return Ok(Json(None));
  }

  let subject = state
    .store
    .get_by_identifier(&params.site_code, &params.subject_number)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subject))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /subjects/:id` — body: `{"data", "change_note"?, "changed_sections"?}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<SubjectUpdate>,
) -> Result<Json<VersionResponse>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  let version = state
    .store
    .update_subject(&identity, id, body)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(subject_id = %id, version, "updated subject");
  Ok(Json(VersionResponse { version }))
}

// ─── Rollback ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RollbackBody {
  pub target_version: i64,
}

/// `POST /subjects/:id/rollback` — body: `{"target_version": 2}`
pub async fn rollback<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<RollbackBody>,
) -> Result<Json<VersionResponse>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  let version = state
    .store
    .rollback(&identity, id, body.target_version)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(
    subject_id = %id,
    target_version = body.target_version,
    version,
    "rolled back subject"
  );
  Ok(Json(VersionResponse { version }))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `POST /subjects/:id/archive`
pub async fn archive<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .archive(&identity, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: SubjectStatus,
}

/// `PUT /subjects/:id/status` — body: `{"status": "complete"}`
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<StatusCode, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .update_status(&identity, id, body.status)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
