//! JSON REST API for the Casebook subject record service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`casebook_core::store::SubjectStore`]. Every mutating route resolves the
//! caller identity from HTTP Basic credentials before touching the store;
//! read routes degrade to empty results when no identity is presented.

pub mod auth;
pub mod cascade;
pub mod error;
pub mod subjects;
pub mod versions;

#[cfg(test)]
mod tests;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use casebook_core::store::SubjectStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, UserEntry};
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Accounts allowed to resolve a caller identity.
  pub users:      Vec<UserEntry>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: SubjectStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the subject record API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route(
      "/subjects",
      get(subjects::list::<S>).post(subjects::create::<S>),
    )
    .route(
      "/subjects/by-identifier",
      get(subjects::get_by_identifier::<S>),
    )
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>).put(subjects::update::<S>),
    )
    .route("/subjects/{id}/rollback", post(subjects::rollback::<S>))
    .route("/subjects/{id}/archive", post(subjects::archive::<S>))
    .route("/subjects/{id}/status", put(subjects::update_status::<S>))
    .route("/subjects/{id}/versions", get(versions::history::<S>))
    .route(
      "/subjects/{id}/versions/{version}",
      get(versions::get_one::<S>),
    )
    .route("/cascade", post(cascade::evaluate::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
