//! HTTP Basic-auth extractors resolving the caller [`Identity`].
//!
//! Mutating handlers take [`Caller`], which rejects with 401 before any
//! store access. Read handlers take [`MaybeCaller`] and return empty results
//! when no identity is presented, mirroring the behaviour of unauthenticated
//! queries in the original deployment.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use casebook_core::{identity::Identity, store::SubjectStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// One account accepted by this server instance.
#[derive(Clone, Deserialize)]
pub struct UserEntry {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub users: Vec<UserEntry>,
}

/// Verify credentials directly from headers and resolve the caller identity.
pub fn verify_auth(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<Identity, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::NotAuthenticated)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::NotAuthenticated)?;

  let decoded = B64
    .decode(encoded)
    .map_err(|_| ApiError::NotAuthenticated)?;
  let creds =
    std::str::from_utf8(&decoded).map_err(|_| ApiError::NotAuthenticated)?;

  let (username, password) =
    creds.split_once(':').ok_or(ApiError::NotAuthenticated)?;

  let user = config
    .users
    .iter()
    .find(|u| u.username == username)
    .ok_or(ApiError::NotAuthenticated)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| ApiError::NotAuthenticated)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::NotAuthenticated)?;

  Ok(Identity::new(username))
}

/// Resolved caller identity; extraction fails with 401 when absent.
pub struct Caller(pub Identity);

/// Caller identity if presented; never rejects.
pub struct MaybeCaller(pub Option<Identity>);

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = verify_auth(&parts.headers, &state.auth)?;
    Ok(Caller(identity))
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeCaller
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeCaller(verify_auth(&parts.headers, &state.auth).ok()))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::http::{Request, header};
  use casebook_core::{
    identity::Identity,
    subject::{
      NewSubject, Subject, SubjectStatus, SubjectUpdate, SubjectVersion,
    },
  };

  use super::*;

  // A minimal no-op store for testing auth only.
  #[derive(Clone)]
  struct NoopStore;

  impl SubjectStore for NoopStore {
    type Error = std::convert::Infallible;
    async fn create_subject(&self, _: &Identity, _: NewSubject) -> Result<Subject, Self::Error> { unimplemented!() }
    async fn update_subject(&self, _: &Identity, _: uuid::Uuid, _: SubjectUpdate) -> Result<i64, Self::Error> { unimplemented!() }
    async fn rollback(&self, _: &Identity, _: uuid::Uuid, _: i64) -> Result<i64, Self::Error> { unimplemented!() }
    async fn archive(&self, _: &Identity, _: uuid::Uuid) -> Result<(), Self::Error> { unimplemented!() }
    async fn update_status(&self, _: &Identity, _: uuid::Uuid, _: SubjectStatus) -> Result<(), Self::Error> { unimplemented!() }
    async fn get_subject(&self, _: uuid::Uuid) -> Result<Option<Subject>, Self::Error> { unimplemented!() }
    async fn get_by_identifier(&self, _: &str, _: &str) -> Result<Option<Subject>, Self::Error> { unimplemented!() }
    async fn list_subjects(&self, _: Option<String>) -> Result<Vec<Subject>, Self::Error> { unimplemented!() }
    async fn get_history(&self, _: uuid::Uuid) -> Result<Vec<SubjectVersion>, Self::Error> { unimplemented!() }
    async fn get_version(&self, _: uuid::Uuid, _: i64) -> Result<Option<SubjectVersion>, Self::Error> { unimplemented!() }
  }

  fn make_state(password: &str) -> AppState<NoopStore> {
    use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState {
      store: Arc::new(NoopStore),
      auth:  Arc::new(AuthConfig {
        users: vec![UserEntry {
          username:      "coordinator".to_string(),
          password_hash: hash,
        }],
      }),
    }
  }

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<NoopStore>,
  ) -> Result<Caller, ApiError> {
    let (mut parts, _) = req.into_parts();
    Caller::from_request_parts(&mut parts, state).await
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[tokio::test]
  async fn correct_credentials_resolve_identity() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("coordinator", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    let caller = extract(req, &state).await.unwrap();
    assert_eq!(caller.0.user_id, "coordinator");
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("coordinator", "wrong"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::NotAuthenticated)
    ));
  }

  #[tokio::test]
  async fn unknown_user() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("stranger", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::NotAuthenticated)
    ));
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state("secret");
    let req = Request::builder()
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::NotAuthenticated)
    ));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::NotAuthenticated)
    ));
  }

  #[tokio::test]
  async fn maybe_caller_never_rejects() {
    let state = make_state("secret");
    let req = Request::builder()
      .body(axum::body::Body::empty())
      .unwrap();
    let (mut parts, _) = req.into_parts();
    let MaybeCaller(identity) =
      MaybeCaller::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(identity.is_none());
  }
}
