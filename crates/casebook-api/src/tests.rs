//! End-to-end tests: full router against an in-memory SQLite store.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use casebook_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  AppState,
  auth::{AuthConfig, UserEntry},
  router,
};

const USER: &str = "coordinator";
const PASS: &str = "protocol-123";

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("store");
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(PASS.as_bytes(), &salt)
    .unwrap()
    .to_string();

  router(AppState {
    store: Arc::new(store),
    auth:  Arc::new(AuthConfig {
      users: vec![UserEntry {
        username:      USER.into(),
        password_hash: hash,
      }],
    }),
  })
}

fn basic_auth() -> String {
  let encoded = B64.encode(format!("{USER}:{PASS}"));
  format!("Basic {encoded}")
}

fn get(path: &str, authed: bool) -> Request<Body> {
  let mut builder = Request::builder().method("GET").uri(path);
  if authed {
    builder = builder.header(header::AUTHORIZATION, basic_auth());
  }
  builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, path: &str, body: &Value, authed: bool) -> Request<Body> {
  let mut builder = Request::builder()
    .method(method)
    .uri(path)
    .header(header::CONTENT_TYPE, "application/json");
  if authed {
    builder = builder.header(header::AUTHORIZATION, basic_auth());
  }
  builder
    .body(Body::from(serde_json::to_vec(body).unwrap()))
    .unwrap()
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn new_subject_body() -> Value {
  json!({
    "site_code": "MSW",
    "subject_number": "001",
    "data": { "acs_risk": { "risk_arm": "Low" } }
  })
}

/// Create one subject and return its id.
async fn create_subject(app: &Router) -> String {
  let (status, body) =
    call(app, send_json("POST", "/subjects", &new_subject_body(), true))
      .await;
  assert_eq!(status, StatusCode::CREATED);
  body["subject_id"].as_str().unwrap().to_owned()
}

// ─── Auth gate ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthenticated_mutation_rejected_before_any_write() {
  let app = app().await;

  let (status, body) =
    call(&app, send_json("POST", "/subjects", &new_subject_body(), false))
      .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "not authenticated");

  // Nothing was written.
  let (status, listed) = call(&app, get("/subjects", true)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn unauthenticated_reads_return_empty() {
  let app = app().await;
  let id = create_subject(&app).await;

  let (status, listed) = call(&app, get("/subjects", false)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed, json!([]));

  let (status, subject) =
    call(&app, get(&format!("/subjects/{id}"), false)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(subject, Value::Null);

  let (status, history) =
    call(&app, get(&format!("/subjects/{id}/versions"), false)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(history, json!([]));
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_subject() {
  let app = app().await;
  let id = create_subject(&app).await;

  let (status, subject) =
    call(&app, get(&format!("/subjects/{id}"), true)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(subject["site_code"], "MSW");
  assert_eq!(subject["current_version"], 1);
  assert_eq!(subject["status"], "draft");
  assert_eq!(subject["created_by"], USER);
  assert_eq!(subject["data"]["acs_risk"]["risk_arm"], "Low");
}

#[tokio::test]
async fn duplicate_create_conflicts() {
  let app = app().await;
  create_subject(&app).await;

  let (status, _) =
    call(&app, send_json("POST", "/subjects", &new_subject_body(), true))
      .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_by_identifier() {
  let app = app().await;
  let id = create_subject(&app).await;

  let (status, subject) = call(
    &app,
    get("/subjects/by-identifier?site_code=MSW&subject_number=001", true),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(subject["subject_id"], id.as_str());

  let (status, subject) = call(
    &app,
    get("/subjects/by-identifier?site_code=MSW&subject_number=999", true),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(subject, Value::Null);
}

// ─── Versioning flow ─────────────────────────────────────────────────────────

#[tokio::test]
async fn update_rollback_and_history_flow() {
  let app = app().await;
  let id = create_subject(&app).await;

  let update = json!({
    "data": { "acs_risk": { "risk_arm": "High" } },
    "change_note": "changed risk",
    "changed_sections": ["acs_risk"]
  });
  let (status, body) = call(
    &app,
    send_json("PUT", &format!("/subjects/{id}"), &update, true),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["version"], 2);

  let (status, body) = call(
    &app,
    send_json(
      "POST",
      &format!("/subjects/{id}/rollback"),
      &json!({ "target_version": 1 }),
      true,
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["version"], 3);

  // History is newest-first and every snapshot is intact.
  let (status, history) =
    call(&app, get(&format!("/subjects/{id}/versions"), true)).await;
  assert_eq!(status, StatusCode::OK);
  let versions: Vec<i64> = history
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v["version"].as_i64().unwrap())
    .collect();
  assert_eq!(versions, vec![3, 2, 1]);
  assert_eq!(history[0]["data"]["acs_risk"]["risk_arm"], "Low");
  assert_eq!(history[0]["change_note"], "Rolled back to version 1");
  assert_eq!(history[1]["data"]["acs_risk"]["risk_arm"], "High");
  assert_eq!(history[2]["data"]["acs_risk"]["risk_arm"], "Low");

  // Current state reflects the restored snapshot.
  let (_, subject) = call(&app, get(&format!("/subjects/{id}"), true)).await;
  assert_eq!(subject["current_version"], 3);
  assert_eq!(subject["data"]["acs_risk"]["risk_arm"], "Low");
}

#[tokio::test]
async fn rollback_to_missing_version_is_404() {
  let app = app().await;
  let id = create_subject(&app).await;

  let (status, _) = call(
    &app,
    send_json(
      "POST",
      &format!("/subjects/{id}/rollback"),
      &json!({ "target_version": 9 }),
      true,
    ),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn point_version_lookup() {
  let app = app().await;
  let id = create_subject(&app).await;

  let (status, snapshot) =
    call(&app, get(&format!("/subjects/{id}/versions/1"), true)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(snapshot["version"], 1);
  assert_eq!(snapshot["change_note"], "Initial creation");

  let (status, snapshot) =
    call(&app, get(&format!("/subjects/{id}/versions/5"), true)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(snapshot, Value::Null);
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_and_status_updates_do_not_version() {
  let app = app().await;
  let id = create_subject(&app).await;

  let (status, _) = call(
    &app,
    send_json("POST", &format!("/subjects/{id}/archive"), &json!({}), true),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, subject) = call(&app, get(&format!("/subjects/{id}"), true)).await;
  assert_eq!(subject["status"], "archived");
  assert_eq!(subject["current_version"], 1);

  // Archived is not terminal: any transition is accepted.
  let (status, _) = call(
    &app,
    send_json(
      "PUT",
      &format!("/subjects/{id}/status"),
      &json!({ "status": "complete" }),
      true,
    ),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, subject) = call(&app, get(&format!("/subjects/{id}"), true)).await;
  assert_eq!(subject["status"], "complete");

  let (_, history) =
    call(&app, get(&format!("/subjects/{id}/versions"), true)).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
}

// ─── Cascade ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cascade_endpoint_applies_decision_table() {
  let app = app().await;

  let request = json!({
    "conditions": {
      "acs": { "present": null },
      "mi": { "present": null },
      "angina": { "present": null }
    },
    "condition_key": "mi",
    "field": "type_details",
    "value": "NSTEMI Type I",
    "cath_date": null
  });

  let (status, patched) =
    call(&app, send_json("POST", "/cascade", &request, true)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(patched["mi"]["present"], "Yes");
  assert_eq!(patched["angina"]["type_details"], "Unstable");
  assert_eq!(patched["acs"]["present"], "Yes");
  assert_eq!(patched["acs"]["type_details"], "NSTEMI Type I");

  let (status, _) =
    call(&app, send_json("POST", "/cascade", &request, false)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}
