//! Handler for `/cascade` — server-side evaluation of the ACS/MI/Angina
//! auto-fill rules, so the editing client applies exactly the same table the
//! protocol defines. Pure computation; never touches the store.

use axum::{Json, extract::State};
use casebook_core::{
  cascade::{
    ConditionField, ConditionKey, MedicalConditions, apply_condition_change,
  },
  store::SubjectStore,
};
use serde::Deserialize;

use crate::{AppState, auth::Caller, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CascadeRequest {
  pub conditions:    MedicalConditions,
  pub condition_key: ConditionKey,
  pub field:         ConditionField,
  pub value:         Option<String>,
  /// Catheterization procedure date from the document, if recorded.
  pub cath_date:     Option<String>,
}

/// `POST /cascade`
pub async fn evaluate<S>(
  State(_state): State<AppState<S>>,
  Caller(_identity): Caller,
  Json(req): Json<CascadeRequest>,
) -> Result<Json<MedicalConditions>, ApiError>
where
  S: SubjectStore + Clone + Send + Sync + 'static,
{
  let patched = apply_condition_change(
    &req.conditions,
    req.condition_key,
    req.field,
    req.value.as_deref(),
    req.cath_date.as_deref(),
  );
  Ok(Json(patched))
}
