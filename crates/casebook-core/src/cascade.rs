//! Cascading auto-fill rules for the ACS / MI / Angina condition group.
//!
//! Protocol logic for the editing client, kept entirely separate from the
//! versioned-record store: a pure function from (condition key, edited
//! field, new value, current section state) to the patched section state.
//! The store never interprets this data; it lives inside the opaque
//! `medical_conditions` section of the subject document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three conditions linked by the cascade rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKey {
  Acs,
  Mi,
  Angina,
}

/// The two fields whose edits trigger cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
  Present,
  TypeDetails,
}

/// One condition entry inside the `medical_conditions` section.
///
/// `present` holds the protocol's literal "Yes"/"No" answers rather than a
/// boolean; the form also allows the question to be unanswered (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionEntry {
  pub present:      Option<String>,
  pub type_details: Option<String>,
  pub onset_date:   Option<String>,
  pub end_date:     Option<String>,
  pub notes:        Option<String>,
}

/// The `medical_conditions` section, with the three cascade-linked entries
/// typed and every other condition carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalConditions {
  pub acs:    ConditionEntry,
  pub mi:     ConditionEntry,
  pub angina: ConditionEntry,
  #[serde(flatten)]
  pub other:  Map<String, Value>,
}

impl MedicalConditions {
  fn entry_mut(&mut self, key: ConditionKey) -> &mut ConditionEntry {
    match key {
      ConditionKey::Acs => &mut self.acs,
      ConditionKey::Mi => &mut self.mi,
      ConditionKey::Angina => &mut self.angina,
    }
  }
}

fn is_yes(answer: &Option<String>) -> bool {
  answer.as_deref() == Some("Yes")
}

/// Apply one field edit plus the protocol's cascade rules.
///
/// `cath_date` is the catheterization procedure date from elsewhere in the
/// document, if known; marking a condition present copies it into that
/// condition's `end_date`.
///
/// The decision table:
/// - MI type NSTEMI (either type) ⇒ MI yes, unstable angina, ACS of that type.
/// - MI type STEMI ⇒ MI yes, ACS STEMI (angina untouched).
/// - Unstable angina ⇒ angina yes; ACS "Unstable Angina" unless MI present.
/// - Stable angina ⇒ angina yes; ACS no unless MI present (stable angina is
///   not an acute coronary syndrome).
/// - MI answered no ⇒ MI type cleared; ACS follows the remaining angina.
/// - Angina answered no ⇒ angina type cleared; ACS no unless MI present.
pub fn apply_condition_change(
  conditions: &MedicalConditions,
  key: ConditionKey,
  field: ConditionField,
  value: Option<&str>,
  cath_date: Option<&str>,
) -> MedicalConditions {
  let mut next = conditions.clone();

  {
    let entry = next.entry_mut(key);
    match field {
      ConditionField::Present => entry.present = value.map(str::to_owned),
      ConditionField::TypeDetails => {
        entry.type_details = value.map(str::to_owned)
      }
    }
  }

  match (key, field, value) {
    (
      ConditionKey::Mi,
      ConditionField::TypeDetails,
      Some(mi_type @ ("NSTEMI Type I" | "NSTEMI Type II")),
    ) => {
      next.mi.present = Some("Yes".into());
      next.angina.present = Some("Yes".into());
      next.angina.type_details = Some("Unstable".into());
      next.acs.present = Some("Yes".into());
      next.acs.type_details = Some(mi_type.into());
    }

    (ConditionKey::Mi, ConditionField::TypeDetails, Some("STEMI")) => {
      next.mi.present = Some("Yes".into());
      next.acs.present = Some("Yes".into());
      next.acs.type_details = Some("STEMI".into());
    }

    (ConditionKey::Angina, ConditionField::TypeDetails, Some("Unstable")) => {
      next.angina.present = Some("Yes".into());
      // An MI already on record decides the ACS entry; don't overwrite it.
      if !is_yes(&next.mi.present) {
        next.acs.present = Some("Yes".into());
        next.acs.type_details = Some("Unstable Angina".into());
      }
    }

    (ConditionKey::Angina, ConditionField::TypeDetails, Some("Stable")) => {
      next.angina.present = Some("Yes".into());
      if !is_yes(&next.mi.present) {
        next.acs.present = Some("No".into());
        next.acs.type_details = None;
      }
    }

    (ConditionKey::Mi, ConditionField::Present, Some("No")) => {
      next.mi.type_details = None;
      if !is_yes(&next.angina.present)
        || next.angina.type_details.as_deref() == Some("Stable")
      {
        next.acs.present = Some("No".into());
        next.acs.type_details = None;
      } else if next.angina.type_details.as_deref() == Some("Unstable") {
        next.acs.present = Some("Yes".into());
        next.acs.type_details = Some("Unstable Angina".into());
      }
    }

    (ConditionKey::Angina, ConditionField::Present, Some("No")) => {
      next.angina.type_details = None;
      if !is_yes(&next.mi.present) {
        next.acs.present = Some("No".into());
        next.acs.type_details = None;
      }
    }

    _ => {}
  }

  if let (Some(date), ConditionField::Present, Some("Yes")) =
    (cath_date, field, value)
  {
    next.entry_mut(key).end_date = Some(date.to_owned());
  }

  next
}
