//! Subject — the per-participant record and its immutable version snapshots.
//!
//! A subject holds the current state of the structured form document plus
//! identity and audit metadata. Every data mutation appends a full-copy
//! snapshot to the version history; snapshots are never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of a subject record.
///
/// No transition guard is applied: any of the three values may follow any
/// other via an explicit status update. "Deletion" is a transition to
/// `Archived`; rows are never physically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
  Draft,
  Complete,
  Archived,
}

/// The current state of one clinical-trial participant record.
///
/// Identified by the `(site_code, subject_number)` pair, which is unique
/// among all subjects. `current_version` always equals the version number of
/// the most recently appended [`SubjectVersion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:      Uuid,
  pub site_code:       String,
  pub subject_number:  String,
  /// The full structured form document. Opaque to the store; schema lives
  /// entirely in the form definitions of the editing client.
  pub data:            Value,
  pub created_by:      String,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub current_version: i64,
  pub status:          SubjectStatus,
}

/// An immutable full-copy snapshot of a subject's data at one version.
///
/// Versions for a subject form the contiguous sequence `1..=current_version`
/// with no gaps, written strictly in increasing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectVersion {
  pub version_id:       Uuid,
  pub subject_id:       Uuid,
  pub version:          i64,
  pub data:             Value,
  pub created_by:       String,
  pub created_at:       DateTime<Utc>,
  pub change_note:      Option<String>,
  /// Names of the form sections touched by this change, for display only.
  pub changed_sections: Option<Vec<String>>,
}

/// Input to [`crate::store::SubjectStore::create_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub site_code:      String,
  pub subject_number: String,
  pub data:           Value,
}

/// Input to [`crate::store::SubjectStore::update_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectUpdate {
  pub data:             Value,
  pub change_note:      Option<String>,
  pub changed_sections: Option<Vec<String>>,
}

impl SubjectUpdate {
  /// Convenience constructor with no note or section list.
  pub fn new(data: Value) -> Self {
    Self {
      data,
      change_note: None,
      changed_sections: None,
    }
  }
}
