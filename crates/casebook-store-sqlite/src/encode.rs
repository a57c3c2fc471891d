//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The form document and the
//! changed-sections list are stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use casebook_core::subject::{Subject, SubjectStatus, SubjectVersion};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SubjectStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: SubjectStatus) -> &'static str {
  match s {
    SubjectStatus::Draft => "draft",
    SubjectStatus::Complete => "complete",
    SubjectStatus::Archived => "archived",
  }
}

pub fn decode_status(s: &str) -> Result<SubjectStatus> {
  match s {
    "draft" => Ok(SubjectStatus::Draft),
    "complete" => Ok(SubjectStatus::Complete),
    "archived" => Ok(SubjectStatus::Archived),
    other => Err(Error::DateParse(format!("unknown status: {other:?}"))),
  }
}

// ─── Changed sections ─────────────────────────────────────────────────────────

pub fn encode_sections(sections: &[String]) -> Result<String> {
  Ok(serde_json::to_string(sections)?)
}

pub fn decode_sections(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:      String,
  pub site_code:       String,
  pub subject_number:  String,
  pub data_json:       String,
  pub created_by:      String,
  pub created_at:      String,
  pub updated_at:      String,
  pub current_version: i64,
  pub status:          String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "subject_id, site_code, subject_number, \
     data_json, created_by, created_at, updated_at, current_version, status";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:      row.get(0)?,
      site_code:       row.get(1)?,
      subject_number:  row.get(2)?,
      data_json:       row.get(3)?,
      created_by:      row.get(4)?,
      created_at:      row.get(5)?,
      updated_at:      row.get(6)?,
      current_version: row.get(7)?,
      status:          row.get(8)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:      decode_uuid(&self.subject_id)?,
      site_code:       self.site_code,
      subject_number:  self.subject_number,
      data:            serde_json::from_str(&self.data_json)?,
      created_by:      self.created_by,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      current_version: self.current_version,
      status:          decode_status(&self.status)?,
    })
  }
}

/// Raw strings read directly from a `subject_versions` row.
pub struct RawVersion {
  pub version_id:       String,
  pub subject_id:       String,
  pub version:          i64,
  pub data_json:        String,
  pub created_by:       String,
  pub created_at:       String,
  pub change_note:      Option<String>,
  pub changed_sections: Option<String>,
}

impl RawVersion {
  pub const COLUMNS: &'static str = "version_id, subject_id, version, \
     data_json, created_by, created_at, change_note, changed_sections";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      version_id:       row.get(0)?,
      subject_id:       row.get(1)?,
      version:          row.get(2)?,
      data_json:        row.get(3)?,
      created_by:       row.get(4)?,
      created_at:       row.get(5)?,
      change_note:      row.get(6)?,
      changed_sections: row.get(7)?,
    })
  }

  pub fn into_version(self) -> Result<SubjectVersion> {
    let changed_sections = self
      .changed_sections
      .as_deref()
      .map(decode_sections)
      .transpose()?;

    Ok(SubjectVersion {
      version_id: decode_uuid(&self.version_id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      version: self.version,
      data: serde_json::from_str(&self.data_json)?,
      created_by: self.created_by,
      created_at: decode_dt(&self.created_at)?,
      change_note: self.change_note,
      changed_sections,
    })
  }
}
