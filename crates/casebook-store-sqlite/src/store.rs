//! [`SqliteStore`] — the SQLite implementation of [`SubjectStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use casebook_core::{
  identity::Identity,
  store::SubjectStore,
  subject::{NewSubject, Subject, SubjectStatus, SubjectUpdate, SubjectVersion},
};

use crate::{
  encode::{
    RawSubject, RawVersion, encode_dt, encode_sections, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Outcome of a versioning mutation, carried out of the connection closure
/// so the domain error can be raised with the original identifiers.
enum MutationOutcome {
  Applied(i64),
  NoSubject,
  NoVersion,
}

/// Encoded column values for one `subject_versions` row.
struct VersionRow {
  version_id:       String,
  subject_id:       String,
  version:          i64,
  data_json:        String,
  created_by:       String,
  created_at:       String,
  change_note:      Option<String>,
  changed_sections: Option<String>,
}

fn insert_version(
  tx: &rusqlite::Transaction<'_>,
  row: &VersionRow,
) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT INTO subject_versions (
       version_id, subject_id, version, data_json,
       created_by, created_at, change_note, changed_sections
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      row.version_id,
      row.subject_id,
      row.version,
      row.data_json,
      row.created_by,
      row.created_at,
      row.change_note,
      row.changed_sections,
    ],
  )?;
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Casebook subject store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// funnel through one serialized connection, so the read-modify-write inside
/// each mutation cannot interleave with another mutation's.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_subject(
    &self,
    sql: &'static str,
    params: Vec<String>,
  ) -> Result<Option<Subject>> {
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              sql,
              rusqlite::params_from_iter(params),
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }
}

// ─── SubjectStore impl ───────────────────────────────────────────────────────

impl SubjectStore for SqliteStore {
  type Error = Error;

  // ── Mutations ───────────────────────────────────────────────────────────

  async fn create_subject(
    &self,
    identity: &Identity,
    input: NewSubject,
  ) -> Result<Subject> {
    let now = Utc::now();
    let subject = Subject {
      subject_id:      Uuid::new_v4(),
      site_code:       input.site_code,
      subject_number:  input.subject_number,
      data:            input.data,
      created_by:      identity.user_id.clone(),
      created_at:      now,
      updated_at:      now,
      current_version: 1,
      status:          SubjectStatus::Draft,
    };

    let id_str     = encode_uuid(subject.subject_id);
    let site       = subject.site_code.clone();
    let number     = subject.subject_number.clone();
    let data_json  = subject.data.to_string();
    let created_by = subject.created_by.clone();
    let at_str     = encode_dt(now);
    let status_str = encode_status(subject.status).to_owned();

    let version_row = VersionRow {
      version_id:       encode_uuid(Uuid::new_v4()),
      subject_id:       id_str.clone(),
      version:          1,
      data_json:        data_json.clone(),
      created_by:       created_by.clone(),
      created_at:       at_str.clone(),
      change_note:      Some("Initial creation".to_owned()),
      changed_sections: None,
    };

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM subjects
             WHERE site_code = ?1 AND subject_number = ?2",
            rusqlite::params![site, number],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO subjects (
             subject_id, site_code, subject_number, data_json,
             created_by, created_at, updated_at, current_version, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, site, number, data_json, created_by, at_str, at_str, 1_i64,
            status_str,
          ],
        )?;
        insert_version(&tx, &version_row)?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::AlreadyExists {
        site_code:      subject.site_code,
        subject_number: subject.subject_number,
      });
    }

    Ok(subject)
  }

  async fn update_subject(
    &self,
    identity: &Identity,
    id: Uuid,
    update: SubjectUpdate,
  ) -> Result<i64> {
    let id_str       = encode_uuid(id);
    let data_json    = update.data.to_string();
    let created_by   = identity.user_id.clone();
    let at_str       = encode_dt(Utc::now());
    let note         = update.change_note;
    let sections_str = update
      .changed_sections
      .as_deref()
      .map(encode_sections)
      .transpose()?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<i64> = tx
          .query_row(
            "SELECT current_version FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(MutationOutcome::NoSubject);
        };
        let new_version = current + 1;

        tx.execute(
          "UPDATE subjects
           SET data_json = ?2, updated_at = ?3, current_version = ?4
           WHERE subject_id = ?1",
          rusqlite::params![id_str, data_json, at_str, new_version],
        )?;
        insert_version(&tx, &VersionRow {
          version_id: encode_uuid(Uuid::new_v4()),
          subject_id: id_str,
          version: new_version,
          data_json,
          created_by,
          created_at: at_str,
          change_note: note,
          changed_sections: sections_str,
        })?;

        tx.commit()?;
        Ok(MutationOutcome::Applied(new_version))
      })
      .await?;

    match outcome {
      MutationOutcome::Applied(v) => Ok(v),
      _ => Err(Error::SubjectNotFound(id)),
    }
  }

  async fn rollback(
    &self,
    identity: &Identity,
    id: Uuid,
    target_version: i64,
  ) -> Result<i64> {
    let id_str     = encode_uuid(id);
    let created_by = identity.user_id.clone();
    let at_str     = encode_dt(Utc::now());
    let note       = format!("Rolled back to version {target_version}");

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let restored: Option<String> = tx
          .query_row(
            "SELECT data_json FROM subject_versions
             WHERE subject_id = ?1 AND version = ?2",
            rusqlite::params![id_str, target_version],
            |r| r.get(0),
          )
          .optional()?;

        let Some(data_json) = restored else {
          return Ok(MutationOutcome::NoVersion);
        };

        let current: Option<i64> = tx
          .query_row(
            "SELECT current_version FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(MutationOutcome::NoSubject);
        };
        let new_version = current + 1;

        tx.execute(
          "UPDATE subjects
           SET data_json = ?2, updated_at = ?3, current_version = ?4
           WHERE subject_id = ?1",
          rusqlite::params![id_str, data_json, at_str, new_version],
        )?;
        insert_version(&tx, &VersionRow {
          version_id: encode_uuid(Uuid::new_v4()),
          subject_id: id_str,
          version: new_version,
          data_json,
          created_by,
          created_at: at_str,
          change_note: Some(note),
          changed_sections: None,
        })?;

        tx.commit()?;
        Ok(MutationOutcome::Applied(new_version))
      })
      .await?;

    match outcome {
      MutationOutcome::Applied(v) => Ok(v),
      MutationOutcome::NoVersion => Err(Error::VersionNotFound {
        subject_id: id,
        version:    target_version,
      }),
      MutationOutcome::NoSubject => Err(Error::SubjectNotFound(id)),
    }
  }

  async fn archive(&self, identity: &Identity, id: Uuid) -> Result<()> {
    self
      .update_status(identity, id, SubjectStatus::Archived)
      .await
  }

  async fn update_status(
    &self,
    _identity: &Identity,
    id: Uuid,
    status: SubjectStatus,
  ) -> Result<()> {
    let id_str     = encode_uuid(id);
    let status_str = encode_status(status).to_owned();
    let at_str     = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET status = ?2, updated_at = ?3
           WHERE subject_id = ?1",
          rusqlite::params![id_str, status_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    self
      .query_subject(
        "SELECT subject_id, site_code, subject_number, data_json, created_by, \
         created_at, updated_at, current_version, status \
         FROM subjects WHERE subject_id = ?1",
        vec![encode_uuid(id)],
      )
      .await
  }

  async fn get_by_identifier(
    &self,
    site_code: &str,
    subject_number: &str,
  ) -> Result<Option<Subject>> {
    self
      .query_subject(
        "SELECT subject_id, site_code, subject_number, data_json, created_by, \
         created_at, updated_at, current_version, status \
         FROM subjects WHERE site_code = ?1 AND subject_number = ?2",
        vec![site_code.to_owned(), subject_number.to_owned()],
      )
      .await
  }

  async fn list_subjects(
    &self,
    created_by: Option<String>,
  ) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(creator) = created_by {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM subjects WHERE created_by = ?1
             ORDER BY updated_at DESC",
            RawSubject::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![creator], RawSubject::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM subjects ORDER BY updated_at DESC",
            RawSubject::COLUMNS
          ))?;
          stmt
            .query_map([], RawSubject::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn get_history(&self, subject_id: Uuid) -> Result<Vec<SubjectVersion>> {
    let id_str = encode_uuid(subject_id);

    let raws: Vec<RawVersion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM subject_versions
           WHERE subject_id = ?1 ORDER BY version DESC",
          RawVersion::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawVersion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVersion::into_version).collect()
  }

  async fn get_version(
    &self,
    subject_id: Uuid,
    version: i64,
  ) -> Result<Option<SubjectVersion>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM subject_versions
                 WHERE subject_id = ?1 AND version = ?2",
                RawVersion::COLUMNS
              ),
              rusqlite::params![id_str, version],
              RawVersion::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_version).transpose()
  }
}
