//! The `SubjectStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `casebook-store-sqlite`). Higher layers (`casebook-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  identity::Identity,
  subject::{NewSubject, Subject, SubjectStatus, SubjectUpdate, SubjectVersion},
};

/// Abstraction over a Casebook subject store backend.
///
/// Every data mutation (create, update, rollback) both patches the current
/// record and appends an immutable [`SubjectVersion`] snapshot; the two
/// writes are atomic with respect to any reader. Status changes are not
/// versioned data changes and append nothing.
///
/// Mutating operations take the resolved caller [`Identity`] explicitly; it
/// is recorded as provenance on every row written.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SubjectStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Create a new subject with `current_version = 1`, `status = draft`, and
  /// a matching version-1 snapshot noted "Initial creation".
  ///
  /// Fails if the `(site_code, subject_number)` pair is already taken.
  fn create_subject<'a>(
    &'a self,
    identity: &'a Identity,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + 'a;

  /// Replace the subject's data, bump `current_version` by exactly one, and
  /// append the matching snapshot. Returns the new version number.
  ///
  /// No optimistic-concurrency token is exchanged with the caller; the
  /// backend serializes the read-modify-write internally.
  fn update_subject<'a>(
    &'a self,
    identity: &'a Identity,
    id: Uuid,
    update: SubjectUpdate,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Restore the data of `target_version` as the subject's current state,
  /// recorded as a new forward version — never a destructive rewind. The
  /// appended snapshot carries the note "Rolled back to version {target}".
  /// Returns the new version number.
  fn rollback<'a>(
    &'a self,
    identity: &'a Identity,
    id: Uuid,
    target_version: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Soft-delete: set `status = archived`. No version is appended.
  fn archive<'a>(
    &'a self,
    identity: &'a Identity,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Set the subject's status. Any transition among the three values is
  /// accepted; no version is appended.
  fn update_status<'a>(
    &'a self,
    identity: &'a Identity,
    id: Uuid,
    status: SubjectStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Point lookup by id. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Point lookup by the `(site_code, subject_number)` identity pair.
  fn get_by_identifier<'a>(
    &'a self,
    site_code: &'a str,
    subject_number: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// List subjects, most recently updated first, optionally restricted to
  /// one creator.
  fn list_subjects(
    &self,
    created_by: Option<String>,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// All version snapshots for a subject, newest first. Single bulk read.
  fn get_history(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SubjectVersion>, Self::Error>> + Send + '_;

  /// Point lookup of one snapshot by `(subject_id, version)`.
  fn get_version(
    &self,
    subject_id: Uuid,
    version: i64,
  ) -> impl Future<Output = Result<Option<SubjectVersion>, Self::Error>> + Send + '_;
}
