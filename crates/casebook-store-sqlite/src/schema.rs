//! SQL schema for the Casebook SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id      TEXT PRIMARY KEY,
    site_code       TEXT NOT NULL,
    subject_number  TEXT NOT NULL,
    data_json       TEXT NOT NULL,   -- full form document, opaque JSON
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at      TEXT NOT NULL,
    current_version INTEGER NOT NULL,
    status          TEXT NOT NULL DEFAULT 'draft',  -- 'draft' | 'complete' | 'archived'
    UNIQUE (site_code, subject_number)
);

-- Snapshots are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS subject_versions (
    version_id       TEXT PRIMARY KEY,
    subject_id       TEXT NOT NULL REFERENCES subjects(subject_id),
    version          INTEGER NOT NULL,
    data_json        TEXT NOT NULL,
    created_by       TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    change_note      TEXT,
    changed_sections TEXT,           -- JSON array of section names or NULL
    UNIQUE (subject_id, version)
);

CREATE INDEX IF NOT EXISTS subjects_created_by_idx ON subjects(created_by);
CREATE INDEX IF NOT EXISTS subjects_updated_at_idx ON subjects(updated_at);
CREATE INDEX IF NOT EXISTS versions_subject_idx
    ON subject_versions(subject_id, version DESC);

PRAGMA user_version = 1;
";
