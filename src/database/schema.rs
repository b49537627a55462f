//! SQL schema definitions for the mudra database.
//!
//! All schema statements live here as constants so migrations and tests
//! reference a single source of truth.

/// Migrations tracking table.
pub const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Gesture classes: one row per distinct gesture name. The integer primary
/// key doubles as the stable class label the classifier trains against.
pub const CREATE_GESTURE_CLASSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS gesture_classes (
    label INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
"#;

/// Feature vectors: one row per converted frame. Values are stored as a
/// JSON array; `ordinal` preserves the original frame order within a batch.
pub const CREATE_FEATURE_VECTORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS feature_vectors (
    id TEXT PRIMARY KEY,
    gesture_name TEXT NOT NULL,
    class_label INTEGER NOT NULL REFERENCES gesture_classes(label),
    vector_json TEXT NOT NULL,
    ordinal INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
"#;

pub const CREATE_FEATURE_VECTORS_LABEL_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_feature_vectors_class_label ON feature_vectors(class_label);
"#;

pub const CREATE_FEATURE_VECTORS_CREATED_AT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_feature_vectors_created_at ON feature_vectors(created_at);
"#;

/// v2: batch metadata, so vectors from one capture session can be grouped
/// and traced back to their source frames.
pub const ALTER_ADD_BATCH_ID: &str = r#"
ALTER TABLE feature_vectors ADD COLUMN batch_id TEXT;
"#;

pub const ALTER_ADD_FRAME_ID: &str = r#"
ALTER TABLE feature_vectors ADD COLUMN frame_id INTEGER;
"#;
