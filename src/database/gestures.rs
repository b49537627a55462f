//! Gesture class and feature-vector CRUD operations.
//!
//! Class labels are allocated lazily: the first submission of a gesture
//! name inserts a `gesture_classes` row; every later lookup of the same
//! name resolves to the same label.

use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{DatabaseError, SqliteStore};
use crate::features::FeatureVector;

/// A gesture class known to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureClass {
    /// Stable integer class label.
    pub label: i64,
    /// Gesture name as submitted by the user.
    pub name: String,
    /// When the class was first seen (ISO 8601).
    pub created_at: String,
}

/// A feature-vector row read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFeatureVector {
    /// Unique identifier (UUID).
    pub id: String,
    pub gesture_name: String,
    pub class_label: i64,
    /// Flat feature values.
    pub values: Vec<f32>,
    /// Position of the source frame within its capture batch.
    pub ordinal: i64,
    /// Batch (capture session) this vector was submitted in.
    pub batch_id: Option<String>,
    /// Id of the source frame.
    pub frame_id: Option<i64>,
    pub created_at: String,
}

/// Resolves the stable class label for a gesture name.
///
/// INSERT OR IGNORE followed by a SELECT on the unique name column keeps
/// the label deterministic across calls and across processes.
pub fn class_label_for(store: &SqliteStore, name: &str) -> Result<i64, DatabaseError> {
    let conn = store.connection()?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO gesture_classes (name, created_at) VALUES (?1, ?2)",
        params![name, Utc::now().to_rfc3339()],
    )?;

    let label: i64 = conn.query_row(
        "SELECT label FROM gesture_classes WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;

    if inserted > 0 {
        tracing::info!("Registered new gesture class '{}' as label {}", name, label);
    }

    Ok(label)
}

/// Inserts one batch of feature vectors in a single transaction.
///
/// All rows share a freshly generated batch id; `ordinal` records the
/// original frame order.
pub fn insert_feature_vectors(
    store: &SqliteStore,
    vectors: &[FeatureVector],
) -> Result<(), DatabaseError> {
    let mut conn = store.connection()?;
    let batch_id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO feature_vectors (
                id, gesture_name, class_label, vector_json, ordinal, created_at,
                batch_id, frame_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;

        for (ordinal, vector) in vectors.iter().enumerate() {
            let vector_json = serde_json::to_string(&vector.values)?;
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                vector.gesture_name,
                vector.class_label,
                vector_json,
                ordinal as i64,
                created_at,
                batch_id,
                vector.frame_id as i64,
            ])?;
        }
    }
    tx.commit()?;

    tracing::debug!(
        "Inserted batch {} with {} feature vector(s)",
        batch_id,
        vectors.len()
    );
    Ok(())
}

/// Column list for all feature-vector SELECT queries.
const SELECT_COLUMNS: &str = r#"
    id, gesture_name, class_label, vector_json, ordinal, created_at,
    batch_id, frame_id
"#;

/// Map a database row to a StoredFeatureVector.
fn row_to_vector(row: &rusqlite::Row) -> rusqlite::Result<StoredFeatureVector> {
    let vector_json: String = row.get(3)?;
    let values: Vec<f32> = serde_json::from_str(&vector_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StoredFeatureVector {
        id: row.get(0)?,
        gesture_name: row.get(1)?,
        class_label: row.get(2)?,
        values,
        ordinal: row.get(4)?,
        created_at: row.get(5)?,
        batch_id: row.get(6)?,
        frame_id: row.get(7)?,
    })
}

/// Lists all gesture classes, ordered by label.
pub fn list_gesture_classes(store: &SqliteStore) -> Result<Vec<GestureClass>, DatabaseError> {
    let conn = store.connection()?;

    let mut stmt =
        conn.prepare("SELECT label, name, created_at FROM gesture_classes ORDER BY label")?;

    let classes = stmt
        .query_map([], |row| {
            Ok(GestureClass {
                label: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(classes)
}

/// Lists the stored vectors for a gesture, in insertion order.
pub fn list_vectors_for(
    store: &SqliteStore,
    name: &str,
) -> Result<Vec<StoredFeatureVector>, DatabaseError> {
    let conn = store.connection()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM feature_vectors WHERE gesture_name = ?1 ORDER BY created_at, ordinal",
        SELECT_COLUMNS
    ))?;

    let vectors = stmt
        .query_map(params![name], row_to_vector)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(vectors)
}

/// Counts the stored vectors for a gesture name.
pub fn count_vectors_for(store: &SqliteStore, name: &str) -> Result<i64, DatabaseError> {
    let conn = store.connection()?;

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM feature_vectors WHERE gesture_name = ?1",
        params![name],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Deletes a gesture class and all of its vectors.
///
/// Returns the number of vectors removed.
pub fn delete_gesture(store: &SqliteStore, name: &str) -> Result<i64, DatabaseError> {
    let mut conn = store.connection()?;

    let tx = conn.transaction()?;
    let removed = tx.execute(
        "DELETE FROM feature_vectors WHERE gesture_name = ?1",
        params![name],
    )?;
    tx.execute("DELETE FROM gesture_classes WHERE name = ?1", params![name])?;
    tx.commit()?;

    if removed > 0 {
        tracing::info!("Deleted gesture '{}' ({} vectors)", name, removed);
    } else {
        tracing::warn!("No vectors found for gesture '{}'", name);
    }

    Ok(removed as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DataService;

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn vector(name: &str, label: i64, frame_id: u64) -> FeatureVector {
        FeatureVector::new(name, label, frame_id, vec![0.5, -0.5, 1.0])
    }

    #[test]
    fn test_class_label_is_stable() {
        let (_dir, store) = test_store();

        let first = class_label_for(&store, "Fist").unwrap();
        let second = class_label_for(&store, "Fist").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_names_get_distinct_labels() {
        let (_dir, store) = test_store();

        let fist = class_label_for(&store, "Fist").unwrap();
        let wave = class_label_for(&store, "Wave").unwrap();
        assert_ne!(fist, wave);
    }

    #[test]
    fn test_insert_batch_preserves_order() {
        let (_dir, store) = test_store();
        let label = class_label_for(&store, "Wave").unwrap();

        store
            .insert_batch(vec![
                vector("Wave", label, 10),
                vector("Wave", label, 11),
                vector("Wave", label, 12),
            ])
            .unwrap();

        let stored = list_vectors_for(&store, "Wave").unwrap();
        assert_eq!(stored.len(), 3);
        let frame_ids: Vec<_> = stored.iter().map(|v| v.frame_id).collect();
        assert_eq!(frame_ids, vec![Some(10), Some(11), Some(12)]);

        // All rows share one batch id
        let batch = stored[0].batch_id.clone();
        assert!(batch.is_some());
        assert!(stored.iter().all(|v| v.batch_id == batch));
    }

    #[test]
    fn test_vector_values_round_trip() {
        let (_dir, store) = test_store();
        let label = class_label_for(&store, "Pinch").unwrap();

        store.insert_batch(vec![vector("Pinch", label, 1)]).unwrap();

        let stored = list_vectors_for(&store, "Pinch").unwrap();
        assert_eq!(stored[0].values, vec![0.5, -0.5, 1.0]);
        assert_eq!(stored[0].class_label, label);
    }

    #[test]
    fn test_count_and_delete() {
        let (_dir, store) = test_store();
        let label = class_label_for(&store, "Swipe").unwrap();

        store
            .insert_batch(vec![vector("Swipe", label, 1), vector("Swipe", label, 2)])
            .unwrap();
        assert_eq!(count_vectors_for(&store, "Swipe").unwrap(), 2);

        let removed = delete_gesture(&store, "Swipe").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(count_vectors_for(&store, "Swipe").unwrap(), 0);
        assert!(list_gesture_classes(&store)
            .unwrap()
            .iter()
            .all(|c| c.name != "Swipe"));
    }
}
