//! Background conversion worker
//!
//! Converts a captured frame buffer into labelled feature vectors and
//! persists them as one batch. The worker takes ownership of the frames at
//! spawn, so no lock is needed between it and the UI loop; completion is
//! reported once over a channel instead of the foreground polling the
//! buffer for emptiness.

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::database::{DataService, DatabaseError};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::leap::Frame;

/// Errors that can occur in the conversion worker
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Conversion worker terminated without reporting a result")]
    WorkerGone,
}

/// Summary of one completed submission
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// The gesture name the batch was stored under
    pub gesture_name: String,
    /// The class label resolved for that name
    pub class_label: i64,
    /// Number of feature vectors in the batch
    pub vector_count: usize,
}

/// Handle to an in-flight conversion worker
///
/// Poll [`ConversionHandle::try_result`] from the UI tick; the worker sends
/// exactly one result when it finishes.
pub struct ConversionHandle {
    receiver: Receiver<Result<BatchSummary, WorkerError>>,
}

impl ConversionHandle {
    /// Returns the worker's result if it has finished, `None` otherwise.
    ///
    /// A worker that died without sending (a panic) is reported as
    /// [`WorkerError::WorkerGone`] rather than leaving the caller polling
    /// forever.
    pub fn try_result(&self) -> Option<Result<BatchSummary, WorkerError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(WorkerError::WorkerGone)),
        }
    }
}

/// Spawn a conversion worker for one submission.
///
/// The frames move into the worker; the caller keeps nothing. Resolves the
/// class label once for the gesture name, converts every frame in original
/// order, and stores the whole batch in a single call.
pub fn spawn_conversion(
    gesture_name: String,
    frames: Vec<Frame>,
    extractor: Arc<dyn FeatureExtractor>,
    store: Arc<dyn DataService>,
) -> ConversionHandle {
    let (sender, receiver) = bounded(1);

    thread::spawn(move || {
        tracing::info!(
            "Conversion worker started: gesture='{}', {} frames",
            gesture_name,
            frames.len()
        );

        let result = convert_and_store(&gesture_name, frames, extractor.as_ref(), store.as_ref());

        match &result {
            Ok(summary) => tracing::info!(
                "Conversion worker finished: gesture='{}', label={}, {} vectors",
                summary.gesture_name,
                summary.class_label,
                summary.vector_count
            ),
            Err(e) => tracing::error!("Conversion worker failed: {}", e),
        }

        if sender.send(result).is_err() {
            tracing::warn!("Conversion result dropped, session no longer listening");
        }
    });

    ConversionHandle { receiver }
}

fn convert_and_store(
    gesture_name: &str,
    frames: Vec<Frame>,
    extractor: &dyn FeatureExtractor,
    store: &dyn DataService,
) -> Result<BatchSummary, WorkerError> {
    let class_label = store.class_label_for(gesture_name)?;

    let vectors: Vec<FeatureVector> = frames
        .iter()
        .map(|frame| {
            let values = extractor.extract(frame);
            FeatureVector::new(gesture_name, class_label, frame.id, values)
        })
        .collect();

    let vector_count = vectors.len();
    store.insert_batch(vectors)?;

    Ok(BatchSummary {
        gesture_name: gesture_name.to_string(),
        class_label,
        vector_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PalmRelativeExtractor;
    use crate::leap::scripted::hand_frame;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// In-memory data service recording every call.
    #[derive(Default)]
    struct MemoryStore {
        batches: Mutex<Vec<Vec<FeatureVector>>>,
        fail_insert: bool,
    }

    impl DataService for MemoryStore {
        fn class_label_for(&self, name: &str) -> Result<i64, DatabaseError> {
            // Deterministic label derived from the name length, good enough
            // for asserting stability within a batch.
            Ok(name.len() as i64)
        }

        fn insert_batch(&self, vectors: Vec<FeatureVector>) -> Result<(), DatabaseError> {
            if self.fail_insert {
                return Err(DatabaseError::Migration("disk full".to_string()));
            }
            self.batches.lock().push(vectors);
            Ok(())
        }
    }

    fn wait_for(handle: &ConversionHandle) -> Result<BatchSummary, WorkerError> {
        for _ in 0..200 {
            if let Some(result) = handle.try_result() {
                return result;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("worker did not finish in time");
    }

    #[test]
    fn test_worker_converts_frames_in_order() {
        let store = Arc::new(MemoryStore::default());
        let extractor = Arc::new(PalmRelativeExtractor);

        let frames = vec![hand_frame(10), hand_frame(11), hand_frame(12)];
        let handle = spawn_conversion(
            "Wave".to_string(),
            frames,
            extractor,
            Arc::clone(&store) as Arc<dyn DataService>,
        );

        let summary = wait_for(&handle).unwrap();
        assert_eq!(summary.gesture_name, "Wave");
        assert_eq!(summary.vector_count, 3);

        let batches = store.batches.lock();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.iter().map(|v| v.frame_id).collect::<Vec<_>>(),
            vec![10, 11, 12]
        );
        assert!(batch.iter().all(|v| v.gesture_name == "Wave"));
        assert!(batch.iter().all(|v| v.class_label == batch[0].class_label));
    }

    #[test]
    fn test_worker_reports_insert_failure() {
        let store = Arc::new(MemoryStore {
            fail_insert: true,
            ..Default::default()
        });
        let handle = spawn_conversion(
            "Fist".to_string(),
            vec![hand_frame(1)],
            Arc::new(PalmRelativeExtractor),
            store as Arc<dyn DataService>,
        );

        let result = wait_for(&handle);
        assert!(matches!(result, Err(WorkerError::Database(_))));
    }

    #[test]
    fn test_try_result_empty_while_running() {
        let (_sender, receiver) = bounded::<Result<BatchSummary, WorkerError>>(1);
        let handle = ConversionHandle { receiver };
        assert!(handle.try_result().is_none());
    }

    #[test]
    fn test_dropped_sender_reports_worker_gone() {
        let (sender, receiver) = bounded::<Result<BatchSummary, WorkerError>>(1);
        drop(sender);
        let handle = ConversionHandle { receiver };
        assert!(matches!(
            handle.try_result(),
            Some(Err(WorkerError::WorkerGone))
        ));
    }
}
