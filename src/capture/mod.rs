//! Gesture capture pipeline
//!
//! A capture runs as a timed sampling window that buffers hand frames, a
//! naming step, and a background worker that converts the buffer into
//! labelled feature vectors and persists them as one batch.

pub mod session;
pub mod state;
pub mod worker;

pub use session::CaptureSession;
pub use state::{CaptureEvent, CaptureState, CaptureStateMachine, TransitionReason};
pub use worker::{BatchSummary, ConversionHandle, WorkerError};
