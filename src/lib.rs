//! Mudra - hand-gesture capture and classification
//!
//! Captures timed snapshots of hand-pose frames from a motion sensor,
//! converts them into labelled feature vectors on a background worker, and
//! persists them for classifier training. The UI framework, audio backend,
//! and sensor driver plug in through the [`coordinator::ViewAnimator`],
//! [`sound::CuePlayer`], and [`leap::FrameSource`] traits.

pub mod capture;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod features;
pub mod leap;
pub mod sound;

pub use capture::{CaptureSession, CaptureState};
pub use classifier::{Trainer, TrainingSession, TrainingState};
pub use coordinator::{View, ViewAnimator, ViewCoordinator};
pub use database::{DataService, SqliteStore};
pub use features::{FeatureExtractor, FeatureVector, PalmRelativeExtractor};
pub use leap::{Frame, FrameSource, HandPose};
pub use sound::{Cue, CuePlayer};

/// Initialise logging for an embedding application.
///
/// Respects `RUST_LOG`, defaulting to `info`, and appends to
/// `~/.mudra/mudra-debug.log` alongside stdout when the log directory is
/// writable.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let log_dir = dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"))
        .join(".mudra");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("mudra-debug.log"))
        .ok();

    if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::fmt().with_timer(LocalTimer).init();
    }
}
