//! Classifier training session
//!
//! Runs the blocking training routine on a background worker while the UI
//! keeps ticking, following the same shape as a capture submission but
//! without the naming step. The worker starts and the indicator shows as
//! soon as a run is requested; half-second grace delays pace the completion
//! sequence so the indicator does not flicker on fast runs.

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Grace delay after the worker finishes, and again for the done message
const TRAINING_GRACE: Duration = Duration::from_millis(500);

/// Errors that can occur during classifier training
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("Training failed: {0}")]
    Failed(String),

    #[error("Training worker terminated without reporting a result")]
    WorkerGone,
}

/// Blocking training routine, run on a worker thread.
pub trait Trainer: Send + Sync {
    fn train(&self) -> Result<(), TrainingError>;
}

/// Training session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrainingState {
    /// No training run in progress
    #[default]
    Idle,
    /// Worker training, or a grace delay around it
    Training,
    /// A model has been trained this run
    Complete,
}

/// Phases of one training run
enum TrainPhase {
    /// Worker running, indicator visible
    AwaitingTrainer(Receiver<Result<(), TrainingError>>),
    /// Worker done, holding the running indicator for the grace period
    HoldingIndicator { remaining: Duration },
    /// Done message visible before the indicator hides
    ShowingDone { remaining: Duration },
}

/// Drives one classifier training run at a time.
pub struct TrainingSession {
    state: TrainingState,
    phase: Option<TrainPhase>,
    model_exists: bool,
    last_error: Option<String>,
}

impl TrainingSession {
    pub fn new() -> Self {
        Self {
            state: TrainingState::Idle,
            phase: None,
            model_exists: false,
            last_error: None,
        }
    }

    /// Returns the current training state
    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Returns whether a trained model exists from a completed run
    pub fn model_exists(&self) -> bool {
        self.model_exists
    }

    /// Mark a model as available without a training run, e.g. after
    /// importing previously saved gestures.
    pub fn set_model_exists(&mut self, exists: bool) {
        self.model_exists = exists;
    }

    /// Returns the most recent training failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns whether the training indicator should be visible
    pub fn indicator_visible(&self) -> bool {
        self.indicator_message().is_some()
    }

    /// Returns the training indicator text, if the indicator is visible
    pub fn indicator_message(&self) -> Option<&'static str> {
        match self.phase {
            Some(TrainPhase::AwaitingTrainer(_)) | Some(TrainPhase::HoldingIndicator { .. }) => {
                Some("Training classifier...")
            }
            Some(TrainPhase::ShowingDone { .. }) => Some("Training Complete"),
            None => None,
        }
    }

    /// Start a training run.
    ///
    /// Rejected while a run is already in progress. Starting again after a
    /// completed run retrains the model.
    pub fn start_training(&mut self, trainer: Arc<dyn Trainer>) -> Result<(), String> {
        if self.state == TrainingState::Training {
            return Err("Training is already in progress".to_string());
        }

        tracing::info!("Training run requested");
        self.state = TrainingState::Training;
        self.model_exists = false;
        self.last_error = None;
        self.phase = Some(TrainPhase::AwaitingTrainer(spawn_trainer(trainer)));
        Ok(())
    }

    /// Advance the session by one UI tick.
    pub fn tick(&mut self, dt: Duration) {
        let phase = match self.phase.take() {
            Some(phase) => phase,
            None => return,
        };

        self.phase = match phase {
            TrainPhase::AwaitingTrainer(receiver) => match try_result(&receiver) {
                None => Some(TrainPhase::AwaitingTrainer(receiver)),
                Some(Ok(())) => Some(TrainPhase::HoldingIndicator {
                    remaining: TRAINING_GRACE,
                }),
                Some(Err(e)) => {
                    tracing::error!("Training failed: {}", e);
                    self.last_error = Some(e.to_string());
                    self.state = TrainingState::Idle;
                    None
                }
            },
            TrainPhase::HoldingIndicator { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    Some(TrainPhase::ShowingDone {
                        remaining: TRAINING_GRACE,
                    })
                } else {
                    Some(TrainPhase::HoldingIndicator { remaining })
                }
            }
            TrainPhase::ShowingDone { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    tracing::info!("Training run complete, model available");
                    self.state = TrainingState::Complete;
                    self.model_exists = true;
                    None
                } else {
                    Some(TrainPhase::ShowingDone { remaining })
                }
            }
        };
    }
}

impl Default for TrainingSession {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_trainer(trainer: Arc<dyn Trainer>) -> Receiver<Result<(), TrainingError>> {
    let (sender, receiver) = bounded(1);

    thread::spawn(move || {
        tracing::info!("Training worker started");
        let result = trainer.train();
        if sender.send(result).is_err() {
            tracing::warn!("Training result dropped, session no longer listening");
        }
    });

    receiver
}

fn try_result(receiver: &Receiver<Result<(), TrainingError>>) -> Option<Result<(), TrainingError>> {
    match receiver.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(Err(TrainingError::WorkerGone)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    struct InstantTrainer;

    impl Trainer for InstantTrainer {
        fn train(&self) -> Result<(), TrainingError> {
            Ok(())
        }
    }

    struct FailingTrainer;

    impl Trainer for FailingTrainer {
        fn train(&self) -> Result<(), TrainingError> {
            Err(TrainingError::Failed("too few samples".to_string()))
        }
    }

    fn drive_until_settled(session: &mut TrainingSession) {
        for _ in 0..300 {
            session.tick(TICK);
            if session.state() != TrainingState::Training {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("training never settled");
    }

    #[test]
    fn test_initial_state() {
        let session = TrainingSession::new();
        assert_eq!(session.state(), TrainingState::Idle);
        assert!(!session.model_exists());
        assert!(!session.indicator_visible());
    }

    #[test]
    fn test_successful_run_sets_model_exists() {
        let mut session = TrainingSession::new();
        session.start_training(Arc::new(InstantTrainer)).unwrap();
        assert_eq!(session.state(), TrainingState::Training);

        drive_until_settled(&mut session);

        assert_eq!(session.state(), TrainingState::Complete);
        assert!(session.model_exists());
        assert!(!session.indicator_visible());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_failed_run_returns_to_idle_with_error() {
        let mut session = TrainingSession::new();
        session.start_training(Arc::new(FailingTrainer)).unwrap();

        drive_until_settled(&mut session);

        assert_eq!(session.state(), TrainingState::Idle);
        assert!(!session.model_exists());
        assert!(session.last_error().unwrap().contains("too few samples"));
    }

    #[test]
    fn test_second_start_rejected_while_training() {
        let mut session = TrainingSession::new();
        session.start_training(Arc::new(InstantTrainer)).unwrap();

        let result = session.start_training(Arc::new(InstantTrainer));
        assert!(result.is_err());
    }

    #[test]
    fn test_worker_and_indicator_start_immediately() {
        let started = Arc::new(std::sync::atomic::AtomicBool::new(false));
        struct FlaggingTrainer(Arc<std::sync::atomic::AtomicBool>);
        impl Trainer for FlaggingTrainer {
            fn train(&self) -> Result<(), TrainingError> {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }
        }

        let mut session = TrainingSession::new();
        session
            .start_training(Arc::new(FlaggingTrainer(Arc::clone(&started))))
            .unwrap();

        // No leading delay: the indicator is up before any tick, and the
        // worker runs without waiting for one.
        assert!(session.indicator_visible());
        session.tick(Duration::from_millis(100));
        assert!(session.indicator_visible());

        for _ in 0..200 {
            if started.load(std::sync::atomic::Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(started.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_completion_holds_indicator_before_done_message() {
        let mut session = TrainingSession::new();
        session.start_training(Arc::new(InstantTrainer)).unwrap();

        // Zero-length ticks pick up the worker result without advancing the
        // grace timers, so the phase sequence below is deterministic.
        for _ in 0..100 {
            session.tick(Duration::ZERO);
            thread::sleep(Duration::from_millis(5));
        }

        // Running indicator held for the first half-second grace
        assert_eq!(session.indicator_message(), Some("Training classifier..."));
        session.tick(Duration::from_millis(100));
        assert_eq!(session.indicator_message(), Some("Training classifier..."));

        // Grace elapses, done message shows for the second grace
        session.tick(Duration::from_millis(400));
        assert_eq!(session.indicator_message(), Some("Training Complete"));

        session.tick(Duration::from_millis(500));
        assert!(session.indicator_message().is_none());
        assert_eq!(session.state(), TrainingState::Complete);
        assert!(session.model_exists());
    }

    #[test]
    fn test_retraining_after_complete() {
        let mut session = TrainingSession::new();
        session.start_training(Arc::new(InstantTrainer)).unwrap();
        drive_until_settled(&mut session);
        assert_eq!(session.state(), TrainingState::Complete);

        session.start_training(Arc::new(InstantTrainer)).unwrap();
        assert_eq!(session.state(), TrainingState::Training);
        drive_until_settled(&mut session);
        assert!(session.model_exists());
    }
}
