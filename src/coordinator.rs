//! View coordination
//!
//! Maps user commands onto view transitions and the capture/training
//! sessions. Exactly one view is active at a time; every command is guarded
//! on sensor connectivity, and a guarded-out command is a no-op apart from
//! the button click cue.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::CaptureSession;
use crate::classifier::{Trainer, TrainingSession, TrainingState};
use crate::config;
use crate::database::DataService;
use crate::features::FeatureExtractor;
use crate::leap::FrameSource;
use crate::sound::{self, Cue, CuePlayer};

/// The application's top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Live recognition view showing the current gesture sign
    #[default]
    FreeRoam,
    /// Snapshot recording view
    Recording,
    /// Gesture creation and training view
    Creation,
}

/// Drives the panel transition animations between two views.
///
/// Supplied by the embedding front end; implementations receive one call
/// per accepted view change.
pub trait ViewAnimator: Send + Sync {
    fn play_transition(&self, from: View, to: View);
}

/// A [`ViewAnimator`] that performs no animation. Used in headless runs and
/// tests.
#[derive(Debug, Default)]
pub struct NullViewAnimator;

impl ViewAnimator for NullViewAnimator {
    fn play_transition(&self, _from: View, _to: View) {}
}

/// Coordinates views, the capture pipeline, and classifier training.
pub struct ViewCoordinator {
    view: View,
    sign: String,
    capture: CaptureSession,
    training: TrainingSession,
    source: Arc<dyn FrameSource>,
    animator: Arc<dyn ViewAnimator>,
    cues: Arc<dyn CuePlayer>,
    extractor: Arc<dyn FeatureExtractor>,
    store: Arc<dyn DataService>,
    trainer: Arc<dyn Trainer>,
}

impl ViewCoordinator {
    pub fn new(
        source: Arc<dyn FrameSource>,
        animator: Arc<dyn ViewAnimator>,
        cues: Arc<dyn CuePlayer>,
        extractor: Arc<dyn FeatureExtractor>,
        store: Arc<dyn DataService>,
        trainer: Arc<dyn Trainer>,
    ) -> Self {
        Self {
            view: View::FreeRoam,
            sign: default_sign(),
            capture: CaptureSession::new(),
            training: TrainingSession::new(),
            source,
            animator,
            cues,
            extractor,
            store,
            trainer,
        }
    }

    /// Returns the currently active view
    pub fn view(&self) -> View {
        self.view
    }

    /// Returns whether a panel's own input handling is enabled.
    ///
    /// Only the active view's panel accepts input.
    pub fn panel_enabled(&self, view: View) -> bool {
        self.view == view
    }

    /// Returns whether the gesture-name input and submit controls accept
    /// input. Leaving the recording panel disables them even while a
    /// session is awaiting a name.
    pub fn name_input_enabled(&self) -> bool {
        self.panel_enabled(View::Recording) && self.capture.inputs_enabled()
    }

    /// Returns the sign text shown in the free-roam view
    pub fn sign(&self) -> &str {
        &self.sign
    }

    /// Sets the sign text shown in the free-roam view
    pub fn set_sign(&mut self, text: impl Into<String>) {
        self.sign = text.into();
    }

    /// Returns the capture session
    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    /// Returns the training session
    pub fn training(&self) -> &TrainingSession {
        &self.training
    }

    /// Advance both sessions by one UI tick, playing the completion cue
    /// when a submission or training run reaches its done phase.
    pub fn tick(&mut self, dt: Duration) {
        let capture_was_done = self.capture.showing_completion();
        let training_was_complete = self.training.state() == TrainingState::Complete;

        self.capture.tick(dt, self.source.as_ref());
        self.training.tick(dt);

        if !capture_was_done && self.capture.showing_completion() {
            sound::play_cue(self.cues.as_ref(), Cue::Complete);
        }
        if !training_was_complete && self.training.state() == TrainingState::Complete {
            sound::play_cue(self.cues.as_ref(), Cue::Complete);
        }
    }

    /// Switch to the gesture creation view.
    pub fn create_gesture_view(&mut self) {
        self.switch_view(View::Creation);
    }

    /// Switch to the snapshot recording view.
    pub fn record_gesture_view(&mut self) {
        self.switch_view(View::Recording);
    }

    /// Return to the free-roam view, resetting the sign text and clearing
    /// the departed panel's status line and prompt.
    pub fn back_to_free_roam(&mut self) {
        if self.switch_view(View::FreeRoam) {
            self.sign = default_sign();
            self.capture.dismiss_status();
            self.capture.cancel_reset();
        }
    }

    /// View change shared guard: the click cue always plays, but without a
    /// connected sensor the command has no further effect.
    fn switch_view(&mut self, to: View) -> bool {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);

        if !self.source.is_connected() {
            tracing::debug!("View change to {:?} ignored, sensor not connected", to);
            return false;
        }
        if self.view == to {
            return false;
        }

        let from = self.view;
        self.animator.play_transition(from, to);
        self.view = to;
        tracing::info!("View changed: {:?} -> {:?}", from, to);
        true
    }

    /// Start a snapshot recording.
    pub fn take_snapshot(&mut self) {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);

        if !self.source.is_connected() {
            tracing::debug!("Snapshot ignored, sensor not connected");
            return;
        }
        self.capture.take_snapshot();
    }

    /// Submit the buffered capture under the given gesture name.
    pub fn submit_gesture(&mut self, name: &str) -> Result<(), String> {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);

        let result = self.capture.submit_gesture(
            name,
            Arc::clone(&self.extractor),
            Arc::clone(&self.store),
        );
        if result.is_err() {
            sound::play_cue(self.cues.as_ref(), Cue::Error);
        }
        result
    }

    /// Ask to discard the current capture (confirmation required).
    pub fn reset_session(&mut self) -> Result<(), String> {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);
        self.capture.request_reset()
    }

    /// Confirm the pending discard.
    pub fn confirm_reset(&mut self) -> Result<(), String> {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);
        self.capture.confirm_reset()
    }

    /// Dismiss the discard prompt.
    pub fn cancel_reset(&mut self) {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);
        self.capture.cancel_reset();
    }

    /// Start a classifier training run.
    pub fn train_classifier(&mut self) -> Result<(), String> {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);

        if !self.source.is_connected() {
            tracing::debug!("Training ignored, sensor not connected");
            return Ok(());
        }
        self.training.start_training(Arc::clone(&self.trainer))
    }

    /// Mark a previously trained model as available without retraining.
    pub fn import_gestures(&mut self) {
        sound::play_cue(self.cues.as_ref(), Cue::ButtonClick);

        if !self.source.is_connected() {
            tracing::debug!("Import ignored, sensor not connected");
            return;
        }
        tracing::info!("Imported previously trained model");
        self.training.set_model_exists(true);
    }
}

fn default_sign() -> String {
    config::get_config()
        .map(|c| c.general.no_gesture_sign)
        .unwrap_or_else(|_| "No Gesture Detected".to_string())
}
