//! Capture session
//!
//! Drives the snapshot workflow: the countdown window that samples frames
//! from the sensor, the name entry step, and the handoff to the background
//! conversion worker. The session is ticked once per UI frame with the
//! elapsed wall-clock time, so the countdown is time-bounded rather than
//! sample-count-bounded.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::state::{CaptureEvent, CaptureState, CaptureStateMachine};
use crate::capture::worker::{self, ConversionHandle};
use crate::config::{self, RECORDING_SECONDS_MAX, RECORDING_SECONDS_MIN};
use crate::database::DataService;
use crate::features::FeatureExtractor;
use crate::leap::{Frame, FrameSource};

/// How long a status message stays visible before clearing itself
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// Pause after the worker reports completion, before the done message
const SUBMIT_GRACE: Duration = Duration::from_secs(1);

/// How long the done message stays up before the indicator hides
const DONE_DISPLAY: Duration = Duration::from_secs(1);

/// A status line that clears itself after a fixed delay
struct StatusLine {
    text: String,
    remaining: Duration,
}

/// Phases of the submission indicator sequence
enum SubmitPhase {
    /// Worker running, indicator shows "saving"
    AwaitingWorker(ConversionHandle),
    /// Worker done, holding the saving indicator for the grace period
    HoldingIndicator { remaining: Duration },
    /// Done message visible before the indicator hides
    ShowingDone { remaining: Duration },
}

/// One complete snapshot cycle from arming through submission or discard.
///
/// Owns the frame buffer exclusively; at submit time the buffered frames
/// move into the worker, so the buffer is never shared across threads.
pub struct CaptureSession {
    machine: CaptureStateMachine,
    frames: Vec<Frame>,
    countdown: Duration,
    status: Option<StatusLine>,
    submit_phase: Option<SubmitPhase>,
    reset_prompt: bool,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            machine: CaptureStateMachine::new(),
            frames: Vec::new(),
            countdown: Duration::ZERO,
            status: None,
            submit_phase: None,
            reset_prompt: false,
        }
    }

    /// Returns the current session state
    pub fn state(&self) -> CaptureState {
        self.machine.state()
    }

    /// Returns the number of buffered frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the time left in the recording window
    pub fn remaining_window(&self) -> Duration {
        self.countdown
    }

    /// Returns whether the name-input and submit controls are enabled
    pub fn inputs_enabled(&self) -> bool {
        self.machine.state().inputs_enabled() && !self.reset_prompt
    }

    /// Returns the current self-clearing status message, if visible
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    /// Returns the processing indicator text, if the indicator is visible
    pub fn processing_message(&self) -> Option<&'static str> {
        match self.submit_phase {
            Some(SubmitPhase::AwaitingWorker(_)) | Some(SubmitPhase::HoldingIndicator { .. }) => {
                Some("Saving gesture...")
            }
            Some(SubmitPhase::ShowingDone { .. }) => Some("Gesture created"),
            None => None,
        }
    }

    /// Returns whether the discard confirmation prompt is showing
    pub fn reset_prompt_visible(&self) -> bool {
        self.reset_prompt
    }

    /// Returns whether the indicator is in its done-message phase.
    pub fn showing_completion(&self) -> bool {
        matches!(self.submit_phase, Some(SubmitPhase::ShowingDone { .. }))
    }

    /// Start a new snapshot with the configured recording window.
    ///
    /// Returns false if a session is already in progress; the command is
    /// ignored in that case.
    pub fn take_snapshot(&mut self) -> bool {
        let seconds = config::get_config()
            .map(|c| c.capture.recording_seconds)
            .unwrap_or(RECORDING_SECONDS_MIN)
            .clamp(RECORDING_SECONDS_MIN, RECORDING_SECONDS_MAX);

        self.take_snapshot_with_window(Duration::from_secs_f32(seconds))
    }

    /// Start a new snapshot with an explicit recording window.
    pub fn take_snapshot_with_window(&mut self, window: Duration) -> bool {
        if self
            .machine
            .process_event(CaptureEvent::TakeSnapshot)
            .is_none()
        {
            tracing::debug!(
                "Snapshot command ignored, session in state {:?}",
                self.machine.state()
            );
            return false;
        }

        self.frames.clear();
        self.countdown = window;
        self.reset_prompt = false;
        true
    }

    /// Advance the session by one UI tick.
    ///
    /// `dt` is the wall-clock time since the previous tick. While recording,
    /// pulls exactly one frame from the source and buffers it if it contains
    /// at least one hand.
    pub fn tick(&mut self, dt: Duration, source: &dyn FrameSource) {
        self.tick_status(dt);

        match self.machine.state() {
            CaptureState::Recording => self.tick_recording(dt, source),
            CaptureState::Submitting => self.tick_submission(dt),
            _ => {}
        }
    }

    fn tick_status(&mut self, dt: Duration) {
        if let Some(status) = &mut self.status {
            status.remaining = status.remaining.saturating_sub(dt);
            if status.remaining.is_zero() {
                self.status = None;
            }
        }
    }

    fn tick_recording(&mut self, dt: Duration, source: &dyn FrameSource) {
        let frame = source.current_frame();
        if frame.has_hands() {
            self.frames.push(frame);
        }

        self.countdown = self.countdown.saturating_sub(dt);
        if self.countdown.is_zero() {
            self.machine.process_event(CaptureEvent::WindowElapsed);
            self.set_status("Gesture captured! Enter a name to save it.");
        }
    }

    fn tick_submission(&mut self, dt: Duration) {
        let phase = match self.submit_phase.take() {
            Some(phase) => phase,
            None => return,
        };

        self.submit_phase = match phase {
            SubmitPhase::AwaitingWorker(handle) => match handle.try_result() {
                None => Some(SubmitPhase::AwaitingWorker(handle)),
                Some(Ok(summary)) => {
                    tracing::info!(
                        "Submission stored: '{}' ({} vectors)",
                        summary.gesture_name,
                        summary.vector_count
                    );
                    Some(SubmitPhase::HoldingIndicator {
                        remaining: SUBMIT_GRACE,
                    })
                }
                Some(Err(e)) => {
                    self.machine.process_event(CaptureEvent::SubmitFailed {
                        error: e.to_string(),
                    });
                    self.set_status("Could not save the gesture");
                    None
                }
            },
            SubmitPhase::HoldingIndicator { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    Some(SubmitPhase::ShowingDone {
                        remaining: DONE_DISPLAY,
                    })
                } else {
                    Some(SubmitPhase::HoldingIndicator { remaining })
                }
            }
            SubmitPhase::ShowingDone { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.machine.process_event(CaptureEvent::SubmitFinished);
                    None
                } else {
                    Some(SubmitPhase::ShowingDone { remaining })
                }
            }
        };
    }

    /// Submit the buffered frames under the given gesture name.
    ///
    /// The name is trimmed; an empty or all-whitespace name is rejected
    /// without starting the worker. On success the buffered frames move
    /// into a background worker and the session enters `Submitting`.
    pub fn submit_gesture(
        &mut self,
        name: &str,
        extractor: Arc<dyn FeatureExtractor>,
        store: Arc<dyn DataService>,
    ) -> Result<(), String> {
        if self.machine.state() != CaptureState::AwaitingName {
            return Err("No capture is awaiting a name".to_string());
        }

        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.set_status("Please enter a gesture name");
            return Err("Gesture name must not be empty".to_string());
        }

        let frames = mem::take(&mut self.frames);
        let handle = worker::spawn_conversion(trimmed.to_string(), frames, extractor, store);

        self.machine.process_event(CaptureEvent::NameAccepted {
            name: trimmed.to_string(),
        });
        self.submit_phase = Some(SubmitPhase::AwaitingWorker(handle));
        self.reset_prompt = false;
        Ok(())
    }

    /// Ask to discard the current session.
    ///
    /// Shows a confirmation prompt; nothing is cleared until
    /// [`CaptureSession::confirm_reset`]. A reset while a submission is in
    /// flight is rejected with a busy status rather than aborting the
    /// worker.
    pub fn request_reset(&mut self) -> Result<(), String> {
        if self.machine.state() == CaptureState::Submitting {
            self.set_status("Still saving the previous gesture");
            return Err("A submission is in progress".to_string());
        }

        if !self.machine.state().is_resettable() || self.frames.is_empty() {
            return Err("Nothing to discard".to_string());
        }

        self.reset_prompt = true;
        Ok(())
    }

    /// Confirm the pending discard, clearing the frame buffer.
    pub fn confirm_reset(&mut self) -> Result<(), String> {
        if !self.reset_prompt {
            return Err("No discard pending".to_string());
        }

        self.frames.clear();
        self.reset_prompt = false;
        self.machine.process_event(CaptureEvent::ResetConfirmed);
        self.set_status("Gesture discarded");
        Ok(())
    }

    /// Dismiss the discard prompt, keeping the buffered frames.
    pub fn cancel_reset(&mut self) {
        self.reset_prompt = false;
    }

    /// Blank the status line immediately, without waiting for the
    /// self-clear delay. Used when the hosting panel is dismissed.
    pub fn dismiss_status(&mut self) {
        self.status = None;
    }

    fn set_status(&mut self, text: &str) {
        self.status = Some(StatusLine {
            text: text.to_string(),
            remaining: STATUS_CLEAR_DELAY,
        });
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}
