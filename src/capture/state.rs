//! Capture session state machine
//!
//! Defines the states and transitions for the gesture snapshot workflow.
//! Holding the enabled/disabled flags of the UI controls inside one enum
//! keeps the transitions the single source of truth for what the user may
//! do at any moment.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Capture session state
///
/// Represents the four states in the gesture snapshot workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Waiting for a "take snapshot" command
    #[default]
    Idle,
    /// Countdown running, sampling frames from the sensor
    Recording,
    /// Window elapsed, waiting for the user to name the gesture
    AwaitingName,
    /// Background worker converting and persisting the buffered frames
    Submitting,
}

impl CaptureState {
    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Ready to capture",
            CaptureState::Recording => "Recording gesture",
            CaptureState::AwaitingName => "Waiting for gesture name",
            CaptureState::Submitting => "Saving gesture",
        }
    }

    /// Returns whether the session can be discarded from this state
    pub fn is_resettable(&self) -> bool {
        matches!(self, CaptureState::Recording | CaptureState::AwaitingName)
    }

    /// Returns whether the name-input and submit controls are enabled
    pub fn inputs_enabled(&self) -> bool {
        matches!(self, CaptureState::AwaitingName)
    }

    /// Returns whether frames are being sampled in this state
    pub fn is_sampling(&self) -> bool {
        matches!(self, CaptureState::Recording)
    }
}

/// Events that can trigger state transitions
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// User requested a snapshot (countdown starts)
    TakeSnapshot,
    /// The recording countdown crossed zero
    WindowElapsed,
    /// User submitted a non-empty gesture name and the worker was started
    NameAccepted {
        /// The trimmed gesture name
        name: String,
    },
    /// The background worker finished and the indicator sequence completed
    SubmitFinished,
    /// The background worker reported a failure
    SubmitFailed {
        /// Error message
        error: String,
    },
    /// User confirmed discarding the buffered frames
    ResetConfirmed,
}

/// Reason for entering a state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// User requested a snapshot
    SnapshotRequested,
    /// The recording window elapsed
    WindowElapsed,
    /// A named submission was handed to the worker
    SubmissionStarted,
    /// The submission completed successfully
    SubmissionSuccess,
    /// The user discarded the session
    UserReset,
    /// Error occurred during submission
    Error { message: String },
}

/// Result of a state transition
#[derive(Debug, Clone)]
pub struct TransitionResult {
    /// The new state after the transition
    pub new_state: CaptureState,
    /// Reason for the transition
    pub reason: TransitionReason,
}

/// Capture state machine
///
/// Manages the state transitions for the snapshot workflow. Timing and the
/// frame buffer are handled externally by the CaptureSession.
pub struct CaptureStateMachine {
    /// Current state
    state: CaptureState,
    /// Timestamp when the current state was entered
    state_entered_at: Instant,
    /// Name of the gesture currently being submitted, if any
    pending_gesture: Option<String>,
}

impl CaptureStateMachine {
    /// Creates a new state machine in the Idle state
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            state_entered_at: Instant::now(),
            pending_gesture: None,
        }
    }

    /// Returns the current state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Returns how long the machine has been in the current state
    pub fn time_in_state(&self) -> std::time::Duration {
        self.state_entered_at.elapsed()
    }

    /// Returns the gesture name of the in-flight submission, if any
    pub fn pending_gesture(&self) -> Option<&str> {
        self.pending_gesture.as_deref()
    }

    /// Process an event and return the transition result if a transition occurred
    ///
    /// Returns `None` if the event is not valid for the current state. A
    /// second `TakeSnapshot` while a session is pending falls through here
    /// and is ignored by the caller.
    pub fn process_event(&mut self, event: CaptureEvent) -> Option<TransitionResult> {
        let transition = match (&self.state, event) {
            // IDLE state transitions
            (CaptureState::Idle, CaptureEvent::TakeSnapshot) => Some(TransitionResult {
                new_state: CaptureState::Recording,
                reason: TransitionReason::SnapshotRequested,
            }),

            // RECORDING state transitions
            (CaptureState::Recording, CaptureEvent::WindowElapsed) => Some(TransitionResult {
                new_state: CaptureState::AwaitingName,
                reason: TransitionReason::WindowElapsed,
            }),
            (CaptureState::Recording, CaptureEvent::ResetConfirmed) => Some(TransitionResult {
                new_state: CaptureState::Idle,
                reason: TransitionReason::UserReset,
            }),

            // AWAITING_NAME state transitions
            (CaptureState::AwaitingName, CaptureEvent::NameAccepted { name }) => {
                self.pending_gesture = Some(name);
                Some(TransitionResult {
                    new_state: CaptureState::Submitting,
                    reason: TransitionReason::SubmissionStarted,
                })
            }
            (CaptureState::AwaitingName, CaptureEvent::ResetConfirmed) => Some(TransitionResult {
                new_state: CaptureState::Idle,
                reason: TransitionReason::UserReset,
            }),

            // SUBMITTING state transitions
            (CaptureState::Submitting, CaptureEvent::SubmitFinished) => Some(TransitionResult {
                new_state: CaptureState::Idle,
                reason: TransitionReason::SubmissionSuccess,
            }),
            (CaptureState::Submitting, CaptureEvent::SubmitFailed { error }) => {
                Some(TransitionResult {
                    new_state: CaptureState::Idle,
                    reason: TransitionReason::Error { message: error },
                })
            }

            // Invalid transitions
            _ => None,
        };

        if let Some(ref result) = transition {
            self.apply_transition(result);
        }

        transition
    }

    /// Apply a transition, updating internal state
    fn apply_transition(&mut self, result: &TransitionResult) {
        let previous_state = self.state;
        self.state = result.new_state;
        self.state_entered_at = Instant::now();

        if result.new_state == CaptureState::Idle {
            self.pending_gesture = None;
        }

        tracing::info!(
            "Capture state transition: {:?} -> {:?} (reason: {:?})",
            previous_state,
            result.new_state,
            result.reason
        );
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let sm = CaptureStateMachine::new();
        assert_eq!(sm.state(), CaptureState::Idle);
    }

    #[test]
    fn test_take_snapshot_transitions_to_recording() {
        let mut sm = CaptureStateMachine::new();
        let result = sm.process_event(CaptureEvent::TakeSnapshot);

        assert!(result.is_some());
        assert_eq!(result.unwrap().new_state, CaptureState::Recording);
        assert_eq!(sm.state(), CaptureState::Recording);
    }

    #[test]
    fn test_window_elapsed_transitions_to_awaiting_name() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        let result = sm.process_event(CaptureEvent::WindowElapsed);

        assert!(result.is_some());
        assert_eq!(result.unwrap().new_state, CaptureState::AwaitingName);
    }

    #[test]
    fn test_name_accepted_transitions_to_submitting() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        sm.process_event(CaptureEvent::WindowElapsed);
        let result = sm.process_event(CaptureEvent::NameAccepted {
            name: "Fist".to_string(),
        });

        assert!(result.is_some());
        assert_eq!(result.unwrap().new_state, CaptureState::Submitting);
        assert_eq!(sm.pending_gesture(), Some("Fist"));
    }

    #[test]
    fn test_submit_finished_returns_to_idle() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        sm.process_event(CaptureEvent::WindowElapsed);
        sm.process_event(CaptureEvent::NameAccepted {
            name: "Fist".to_string(),
        });
        let result = sm.process_event(CaptureEvent::SubmitFinished);

        assert!(result.is_some());
        assert_eq!(result.unwrap().new_state, CaptureState::Idle);
        assert!(sm.pending_gesture().is_none());
    }

    #[test]
    fn test_submit_failed_returns_to_idle_with_error() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        sm.process_event(CaptureEvent::WindowElapsed);
        sm.process_event(CaptureEvent::NameAccepted {
            name: "Fist".to_string(),
        });
        let result = sm.process_event(CaptureEvent::SubmitFailed {
            error: "database locked".to_string(),
        });

        assert!(result.is_some());
        let result = result.unwrap();
        assert_eq!(result.new_state, CaptureState::Idle);
        assert!(matches!(result.reason, TransitionReason::Error { .. }));
    }

    #[test]
    fn test_reset_confirmed_from_awaiting_name() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        sm.process_event(CaptureEvent::WindowElapsed);
        let result = sm.process_event(CaptureEvent::ResetConfirmed);

        assert!(result.is_some());
        let result = result.unwrap();
        assert_eq!(result.new_state, CaptureState::Idle);
        assert!(matches!(result.reason, TransitionReason::UserReset));
    }

    #[test]
    fn test_reset_rejected_while_submitting() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        sm.process_event(CaptureEvent::WindowElapsed);
        sm.process_event(CaptureEvent::NameAccepted {
            name: "Fist".to_string(),
        });

        let result = sm.process_event(CaptureEvent::ResetConfirmed);
        assert!(result.is_none());
        assert_eq!(sm.state(), CaptureState::Submitting);
    }

    #[test]
    fn test_second_take_snapshot_is_invalid() {
        let mut sm = CaptureStateMachine::new();
        sm.process_event(CaptureEvent::TakeSnapshot);
        let result = sm.process_event(CaptureEvent::TakeSnapshot);

        assert!(result.is_none());
        assert_eq!(sm.state(), CaptureState::Recording);
    }

    #[test]
    fn test_state_flags() {
        assert!(!CaptureState::Idle.is_resettable());
        assert!(CaptureState::Recording.is_resettable());
        assert!(CaptureState::AwaitingName.is_resettable());
        assert!(!CaptureState::Submitting.is_resettable());

        assert!(CaptureState::AwaitingName.inputs_enabled());
        assert!(!CaptureState::Submitting.inputs_enabled());

        assert!(CaptureState::Recording.is_sampling());
        assert!(!CaptureState::AwaitingName.is_sampling());
    }
}
