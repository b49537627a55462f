//! Scripted frame source for tests and demos.
//!
//! Plays back a fixed sequence of frames, then keeps returning empty frames
//! once the script is exhausted. Connectivity is toggleable so guard
//! behaviour can be exercised without hardware.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::frame::{Finger, FingerKind, Frame, HandPose, Vec3};
use super::source::FrameSource;

/// Deterministic [`FrameSource`] backed by a queue of scripted frames.
pub struct ScriptedFrameSource {
    script: Mutex<VecDeque<Frame>>,
    connected: AtomicBool,
    next_id: AtomicU64,
}

impl ScriptedFrameSource {
    /// Create a source that will play the given frames in order.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            script: Mutex::new(frames.into()),
            connected: AtomicBool::new(true),
            next_id: AtomicU64::new(0),
        }
    }

    /// Create a connected source with an empty script.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Append a frame to the end of the script.
    pub fn push_frame(&self, frame: Frame) {
        self.script.lock().push_back(frame);
    }

    /// Toggle the reported connectivity.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of scripted frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl FrameSource for ScriptedFrameSource {
    fn current_frame(&self) -> Frame {
        let mut script = self.script.lock();
        match script.pop_front() {
            Some(frame) => frame,
            None => Frame::empty(self.next_id.fetch_add(1, Ordering::SeqCst) | (1 << 63)),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Build a plausible single-hand frame for fixtures.
///
/// The hand is an open right hand hovering above the sensor; `id` seeds a
/// small positional offset so consecutive frames differ.
pub fn hand_frame(id: u64) -> Frame {
    let jitter = (id % 10) as f32;
    let palm = Vec3::new(jitter, 180.0 + jitter, -20.0);

    let tips = [
        Vec3::new(palm.x - 45.0, palm.y + 25.0, palm.z - 10.0), // thumb
        Vec3::new(palm.x - 20.0, palm.y + 70.0, palm.z - 15.0), // index
        Vec3::new(palm.x, palm.y + 80.0, palm.z - 15.0),        // middle
        Vec3::new(palm.x + 20.0, palm.y + 72.0, palm.z - 15.0), // ring
        Vec3::new(palm.x + 38.0, palm.y + 55.0, palm.z - 12.0), // pinky
    ];

    let fingers = FingerKind::ALL
        .iter()
        .zip(tips.iter())
        .map(|(kind, tip)| Finger {
            kind: *kind,
            tip_position: *tip,
            is_extended: true,
        })
        .collect();

    Frame {
        id,
        timestamp_us: id * 11_111,
        hands: vec![HandPose {
            palm_position: palm,
            palm_normal: Vec3::new(0.0, -1.0, 0.0),
            palm_velocity: Vec3::ZERO,
            is_left: false,
            pinch_strength: 0.05,
            grab_strength: 0.0,
            fingers,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_plays_in_order() {
        let source = ScriptedFrameSource::new(vec![hand_frame(1), hand_frame(2)]);

        assert_eq!(source.current_frame().id, 1);
        assert_eq!(source.current_frame().id, 2);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script_returns_empty_frames() {
        let source = ScriptedFrameSource::empty();
        let frame = source.current_frame();
        assert!(!frame.has_hands());
    }

    #[test]
    fn test_connectivity_toggle() {
        let source = ScriptedFrameSource::empty();
        assert!(source.is_connected());
        source.set_connected(false);
        assert!(!source.is_connected());
    }

    #[test]
    fn test_hand_frame_fixture_has_five_fingers() {
        let frame = hand_frame(3);
        assert!(frame.has_hands());
        assert_eq!(frame.hands[0].fingers.len(), 5);
    }
}
