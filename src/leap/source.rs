//! Frame source seam.
//!
//! A device integration (LeapC, a replay file, a simulator) implements
//! [`FrameSource`]; the capture session and coordinator only ever talk to
//! this trait.

use super::frame::Frame;

/// Anything that can deliver the latest motion-sensor frame on demand.
///
/// `current_frame` is non-blocking and always returns the most recent
/// snapshot available, which may contain zero hands. Connectivity gates
/// every coordinator command: a disconnected source turns commands into
/// no-ops.
pub trait FrameSource: Send + Sync {
    /// The latest available frame.
    fn current_frame(&self) -> Frame;

    /// Whether the sensor is currently connected.
    fn is_connected(&self) -> bool;
}
