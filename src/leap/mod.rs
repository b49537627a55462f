//! Motion-sensor frame model and frame sources.
//!
//! The hardware service itself is an external collaborator; this module
//! defines the frame data model the rest of the crate consumes and the
//! [`FrameSource`] seam a device integration must implement. A deterministic
//! [`ScriptedFrameSource`] is provided for tests and demos.

pub mod frame;
pub mod scripted;
pub mod source;

pub use frame::{Finger, FingerKind, Frame, HandPose, Vec3};
pub use scripted::ScriptedFrameSource;
pub use source::FrameSource;
