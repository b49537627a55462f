//! Frame and hand-pose data model.
//!
//! A [`Frame`] is one timestamped snapshot from the motion sensor containing
//! zero or more detected hand poses. Frames are immutable once captured; the
//! capture session buffers them and the conversion worker consumes them.

use serde::{Deserialize, Serialize};

/// A 3D vector in sensor space (millimetres, sensor origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise difference `self - other`.
    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Euclidean length.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance between two points.
    pub fn distance(&self, other: &Vec3) -> f32 {
        self.sub(other).magnitude()
    }
}

/// Finger identity, in the stable order used by the feature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerKind {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl FingerKind {
    /// All fingers in encoding order.
    pub const ALL: [FingerKind; 5] = [
        FingerKind::Thumb,
        FingerKind::Index,
        FingerKind::Middle,
        FingerKind::Ring,
        FingerKind::Pinky,
    ];
}

/// One tracked finger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Finger {
    pub kind: FingerKind,
    /// Fingertip position in sensor space.
    pub tip_position: Vec3,
    /// Whether the sensor reports the finger as extended.
    pub is_extended: bool,
}

/// One detected hand pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    /// Palm centre in sensor space.
    pub palm_position: Vec3,
    /// Unit normal pointing out of the palm.
    pub palm_normal: Vec3,
    /// Instantaneous palm velocity (mm/s).
    pub palm_velocity: Vec3,
    /// Whether this is a left hand.
    pub is_left: bool,
    /// Pinch strength reported by the sensor, 0.0..=1.0.
    pub pinch_strength: f32,
    /// Grab strength reported by the sensor, 0.0..=1.0.
    pub grab_strength: f32,
    /// Fingers in [`FingerKind::ALL`] order.
    pub fingers: Vec<Finger>,
}

impl HandPose {
    /// Characteristic hand scale used to normalise the feature encoding:
    /// the distance from the palm to the middle fingertip, falling back to
    /// 1.0 for degenerate poses so normalisation never divides by zero.
    pub fn scale(&self) -> f32 {
        let middle = self
            .fingers
            .iter()
            .find(|f| f.kind == FingerKind::Middle)
            .map(|f| f.tip_position.distance(&self.palm_position))
            .unwrap_or(0.0);
        if middle > f32::EPSILON {
            middle
        } else {
            1.0
        }
    }
}

/// One timestamped snapshot from the motion sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonic frame id assigned by the source.
    pub id: u64,
    /// Sensor timestamp in microseconds.
    pub timestamp_us: u64,
    /// Detected hands; possibly empty.
    pub hands: Vec<HandPose>,
}

impl Frame {
    /// An empty frame (no hands detected) with the given id.
    pub fn empty(id: u64) -> Self {
        Self {
            id,
            timestamp_us: id.wrapping_mul(1_000),
            hands: Vec::new(),
        }
    }

    /// Whether at least one hand was detected.
    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }
}
