//! Feature-vector preprocessing.
//!
//! Converts one captured [`Frame`] into a flat numeric feature vector the
//! classifier trains on. The encoding lives behind [`FeatureExtractor`] so
//! alternative preprocessors can be swapped in without touching the capture
//! pipeline.

use serde::{Deserialize, Serialize};

use crate::leap::{FingerKind, Frame, HandPose};

/// Number of values produced per frame by [`PalmRelativeExtractor`]:
/// 5 fingers x (3 offset components + 1 extension flag) + palm normal (3)
/// + pinch + grab + handedness.
pub const PALM_RELATIVE_LEN: usize = 5 * 4 + 3 + 3;

/// A labelled numeric encoding of one frame.
///
/// Created by the conversion worker, immutable afterwards, and handed to the
/// data service in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Free-text gesture identifier supplied by the user.
    pub gesture_name: String,
    /// Stable integer class label resolved by the data service.
    pub class_label: i64,
    /// Id of the frame this vector was derived from.
    pub frame_id: u64,
    /// Flat feature values.
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn new(
        gesture_name: impl Into<String>,
        class_label: i64,
        frame_id: u64,
        values: Vec<f32>,
    ) -> Self {
        Self {
            gesture_name: gesture_name.into(),
            class_label,
            frame_id,
            values,
        }
    }
}

/// Converts one frame into flat feature values.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> Vec<f32>;
}

/// Default extractor: palm-relative, hand-scale normalised encoding of the
/// first detected hand.
///
/// Normalising fingertip offsets by the hand's own scale makes the encoding
/// insensitive to hand size and distance from the sensor. Finger order is
/// fixed ([`FingerKind::ALL`]); missing fingers encode as zeros so the
/// vector length is constant.
#[derive(Debug, Default, Clone, Copy)]
pub struct PalmRelativeExtractor;

impl PalmRelativeExtractor {
    fn encode_hand(hand: &HandPose, out: &mut Vec<f32>) {
        let scale = hand.scale();

        for kind in FingerKind::ALL {
            match hand.fingers.iter().find(|f| f.kind == kind) {
                Some(finger) => {
                    let offset = finger.tip_position.sub(&hand.palm_position);
                    out.push(offset.x / scale);
                    out.push(offset.y / scale);
                    out.push(offset.z / scale);
                    out.push(if finger.is_extended { 1.0 } else { 0.0 });
                }
                None => out.extend_from_slice(&[0.0; 4]),
            }
        }

        out.push(hand.palm_normal.x);
        out.push(hand.palm_normal.y);
        out.push(hand.palm_normal.z);
        out.push(hand.pinch_strength);
        out.push(hand.grab_strength);
        out.push(if hand.is_left { 1.0 } else { 0.0 });
    }
}

impl FeatureExtractor for PalmRelativeExtractor {
    fn extract(&self, frame: &Frame) -> Vec<f32> {
        let mut values = Vec::with_capacity(PALM_RELATIVE_LEN);
        match frame.hands.first() {
            Some(hand) => Self::encode_hand(hand, &mut values),
            // Handless frames never reach the worker, but the encoding stays
            // total: all-zero vector of the fixed length.
            None => values.resize(PALM_RELATIVE_LEN, 0.0),
        }
        values
    }
}
