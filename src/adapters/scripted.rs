//! Scripted camera and classifier adapters.
//!
//! Stand-ins for a webcam and an image model, driven from the console:
//! the operator "holds up" an item and the classifier reports it with a
//! fixed confidence until the item is put away.  Useful for demos and
//! for exercising the full detection path without hardware.

use crate::app::ports::{CameraPort, ClassifierPort, Frame};
use crate::error::{InferenceError, InitFailure};
use crate::smoother::ConfidenceSample;

const FRAME_WIDTH: u32 = 224;
const FRAME_HEIGHT: u32 = 224;

/// Label reported when nothing is held up.
pub const BACKGROUND_LABEL: &str = "background";

/// Everyday non-food items the demo model knows besides the food keyword.
pub const HOUSEHOLD_LABELS: &[&str] = &["ball", "mug", "hand", "phone"];

// ───────────────────────────────────────────────────────────────
// Camera
// ───────────────────────────────────────────────────────────────

/// Camera that always yields the same blank frame.
pub struct SyntheticCamera {
    frame: Frame,
    frames: u64,
}

impl SyntheticCamera {
    /// Open the camera.
    pub fn open() -> Result<Self, InitFailure> {
        Ok(Self {
            frame: Frame::blank(FRAME_WIDTH, FRAME_HEIGHT),
            frames: 0,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl CameraPort for SyntheticCamera {
    fn update(&mut self) -> Result<&Frame, InferenceError> {
        self.frames += 1;
        Ok(&self.frame)
    }
}

// ───────────────────────────────────────────────────────────────
// Classifier
// ───────────────────────────────────────────────────────────────

/// Classifier whose output is set by hand.
pub struct ScriptedClassifier {
    labels: Vec<String>,
    scene: Option<(String, f32)>,
    failing: bool,
}

impl ScriptedClassifier {
    /// Load the "model".  `labels` is its class list and must be
    /// non-empty.
    pub fn load(labels: &[&str]) -> Result<Self, InitFailure> {
        if labels.is_empty() {
            return Err(InitFailure::ClassifierUnavailable);
        }
        Ok(Self {
            labels: labels.iter().map(|l| l.to_ascii_lowercase()).collect(),
            scene: None,
            failing: false,
        })
    }

    /// Class list, lowercased.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Show `label` to the camera with the given confidence.  Returns
    /// `false` (and leaves the scene alone) if the model has no such class.
    pub fn set_scene(&mut self, label: &str, probability: f32) -> bool {
        let Some(known) = self.labels.iter().find(|l| l.eq_ignore_ascii_case(label)) else {
            return false;
        };
        self.scene = Some((known.clone(), probability.clamp(0.0, 1.0)));
        true
    }

    /// Put the item away.
    pub fn clear(&mut self) {
        self.scene = None;
    }

    /// Make every subsequent prediction fail (or succeed again).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn is_failing(&self) -> bool {
        self.failing
    }
}

impl ClassifierPort for ScriptedClassifier {
    fn predict(&mut self, _frame: &Frame) -> Result<Vec<ConfidenceSample>, InferenceError> {
        if self.failing {
            return Err(InferenceError::Backend("scripted failure"));
        }
        Ok(match &self.scene {
            Some((label, p)) => vec![
                ConfidenceSample::new(label.clone(), *p),
                ConfidenceSample::new(BACKGROUND_LABEL, 1.0 - *p),
            ],
            None => vec![ConfidenceSample::new(BACKGROUND_LABEL, 1.0)],
        })
    }
}
