//! Automatic detection loop.
//!
//! Pulls a frame from the camera, runs the classifier and hands the
//! result to [`PetService::observe`].  Either collaborator may be missing
//! (failed to initialise); the detector then idles and the pet keeps
//! working through manual presses alone.

use log::{debug, info};

use crate::error::InitFailure;
use crate::fsm::context::Millis;

use super::ports::{CameraPort, ClassifierPort, DisplayPort, EventSink};
use super::service::PetService;

/// Camera + classifier pair driving [`PetService::observe`].
pub struct Detector<K: CameraPort, C: ClassifierPort> {
    camera: Option<K>,
    classifier: Option<C>,
}

impl<K: CameraPort, C: ClassifierPort> Detector<K, C> {
    pub fn new(camera: Option<K>, classifier: Option<C>) -> Self {
        Self { camera, classifier }
    }

    /// Build from fallible initialisers, reporting each failure to the
    /// service so the display and event log reflect the degraded mode.
    pub fn from_init(
        camera: Result<K, InitFailure>,
        classifier: Result<C, InitFailure>,
        service: &mut PetService,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) -> Self {
        let camera = match camera {
            Ok(camera) => Some(camera),
            Err(failure) => {
                service.report_init_failure(failure, display, sink);
                None
            }
        };
        let classifier = match classifier {
            Ok(classifier) => Some(classifier),
            Err(failure) => {
                service.report_init_failure(failure, display, sink);
                None
            }
        };
        let detector = Self { camera, classifier };
        if detector.is_active() {
            info!("Detector ready");
        }
        detector
    }

    /// `true` when both camera and classifier are available.
    pub fn is_active(&self) -> bool {
        self.camera.is_some() && self.classifier.is_some()
    }

    pub fn camera_mut(&mut self) -> Option<&mut K> {
        self.camera.as_mut()
    }

    pub fn classifier_mut(&mut self) -> Option<&mut C> {
        self.classifier.as_mut()
    }

    /// Run one detection tick.  Returns `true` if a prediction reached the
    /// service.
    pub fn tick(
        &mut self,
        now: Millis,
        service: &mut PetService,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(camera) = self.camera.as_mut() else {
            return false;
        };
        let frame = match camera.update() {
            Ok(frame) => frame,
            Err(e) => {
                service.inference_failed(now, e, sink);
                return false;
            }
        };
        let Some(classifier) = self.classifier.as_mut() else {
            return false;
        };

        match classifier.predict(frame) {
            Ok(predictions) => {
                debug!("Predicted {} labels at {}ms", predictions.len(), now);
                service.observe(now, &predictions, display, sink);
                true
            }
            Err(e) => {
                service.inference_failed(now, e, sink);
                false
            }
        }
    }
}
