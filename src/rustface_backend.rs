// SeetaFace detection through `rustface`, behind the `rustface` feature.

use crate::config::DETECTION_INPUT_SIZE;
use crate::detector::{detection_input, FaceBox, FaceDetector};
use crate::error::Error;
use crate::types::FrameBuffer;
use std::path::Path;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is read from disk once; a missing or corrupt file means
/// detection is unavailable for the session, not a fatal error.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
    score_threshold: f64,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file (e.g. `seeta_fd_frontal_v1.0.bin`).
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::DetectorUnavailable(format!("{}: {e}", path.display())))?;
        let model = rustface::read_model(std::io::Cursor::new(bytes))
            .map_err(|e| Error::DetectorUnavailable(format!("{}: {e}", path.display())))?;
        log::info!("loaded face model from {}", path.display());
        Ok(Self { model, min_face_size: 20, score_threshold: 2.0 })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &FrameBuffer) -> Result<Vec<FaceBox>, Error> {
        if image.width == 0 || image.height == 0 {
            return Err(Error::Detection("empty image".into()));
        }
        let (gray, back) = detection_input(image, DETECTION_INPUT_SIZE);
        let (w, h) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_threshold);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), w, h));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox {
                    x: bbox.x() as f64 * back,
                    y: bbox.y() as f64 * back,
                    width: bbox.width() as f64 * back,
                    height: bbox.height() as f64 * back,
                    confidence: face.score(),
                }
            })
            .collect())
    }
}
